//! Inbound-call poller
//!
//! Polling stands in for push notifications: an inbound call shows up at the
//! latest one period after the backend has it.

use super::PhoneSnapshot;
use crate::state_machine::Event;
use crate::telephony::TelephonyClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub async fn run_poller<C>(
    client: Arc<C>,
    state_rx: watch::Receiver<PhoneSnapshot>,
    event_tx: mpsc::Sender<Event>,
    period: Duration,
    cancel: CancellationToken,
) where
    C: TelephonyClient + ?Sized,
{
    tracing::info!(period_ms = %period.as_millis(), "Starting inbound-call poller");

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Busy line: skip the request entirely
        let idle = state_rx.borrow().call.is_idle();
        if !idle {
            tracing::trace!("Poll skipped, phone not idle");
            continue;
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = client.poll_incoming() => result,
        };

        match result {
            Ok(incoming) if incoming.pending => {
                if event_tx
                    .send(Event::IncomingCall {
                        from: incoming.from,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(_) => {}
            // Best effort: a failed poll is the same as no call
            Err(e) => tracing::debug!(error = %e, "Inbound poll failed"),
        }
    }

    tracing::info!("Inbound-call poller stopped");
}
