//! Phone runtime executor

use super::{PhoneSnapshot, SseEvent};
use crate::messages::MessageLog;
use crate::state_machine::{transition, Effect, Event, PhoneState, SessionId};
use crate::telephony::TelephonyClient;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Owns the phone state; generic over the telephony backend
pub struct PhoneRuntime<C>
where
    C: TelephonyClient + 'static,
{
    state: PhoneState,
    client: Arc<C>,
    messages: Arc<RwLock<MessageLog>>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_tx: watch::Sender<PhoneSnapshot>,
    tick_period: Duration,
    /// Token for the running call timer, if any
    call_timer: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<C> PhoneRuntime<C>
where
    C: TelephonyClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: PhoneState,
        client: Arc<C>,
        messages: Arc<RwLock<MessageLog>>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        snapshot_tx: watch::Sender<PhoneSnapshot>,
        tick_period: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            client,
            messages,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            tick_period,
            call_timer: None,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(caller_id = %self.client.caller_id(), "Starting phone runtime");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    self.process_event(event).await;
                }

                else => break,
            }
        }

        self.stop_call_timer();
        tracing::info!("Phone runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        let event_name = event.name();

        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                // Ignored intents and late responses are routine
                tracing::debug!(event = event_name, reason = %e, "Event ignored");
                return;
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state.call != self.state.call {
            tracing::info!(
                from = old_state.call.name(),
                to = self.state.call.name(),
                session = ?self.state.call.session().or(old_state.call.session()),
                "Call state changed"
            );
        }
        if old_state != self.state {
            self.publish();
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
    }

    fn publish(&self) {
        let snapshot = PhoneSnapshot::from(&self.state);
        self.snapshot_tx.send_replace(snapshot.clone());
        let _ = self.broadcast_tx.send(SseEvent::StateChange { snapshot });
    }

    /// Execute an effect. Backend calls are spawned and report back as events.
    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::OriginateCall { session, to } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(session = %session, to = %to, "Originating call");
                    let result = client.originate_call(&to).await;
                    let _ = event_tx.send(Event::OriginateResult { session, result }).await;
                });
            }

            Effect::AnswerCall { session } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(session = %session, "Answering call");
                    let result = client.answer_call().await;
                    let _ = event_tx.send(Event::AnswerResult { session, result }).await;
                });
            }

            Effect::EndCall { session } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(session = %session, "Ending call");
                    let result = client.end_call().await;
                    let _ = event_tx.send(Event::EndResult { session, result }).await;
                });
            }

            Effect::SendMessage { send_id, to, body } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                // Stamped here so timestamps follow send_id order
                let sent_at = Utc::now();
                tokio::spawn(async move {
                    let result = client.send_message(&to, &body).await;
                    let _ = event_tx
                        .send(Event::MessageResult {
                            send_id,
                            to,
                            body,
                            sent_at,
                            result,
                        })
                        .await;
                });
            }

            Effect::StartCallTimer { session } => {
                self.stop_call_timer();
                let cancel = self.shutdown.child_token();
                self.call_timer = Some(cancel.clone());
                tokio::spawn(run_call_timer(
                    session,
                    self.tick_period,
                    self.event_tx.clone(),
                    cancel,
                ));
            }

            Effect::StopCallTimer => self.stop_call_timer(),

            Effect::RecordMessage {
                id,
                peer,
                content,
                direction,
                created_at,
            } => {
                let message = self
                    .messages
                    .write()
                    .await
                    .record(id, peer, content, direction, created_at);
                tracing::info!(id = message.id, peer = %message.peer, "Message recorded");
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }
        }
    }

    fn stop_call_timer(&mut self) {
        if let Some(token) = self.call_timer.take() {
            token.cancel();
        }
    }
}

/// Emit one `Tick` per period until cancelled. The first tick lands one full
/// period after the call connects.
async fn run_call_timer(
    session: SessionId,
    period: Duration,
    event_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            _ = ticker.tick() => {
                if event_tx.send(Event::Tick { session }).await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(session = %session, "Call timer stopped");
}
