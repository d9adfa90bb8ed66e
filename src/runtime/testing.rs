//! Mock implementations for testing
//!
//! These mocks enable integration testing of the runtime without a real
//! telephony backend. Tests run on tokio's paused clock so call timers and
//! poll periods elapse instantly.

use super::{spawn_phone, PhoneHandle, PhoneSnapshot, RuntimeConfig};
use crate::dialer::DialKey;
use crate::state_machine::Event;
use crate::telephony::{IncomingCall, TelephonyClient, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ============================================================================
// Mock Telephony Client
// ============================================================================

/// A request the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Originate { to: String },
    Answer,
    End,
    Send { to: String, body: String },
    Poll,
}

type Ack = Result<(), TransportError>;

/// Mock telephony client that returns queued results. Empty queues answer
/// with success, and polls with "no call".
#[derive(Default)]
pub struct MockTelephony {
    originate: Mutex<VecDeque<Ack>>,
    answer: Mutex<VecDeque<Ack>>,
    end: Mutex<VecDeque<Ack>>,
    send: Mutex<VecDeque<Ack>>,
    incoming: Mutex<VecDeque<Result<IncomingCall, TransportError>>>,
    /// Extra latency for successive sends
    send_delays: Mutex<VecDeque<Duration>>,
    /// Latency applied to every call-affecting request
    delay: Duration,
    /// Record of all requests made
    pub calls: Mutex<Vec<MockCall>>,
}

impl MockTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queue_originate(&self, result: Ack) {
        self.originate.lock().unwrap().push_back(result);
    }

    pub fn queue_answer(&self, result: Ack) {
        self.answer.lock().unwrap().push_back(result);
    }

    pub fn queue_end(&self, result: Ack) {
        self.end.lock().unwrap().push_back(result);
    }

    pub fn queue_send(&self, result: Ack) {
        self.send.lock().unwrap().push_back(result);
    }

    pub fn queue_send_delay(&self, delay: Duration) {
        self.send_delays.lock().unwrap().push_back(delay);
    }

    pub fn queue_incoming(&self, result: Result<IncomingCall, TransportError>) {
        self.incoming.lock().unwrap().push_back(result);
    }

    pub fn recorded_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|&c| matcher(c)).count()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn respond(&self, queue: &Mutex<VecDeque<Ack>>) -> Ack {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        queue.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl TelephonyClient for MockTelephony {
    async fn originate_call(&self, to: &str) -> Result<(), TransportError> {
        self.record(MockCall::Originate { to: to.to_string() });
        self.respond(&self.originate).await
    }

    async fn answer_call(&self) -> Result<(), TransportError> {
        self.record(MockCall::Answer);
        self.respond(&self.answer).await
    }

    async fn end_call(&self) -> Result<(), TransportError> {
        self.record(MockCall::End);
        self.respond(&self.end).await
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        self.record(MockCall::Send {
            to: to.to_string(),
            body: body.to_string(),
        });
        let delay = self.send_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.respond(&self.send).await
    }

    async fn poll_incoming(&self) -> Result<IncomingCall, TransportError> {
        self.record(MockCall::Poll);
        self.incoming
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(IncomingCall::none()))
    }

    fn caller_id(&self) -> &str {
        "5550000"
    }
}

// ============================================================================
// Test Phone
// ============================================================================

/// A running phone wired to a mock backend
pub struct TestPhone {
    pub handle: PhoneHandle,
    pub telephony: Arc<MockTelephony>,
    state_rx: watch::Receiver<PhoneSnapshot>,
    pub join: JoinHandle<()>,
}

impl TestPhone {
    pub fn start(telephony: MockTelephony) -> Self {
        Self::start_with(telephony, RuntimeConfig::default())
    }

    pub fn start_with(telephony: MockTelephony, config: RuntimeConfig) -> Self {
        let telephony = Arc::new(telephony);
        let (handle, join) = spawn_phone(telephony.clone(), config);
        let state_rx = handle.watch();
        Self {
            handle,
            telephony,
            state_rx,
            join,
        }
    }

    pub async fn send(&self, event: Event) {
        self.handle
            .send_event(event)
            .await
            .expect("Failed to send event");
    }

    /// Type a number on the keypad
    pub async fn dial(&self, number: &str) {
        for c in number.chars() {
            let key = DialKey::try_from(c).expect("not a keypad key");
            self.send(Event::KeyPress { key }).await;
        }
    }

    pub fn snapshot(&self) -> PhoneSnapshot {
        self.handle.snapshot()
    }

    /// Wait until a published snapshot satisfies `pred`
    pub async fn wait_for(
        &mut self,
        pred: impl Fn(&PhoneSnapshot) -> bool,
        timeout: Duration,
    ) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.state_rx.wait_for(|s| pred(s))).await,
            Ok(Ok(_))
        )
    }

    pub async fn wait_for_state(&mut self, name: &str, timeout: Duration) -> bool {
        self.wait_for(|s| s.call.name() == name, timeout).await
    }

    /// Let every runnable task finish before the paused clock moves on
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Direction, Message};
    use crate::runtime::SseEvent;

    const WAIT: Duration = Duration::from_secs(1);

    fn refused() -> TransportError {
        TransportError::network("connection refused")
    }

    #[tokio::test]
    async fn test_mock_telephony_defaults() {
        let mock = MockTelephony::new();
        mock.queue_originate(Err(refused()));

        assert!(mock.originate_call("555").await.is_err());
        assert!(mock.originate_call("555").await.is_ok());
        assert!(!mock.poll_incoming().await.unwrap().pending);
        assert_eq!(
            mock.recorded_calls(),
            vec![
                MockCall::Originate { to: "555".to_string() },
                MockCall::Originate { to: "555".to_string() },
                MockCall::Poll,
            ]
        );
    }

    /// Dial, connect, talk for three seconds, hang up
    #[tokio::test(start_paused = true)]
    async fn test_outbound_call_scenario() {
        let mut phone = TestPhone::start(MockTelephony::new());

        phone.dial("5551234").await;
        assert!(phone.wait_for(|s| s.dialer == "5551234", WAIT).await);

        phone.send(Event::Call).await;
        assert!(phone.wait_for_state("in_call", WAIT).await);
        assert_eq!(phone.snapshot().duration_secs, 0);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let snapshot = phone.snapshot();
        assert_eq!(snapshot.duration_secs, 3);
        assert_eq!(snapshot.duration_display, "0:03");

        phone.send(Event::HangUp).await;
        assert!(phone.wait_for_state("idle", WAIT).await);
        let snapshot = phone.snapshot();
        assert_eq!(snapshot.duration_secs, 0);
        assert_eq!(snapshot.dialer, "");

        phone.settle().await;
        assert_eq!(
            phone.telephony.count(|c| matches!(c, MockCall::Originate { to } if to == "5551234")),
            1
        );
        assert_eq!(phone.telephony.count(|c| *c == MockCall::End), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_originate_failure_keeps_number() {
        let telephony = MockTelephony::new();
        telephony.queue_originate(Err(refused()));
        let phone = TestPhone::start(telephony);

        phone.dial("5551234").await;
        phone.send(Event::Call).await;
        phone.settle().await;

        let snapshot = phone.snapshot();
        assert!(snapshot.call.is_idle());
        assert_eq!(snapshot.dialer, "5551234");
        assert!(!snapshot.request_in_flight);
        assert!(phone.handle.messages(None).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_with_empty_number_not_forwarded() {
        let phone = TestPhone::start(MockTelephony::new());
        phone.send(Event::Call).await;
        phone.settle().await;

        assert!(phone.snapshot().call.is_idle());
        assert_eq!(phone.telephony.count(|c| matches!(c, MockCall::Originate { .. })), 0);
    }

    /// Ringing, answer fails
    #[tokio::test(start_paused = true)]
    async fn test_incoming_call_answer_fails() {
        let telephony = MockTelephony::new();
        telephony.queue_incoming(Ok(IncomingCall::from_caller("5559876")));
        telephony.queue_answer(Err(refused()));
        let mut phone = TestPhone::start(telephony);

        phone.dial("12").await;
        assert!(phone.wait_for_state("ringing", Duration::from_secs(6)).await);
        assert_eq!(phone.snapshot().call.peer(), Some("5559876"));
        assert!(phone.snapshot().ringing);

        phone.send(Event::Answer).await;
        assert!(phone.wait_for_state("idle", WAIT).await);
        assert_eq!(phone.snapshot().dialer, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_incoming_call_answered() {
        let telephony = MockTelephony::new();
        telephony.queue_incoming(Ok(IncomingCall {
            pending: true,
            from: None,
        }));
        let mut phone = TestPhone::start(telephony);

        assert!(phone.wait_for_state("ringing", Duration::from_secs(6)).await);
        phone.send(Event::Answer).await;
        assert!(phone.wait_for_state("in_call", WAIT).await);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(phone.snapshot().duration_secs, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_skipped_while_in_call() {
        let mut phone = TestPhone::start(MockTelephony::new());
        phone.dial("555").await;
        phone.send(Event::Call).await;
        assert!(phone.wait_for_state("in_call", WAIT).await);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(phone.telephony.count(|c| *c == MockCall::Poll), 0);
        assert!(phone.snapshot().in_call);

        phone.send(Event::HangUp).await;
        assert!(phone.wait_for_state("idle", WAIT).await);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(phone.telephony.count(|c| *c == MockCall::Poll), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_is_silent() {
        let telephony = MockTelephony::new();
        telephony.queue_incoming(Err(refused()));
        telephony.queue_incoming(Ok(IncomingCall::from_caller("777")));
        let mut phone = TestPhone::start(telephony);

        tokio::time::sleep(Duration::from_millis(5500)).await;
        assert!(phone.snapshot().call.is_idle());
        assert_eq!(phone.telephony.count(|c| *c == MockCall::Poll), 1);

        assert!(phone.wait_for_state("ringing", Duration::from_secs(6)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_up_does_not_wait_for_backend() {
        let telephony = MockTelephony::new().with_delay(Duration::from_secs(2));
        telephony.queue_end(Err(refused()));
        let mut phone = TestPhone::start(telephony);

        phone.dial("555").await;
        phone.send(Event::Call).await;
        assert!(phone.wait_for_state("in_call", Duration::from_secs(3)).await);

        phone.send(Event::HangUp).await;
        phone.settle().await;
        let snapshot = phone.snapshot();
        assert!(snapshot.call.is_idle());
        assert_eq!(snapshot.dialer, "");
        assert!(snapshot.request_in_flight);

        assert!(phone.wait_for(|s| !s.request_in_flight, Duration::from_secs(3)).await);
        assert!(phone.snapshot().call.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_call_taps_originate_once() {
        let telephony = MockTelephony::new().with_delay(Duration::from_secs(1));
        let mut phone = TestPhone::start(telephony);

        phone.dial("555").await;
        phone.send(Event::Call).await;
        phone.send(Event::Call).await;
        phone.send(Event::Call).await;
        assert!(phone.wait_for_state("in_call", Duration::from_secs(2)).await);

        assert_eq!(phone.telephony.count(|c| matches!(c, MockCall::Originate { .. })), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_up_while_dialing_ignores_late_success() {
        let telephony = MockTelephony::new().with_delay(Duration::from_secs(2));
        let mut phone = TestPhone::start(telephony);

        phone.dial("555").await;
        phone.send(Event::Call).await;
        assert!(phone.wait_for_state("dialing", WAIT).await);

        phone.send(Event::HangUp).await;
        assert!(phone.wait_for_state("idle", WAIT).await);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(phone.snapshot().call.is_idle());
        assert_eq!(phone.snapshot().duration_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_appends_on_success() {
        let phone = TestPhone::start(MockTelephony::new());
        let mut updates = phone.handle.subscribe();

        phone.dial("555").await;
        phone
            .send(Event::ComposeText {
                text: "hello".to_string(),
            })
            .await;
        phone.send(Event::SendMessage).await;
        phone.settle().await;
        assert_eq!(phone.snapshot().compose, "");
        assert_eq!(phone.snapshot().dialer, "555");

        let thread = phone.handle.messages(Some("555")).await;
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].content, "hello");
        assert_eq!(thread[0].direction, Direction::Sent);

        let mut saw_message = false;
        while let Ok(event) = updates.try_recv() {
            if let SseEvent::Message { message } = event {
                assert_eq!(message.content, "hello");
                saw_message = true;
            }
        }
        assert!(saw_message);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_sends_logged_in_send_order() {
        let telephony = MockTelephony::new();
        telephony.queue_send_delay(Duration::from_millis(300));
        let phone = TestPhone::start(telephony);

        phone.dial("555").await;
        for text in ["first", "second"] {
            phone
                .send(Event::ComposeText {
                    text: text.to_string(),
                })
                .await;
            phone.send(Event::SendMessage).await;
            phone.settle().await;
        }

        // The slow first send has not been confirmed yet
        let contents = |log: &[Message]| log.iter().map(|m| m.content.clone()).collect::<Vec<_>>();
        assert_eq!(contents(&phone.handle.messages(None).await), vec!["second"]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let log = phone.handle.messages(None).await;
        assert_eq!(contents(&log), vec!["first", "second"]);
        assert!(log[0].id < log[1].id);
        assert!(log[0].created_at <= log[1].created_at);
        assert_eq!(phone.snapshot().compose, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_failure_keeps_draft() {
        let telephony = MockTelephony::new();
        telephony.queue_send(Err(refused()));
        let phone = TestPhone::start(telephony);

        phone.dial("555").await;
        phone
            .send(Event::ComposeText {
                text: "hello".to_string(),
            })
            .await;
        phone.send(Event::SendMessage).await;
        phone.settle().await;

        assert_eq!(phone.telephony.count(|c| matches!(c, MockCall::Send { .. })), 1);
        assert_eq!(phone.snapshot().compose, "hello");
        assert!(phone.handle.messages(None).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sends_are_noops() {
        let phone = TestPhone::start(MockTelephony::new());

        // No destination
        phone
            .send(Event::ComposeText {
                text: "hello".to_string(),
            })
            .await;
        phone.send(Event::SendMessage).await;

        // No body
        phone
            .send(Event::ComposeText {
                text: String::new(),
            })
            .await;
        phone.dial("555").await;
        phone.send(Event::SendMessage).await;
        phone.settle().await;

        assert_eq!(phone.telephony.count(|c| matches!(c, MockCall::Send { .. })), 0);
        assert!(phone.handle.messages(None).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_runtime() {
        let phone = TestPhone::start(MockTelephony::new());
        phone.handle.shutdown();

        let finished = tokio::time::timeout(WAIT, phone.join).await;
        assert!(finished.is_ok());
        assert!(phone.handle.send_event(Event::Backspace).await.is_err());
    }
}
