//! Pure state transition function
//!
//! Given the current phone state and an event, compute the next state and
//! the effects the runtime must carry out. No I/O happens here.

use super::state::{CallRequest, CallState, PendingRequest, PhoneState, SessionId, UNKNOWN_CALLER};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: PhoneState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: PhoneState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is ignored. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A {0:?} request is still waiting for the backend")]
    RequestInFlight(CallRequest),
    #[error("No number entered")]
    EmptyNumber,
    #[error("A call is already in progress")]
    CallInProgress,
    #[error("No call is ringing")]
    NotRinging,
    #[error("No call to hang up")]
    NoActiveCall,
    #[error("Line busy, inbound call ignored")]
    LineBusy,
    #[error("No destination number for message")]
    NoDestination,
    #[error("Message body is empty")]
    EmptyMessage,
    #[error("Stale {event} for session {session}")]
    StaleResponse {
        event: &'static str,
        session: SessionId,
    },
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per (state, event) pair reads best flat
pub fn transition(state: &PhoneState, event: Event) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();

    match event {
        // ============================================================
        // Keypad and composer
        // ============================================================
        Event::KeyPress { key } => {
            next.dialer.append(key);
            Ok(TransitionResult::new(next))
        }

        Event::Backspace => {
            next.dialer.backspace();
            Ok(TransitionResult::new(next))
        }

        Event::ComposeText { text } => {
            next.compose = text;
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Outbound call
        // ============================================================
        Event::Call => {
            if !state.call.is_idle() {
                return Err(TransitionError::CallInProgress);
            }
            if let Some(pending) = state.in_flight {
                return Err(TransitionError::RequestInFlight(pending.request));
            }
            if state.dialer.is_empty() {
                return Err(TransitionError::EmptyNumber);
            }

            let session = next.allocate_session();
            let peer = state.dialer.as_str().to_string();
            next.call = CallState::Dialing {
                session,
                peer: peer.clone(),
            };
            next.in_flight = Some(PendingRequest {
                request: CallRequest::Originate,
                session,
            });
            Ok(TransitionResult::new(next).with_effect(Effect::OriginateCall { session, to: peer }))
        }

        Event::OriginateResult { session, result } => match &state.call {
            CallState::Dialing {
                session: current,
                peer,
            } if *current == session => {
                next.in_flight = None;
                match result {
                    Ok(()) => {
                        next.call = CallState::InCall {
                            session,
                            peer: peer.clone(),
                            duration_secs: 0,
                        };
                        Ok(TransitionResult::new(next)
                            .with_effect(Effect::StartCallTimer { session }))
                    }
                    // Number stays in the dialer so the user can retry or edit
                    Err(_) => {
                        next.call = CallState::Idle;
                        Ok(TransitionResult::new(next))
                    }
                }
            }
            _ => Err(TransitionError::StaleResponse {
                event: "originate result",
                session,
            }),
        },

        // ============================================================
        // Inbound call
        // ============================================================
        Event::IncomingCall { from } => {
            if !state.call.is_idle() {
                return Err(TransitionError::LineBusy);
            }
            let session = next.allocate_session();
            let peer = from
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| UNKNOWN_CALLER.to_string());
            next.call = CallState::Ringing { session, peer };
            Ok(TransitionResult::new(next))
        }

        Event::Answer => {
            let CallState::Ringing { session, .. } = &state.call else {
                return Err(TransitionError::NotRinging);
            };
            if let Some(pending) = state.in_flight {
                return Err(TransitionError::RequestInFlight(pending.request));
            }
            let session = *session;
            next.in_flight = Some(PendingRequest {
                request: CallRequest::Answer,
                session,
            });
            Ok(TransitionResult::new(next).with_effect(Effect::AnswerCall { session }))
        }

        Event::AnswerResult { session, result } => match &state.call {
            CallState::Ringing {
                session: current,
                peer,
            } if *current == session => {
                next.in_flight = None;
                match result {
                    Ok(()) => {
                        next.call = CallState::InCall {
                            session,
                            peer: peer.clone(),
                            duration_secs: 0,
                        };
                        Ok(TransitionResult::new(next)
                            .with_effect(Effect::StartCallTimer { session }))
                    }
                    Err(_) => {
                        next.call = CallState::Idle;
                        next.dialer.clear();
                        Ok(TransitionResult::new(next))
                    }
                }
            }
            _ => Err(TransitionError::StaleResponse {
                event: "answer result",
                session,
            }),
        },

        // ============================================================
        // Hang-up: local state never waits on the backend
        // ============================================================
        Event::HangUp => {
            let Some(session) = state.call.session() else {
                return Err(TransitionError::NoActiveCall);
            };
            let was_in_call = state.call.is_in_call();

            next.call = CallState::Idle;
            next.dialer.clear();
            // Supersedes a pending originate/answer; its response becomes stale
            next.in_flight = Some(PendingRequest {
                request: CallRequest::End,
                session,
            });

            let mut result = TransitionResult::new(next);
            if was_in_call {
                result = result.with_effect(Effect::StopCallTimer);
            }
            Ok(result.with_effect(Effect::EndCall { session }))
        }

        Event::EndResult { session, .. } => {
            let expected = PendingRequest {
                request: CallRequest::End,
                session,
            };
            if state.in_flight != Some(expected) {
                return Err(TransitionError::StaleResponse {
                    event: "end result",
                    session,
                });
            }
            next.in_flight = None;
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Call timer
        // ============================================================
        Event::Tick { session } => match &state.call {
            CallState::InCall {
                session: current,
                peer,
                duration_secs,
            } if *current == session => {
                next.call = CallState::InCall {
                    session,
                    peer: peer.clone(),
                    duration_secs: duration_secs + 1,
                };
                Ok(TransitionResult::new(next))
            }
            _ => Err(TransitionError::StaleResponse {
                event: "tick",
                session,
            }),
        },

        // ============================================================
        // Messaging
        // ============================================================
        Event::SendMessage => {
            if state.dialer.is_empty() {
                return Err(TransitionError::NoDestination);
            }
            if state.compose.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            let send_id = next.allocate_send();
            Ok(TransitionResult::new(next).with_effect(Effect::SendMessage {
                send_id,
                to: state.dialer.as_str().to_string(),
                body: state.compose.clone(),
            }))
        }

        Event::MessageResult {
            send_id,
            to,
            body,
            sent_at,
            result,
        } => match result {
            Ok(()) => {
                // Keep anything the user typed while the send was in flight
                if next.compose == body {
                    next.compose.clear();
                }
                Ok(TransitionResult::new(next)
                    .with_effect(Effect::sent_message(send_id, to, body, sent_at)))
            }
            Err(_) => Ok(TransitionResult::new(next)),
        },
    }
}
