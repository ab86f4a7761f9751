pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use crate::router::{self, AuxAction, InboundEvent, OutboundReply};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("platform rejected request: {0}")]
    Rejected(String),
    #[error("request to platform failed: {0}")]
    Transport(String),
}

/// Outbound side of the messaging platform
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> Result<(), GatewayError>;

    async fn acknowledge(&self, press_id: &str) -> Result<(), GatewayError>;
}

/// Starts a keep-alive burst when a user says /start
pub trait KeepAliveTrigger: Send + Sync {
    fn activate(&self);
}

/// Route one event and carry out the result.
///
/// Failures are logged and dropped here; nothing is retried and no error
/// reaches the caller, so one bad send cannot affect later events.
pub async fn handle_event(
    event: &InboundEvent,
    gateway: &dyn Gateway,
    keep_alive: &dyn KeepAliveTrigger,
) {
    let outcome = router::route(event);

    if outcome.reply.is_none() && outcome.actions.is_empty() {
        debug!("No rule matched, ignoring event");
        return;
    }

    if let Some(reply) = &outcome.reply {
        if let Err(e) = gateway.send(reply).await {
            error!("Failed to send reply to chat {}: {}", reply.chat_id, e);
        }
    }

    for action in &outcome.actions {
        match action {
            AuxAction::ActivateKeepAlive => keep_alive.activate(),
            AuxAction::AcknowledgePress(id) => {
                if let Err(e) = gateway.acknowledge(id).await {
                    error!("Failed to acknowledge button press {}: {}", id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{ButtonPress, ChatInfo, ChatKind, MessageEvent, UserInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        sent: Mutex<Vec<OutboundReply>>,
        acknowledged: Mutex<Vec<String>>,
        fail_sends: bool,
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn send(&self, reply: &OutboundReply) -> Result<(), GatewayError> {
            if self.fail_sends {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            self.sent.lock().unwrap().push(reply.clone());
            Ok(())
        }

        async fn acknowledge(&self, press_id: &str) -> Result<(), GatewayError> {
            self.acknowledged.lock().unwrap().push(press_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingTrigger {
        activations: AtomicUsize,
    }

    impl KeepAliveTrigger for CountingTrigger {
        fn activate(&self) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn chat() -> ChatInfo {
        ChatInfo {
            id: 42,
            kind: ChatKind::Private,
            title: None,
            username: None,
        }
    }

    fn user() -> UserInfo {
        UserInfo {
            id: 42,
            first_name: "Alice".to_string(),
            last_name: None,
            username: Some("alice".to_string()),
        }
    }

    fn message(text: &str) -> InboundEvent {
        InboundEvent::Message(MessageEvent {
            chat: chat(),
            from: Some(user()),
            text: Some(text.to_string()),
            forwarded_from: None,
        })
    }

    #[tokio::test]
    async fn test_start_sends_and_activates() {
        let gateway = FakeGateway::default();
        let trigger = CountingTrigger::default();

        handle_event(&message("/start"), &gateway, &trigger).await;

        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].keyboard.is_some());
        assert_eq!(trigger.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmatched_event_does_nothing() {
        let gateway = FakeGateway::default();
        let trigger = CountingTrigger::default();

        handle_event(&message("just chatting"), &gateway, &trigger).await;

        assert!(gateway.sent.lock().unwrap().is_empty());
        assert!(gateway.acknowledged.lock().unwrap().is_empty());
        assert_eq!(trigger.activations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_button_press_is_acknowledged_after_reply() {
        let gateway = FakeGateway::default();
        let trigger = CountingTrigger::default();
        let event = InboundEvent::ButtonPress(ButtonPress {
            id: "press-9".to_string(),
            data: Some("cmd_group".to_string()),
            from: user(),
            chat: chat(),
        });

        handle_event(&event, &gateway, &trigger).await;

        assert_eq!(gateway.sent.lock().unwrap().len(), 1);
        assert_eq!(*gateway.acknowledged.lock().unwrap(), vec!["press-9".to_string()]);
    }

    #[tokio::test]
    async fn test_send_failure_is_contained() {
        let gateway = FakeGateway {
            fail_sends: true,
            ..Default::default()
        };
        let trigger = CountingTrigger::default();
        let event = InboundEvent::ButtonPress(ButtonPress {
            id: "press-1".to_string(),
            data: Some("cmd_getid".to_string()),
            from: user(),
            chat: chat(),
        });

        handle_event(&event, &gateway, &trigger).await;
        handle_event(&message("/start"), &gateway, &trigger).await;

        // The failed sends neither block the acknowledgement nor later events
        assert_eq!(*gateway.acknowledged.lock().unwrap(), vec!["press-1".to_string()]);
        assert_eq!(trigger.activations.load(Ordering::SeqCst), 1);
    }
}
