//! Single consumer of persisted chats, fanning each out to its participants.

use crate::connection::ConnectionRegistry;
use crate::error::Error;
use domain::chats::Model as Chat;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Producer side of the router queue. Cloned into every session.
#[derive(Clone)]
pub struct RouterQueue {
    sender: mpsc::Sender<Chat>,
}

impl RouterQueue {
    /// Queues a persisted chat for fan-out, waiting for space when the queue is full.
    pub async fn enqueue(&self, chat: Chat) -> Result<(), Error> {
        self.sender
            .send(chat)
            .await
            .map_err(|_| Error::queue_closed())
    }
}

/// Result of delivering one chat.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    /// Connections whose transport was closed or full and were removed from the registry.
    pub dropped: usize,
}

pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
    receiver: mpsc::Receiver<Chat>,
}

/// Creates a bounded router queue of `capacity` chats.
pub fn channel(registry: Arc<ConnectionRegistry>, capacity: usize) -> (RouterQueue, MessageRouter) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (RouterQueue { sender }, MessageRouter { registry, receiver })
}

impl MessageRouter {
    /// Delivers `chat` to every bound connection of its sender and recipient.
    pub fn fan_out(&self, chat: &Chat) -> FanOut {
        let frame = match serde_json::to_string(chat) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize chat {}: {e}", chat.id);
                return FanOut::default();
            }
        };

        let mut outcome = FanOut::default();
        for recipient in self.registry.snapshot() {
            if recipient.user_id != chat.from_user && recipient.user_id != chat.to_user {
                continue;
            }

            match recipient.sender.try_send(frame.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    let reason = match e {
                        TrySendError::Full(_) => "outbound buffer is full",
                        TrySendError::Closed(_) => "transport is closed",
                    };
                    warn!(
                        "Delivery of chat {} to connection {} failed ({reason}), removing it",
                        chat.id, recipient.connection_id
                    );
                    self.registry.unregister(&recipient.connection_id);
                    outcome.dropped += 1;
                }
            }
        }

        trace!(
            "Chat {} delivered to {} connection(s), {} dropped",
            chat.id,
            outcome.delivered,
            outcome.dropped
        );
        outcome
    }

    /// Waits for the next queued chat and fans it out. `None` once every
    /// producer is gone and the queue is drained.
    pub async fn dispatch_next(&mut self) -> Option<FanOut> {
        let chat = self.receiver.recv().await?;
        Some(self.fan_out(&chat))
    }

    pub async fn run(mut self) {
        info!("Message router started");
        while self.dispatch_next().await.is_some() {}
        info!("Message router stopped: queue closed");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayErrorKind;
    use tokio::sync::mpsc::{channel as transport, Receiver};

    fn chat(from: &str, to: &str) -> Chat {
        Chat {
            id: "chat#0000000001000-000000".to_string(),
            from_user: from.to_string(),
            to_user: to.to_string(),
            message: "hi".to_string(),
            created_at: 1,
        }
    }

    fn connect(registry: &ConnectionRegistry, user: &str) -> Receiver<String> {
        connect_with_buffer(registry, user, 8)
    }

    fn connect_with_buffer(
        registry: &ConnectionRegistry,
        user: &str,
        buffer: usize,
    ) -> Receiver<String> {
        let (tx, rx) = transport(buffer);
        let connection_id = registry.register(tx);
        registry.bind(&connection_id, user);
        rx
    }

    #[test]
    fn fan_out_reaches_only_the_participants() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_queue, router) = channel(Arc::clone(&registry), 4);
        let mut alice = connect(&registry, "alice");
        let mut bob = connect(&registry, "bob");
        let mut charlie = connect(&registry, "charlie");
        let (tx, mut unbound) = transport(8);
        registry.register(tx);

        let outcome = router.fan_out(&chat("alice", "bob"));

        assert_eq!(outcome, FanOut { delivered: 2, dropped: 0 });
        let frame = serde_json::to_string(&chat("alice", "bob")).unwrap();
        assert_eq!(alice.try_recv().unwrap(), frame);
        assert_eq!(bob.try_recv().unwrap(), frame);
        assert!(charlie.try_recv().is_err());
        assert!(unbound.try_recv().is_err());
    }

    #[test]
    fn self_chat_is_delivered_once_per_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_queue, router) = channel(Arc::clone(&registry), 4);
        let mut alice = connect(&registry, "alice");

        let outcome = router.fan_out(&chat("alice", "alice"));

        assert_eq!(outcome.delivered, 1);
        assert!(alice.try_recv().is_ok());
        assert!(alice.try_recv().is_err());
    }

    #[test]
    fn failed_delivery_removes_only_that_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_queue, router) = channel(Arc::clone(&registry), 4);
        let mut alice = connect(&registry, "alice");
        drop(connect(&registry, "bob"));
        let mut bob_second_tab = connect(&registry, "bob");

        let outcome = router.fan_out(&chat("alice", "bob"));

        assert_eq!(outcome, FanOut { delivered: 2, dropped: 1 });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.connections_for_user("bob").len(), 1);
        assert!(alice.try_recv().is_ok());
        assert!(bob_second_tab.try_recv().is_ok());

        let outcome = router.fan_out(&chat("bob", "alice"));
        assert_eq!(outcome, FanOut { delivered: 2, dropped: 0 });
    }

    #[test]
    fn stalled_connection_is_removed_once_its_buffer_fills() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (_queue, router) = channel(Arc::clone(&registry), 4);
        let mut alice = connect(&registry, "alice");
        let mut stalled_bob = connect_with_buffer(&registry, "bob", 1);

        assert_eq!(
            router.fan_out(&chat("alice", "bob")),
            FanOut { delivered: 2, dropped: 0 }
        );
        assert_eq!(
            router.fan_out(&chat("alice", "bob")),
            FanOut { delivered: 1, dropped: 1 }
        );

        assert!(registry.connections_for_user("bob").is_empty());
        assert_eq!(registry.connections_for_user("alice").len(), 1);
        assert!(stalled_bob.try_recv().is_ok());
        assert!(stalled_bob.try_recv().is_err());
        assert!(alice.try_recv().is_ok());
        assert!(alice.try_recv().is_ok());
    }

    #[tokio::test]
    async fn dispatch_preserves_queue_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, mut router) = channel(Arc::clone(&registry), 4);
        let mut bob = connect(&registry, "bob");

        let mut first = chat("alice", "bob");
        first.message = "first".to_string();
        let mut second = chat("alice", "bob");
        second.message = "second".to_string();
        queue.enqueue(first).await.unwrap();
        queue.enqueue(second).await.unwrap();

        router.dispatch_next().await.unwrap();
        router.dispatch_next().await.unwrap();

        assert!(bob.try_recv().unwrap().contains("first"));
        assert!(bob.try_recv().unwrap().contains("second"));
    }

    #[tokio::test]
    async fn router_stops_when_every_producer_is_gone() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, mut router) = channel(registry, 1);
        drop(queue);

        assert!(router.dispatch_next().await.is_none());
    }

    #[tokio::test]
    async fn enqueue_fails_once_the_router_is_gone() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, router) = channel(registry, 1);
        drop(router);

        let err = queue.enqueue(chat("alice", "bob")).await.unwrap_err();
        assert_eq!(err.error_kind, RelayErrorKind::QueueClosed);
    }

    #[tokio::test]
    async fn full_queue_holds_the_producer_back() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, mut router) = channel(registry, 1);
        queue.enqueue(chat("alice", "bob")).await.unwrap();

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            queue.enqueue(chat("alice", "bob")),
        )
        .await;
        assert!(blocked.is_err());

        router.dispatch_next().await.unwrap();
        queue.enqueue(chat("alice", "bob")).await.unwrap();
    }
}
