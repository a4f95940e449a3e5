//! Real-time chat relay over long-lived WebSocket connections.
//!
//! # Message Flow
//!
//! 1. The web layer upgrades a connection and opens a [`Session`], receiving
//!    the bounded channel of outbound frames its socket writer drains.
//! 2. The connection is registered unbound; its first bind frame associates
//!    it with an identity.
//! 3. Content frames are stamped with the receipt time, persisted through the
//!    `ChatStore`, recorded as contacts in both directions and queued.
//! 4. The [`MessageRouter`] drains the queue in order and sends each chat to
//!    every connection bound to its sender or recipient. A connection whose
//!    transport is gone is removed from the registry.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with dual indices
//! - `router`: bounded queue and the single fan-out consumer
//! - `session`: per-connection frame handling
//! - `message`: inbound frame types

pub mod clock;
pub mod connection;
pub mod error;
pub mod message;
pub mod router;
pub mod session;

pub use router::MessageRouter;
pub use session::Session;

use clock::{Clock, SystemClock};
use connection::{ConnectionRegistry, DEFAULT_CONNECTION_BUFFER};
use domain::chat::ChatStore;
use router::RouterQueue;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    store: Arc<ChatStore>,
    queue: RouterQueue,
    clock: Arc<dyn Clock>,
    connection_buffer: usize,
}

impl Relay {
    /// Builds a relay and the router that must be run for chats to be delivered.
    pub fn new(store: Arc<ChatStore>, queue_capacity: usize) -> (Self, MessageRouter) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, router) = router::channel(Arc::clone(&registry), queue_capacity);

        let relay = Self {
            registry,
            store,
            queue,
            clock: Arc::new(SystemClock),
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
        };
        (relay, router)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how many outbound frames a connection may have pending before
    /// the router drops it.
    pub fn with_connection_buffer(mut self, capacity: usize) -> Self {
        self.connection_buffer = capacity.max(1);
        self
    }

    /// Registers a new unbound connection. The receiver yields the frames to
    /// write to its socket and ends once the connection is unregistered.
    pub fn open_session(&self) -> (Session, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(self.connection_buffer);
        let connection_id = self.registry.register(sender);
        let session = Session::new(
            connection_id,
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            self.queue.clone(),
            Arc::clone(&self.clock),
        );
        (session, receiver)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<ChatStore> {
        &self.store
    }
}
