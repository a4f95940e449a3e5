//! Per-connection protocol handling: bind first, then relay content frames.

use crate::clock::Clock;
use crate::connection::{BindOutcome, ConnectionId, ConnectionRegistry};
use crate::error::Error;
use crate::message::{Frame, InboundChat};
use crate::router::RouterQueue;
use domain::chat::{ChatStore, NewChat};
use domain::chats::Model as Chat;
use domain::contact::touch;
use domain::UserId;
use log::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound(UserId),
}

/// Why a frame was discarded. The connection stays open in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Malformed(String),
    EmptyIdentity,
    /// Content arrived before any bind frame.
    Unbound,
    EmptyRecipient,
    SenderMismatch { bound: UserId, claimed: UserId },
    /// The connection was already removed from the registry.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Bound(UserId),
    AlreadyBound(UserId),
    Relayed(Chat),
    Rejected(Rejection),
}

pub struct Session {
    connection_id: ConnectionId,
    state: SessionState,
    registry: Arc<ConnectionRegistry>,
    store: Arc<ChatStore>,
    queue: RouterQueue,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub(crate) fn new(
        connection_id: ConnectionId,
        registry: Arc<ConnectionRegistry>,
        store: Arc<ChatStore>,
        queue: RouterQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connection_id,
            state: SessionState::Unbound,
            registry,
            store,
            queue,
            clock,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handles one inbound text frame. Errors are only returned for store and
    /// router failures; protocol violations come back as `Rejected`.
    pub async fn handle_text(&mut self, text: &str) -> Result<FrameOutcome, Error> {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Discarding malformed frame on {}: {e}", self.connection_id);
                return Ok(FrameOutcome::Rejected(Rejection::Malformed(e.to_string())));
            }
        };

        match frame {
            Frame::Bind { user } => Ok(self.bind(user)),
            Frame::Message { chat } => self.relay(chat).await,
        }
    }

    fn bind(&mut self, user: UserId) -> FrameOutcome {
        let user = user.trim().to_string();
        if user.is_empty() {
            warn!("Ignoring bind without identity on {}", self.connection_id);
            return FrameOutcome::Rejected(Rejection::EmptyIdentity);
        }

        match self.registry.bind(&self.connection_id, &user) {
            BindOutcome::Bound => {
                info!("Connection {} bound to {user}", self.connection_id);
                self.state = SessionState::Bound(user.clone());
                FrameOutcome::Bound(user)
            }
            BindOutcome::AlreadyBound(existing) => {
                warn!(
                    "Connection {} is already bound to {existing}, ignoring bind to {user}",
                    self.connection_id
                );
                FrameOutcome::AlreadyBound(existing)
            }
            BindOutcome::UnknownConnection => {
                FrameOutcome::Rejected(Rejection::Disconnected)
            }
        }
    }

    async fn relay(&self, inbound: InboundChat) -> Result<FrameOutcome, Error> {
        let SessionState::Bound(identity) = &self.state else {
            warn!("Discarding chat on unbound connection {}", self.connection_id);
            return Ok(FrameOutcome::Rejected(Rejection::Unbound));
        };

        let claimed = inbound.from.trim();
        if !claimed.is_empty() && claimed != identity.as_str() {
            warn!(
                "Connection {} bound to {identity} tried to send as {claimed}",
                self.connection_id
            );
            return Ok(FrameOutcome::Rejected(Rejection::SenderMismatch {
                bound: identity.clone(),
                claimed: claimed.to_string(),
            }));
        }
        let from = identity.clone();

        let to = inbound.to.trim();
        if to.is_empty() {
            warn!("Discarding chat without recipient from {from}");
            return Ok(FrameOutcome::Rejected(Rejection::EmptyRecipient));
        }

        let created_at = self.clock.now();
        let chat = self
            .store
            .put(NewChat {
                from,
                to: to.to_string(),
                message: inbound.message,
                created_at,
            })
            .await
            .map_err(|e| Error::persist(e.into()))?;

        for (owner, peer) in [
            (&chat.from_user, &chat.to_user),
            (&chat.to_user, &chat.from_user),
        ] {
            if let Err(e) = touch(self.store.db(), owner, peer, created_at).await {
                warn!("Failed to update contact {owner} -> {peer}: {e}");
            }
        }

        self.queue.enqueue(chat.clone()).await?;
        Ok(FrameOutcome::Relayed(chat))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.registry.unregister(&self.connection_id) {
            debug!("Session {} closed", self.connection_id);
        }
    }
}
