use dashmap::DashMap;
use domain::UserId;
use log::*;
use std::collections::HashSet;
use std::fmt;
use tokio::sync::mpsc::Sender;

/// Outbound half of a connection. Each value is one text frame for the socket writer.
pub type Transport = Sender<String>;

/// Frames a connection may have waiting for its socket writer before it is
/// treated as stalled and dropped.
pub const DEFAULT_CONNECTION_BUFFER: usize = 256;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Empty until the connection's first bind frame.
    pub user_id: Option<UserId>,
    pub sender: Transport,
}

/// A bound connection as seen by a snapshot.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub sender: Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// The connection keeps the identity it was first bound to.
    AlreadyBound(UserId),
    UnknownConnection,
}

/// Live connections with dual indices: by connection for registration and
/// cleanup, and by bound identity for inspection.
///
/// Lock order is always `connections` then `user_index`.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    user_index: DashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    /// Adds an unbound connection - O(1)
    pub fn register(&self, sender: Transport) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections.insert(
            connection_id,
            ConnectionInfo {
                user_id: None,
                sender,
            },
        );
        trace!("Registered connection {connection_id}");
        connection_id
    }

    /// Sets the identity of `connection_id`. Only the first bind has effect.
    pub fn bind(&self, connection_id: &ConnectionId, user_id: &str) -> BindOutcome {
        let Some(mut info) = self.connections.get_mut(connection_id) else {
            return BindOutcome::UnknownConnection;
        };

        if let Some(existing) = &info.user_id {
            return BindOutcome::AlreadyBound(existing.clone());
        }

        info.user_id = Some(user_id.to_string());
        // Indexed while the connection entry is still locked so a concurrent
        // unregister cannot leave a stale index entry behind.
        self.user_index
            .entry(user_id.to_string())
            .or_default()
            .insert(*connection_id);

        BindOutcome::Bound
    }

    /// Removes a connection, dropping the registry's transport handle.
    /// Returns false when it was already gone.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let Some((_, info)) = self.connections.remove(connection_id) else {
            return false;
        };

        if let Some(user_id) = info.user_id {
            if let Some(mut entry) = self.user_index.get_mut(&user_id) {
                entry.remove(connection_id);
            }
            self.user_index
                .remove_if(&user_id, |_, connections| connections.is_empty());
        }

        trace!("Unregistered connection {connection_id}");
        true
    }

    /// Point-in-time copy of every bound connection.
    pub fn snapshot(&self) -> Vec<Recipient> {
        self.connections
            .iter()
            .filter_map(|entry| {
                entry.value().user_id.as_ref().map(|user_id| Recipient {
                    connection_id: *entry.key(),
                    user_id: user_id.clone(),
                    sender: entry.value().sender.clone(),
                })
            })
            .collect()
    }

    pub fn connections_for_user(&self, user_id: &str) -> Vec<ConnectionId> {
        let connection_ids: Vec<ConnectionId> = match self.user_index.get(user_id) {
            Some(entry) => entry.iter().copied().collect(),
            None => return Vec::new(),
        };

        connection_ids
            .into_iter()
            .filter(|connection_id| self.connections.contains_key(connection_id))
            .collect()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc::channel;

    #[test]
    fn unbound_connections_are_not_in_snapshots() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel(1);
        let connection_id = registry.register(tx);

        assert!(registry.contains(&connection_id));
        assert_eq!(registry.len(), 1);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn only_the_first_bind_has_effect() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel(1);
        let connection_id = registry.register(tx);

        assert_eq!(registry.bind(&connection_id, "alice"), BindOutcome::Bound);
        assert_eq!(
            registry.bind(&connection_id, "bob"),
            BindOutcome::AlreadyBound("alice".to_string())
        );

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].user_id, "alice");
        assert!(registry.connections_for_user("bob").is_empty());
    }

    #[test]
    fn binding_an_unknown_connection_is_reported() {
        let registry = ConnectionRegistry::new();
        assert_eq!(
            registry.bind(&ConnectionId::new(), "alice"),
            BindOutcome::UnknownConnection
        );
    }

    #[test]
    fn unregister_is_idempotent_and_cleans_the_user_index() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel(1);
        let connection_id = registry.register(tx);
        registry.bind(&connection_id, "alice");

        assert!(registry.unregister(&connection_id));
        assert!(!registry.unregister(&connection_id));
        assert!(registry.is_empty());
        assert!(registry.connections_for_user("alice").is_empty());
        assert!(registry.user_index.is_empty());
    }

    #[tokio::test]
    async fn unregister_drops_the_registry_transport() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel::<String>(1);
        let connection_id = registry.register(tx);

        registry.unregister(&connection_id);

        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn one_identity_may_hold_several_connections() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel(1);
        let (tx2, _rx2) = channel(1);
        let first = registry.register(tx1);
        let second = registry.register(tx2);
        registry.bind(&first, "alice");
        registry.bind(&second, "alice");

        let mut connections = registry.connections_for_user("alice");
        connections.sort_by_key(|id| id.to_string());
        let mut expected = vec![first, second];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(connections, expected);

        registry.unregister(&first);
        assert_eq!(registry.connections_for_user("alice"), vec![second]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutation_and_snapshots_stay_consistent() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for worker in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                for round in 0..50 {
                    let (tx, _rx) = channel(1);
                    let connection_id = registry.register(tx);
                    registry.bind(&connection_id, &format!("user{worker}"));
                    for recipient in registry.snapshot() {
                        assert!(recipient.user_id.starts_with("user"));
                    }
                    if round % 2 == 0 {
                        registry.unregister(&connection_id);
                    }
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.len(), 8 * 25);
        assert_eq!(registry.snapshot().len(), 8 * 25);
        for worker in 0..8 {
            assert_eq!(registry.connections_for_user(&format!("user{worker}")).len(), 25);
        }
    }
}
