//! Connection registry
//!
//! Single source of truth for which peers this node is connected to.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::RegistryError;
use crate::peer::{PeerAddress, PeerConnection};

/// Registry for tracking live peer connections, keyed by address.
///
/// The map is only reachable through the methods below; every call takes the
/// lock for its whole duration, so no caller can observe a half-inserted
/// entry.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<PeerAddress, Arc<PeerConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `connection` under `address`.
    ///
    /// Fails without touching the existing entry if `address` is already
    /// registered.
    pub async fn register(
        &self,
        address: PeerAddress,
        connection: Arc<PeerConnection>,
    ) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&address) {
            warn!("Rejected duplicate connection for {}", address);
            return Err(RegistryError::AlreadyConnected(address));
        }

        debug!("Registered {} ({} peers)", address, connections.len() + 1);
        connections.insert(address, connection);
        Ok(())
    }

    /// Removes `address`. Removing an absent address is a no-op.
    pub async fn unregister(&self, address: &PeerAddress) {
        let mut connections = self.connections.lock().await;
        if connections.remove(address).is_some() {
            debug!("Unregistered {} ({} peers)", address, connections.len());
        }
    }

    pub async fn get(&self, address: &PeerAddress) -> Option<Arc<PeerConnection>> {
        self.connections.lock().await.get(address).cloned()
    }

    /// Point-in-time copy of every registered connection, oldest first.
    ///
    /// The returned handles stay valid while other tasks keep registering and
    /// unregistering peers.
    pub async fn snapshot(&self) -> Vec<Arc<PeerConnection>> {
        let mut connections: Vec<Arc<PeerConnection>> =
            self.connections.lock().await.values().cloned().collect();
        connections.sort_by(|a, b| {
            a.connected_at()
                .cmp(&b.connected_at())
                .then_with(|| a.address().cmp(b.address()))
        });
        connections
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn connection(address: &PeerAddress) -> Arc<PeerConnection> {
        let (local, _remote) = tokio::io::duplex(64);
        Arc::new(PeerConnection::new(
            address.clone(),
            Box::new(local),
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn test_duplicate_register_keeps_first() {
        let registry = ConnectionRegistry::new();
        let addr = PeerAddress::new("10.0.0.1", 5000);
        let first = connection(&addr);
        let second = connection(&addr);

        registry.register(addr.clone(), first.clone()).await.unwrap();
        let result = registry.register(addr.clone(), second).await;

        assert!(matches!(result, Err(RegistryError::AlreadyConnected(a)) if a == addr));
        assert_eq!(registry.len().await, 1);
        let kept = registry.get(&addr).await.unwrap();
        assert!(Arc::ptr_eq(&kept, &first));
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        let addr = PeerAddress::new("10.0.0.1", 5000);
        registry.register(addr.clone(), connection(&addr)).await.unwrap();

        registry
            .unregister(&PeerAddress::new("10.0.0.2", 5000))
            .await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&addr).await.is_some());

        registry.unregister(&addr).await;
        registry.unregister(&addr).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_survives_mutation() {
        let registry = ConnectionRegistry::new();
        for port in 5000..5005 {
            let addr = PeerAddress::new("10.0.0.1", port);
            registry.register(addr.clone(), connection(&addr)).await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        for conn in &snapshot {
            registry.unregister(conn.address()).await;
        }

        assert_eq!(snapshot.len(), 5);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_register_same_address() {
        let registry = Arc::new(ConnectionRegistry::new());
        let addr = PeerAddress::new("10.0.0.9", 7000);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let addr = addr.clone();
            handles.push(tokio::spawn(async move {
                registry.register(addr.clone(), connection(&addr)).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(registry.len().await, 1);
    }
}
