use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ChannelLink, PeerId, ServerEvent, SignalingLink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

struct SignalingInner {
    peers: DashMap<PeerId, ChannelLink<ServerEvent>>,
}

/// Registry of live peer links. Each link feeds the writer task of one connection.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    /// Registers a connection and returns the queue its writer task must drain.
    pub fn add_peer(&self, peer_id: PeerId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (link, rx) = ChannelLink::new();
        self.inner.peers.insert(peer_id, link);
        rx
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn link(&self, peer_id: &PeerId) -> Option<ChannelLink<ServerEvent>> {
        self.inner.peers.get(peer_id).map(|entry| entry.value().clone())
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn emit(&self, peer_id: &PeerId, event: ServerEvent) {
        let Some(link) = self.link(peer_id) else {
            warn!(
                "Attempted to send '{}' to disconnected peer {}",
                event.name(),
                peer_id
            );
            return;
        };

        if let Err(e) = link.send(event).await {
            warn!("Failed to queue signal for {}: {}", peer_id, e);
        }
    }
}
