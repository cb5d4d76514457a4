use async_trait::async_trait;
use huddle_core::{PeerId, ServerEvent};

/// Implemented by whatever owns the peers' connections, so the relay can push lifecycle
/// events without knowing about sockets.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue an event for one peer. Delivery is fire-and-forget, but events emitted to
    /// the same peer keep their order.
    async fn emit(&self, peer_id: &PeerId, event: ServerEvent);
}
