mod static_source;

pub use static_source::*;

use async_trait::async_trait;
use huddle_core::Result;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

/// Opaque local media handle, attached to every engine the session acquires.
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Description of a track the remote side started sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: String,
}

/// Supplies local tracks and consumes remote ones. Capture and rendering live behind
/// this trait.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<Vec<LocalTrack>>;

    /// Stops local capture. Called on every teardown that leaves the room.
    async fn release(&self);

    fn on_remote_track(&self, _track: RemoteTrack) {}
}
