mod webrtc_engine;

pub use webrtc_engine::*;

use crate::media::{LocalTrack, RemoteTrack};
use crate::session::SessionInput;
use async_trait::async_trait;
use huddle_core::{IceCandidate, Result, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The peer-connection object that performs the actual media negotiation. The session
/// only sequences calls on it; failures are reported as [`huddle_core::Error::NegotiationFailure`].
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn add_track(&self, track: LocalTrack) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Produces a fresh engine each time the session needs one.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// `events` must receive every locally discovered candidate and inbound track for the
    /// lifetime of the returned engine.
    async fn acquire(&self, events: EngineEvents) -> Result<Arc<dyn NegotiationEngine>>;
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteTrack),
}

/// Event sink handed to an engine. Events are stamped with the engine's generation so the
/// session can drop whatever a released engine still reports.
#[derive(Clone)]
pub struct EngineEvents {
    tx: mpsc::WeakUnboundedSender<SessionInput>,
    generation: u64,
}

impl EngineEvents {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<SessionInput>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn local_candidate(&self, candidate: IceCandidate) {
        self.emit(EngineEvent::LocalCandidate(candidate));
    }

    pub fn remote_track(&self, track: RemoteTrack) {
        self.emit(EngineEvent::RemoteTrack(track));
    }

    fn emit(&self, event: EngineEvent) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let _ = tx.send(SessionInput::Engine {
            generation: self.generation,
            event,
        });
    }
}
