mod client;
pub mod engine;
pub mod link;
pub mod media;
pub mod session;

pub use client::*;
pub use engine::{
    EngineEvent, EngineEvents, EngineFactory, NegotiationEngine, WebrtcEngine, WebrtcEngineFactory,
};
pub use media::{LocalTrack, MediaSource, RemoteTrack, StaticMediaSource};
pub use session::{
    NegotiationSession, SessionHandle, SessionInput, SessionSnapshot, SessionState,
    WeakSessionHandle,
};
