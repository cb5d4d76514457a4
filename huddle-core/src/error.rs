use crate::model::RoomId;
use thiserror::Error;

/// Failures that can occur while coordinating a room. None of them is fatal to the relay
/// or to a peer: each one is either surfaced as an event or logged and dropped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("room {0} is at capacity")]
    CapacityExceeded(RoomId),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("operation belongs to a torn down negotiation")]
    StaleOperation,

    #[error("negotiation failed: {0}")]
    NegotiationFailure(String),

    #[error("signaling link lost")]
    LinkLost,

    #[error("media source error: {0}")]
    Media(String),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
