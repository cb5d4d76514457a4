use crate::error::Error;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::utils::DEFAULT_STUN_ADDRS;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    /// Unauthenticated STUN entry.
    pub fn stun<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }
}

impl Default for IceServerConfig {
    fn default() -> Self {
        Self::stun(DEFAULT_STUN_ADDRS)
    }
}

/// Events a peer sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Join { room_id: RoomId },
    Leave { room_id: RoomId },
    /// `data` is relayed untouched, it is expected to hold a [`NegotiationMessage`].
    Message { room_id: RoomId, data: Value },
}

/// Events the relay sends to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Membership granted, sent to the joiner only.
    Joined { room_id: RoomId, peer_id: PeerId },
    /// A newcomer joined, sent to every member that was already in the room.
    OtherJoin { room_id: RoomId, peer_id: PeerId },
    /// Membership denied because the room is at capacity.
    Full { room_id: RoomId, peer_id: PeerId },
    /// Acknowledges a voluntary leave.
    Leaved { room_id: RoomId, peer_id: PeerId },
    /// A member departed, sent to the members that remain.
    Bye { room_id: RoomId, peer_id: PeerId },
    Message {
        room_id: RoomId,
        from: PeerId,
        data: Value,
    },
}

impl ServerEvent {
    pub fn room_id(&self) -> &RoomId {
        match self {
            ServerEvent::Joined { room_id, .. }
            | ServerEvent::OtherJoin { room_id, .. }
            | ServerEvent::Full { room_id, .. }
            | ServerEvent::Leaved { room_id, .. }
            | ServerEvent::Bye { room_id, .. }
            | ServerEvent::Message { room_id, .. } => room_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Joined { .. } => "joined",
            ServerEvent::OtherJoin { .. } => "other_join",
            ServerEvent::Full { .. } => "full",
            ServerEvent::Leaved { .. } => "leaved",
            ServerEvent::Bye { .. } => "bye",
            ServerEvent::Message { .. } => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// An SDP blob plus its role. The SDP text itself is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// ICE candidate as exchanged between peers.
///
/// Older clients send `label`/`id` instead of `sdpMLineIndex`/`sdpMid`; both spellings are
/// accepted, the standard names are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", alias = "id", default)]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", alias = "label", default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Payload of a `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NegotiationMessage {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate(IceCandidate),
}

impl NegotiationMessage {
    /// Parses a relayed payload, rejecting anything without a known `type`.
    pub fn parse(data: &Value) -> Result<Self, Error> {
        NegotiationMessage::deserialize(data).map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NegotiationMessage::Offer { .. } => "offer",
            NegotiationMessage::Answer { .. } => "answer",
            NegotiationMessage::Candidate(_) => "candidate",
        }
    }
}

impl From<SessionDescription> for NegotiationMessage {
    fn from(desc: SessionDescription) -> Self {
        match desc.kind {
            SdpKind::Offer => NegotiationMessage::Offer { sdp: desc.sdp },
            SdpKind::Answer => NegotiationMessage::Answer { sdp: desc.sdp },
        }
    }
}
