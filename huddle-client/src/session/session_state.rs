use huddle_core::{PeerId, RoomId, SessionDescription};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not in a room; a join may be in flight.
    Init,
    /// Member of the room with an engine ready, nobody to talk to yet.
    Joined,
    /// Bound to a counterpart and negotiating with it.
    JoinedConnected,
    /// The counterpart left; the engine is gone until the next newcomer.
    JoinedUnbound,
    /// Terminal. The link is closed and every resource released.
    Leaved,
}

impl SessionState {
    pub fn in_room(self) -> bool {
        matches!(
            self,
            SessionState::Joined | SessionState::JoinedConnected | SessionState::JoinedUnbound
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::Joined => "joined",
            SessionState::JoinedConnected => "joined_conn",
            SessionState::JoinedUnbound => "joined_unbind",
            SessionState::Leaved => "leaved",
        };
        f.write_str(name)
    }
}

/// Everything an observer of the session can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub room_id: RoomId,
    pub peer_id: Option<PeerId>,
    pub counterpart: Option<PeerId>,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
}

impl SessionSnapshot {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            state: SessionState::Init,
            room_id,
            peer_id: None,
            counterpart: None,
            local_description: None,
            remote_description: None,
        }
    }
}
