use huddle_core::{ClientEvent, PeerId};

/// What a peer connection reports to the relay.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A decoded event from the peer.
    Signal(PeerId, ClientEvent),

    /// The connection is gone, whichever side closed it.
    Disconnected(PeerId),
}
