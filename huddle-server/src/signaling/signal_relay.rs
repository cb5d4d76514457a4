use crate::room::{JoinOutcome, RoomRegistry};
use crate::signaling::SignalingOutput;
use crate::transport::TransportEvent;
use huddle_core::{ClientEvent, Error, NegotiationMessage, PeerId, RoomId, ServerEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies the room rules to connection events: membership goes through the
/// [`RoomRegistry`], every resulting notification goes out through [`SignalingOutput`].
#[derive(Clone)]
pub struct SignalRelay {
    registry: Arc<RoomRegistry>,
    signaling: Arc<dyn SignalingOutput>,
}

impl SignalRelay {
    pub fn new(registry: Arc<RoomRegistry>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry,
            signaling,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Signal(peer_id, ClientEvent::Join { room_id }) => {
                self.join(&peer_id, room_id).await
            }
            TransportEvent::Signal(peer_id, ClientEvent::Leave { room_id }) => {
                self.leave(&peer_id, room_id).await
            }
            TransportEvent::Signal(peer_id, ClientEvent::Message { room_id, data }) => {
                self.relay_message(&peer_id, room_id, data).await
            }
            TransportEvent::Disconnected(peer_id) => self.disconnect(&peer_id).await,
        }
    }

    pub async fn join(&self, peer_id: &PeerId, room_id: RoomId) {
        if let Some(current) = self.registry.room_of(peer_id) {
            if current != room_id {
                info!(
                    "Peer {} moves from room '{}' to '{}'",
                    peer_id, current, room_id
                );
                self.depart(peer_id, &current, true).await;
            }
        }

        match self.registry.join(&room_id, peer_id) {
            JoinOutcome::Full => {
                info!(
                    "Rejecting peer {}: {}",
                    peer_id,
                    Error::CapacityExceeded(room_id.clone())
                );
                self.signaling
                    .emit(
                        peer_id,
                        ServerEvent::Full {
                            room_id,
                            peer_id: peer_id.clone(),
                        },
                    )
                    .await;
            }

            JoinOutcome::AlreadyMember { count } => {
                debug!(
                    "Peer {} re-joined room '{}' ({} members)",
                    peer_id, room_id, count
                );
                self.signaling
                    .emit(
                        peer_id,
                        ServerEvent::Joined {
                            room_id,
                            peer_id: peer_id.clone(),
                        },
                    )
                    .await;
            }

            JoinOutcome::Joined { count, existing } => {
                info!(
                    "Peer {} joined room '{}' ({}/{} members)",
                    peer_id,
                    room_id,
                    count,
                    self.registry.capacity()
                );

                self.signaling
                    .emit(
                        peer_id,
                        ServerEvent::Joined {
                            room_id: room_id.clone(),
                            peer_id: peer_id.clone(),
                        },
                    )
                    .await;

                let announcement = ServerEvent::OtherJoin {
                    room_id,
                    peer_id: peer_id.clone(),
                };
                self.fan_out(&existing, peer_id, &announcement).await;
            }
        }
    }

    pub async fn leave(&self, peer_id: &PeerId, room_id: RoomId) {
        self.depart(peer_id, &room_id, true).await;
    }

    pub async fn relay_message(&self, peer_id: &PeerId, room_id: RoomId, data: Value) {
        if !self.registry.is_member(&room_id, peer_id) {
            warn!(
                "Dropping message from {}: not a member of room '{}'",
                peer_id, room_id
            );
            return;
        }

        let kind = match NegotiationMessage::parse(&data) {
            Ok(msg) => msg.kind(),
            Err(e) => {
                warn!("Dropping message from {}: {}", peer_id, e);
                return;
            }
        };

        let members = self.registry.members(&room_id);
        debug!(
            "Relaying '{}' from {} to {} peer(s) in room '{}'",
            kind,
            peer_id,
            members.len().saturating_sub(1),
            room_id
        );

        let event = ServerEvent::Message {
            room_id,
            from: peer_id.clone(),
            data,
        };
        self.fan_out(&members, peer_id, &event).await;
    }

    /// Implicit leave for a vanished connection. Nothing is sent to the peer itself.
    pub async fn disconnect(&self, peer_id: &PeerId) {
        let Some(room_id) = self.registry.room_of(peer_id) else {
            debug!("Peer {} disconnected outside any room", peer_id);
            return;
        };

        info!("Peer {} disconnected from room '{}'", peer_id, room_id);
        self.depart(peer_id, &room_id, false).await;
    }

    async fn depart(&self, peer_id: &PeerId, room_id: &RoomId, acknowledge: bool) {
        let outcome = self.registry.leave(room_id, peer_id);

        if outcome.was_member {
            info!(
                "Peer {} left room '{}' ({} remaining)",
                peer_id,
                room_id,
                outcome.remaining_count()
            );

            let bye = ServerEvent::Bye {
                room_id: room_id.clone(),
                peer_id: peer_id.clone(),
            };
            self.fan_out(&outcome.remaining, peer_id, &bye).await;
        }

        if acknowledge {
            self.signaling
                .emit(
                    peer_id,
                    ServerEvent::Leaved {
                        room_id: room_id.clone(),
                        peer_id: peer_id.clone(),
                    },
                )
                .await;
        }
    }

    async fn fan_out(&self, recipients: &[PeerId], sender: &PeerId, event: &ServerEvent) {
        for recipient in recipients.iter().filter(|id| *id != sender) {
            self.signaling.emit(recipient, event.clone()).await;
        }
    }
}
