use crate::room::Room;
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The peer was added. `existing` lists the members that were present before it.
    Joined { count: usize, existing: Vec<PeerId> },
    /// The peer was already a member; nothing changed.
    AlreadyMember { count: usize },
    /// The room is at capacity; nothing changed.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub remaining: Vec<PeerId>,
    pub was_member: bool,
}

impl LeaveOutcome {
    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }
}

/// Room membership for the whole relay.
///
/// Every room sits behind its own mutex, so joins and leaves on one room are serialized
/// while unrelated rooms proceed independently. The registry never performs I/O.
///
/// A peer belongs to at most one room; callers that move a peer to another room must
/// [`leave`](Self::leave) the old one first.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    peers: DashMap<PeerId, RoomId>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            peers: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn join(&self, room_id: &RoomId, peer_id: &PeerId) -> JoinOutcome {
        loop {
            let room = self.room_or_create(room_id);
            let mut guard = lock(&room);

            // Lost a race with the leave that emptied this room; its entry is about to go.
            if guard.is_retired() {
                drop(guard);
                std::thread::yield_now();
                continue;
            }

            if guard.contains(peer_id) {
                return JoinOutcome::AlreadyMember { count: guard.len() };
            }

            if guard.is_full() {
                debug!("Room {} is full, rejecting {}", room_id, peer_id);
                return JoinOutcome::Full;
            }

            let existing = guard.members().to_vec();
            guard.insert(peer_id.clone());
            self.peers.insert(peer_id.clone(), room_id.clone());

            return JoinOutcome::Joined {
                count: guard.len(),
                existing,
            };
        }
    }

    pub fn leave(&self, room_id: &RoomId, peer_id: &PeerId) -> LeaveOutcome {
        let Some(room) = self.room(room_id) else {
            return LeaveOutcome {
                remaining: Vec::new(),
                was_member: false,
            };
        };

        let mut guard = lock(&room);
        let was_member = guard.remove(peer_id);
        if was_member {
            self.peers.remove_if(peer_id, |_, current| current == room_id);
        }

        let remaining = guard.members().to_vec();

        if guard.is_empty() && !guard.is_retired() {
            guard.retire();
            drop(guard);
            self.rooms
                .remove_if(room_id, |_, entry| Arc::ptr_eq(entry, &room));
            info!("Room {} is empty, removed", room_id);
        }

        LeaveOutcome {
            remaining,
            was_member,
        }
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.room(room_id).map_or(0, |room| lock(&room).len())
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.room(room_id)
            .map(|room| lock(&room).members().to_vec())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        self.room(room_id)
            .is_some_and(|room| lock(&room).contains(peer_id))
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.peers.get(peer_id).map(|entry| entry.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn room(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|entry| Arc::clone(entry.value()))
    }

    fn room_or_create(&self, room_id: &RoomId) -> Arc<Mutex<Room>> {
        Arc::clone(
            self.rooms
                .entry(room_id.clone())
                .or_insert_with(|| {
                    info!("Creating new room: {}", room_id);
                    Arc::new(Mutex::new(Room::new(self.capacity)))
                })
                .value(),
        )
    }
}

fn lock(room: &Mutex<Room>) -> MutexGuard<'_, Room> {
    room.lock().unwrap_or_else(PoisonError::into_inner)
}
