use huddle_core::PeerId;

/// Membership of a single room, kept in join order.
#[derive(Debug)]
pub struct Room {
    members: Vec<PeerId>,
    capacity: usize,
    /// Set once the room has been emptied and is being pruned from the registry.
    retired: bool,
}

impl Room {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
            capacity,
            retired: false,
        }
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.contains(peer_id)
    }

    pub(crate) fn insert(&mut self, peer_id: PeerId) {
        debug_assert!(!self.is_full());
        self.members.push(peer_id);
    }

    pub(crate) fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != peer_id);
        self.members.len() != before
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }
}
