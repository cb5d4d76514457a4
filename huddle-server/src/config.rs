use huddle_core::utils::DEFAULT_ROOM_CAPACITY;
use std::net::SocketAddr;

/// Process-wide relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Maximum members per room. Values below 1 are raised to 1.
    pub capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            capacity: DEFAULT_ROOM_CAPACITY,
        }
    }
}
