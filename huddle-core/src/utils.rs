pub const DEFAULT_ROOM_CAPACITY: usize = 3;

/// STUN servers used when a client configures none.
pub const DEFAULT_STUN_ADDRS: [&str; 4] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
    "stun:stun3.l.google.com:19302",
];
