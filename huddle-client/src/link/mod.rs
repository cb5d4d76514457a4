mod ws_link;

pub use ws_link::*;
