pub mod error;
pub mod link;
pub mod model;
pub mod utils;

pub use error::{Error, Result};
pub use link::{ChannelLink, SignalingLink};
pub use model::*;
