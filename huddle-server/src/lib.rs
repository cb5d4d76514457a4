mod app;
mod config;
mod room;
mod signaling;
mod transport;

pub use app::*;
pub use config::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;
