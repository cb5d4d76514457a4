mod negotiation_session;
mod session_handle;
mod session_input;
mod session_state;

pub use negotiation_session::*;
pub use session_handle::*;
pub use session_input::*;
pub use session_state::*;
