use crate::engine::EngineEvent;
use huddle_core::ServerEvent;

/// Everything the session reacts to, funnelled through one channel.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Server(ServerEvent),
    Engine { generation: u64, event: EngineEvent },
    Leave,
    Exit,
    Rejoin,
    LinkLost,
}

impl SessionInput {
    /// Teardown inputs are handled immediately, even while an offer or answer is pending.
    pub fn preempts(&self) -> bool {
        matches!(
            self,
            SessionInput::Server(ServerEvent::Bye { .. })
                | SessionInput::Server(ServerEvent::Full { .. })
                | SessionInput::Leave
                | SessionInput::Exit
                | SessionInput::LinkLost
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionInput::Server(event) => event.name(),
            SessionInput::Engine { .. } => "engine",
            SessionInput::Leave => "leave",
            SessionInput::Exit => "exit",
            SessionInput::Rejoin => "rejoin",
            SessionInput::LinkLost => "link_lost",
        }
    }
}
