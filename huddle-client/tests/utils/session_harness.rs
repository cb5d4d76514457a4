use huddle_client::{NegotiationSession, SessionHandle, SessionSnapshot, SessionState};
use huddle_core::{ChannelLink, ClientEvent, NegotiationMessage, ServerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::mock_engine::MockEngineFactory;
use super::mock_media::MockMediaSource;
use super::signal_helpers::{STEP_TIMEOUT_MS, joined, room};

pub const ROOM: &str = "r1";

/// A session wired to mocks, with its outbound link captured in `sent`.
pub struct TestSession {
    pub handle: SessionHandle,
    pub link: ChannelLink<ClientEvent>,
    pub sent: mpsc::UnboundedReceiver<ClientEvent>,
    pub engines: MockEngineFactory,
    pub media: Arc<MockMediaSource>,
}

impl TestSession {
    pub fn start() -> Self {
        Self::start_with(MockEngineFactory::new(), MockMediaSource::new())
    }

    pub fn start_with(engines: MockEngineFactory, media: Arc<MockMediaSource>) -> Self {
        let (link, sent) = ChannelLink::new();
        let handle = NegotiationSession::spawn(
            room(ROOM),
            Arc::new(link.clone()),
            media.clone(),
            Arc::new(engines.clone()),
        );

        Self {
            handle,
            link,
            sent,
            engines,
            media,
        }
    }

    /// Starts a session and walks it into `Joined` as `me`.
    pub async fn joined_as(me: &str) -> Self {
        let mut session = Self::start();
        assert_eq!(
            session.next_sent().await,
            ClientEvent::Join { room_id: room(ROOM) }
        );
        session.deliver(joined(ROOM, me));
        session.wait_state(SessionState::Joined).await;
        session
    }

    pub fn deliver(&self, event: ServerEvent) {
        self.handle.deliver(event);
    }

    pub async fn next_sent(&mut self) -> ClientEvent {
        tokio::time::timeout(Duration::from_millis(STEP_TIMEOUT_MS), self.sent.recv())
            .await
            .expect("Timeout waiting for outbound signal")
            .expect("Link closed while waiting for outbound signal")
    }

    /// Next outbound `message`, decoded.
    pub async fn next_message(&mut self) -> NegotiationMessage {
        match self.next_sent().await {
            ClientEvent::Message { room_id, data } => {
                assert_eq!(room_id, room(ROOM));
                NegotiationMessage::parse(&data).expect("session sent an invalid payload")
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    pub async fn expect_no_send(&mut self, wait_ms: u64) {
        if let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(wait_ms), self.sent.recv()).await
        {
            panic!("expected no outbound signal, got {:?}", event);
        }
    }

    pub async fn wait_state(&self, state: SessionState) -> SessionSnapshot {
        self.wait_until(|snapshot| snapshot.state == state).await
    }

    pub async fn wait_until<F>(&self, predicate: F) -> SessionSnapshot
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        tokio::time::timeout(
            Duration::from_millis(STEP_TIMEOUT_MS),
            self.handle.wait_until(predicate),
        )
        .await
        .expect("Timeout waiting for session snapshot")
        .expect("Session ended before reaching the expected snapshot")
    }

    /// Lets the session task drain whatever is already queued.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Polls `condition` until it holds or the step timeout runs out.
pub async fn eventually<F>(what: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(STEP_TIMEOUT_MS);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timeout waiting for {}",
            what
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
