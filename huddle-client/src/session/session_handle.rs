use crate::session::{SessionInput, SessionSnapshot, SessionState};
use huddle_core::ServerEvent;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Cloneable control surface of a running [`NegotiationSession`](crate::session::NegotiationSession).
///
/// The session shuts down once every handle is dropped. A [`WeakSessionHandle`] does
/// not count.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<SessionInput>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { tx, snapshot }
    }

    /// Feeds an event received from the relay.
    pub fn deliver(&self, event: ServerEvent) {
        self.push(SessionInput::Server(event));
    }

    /// Leaves the room but keeps the link, so [`rejoin`](Self::rejoin) is possible.
    pub fn leave(&self) {
        self.push(SessionInput::Leave);
    }

    /// Leaves the room and closes the link for good.
    pub fn exit(&self) {
        self.push(SessionInput::Exit);
    }

    pub fn rejoin(&self) {
        self.push(SessionInput::Rejoin);
    }

    /// Reports that the signaling link dropped underneath the session.
    pub fn link_lost(&self) {
        self.push(SessionInput::LinkLost);
    }

    pub fn downgrade(&self) -> WeakSessionHandle {
        WeakSessionHandle {
            tx: self.tx.downgrade(),
            snapshot: self.snapshot.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`. Returns `None` if the
    /// session ended without ever getting there.
    pub async fn wait_until<F>(&self, mut predicate: F) -> Option<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        rx.wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }

    pub async fn wait_for_state(&self, state: SessionState) -> Option<SessionSnapshot> {
        self.wait_until(|snapshot| snapshot.state == state).await
    }

    fn push(&self, input: SessionInput) {
        let name = input.name();
        if self.tx.send(input).is_err() {
            debug!("Session already finished, dropping '{}'", name);
        }
    }
}

/// Handle that does not keep the session alive.
#[derive(Clone)]
pub struct WeakSessionHandle {
    tx: mpsc::WeakUnboundedSender<SessionInput>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl WeakSessionHandle {
    /// Returns `None` once every strong handle is gone.
    pub fn upgrade(&self) -> Option<SessionHandle> {
        let tx = self.tx.upgrade()?;
        Some(SessionHandle::new(tx, self.snapshot.clone()))
    }
}
