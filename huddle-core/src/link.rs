use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Outbound half of the persistent connection between a peer and the relay.
///
/// The relay holds one `SignalingLink<ServerEvent>` per connected peer, a client holds a
/// `SignalingLink<ClientEvent>`. Events sent through one link arrive in send order.
#[async_trait]
pub trait SignalingLink<E>: Send + Sync
where
    E: Send + 'static,
{
    async fn send(&self, event: E) -> Result<()>;

    /// Closes the link. Further sends fail with [`Error::LinkLost`].
    async fn close(&self);

    fn is_open(&self) -> bool;
}

/// A link backed by an unbounded channel. The receiving half is usually drained by a task
/// that writes into a socket; closing the link drops the sender so that task can finish.
pub struct ChannelLink<E> {
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<E>>>>,
}

impl<E> Clone for ChannelLink<E> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<E> ChannelLink<E> {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (link, rx)
    }

    /// Pushes an event without awaiting; used where the caller cannot yield.
    pub fn try_send(&self, event: E) -> Result<()> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            return Err(Error::LinkLost);
        };
        tx.send(event).map_err(|_| Error::LinkLost)
    }

    fn shutdown(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn open(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl<E> SignalingLink<E> for ChannelLink<E>
where
    E: Send + 'static,
{
    async fn send(&self, event: E) -> Result<()> {
        self.try_send(event)
    }

    async fn close(&self) {
        self.shutdown();
    }

    fn is_open(&self) -> bool {
        self.open()
    }
}
