use crate::engine::EngineFactory;
use crate::link;
use crate::media::MediaSource;
use crate::session::{NegotiationSession, SessionHandle};
use anyhow::Result;
use huddle_core::{IceServerConfig, RoomId};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://127.0.0.1:3000/ws`.
    pub url: String,
    pub room_id: RoomId,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, room_id: impl Into<RoomId>) -> Self {
        Self {
            url: url.into(),
            room_id: room_id.into(),
            ice_servers: vec![IceServerConfig::default()],
        }
    }
}

/// Connects to the relay and starts a session that joins `config.room_id`.
///
/// Every event read from the socket is delivered to the session; when the socket goes
/// away the session is told the link was lost. The reader only holds a weak handle, so
/// dropping the returned handle (and its clones) still shuts the session down.
pub async fn connect(
    config: &ClientConfig,
    media: Arc<dyn MediaSource>,
    engines: Arc<dyn EngineFactory>,
) -> Result<SessionHandle> {
    let (link, mut incoming) = link::connect(&config.url).await?;
    info!("Connected to relay at {}", config.url);

    let handle =
        NegotiationSession::spawn(config.room_id.clone(), Arc::new(link), media, engines);

    let bridge = handle.downgrade();
    tokio::spawn(async move {
        while let Some(event) = incoming.recv().await {
            let Some(session) = bridge.upgrade() else {
                return;
            };
            session.deliver(event);
        }
        if let Some(session) = bridge.upgrade() {
            session.link_lost();
        }
    });

    Ok(handle)
}
