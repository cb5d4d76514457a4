use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use huddle_core::{ChannelLink, ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

/// Opens the WebSocket to the relay.
///
/// Returns the outbound link and the stream of decoded server events. The stream ends
/// when the socket closes for any reason; closing the link closes the socket.
pub async fn connect(
    url: &str,
) -> Result<(ChannelLink<ClientEvent>, mpsc::UnboundedReceiver<ServerEvent>)> {
    let (socket, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to relay at {}", url))?;
    let (mut write, mut read) = socket.split();

    let (link, mut outgoing) = ChannelLink::<ClientEvent>::new();
    let (incoming_tx, incoming) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(event) = outgoing.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal: {}", e);
                    continue;
                }
            };
            if write.send(Message::text(json)).await.is_err() {
                break;
            }
        }
        debug!("Outbound signaling closed");
        let _ = write.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => {
                            if incoming_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid signal from relay: {}", e),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Relay connection error: {}", e);
                    break;
                }
            }
        }
        debug!("Inbound signaling closed");
    });

    Ok((link, incoming))
}
