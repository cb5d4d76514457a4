use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use huddle_client::{ClientConfig, SessionState, StaticMediaSource, WebrtcEngineFactory};
use huddle_core::utils::DEFAULT_ROOM_CAPACITY;
use huddle_core::{IceServerConfig, RoomId};
use huddle_server::RelayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Room-scoped WebRTC signaling relay and peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        #[arg(long, env = "HUDDLE_CAPACITY", default_value_t = DEFAULT_ROOM_CAPACITY)]
        capacity: usize,
    },

    /// Join a room as a peer and negotiate with whoever else is in it.
    Join {
        #[arg(long, env = "HUDDLE_URL", default_value = "ws://127.0.0.1:3000/ws")]
        url: String,

        /// Room to join; prompted for when omitted.
        #[arg(short, long)]
        room: Option<String>,

        /// STUN/TURN server URL, may be repeated.
        #[arg(long = "ice-server", env = "HUDDLE_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind, capacity } => serve(bind, capacity).await,
        Commands::Join {
            url,
            room,
            ice_servers,
        } => join(url, room, ice_servers).await,
    }
}

async fn serve(bind: SocketAddr, capacity: usize) -> Result<()> {
    println!("{}", "📡 Starting huddle relay...".green().bold());
    println!("   🔗 ws://{}/ws", bind);
    println!("   👥 Room capacity: {}", capacity);

    huddle_server::serve(RelayConfig {
        bind_addr: bind,
        capacity,
    })
    .await
}

async fn join(url: String, room: Option<String>, ice_servers: Vec<String>) -> Result<()> {
    let room = match room {
        Some(room) => room,
        None => Input::new()
            .with_prompt("Room")
            .interact_text()
            .context("Failed to read room name")?,
    };

    let mut config = ClientConfig::new(url, RoomId::from(room));
    if !ice_servers.is_empty() {
        config.ice_servers = vec![IceServerConfig::stun(ice_servers)];
    }

    println!(
        "{}",
        format!("🚪 Joining room '{}' via {}", config.room_id, config.url)
            .cyan()
            .bold()
    );

    let handle = huddle_client::connect(
        &config,
        Arc::new(StaticMediaSource::default()),
        Arc::new(WebrtcEngineFactory::new(config.ice_servers.clone())),
    )
    .await?;

    let mut snapshots = handle.subscribe();
    let mut last_state = SessionState::Init;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.state != last_state {
                    last_state = snapshot.state;
                    let peer = snapshot
                        .counterpart
                        .as_ref()
                        .map(|p| format!(" with {}", p))
                        .unwrap_or_default();
                    println!("   {} {}{}", "➜".blue(), snapshot.state, peer);
                }

                if snapshot.state == SessionState::Leaved {
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving...".yellow());
                handle.exit();
                let _ = handle.wait_for_state(SessionState::Leaved).await;
                break;
            }
        }
    }

    println!("{}", "✨ Session finished".green().bold());
    Ok(())
}
