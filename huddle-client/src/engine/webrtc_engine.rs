use crate::engine::{EngineEvents, EngineFactory, NegotiationEngine};
use crate::media::{LocalTrack, RemoteTrack};
use async_trait::async_trait;
use huddle_core::{Error, IceCandidate, IceServerConfig, Result, SdpKind, SessionDescription};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// Builds one `RTCPeerConnection` per acquisition, all sharing the same ICE servers.
#[derive(Debug, Clone)]
pub struct WebrtcEngineFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl WebrtcEngineFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl Default for WebrtcEngineFactory {
    fn default() -> Self {
        Self::new(vec![IceServerConfig::default()])
    }
}

#[async_trait]
impl EngineFactory for WebrtcEngineFactory {
    async fn acquire(&self, events: EngineEvents) -> Result<Arc<dyn NegotiationEngine>> {
        let engine = WebrtcEngine::new(self.rtc_config(), events).await?;
        Ok(Arc::new(engine))
    }
}

pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcEngine {
    pub async fn new(config: RTCConfiguration, events: EngineEvents) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(failure)?;
        let registry = register_default_interceptors(Registry::new(), &mut m).map_err(failure)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(api.new_peer_connection(config).await.map_err(failure)?);
        let generation = events.generation();

        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                Box::pin(async move {
                    info!("Peer connection (generation {}) is {}", generation, s);
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.local_candidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                });
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let remote = RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind: track.kind().to_string(),
                    };
                    debug!("Remote {} track {} arrived", remote.kind, remote.id);
                    events.remote_track(remote);
                })
            },
        ));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl NegotiationEngine for WebrtcEngine {
    async fn add_track(&self, track: LocalTrack) -> Result<()> {
        self.peer_connection
            .add_track(track)
            .await
            .map_err(failure)?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(failure)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(failure)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await
            .map_err(failure)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await
            .map_err(failure)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(failure)
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await.map_err(failure)
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp),
    };
    rtc.map_err(failure)
}

fn failure(e: impl Display) -> Error {
    Error::NegotiationFailure(e.to_string())
}
