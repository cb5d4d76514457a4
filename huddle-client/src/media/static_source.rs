use crate::media::{LocalTrack, MediaSource, RemoteTrack};
use async_trait::async_trait;
use huddle_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// A single opus track with no capture behind it. Enough to make the local side offer
/// audio; samples can be written through [`StaticMediaSource::track`] if needed.
pub struct StaticMediaSource {
    track: Arc<TrackLocalStaticSample>,
    active: AtomicBool,
}

impl StaticMediaSource {
    pub fn new(stream_id: impl Into<String>) -> Self {
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            stream_id.into(),
        );

        Self {
            track: Arc::new(track),
            active: AtomicBool::new(false),
        }
    }

    pub fn track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.track
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for StaticMediaSource {
    fn default() -> Self {
        Self::new("huddle")
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self) -> Result<Vec<LocalTrack>> {
        self.active.store(true, Ordering::SeqCst);
        let track: LocalTrack = self.track.clone();
        Ok(vec![track])
    }

    async fn release(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("Local media released");
        }
    }

    fn on_remote_track(&self, track: RemoteTrack) {
        info!(
            "Receiving {} track {} (stream {})",
            track.kind, track.id, track.stream_id
        );
    }
}
