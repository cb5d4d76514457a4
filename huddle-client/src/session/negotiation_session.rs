use crate::engine::{EngineEvent, EngineEvents, EngineFactory, NegotiationEngine};
use crate::media::{LocalTrack, MediaSource};
use crate::session::{SessionHandle, SessionInput, SessionSnapshot, SessionState};
use huddle_core::{
    ClientEvent, Error, NegotiationMessage, PeerId, Result, RoomId, ServerEvent,
    SessionDescription, SignalingLink,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Offer,
    Answer,
}

impl StepKind {
    fn name(self) -> &'static str {
        match self {
            StepKind::Offer => "offer",
            StepKind::Answer => "answer",
        }
    }
}

/// Outcome of a spawned offer/answer creation, reported back to the session task.
struct StepResult {
    generation: u64,
    kind: StepKind,
    result: Result<SessionDescription>,
}

/// Per-peer negotiation actor.
///
/// One instance drives one local peer through a room: it joins, binds a single
/// counterpart, exchanges offer/answer/candidate messages with it and tears the
/// negotiation down again when the counterpart leaves. All inputs arrive on one channel
/// and are handled in order by [`run`](Self::run).
pub struct NegotiationSession {
    core: SessionCore,
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    steps: mpsc::UnboundedReceiver<StepResult>,
}

impl NegotiationSession {
    pub fn new(
        room_id: RoomId,
        link: Arc<dyn SignalingLink<ClientEvent>>,
        media: Arc<dyn MediaSource>,
        engines: Arc<dyn EngineFactory>,
    ) -> (Self, SessionHandle) {
        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        let (steps_tx, steps) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::new(room_id.clone()));

        let core = SessionCore {
            room_id,
            peer_id: None,
            state: SessionState::Init,
            counterpart: None,
            local_description: None,
            remote_description: None,
            engine: None,
            join_requested: false,
            stale_join_replies: 0,
            generation: 0,
            local_tracks: Vec::new(),
            pending: None,
            backlog: VecDeque::new(),
            link,
            media,
            engines,
            inputs_tx: inputs_tx.downgrade(),
            steps_tx,
            snapshot: snapshot_tx,
        };

        let session = Self {
            core,
            inputs,
            steps,
        };
        (session, SessionHandle::new(inputs_tx, snapshot_rx))
    }

    /// Builds the session and runs it on its own task.
    pub fn spawn(
        room_id: RoomId,
        link: Arc<dyn SignalingLink<ClientEvent>>,
        media: Arc<dyn MediaSource>,
        engines: Arc<dyn EngineFactory>,
    ) -> SessionHandle {
        let (session, handle) = Self::new(room_id, link, media, engines);
        tokio::spawn(session.run());
        handle
    }

    /// Event loop. Returns once the session reaches `Leaved` or every handle is dropped.
    pub async fn run(self) {
        let NegotiationSession {
            mut core,
            mut inputs,
            mut steps,
        } = self;

        info!("Session for room '{}' started", core.room_id);
        core.enter_room().await;
        core.publish();

        loop {
            tokio::select! {
                input = inputs.recv() => {
                    match input {
                        Some(input) => core.handle_input(input).await,
                        None => {
                            info!("All session handles dropped, shutting down");
                            core.shutdown().await;
                            break;
                        }
                    }
                }

                Some(step) = steps.recv() => core.complete_step(step).await,
            }

            core.publish();

            if core.state == SessionState::Leaved {
                break;
            }
        }

        core.publish();
        info!("Session for room '{}' finished", core.room_id);
    }
}

struct SessionCore {
    room_id: RoomId,
    peer_id: Option<PeerId>,
    state: SessionState,
    counterpart: Option<PeerId>,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,

    /// A `join` was sent and its reply has not arrived yet.
    join_requested: bool,
    /// Replies still owed by the relay for joins abandoned by a local leave.
    stale_join_replies: u32,

    engine: Option<Arc<dyn NegotiationEngine>>,
    /// Bumped on every engine acquire and release. Step results and engine events that
    /// carry an older value are discarded.
    generation: u64,
    local_tracks: Vec<LocalTrack>,

    pending: Option<StepKind>,
    backlog: VecDeque<SessionInput>,

    link: Arc<dyn SignalingLink<ClientEvent>>,
    media: Arc<dyn MediaSource>,
    engines: Arc<dyn EngineFactory>,

    inputs_tx: mpsc::WeakUnboundedSender<SessionInput>,
    steps_tx: mpsc::UnboundedSender<StepResult>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl SessionCore {
    async fn handle_input(&mut self, input: SessionInput) {
        if self.pending.is_some() && !input.preempts() {
            debug!("Queueing '{}' behind pending step", input.name());
            self.backlog.push_back(input);
            return;
        }

        self.dispatch(input).await;
        self.drain_backlog().await;
    }

    async fn drain_backlog(&mut self) {
        while self.pending.is_none() {
            let Some(input) = self.backlog.pop_front() else {
                break;
            };
            self.dispatch(input).await;
        }
    }

    async fn dispatch(&mut self, input: SessionInput) {
        match input {
            SessionInput::Server(event) => self.handle_server_event(event).await,
            SessionInput::Engine { generation, event } => {
                self.handle_engine_event(generation, event).await
            }
            SessionInput::Leave => self.leave(false).await,
            SessionInput::Exit => self.leave(true).await,
            SessionInput::Rejoin => self.rejoin().await,
            SessionInput::LinkLost => self.link_lost().await,
        }
    }

    async fn handle_server_event(&mut self, event: ServerEvent) {
        if *event.room_id() != self.room_id {
            debug!(
                "Ignoring '{}' for foreign room '{}'",
                event.name(),
                event.room_id()
            );
            return;
        }

        match event {
            ServerEvent::Joined { peer_id, .. } => self.on_joined(peer_id).await,
            ServerEvent::OtherJoin { peer_id, .. } => self.on_other_join(peer_id).await,
            ServerEvent::Full { .. } => self.on_full().await,
            ServerEvent::Bye { peer_id, .. } => self.on_bye(peer_id).await,
            ServerEvent::Leaved { .. } => debug!("Leave acknowledged by relay"),
            ServerEvent::Message { from, data, .. } => self.on_message(from, data).await,
        }
    }

    async fn on_joined(&mut self, peer_id: PeerId) {
        if self.consume_stale_join_reply() {
            debug!("Ignoring 'joined' for an abandoned join");
            return;
        }

        if self.state != SessionState::Init || !self.join_requested {
            debug!("Ignoring 'joined' in state {}", self.state);
            return;
        }

        self.join_requested = false;

        info!("Joined room '{}' as {}", self.room_id, peer_id);
        self.peer_id = Some(peer_id);
        self.acquire_engine().await;
        self.state = SessionState::Joined;
    }

    async fn on_other_join(&mut self, newcomer: PeerId) {
        if !self.state.in_room() {
            debug!("Ignoring 'other_join' from {} in state {}", newcomer, self.state);
            return;
        }

        if let Some(current) = &self.counterpart {
            if *current != newcomer && self.has_negotiated() {
                info!(
                    "Already negotiating with {}, ignoring newcomer {}",
                    current, newcomer
                );
                return;
            }
        }

        if self.engine.is_none() && !self.acquire_engine().await {
            warn!("No engine available, cannot offer to {}", newcomer);
            return;
        }

        info!("Peer {} joined, sending offer", newcomer);
        self.counterpart = Some(newcomer);
        self.state = SessionState::JoinedConnected;
        self.start_step(StepKind::Offer);
    }

    async fn on_bye(&mut self, departed: PeerId) {
        if !self.state.in_room() {
            debug!("Ignoring 'bye' from {} in state {}", departed, self.state);
            return;
        }

        if self.counterpart.as_ref().is_some_and(|c| *c != departed) {
            info!("Ignoring 'bye' from {}: not the bound counterpart", departed);
            return;
        }

        info!("Peer {} left, negotiation torn down", departed);
        self.release_engine().await;
        self.state = SessionState::JoinedUnbound;
    }

    async fn on_full(&mut self) {
        if self.consume_stale_join_reply() {
            debug!("Ignoring 'full' for an abandoned join");
            return;
        }

        warn!("Room '{}' is full", self.room_id);
        self.join_requested = false;
        self.backlog.clear();
        self.release_engine().await;
        self.release_media().await;
        self.link.close().await;
        self.state = SessionState::Leaved;
    }

    async fn leave(&mut self, exit: bool) {
        if self.state == SessionState::Leaved {
            debug!("Session already left");
            return;
        }

        info!("Leaving room '{}'", self.room_id);
        self.send(ClientEvent::Leave {
            room_id: self.room_id.clone(),
        })
        .await;
        if self.join_requested {
            self.join_requested = false;
            self.stale_join_replies += 1;
        }
        self.backlog.clear();
        self.release_engine().await;
        self.release_media().await;
        self.peer_id = None;

        if exit {
            self.link.close().await;
            self.state = SessionState::Leaved;
        } else {
            self.state = SessionState::Init;
        }
    }

    async fn rejoin(&mut self) {
        if self.state != SessionState::Init {
            warn!("Cannot rejoin in state {}", self.state);
            return;
        }
        if !self.link.is_open() {
            warn!("Cannot rejoin: signaling link is closed");
            return;
        }

        self.enter_room().await;
    }

    async fn link_lost(&mut self) {
        if self.state == SessionState::Leaved {
            return;
        }

        warn!("Signaling link lost");
        self.join_requested = false;
        self.backlog.clear();
        self.release_engine().await;
        self.release_media().await;
        self.link.close().await;
        self.state = SessionState::Leaved;
    }

    /// Cleanup when nobody can drive the session anymore.
    async fn shutdown(&mut self) {
        if self.state != SessionState::Leaved {
            self.leave(true).await;
        }
    }

    async fn on_message(&mut self, from: PeerId, data: Value) {
        let message = match NegotiationMessage::parse(&data) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message from {}: {}", from, e);
                return;
            }
        };

        if let Some(current) = &self.counterpart {
            if *current != from {
                debug!(
                    "Dropping '{}' from {}: bound to {}",
                    message.kind(),
                    from,
                    current
                );
                return;
            }
        }

        let Some(engine) = self.engine.clone() else {
            debug!("Dropping '{}' from {}: no engine", message.kind(), from);
            return;
        };

        match message {
            NegotiationMessage::Offer { sdp } => {
                let offer = SessionDescription::offer(sdp);
                if let Err(e) = engine.set_remote_description(offer.clone()).await {
                    error!("Failed to apply offer from {}: {}", from, e);
                    return;
                }

                debug!("Offer from {} applied, creating answer", from);
                self.counterpart = Some(from);
                self.remote_description = Some(offer);
                self.start_step(StepKind::Answer);
            }

            NegotiationMessage::Answer { sdp } => {
                let answer = SessionDescription::answer(sdp);
                if let Err(e) = engine.set_remote_description(answer.clone()).await {
                    error!("Failed to apply answer from {}: {}", from, e);
                    return;
                }

                debug!("Answer from {} applied", from);
                self.counterpart.get_or_insert(from);
                self.remote_description = Some(answer);
            }

            NegotiationMessage::Candidate(candidate) => {
                if let Err(e) = engine.add_ice_candidate(candidate).await {
                    warn!("Failed to add candidate from {}: {}", from, e);
                }
            }
        }
    }

    async fn handle_engine_event(&mut self, generation: u64, event: EngineEvent) {
        if generation != self.generation || self.engine.is_none() {
            debug!(
                "Dropping engine event (generation {}): {}",
                generation,
                Error::StaleOperation
            );
            return;
        }

        match event {
            EngineEvent::LocalCandidate(candidate) => {
                self.send_message(NegotiationMessage::Candidate(candidate))
                    .await
            }
            EngineEvent::RemoteTrack(track) => self.media.on_remote_track(track),
        }
    }

    fn start_step(&mut self, kind: StepKind) {
        let Some(engine) = self.engine.clone() else {
            return;
        };

        let generation = self.generation;
        let steps_tx = self.steps_tx.clone();
        self.pending = Some(kind);

        tokio::spawn(async move {
            let result = match kind {
                StepKind::Offer => engine.create_offer().await,
                StepKind::Answer => engine.create_answer().await,
            };
            let _ = steps_tx.send(StepResult {
                generation,
                kind,
                result,
            });
        });
    }

    async fn complete_step(&mut self, step: StepResult) {
        if step.generation != self.generation {
            debug!(
                "Discarding {} (generation {}): {}",
                step.kind.name(),
                step.generation,
                Error::StaleOperation
            );
            return;
        }

        self.pending = None;
        self.finish_step(step).await;
        self.drain_backlog().await;
    }

    async fn finish_step(&mut self, step: StepResult) {
        let desc = match step.result {
            Ok(desc) => desc,
            Err(e) => {
                error!("Failed to create {}: {}", step.kind.name(), e);
                return;
            }
        };

        let Some(engine) = self.engine.clone() else {
            return;
        };

        if let Err(e) = engine.set_local_description(desc.clone()).await {
            error!("Failed to apply local {}: {}", step.kind.name(), e);
            return;
        }

        self.local_description = Some(desc.clone());
        self.send_message(NegotiationMessage::from(desc)).await;
    }

    async fn enter_room(&mut self) {
        match self.media.acquire().await {
            Ok(tracks) => self.local_tracks = tracks,
            Err(e) => {
                error!("Failed to acquire local media: {}", e);
                return;
            }
        }

        info!("Requesting to join room '{}'", self.room_id);
        self.send(ClientEvent::Join {
            room_id: self.room_id.clone(),
        })
        .await;
        self.join_requested = true;
    }

    /// The relay answers every `join` with exactly one `joined` or `full`, in order.
    fn consume_stale_join_reply(&mut self) -> bool {
        if self.stale_join_replies == 0 {
            return false;
        }
        self.stale_join_replies -= 1;
        true
    }

    async fn acquire_engine(&mut self) -> bool {
        self.generation += 1;
        let events = EngineEvents::new(self.inputs_tx.clone(), self.generation);

        let engine = match self.engines.acquire(events).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Failed to acquire negotiation engine: {}", e);
                return false;
            }
        };

        for track in &self.local_tracks {
            if let Err(e) = engine.add_track(Arc::clone(track)).await {
                warn!("Failed to attach local track: {}", e);
            }
        }

        debug!("Engine acquired (generation {})", self.generation);
        self.engine = Some(engine);
        true
    }

    async fn release_engine(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.counterpart = None;
        self.local_description = None;
        self.remote_description = None;

        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                warn!("Failed to close engine: {}", e);
            }
        }
    }

    async fn release_media(&mut self) {
        self.local_tracks.clear();
        self.media.release().await;
    }

    fn has_negotiated(&self) -> bool {
        self.pending.is_some()
            || self.local_description.is_some()
            || self.remote_description.is_some()
    }

    async fn send_message(&self, message: NegotiationMessage) {
        let data = match message.to_value() {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode '{}': {}", message.kind(), e);
                return;
            }
        };

        debug!("Sending '{}'", message.kind());
        self.send(ClientEvent::Message {
            room_id: self.room_id.clone(),
            data,
        })
        .await;
    }

    async fn send(&self, event: ClientEvent) {
        if let Err(e) = self.link.send(event).await {
            warn!("Failed to send signal: {}", e);
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(SessionSnapshot {
            state: self.state,
            room_id: self.room_id.clone(),
            peer_id: self.peer_id.clone(),
            counterpart: self.counterpart.clone(),
            local_description: self.local_description.clone(),
            remote_description: self.remote_description.clone(),
        });
    }
}
