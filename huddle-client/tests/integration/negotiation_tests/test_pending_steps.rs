use huddle_client::SessionState;
use huddle_core::{IceCandidate, SdpKind};

use crate::integration::init_tracing;
use crate::utils::{
    EngineCall, ROOM, TestSession, bye, candidate, eventually, full, message, offer, other_join,
    peer,
};

#[tokio::test]
async fn test_inputs_queue_behind_pending_offer() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    let gate = session.engines.hold_steps();

    session.deliver(other_join(ROOM, "b"));
    let engine = session.engines.engine(0);
    eventually("offer started", || {
        engine.calls().contains(&EngineCall::CreateOffer)
    })
    .await;

    session.deliver(message(ROOM, "b", candidate("cand-b")));
    session.settle().await;
    assert!(!engine.calls().contains(&EngineCall::AddCandidate("cand-b".into())));

    gate.notify_one();

    assert_eq!(session.next_message().await, offer("offer-0"));
    eventually("queued candidate applied", || {
        engine
            .calls()
            .contains(&EngineCall::AddCandidate("cand-b".into()))
    })
    .await;
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::AddTrack,
            EngineCall::CreateOffer,
            EngineCall::SetLocal(SdpKind::Offer),
            EngineCall::AddCandidate("cand-b".into()),
        ]
    );
}

#[tokio::test]
async fn test_bye_during_pending_offer_discards_result() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    let gate = session.engines.hold_steps();

    session.deliver(other_join(ROOM, "b"));
    let engine = session.engines.engine(0);
    eventually("offer started", || {
        engine.calls().contains(&EngineCall::CreateOffer)
    })
    .await;

    session.deliver(bye(ROOM, "b"));
    let snapshot = session.wait_state(SessionState::JoinedUnbound).await;
    assert_eq!(snapshot.counterpart, None);
    assert!(engine.is_closed());

    gate.notify_one();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(!engine.calls().contains(&EngineCall::SetLocal(SdpKind::Offer)));
    session.expect_no_send(100).await;
    assert_eq!(session.handle.snapshot().local_description, None);
}

#[tokio::test]
async fn test_bye_during_pending_answer_discards_result() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    let gate = session.engines.hold_steps();

    session.deliver(message(ROOM, "b", offer("offer-b")));
    let engine = session.engines.engine(0);
    eventually("answer started", || {
        engine.calls().contains(&EngineCall::CreateAnswer)
    })
    .await;
    session
        .wait_until(|s| s.counterpart == Some(peer("b")))
        .await;

    session.deliver(bye(ROOM, "b"));
    let snapshot = session.wait_state(SessionState::JoinedUnbound).await;
    assert_eq!(snapshot.counterpart, None);
    assert_eq!(snapshot.remote_description, None);
    assert!(engine.is_closed());

    gate.notify_one();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(!engine.calls().contains(&EngineCall::SetLocal(SdpKind::Answer)));
    session.expect_no_send(100).await;
    assert_eq!(session.handle.snapshot().local_description, None);
}

#[tokio::test]
async fn test_full_during_pending_step_drops_backlog() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    let gate = session.engines.hold_steps();

    session.deliver(other_join(ROOM, "b"));
    let engine = session.engines.engine(0);
    eventually("offer started", || {
        engine.calls().contains(&EngineCall::CreateOffer)
    })
    .await;

    session.deliver(message(ROOM, "b", candidate("cand-b")));
    session.deliver(full(ROOM, "a"));
    let snapshot = session.wait_state(SessionState::Leaved).await;
    assert_eq!(snapshot.local_description, None);
    assert!(engine.is_closed());

    gate.notify_one();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::AddTrack,
            EngineCall::CreateOffer,
            EngineCall::Close,
        ]
    );
    assert_eq!(session.sent.recv().await, None);
    assert!(!session.handle.is_running());
}

#[tokio::test]
async fn test_released_engine_events_are_dropped() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    session.deliver(other_join(ROOM, "b"));
    session.next_message().await;

    let old_events = session.engines.events(0);
    session.deliver(bye(ROOM, "b"));
    session.wait_state(SessionState::JoinedUnbound).await;

    let late = IceCandidate {
        candidate: "cand-late".into(),
        sdp_mid: None,
        sdp_m_line_index: None,
    };
    old_events.local_candidate(late.clone());
    session.expect_no_send(100).await;

    session.deliver(other_join(ROOM, "c"));
    assert_eq!(session.next_message().await, offer("offer-1"));

    old_events.local_candidate(late);
    session.expect_no_send(100).await;

    session.engines.events(1).local_candidate(IceCandidate {
        candidate: "cand-fresh".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    });
    assert_eq!(session.next_message().await, candidate("cand-fresh"));
}
