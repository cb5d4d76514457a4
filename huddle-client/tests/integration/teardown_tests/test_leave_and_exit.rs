use huddle_client::SessionState;
use huddle_core::{ClientEvent, SignalingLink};

use crate::integration::init_tracing;
use crate::utils::{ROOM, TestSession, full, joined, other_join, room};

#[tokio::test]
async fn test_leave_returns_to_init_and_rejoin_works() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    session.deliver(other_join(ROOM, "b"));
    session.next_message().await;

    session.handle.leave();

    assert_eq!(
        session.next_sent().await,
        ClientEvent::Leave { room_id: room(ROOM) }
    );
    let snapshot = session.wait_state(SessionState::Init).await;
    assert_eq!(snapshot.counterpart, None);
    assert_eq!(snapshot.local_description, None);
    assert!(session.engines.engine(0).is_closed());
    assert_eq!(session.media.released(), 1);
    assert!(session.link.is_open());

    session.handle.rejoin();

    assert_eq!(
        session.next_sent().await,
        ClientEvent::Join { room_id: room(ROOM) }
    );
    assert_eq!(session.media.acquired(), 2);

    session.deliver(joined(ROOM, "a"));
    session.wait_state(SessionState::Joined).await;
    assert_eq!(session.engines.acquired(), 2);
}

#[tokio::test]
async fn test_late_joined_after_leave_is_ignored() {
    init_tracing();

    let mut session = TestSession::start();
    assert_eq!(
        session.next_sent().await,
        ClientEvent::Join { room_id: room(ROOM) }
    );

    session.handle.leave();
    assert_eq!(
        session.next_sent().await,
        ClientEvent::Leave { room_id: room(ROOM) }
    );
    session.wait_state(SessionState::Init).await;

    // The relay answered the abandoned join before processing the leave.
    session.deliver(joined(ROOM, "a"));
    session.settle().await;

    assert_eq!(session.handle.state(), SessionState::Init);
    assert_eq!(session.handle.snapshot().peer_id, None);
    assert_eq!(session.engines.acquired(), 0);

    session.handle.rejoin();
    assert_eq!(
        session.next_sent().await,
        ClientEvent::Join { room_id: room(ROOM) }
    );

    session.deliver(joined(ROOM, "a"));
    session.wait_state(SessionState::Joined).await;
    assert_eq!(session.engines.acquired(), 1);
}

#[tokio::test]
async fn test_reply_to_abandoned_join_does_not_satisfy_rejoin() {
    init_tracing();

    let mut session = TestSession::start();
    session.next_sent().await;

    session.handle.leave();
    session.next_sent().await;
    session.wait_state(SessionState::Init).await;

    session.handle.rejoin();
    assert_eq!(
        session.next_sent().await,
        ClientEvent::Join { room_id: room(ROOM) }
    );

    // First reply belongs to the abandoned join, the second to the rejoin.
    session.deliver(joined(ROOM, "a"));
    session.settle().await;
    assert_eq!(session.handle.state(), SessionState::Init);
    assert_eq!(session.engines.acquired(), 0);

    session.deliver(joined(ROOM, "a"));
    session.wait_state(SessionState::Joined).await;
    assert_eq!(session.engines.acquired(), 1);
}

#[tokio::test]
async fn test_late_full_after_leave_is_ignored() {
    init_tracing();

    let mut session = TestSession::start();
    session.next_sent().await;

    session.handle.leave();
    session.next_sent().await;
    session.wait_state(SessionState::Init).await;

    session.deliver(full(ROOM, "a"));
    session.settle().await;

    assert_eq!(session.handle.state(), SessionState::Init);
    assert!(session.link.is_open());

    session.handle.rejoin();
    assert_eq!(
        session.next_sent().await,
        ClientEvent::Join { room_id: room(ROOM) }
    );
}

#[tokio::test]
async fn test_rejoin_outside_init_is_ignored() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;

    session.handle.rejoin();
    session.settle().await;

    session.expect_no_send(100).await;
    assert_eq!(session.handle.state(), SessionState::Joined);
}

#[tokio::test]
async fn test_exit_is_terminal() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;

    session.handle.exit();

    assert_eq!(
        session.next_sent().await,
        ClientEvent::Leave { room_id: room(ROOM) }
    );
    session.wait_state(SessionState::Leaved).await;
    assert_eq!(session.sent.recv().await, None);
    assert!(!session.link.is_open());
    assert_eq!(session.media.released(), 1);

    session.settle().await;
    session.handle.rejoin();
    session.settle().await;
    assert_eq!(session.handle.state(), SessionState::Leaved);
    assert_eq!(session.media.acquired(), 1);
}

#[tokio::test]
async fn test_link_lost_leaves_without_signaling() {
    init_tracing();

    let mut session = TestSession::joined_as("a").await;
    session.deliver(other_join(ROOM, "b"));
    session.next_message().await;

    session.handle.link_lost();

    session.wait_state(SessionState::Leaved).await;
    assert_eq!(session.sent.recv().await, None);
    assert!(session.engines.engine(0).is_closed());
    assert_eq!(session.media.released(), 1);
}

#[tokio::test]
async fn test_dropping_every_handle_shuts_session_down() {
    init_tracing();

    let TestSession {
        handle,
        mut sent,
        media,
        ..
    } = TestSession::joined_as("a").await;
    let mut snapshots = handle.subscribe();

    drop(handle);

    assert_eq!(
        sent.recv().await,
        Some(ClientEvent::Leave { room_id: room(ROOM) })
    );
    assert_eq!(sent.recv().await, None);
    assert_eq!(media.released(), 1);

    let last = snapshots
        .wait_for(|s| s.state == SessionState::Leaved)
        .await
        .map(|s| s.clone());
    assert!(last.is_ok());
}
