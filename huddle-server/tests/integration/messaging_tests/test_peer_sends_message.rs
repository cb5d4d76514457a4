use huddle_core::{IceCandidate, NegotiationMessage, ServerEvent};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{peer, room};

#[tokio::test]
async fn test_candidate_fans_out_to_other_members() {
    init_tracing();

    let (relay, signaling) = create_test_relay(3);
    let (a, b, c) = (peer("a"), peer("b"), peer("c"));

    for p in [&a, &b, &c] {
        relay.join(p, room("r1")).await;
    }
    signaling.clear().await;

    let data = NegotiationMessage::Candidate(IceCandidate {
        candidate: "candidate:842163049 1 udp 1677729535 203.0.113.7 46154 typ srflx".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    })
    .to_value()
    .unwrap();

    relay.relay_message(&a, room("r1"), data.clone()).await;

    let expected = ServerEvent::Message {
        room_id: room("r1"),
        from: a.clone(),
        data,
    };
    assert_eq!(signaling.events_for(&b).await, vec![expected.clone()]);
    assert_eq!(signaling.events_for(&c).await, vec![expected]);
    assert!(signaling.events_for(&a).await.is_empty(), "no echo to sender");
}

#[tokio::test]
async fn test_payload_is_forwarded_unchanged() {
    init_tracing();

    let (relay, signaling) = create_test_relay(3);
    let (a, b) = (peer("a"), peer("b"));
    relay.join(&a, room("r1")).await;
    relay.join(&b, room("r1")).await;
    signaling.clear().await;

    // Legacy field names and extra keys survive the relay untouched.
    let data = serde_json::json!({
        "type": "candidate",
        "label": 1,
        "id": "video",
        "candidate": "candidate:1 1 udp 2122260223 192.168.1.4 50000 typ host",
        "extra": true
    });
    relay.relay_message(&a, room("r1"), data.clone()).await;

    let events = signaling.events_for(&b).await;
    let [ServerEvent::Message { data: got, .. }] = events.as_slice() else {
        panic!("expected exactly one message, got {:?}", events);
    };
    assert_eq!(got, &data);
}

#[tokio::test]
async fn test_order_is_preserved_per_recipient() {
    init_tracing();

    let (relay, signaling) = create_test_relay(2);
    let (a, b) = (peer("a"), peer("b"));
    relay.join(&a, room("r1")).await;
    relay.join(&b, room("r1")).await;
    signaling.clear().await;

    for i in 0..20 {
        let data = NegotiationMessage::Offer {
            sdp: format!("v=0 {i}"),
        }
        .to_value()
        .unwrap();
        relay.relay_message(&a, room("r1"), data).await;
    }

    let sdps: Vec<String> = signaling
        .events_for(&b)
        .await
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::Message { data, .. } => data["sdp"].as_str().map(str::to_owned),
            _ => None,
        })
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("v=0 {i}")).collect();
    assert_eq!(sdps, expected);
}
