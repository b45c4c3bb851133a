// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::wire::{message::Message, method::Method, serpid::SerpId, status};

use crate::serp_integration::common::{connect, discover_id, spawn_hub};

/// S6 — multi-send.
#[tokio::test]
async fn multi_send_fans_out_and_reports_missing_destination() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let mut b = connect(addr).await.unwrap();
    let mut c = connect(addr).await.unwrap();

    let id_a = discover_id(&mut a, 1).await.unwrap();
    let id_b = discover_id(&mut b, 2).await.unwrap();
    let id_c = discover_id(&mut c, 3).await.unwrap();

    let missing = SerpId::new({
        let mut candidate = 1u16;
        while [id_a, id_b, id_c].contains(&SerpId::new(candidate)) {
            candidate += 1;
        }
        candidate
    });

    a.send(Message::multi_request(
        id_a,
        vec![id_b, id_c, missing],
        5,
        Method::Post,
        "/messages",
        Bytes::from_static(b"broadcast"),
    ))
    .await
    .unwrap();

    for (link, expected_id) in [(&mut b, id_b), (&mut c, id_c)] {
        let received = link.next().await.expect("connection closed").unwrap();
        let req = received.as_request().expect("expected a Request");
        assert!(!received.is_multi_send());
        assert_eq!(received.destination, expected_id);
        assert_eq!(received.source, id_a);
        assert_eq!(received.correlation, 5);
        assert_eq!(&req.body[..], b"broadcast");
    }

    // A gets exactly one 404, naming the missing id, and nothing else.
    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::NOT_FOUND);
    assert_eq!(reply.correlation, 5);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains(&missing.to_string()));
}

/// A spoofed source on a multi-send request gets one synthesised `400` per
/// destination in the fan-out list, not just one — and none of the listed
/// destinations ever see the forged request.
#[tokio::test]
async fn multi_send_with_spoofed_source_gets_one_400_per_destination() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let mut b = connect(addr).await.unwrap();
    let mut c = connect(addr).await.unwrap();

    let id_a = discover_id(&mut a, 1).await.unwrap();
    let id_b = discover_id(&mut b, 2).await.unwrap();
    let id_c = discover_id(&mut c, 3).await.unwrap();

    let bogus_source = SerpId::new({
        let mut candidate = 1u16;
        while [id_a, id_b, id_c].contains(&SerpId::new(candidate)) {
            candidate += 1;
        }
        candidate
    });

    a.send(Message::multi_request(
        bogus_source,
        vec![id_b, id_c],
        11,
        Method::Post,
        "/messages",
        Bytes::from_static(b"spoofed broadcast"),
    ))
    .await
    .unwrap();

    for _ in 0..2 {
        let reply = a.next().await.expect("connection closed").unwrap();
        let resp = reply.as_response().expect("expected a Response");
        assert_eq!(resp.status, status::BAD_REQUEST);
        assert_eq!(reply.correlation, 11);
        assert_eq!(
            &resp.body[..],
            b"Attempted to relay message but gave incorrect serpID as source!" as &[u8]
        );
    }

    // Neither listed destination ever observes the spoofed request: the
    // only thing waiting on their links is the reply to their own,
    // unrelated pings.
    for (link, id, correlation) in [(&mut b, id_b, 20u32), (&mut c, id_c, 21u32)] {
        link.send(Message::request(id, SerpId::HUB, correlation, Method::Get, "/ping", Bytes::new()))
            .await
            .unwrap();
        let pinged = link.next().await.expect("connection closed").unwrap();
        assert_eq!(pinged.correlation, correlation);
        assert!(pinged.as_response().unwrap().body.is_empty());
    }
}
