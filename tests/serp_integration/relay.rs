// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::wire::{message::Message, method::Method, status};

use crate::serp_integration::common::{connect, discover_id, spawn_hub};

/// S3 — relay between two clients.
#[tokio::test]
async fn relays_request_and_response_between_two_clients() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let mut b = connect(addr).await.unwrap();

    let id_a = discover_id(&mut a, 1).await.unwrap();
    let id_b = discover_id(&mut b, 2).await.unwrap();

    a.send(Message::request(
        id_a,
        id_b,
        42,
        Method::Post,
        "/messages",
        Bytes::from_static(b"hi"),
    ))
    .await
    .unwrap();

    let received = b.next().await.expect("connection closed").unwrap();
    let req = received.as_request().expect("expected a Request");
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.target, "/messages");
    assert_eq!(&req.body[..], b"hi");
    assert_eq!(received.source, id_a);
    assert_eq!(received.destination, id_b);
    assert_eq!(received.correlation, 42);

    b.send(Message::response(id_b, id_a, 42, status::OK, Bytes::new()))
        .await
        .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::OK);
    assert_eq!(reply.source, id_b);
    assert_eq!(reply.destination, id_a);
    assert_eq!(reply.correlation, 42);
}
