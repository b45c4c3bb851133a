// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::wire::{message::Message, method::Method, serpid::SerpId, status};

use crate::serp_integration::common::{connect, discover_id, spawn_hub};

/// S4 — missing destination.
#[tokio::test]
async fn request_to_unconnected_id_gets_404() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let id_a = discover_id(&mut a, 1).await.unwrap();

    let missing = SerpId::new(if id_a.get() == 1 { 2 } else { 1 });

    a.send(Message::request(
        id_a,
        missing,
        9,
        Method::Get,
        "/messages",
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::NOT_FOUND);
    assert_eq!(reply.correlation, 9);
    assert_eq!(reply.source, SerpId::HUB);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains(&missing.to_string()));
}
