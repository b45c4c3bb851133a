// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::wire::{message::Message, method::Method, serpid::SerpId, status};

use crate::serp_integration::common::{connect, spawn_hub};

/// S1 — ping.
#[tokio::test]
async fn ping_returns_empty_200() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut link = connect(addr).await.expect("failed to connect");

    link.send(Message::request(
        SerpId::HUB,
        SerpId::HUB,
        7,
        Method::Get,
        "/ping",
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = link.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::OK);
    assert!(resp.body.is_empty());
    assert_eq!(reply.correlation, 7);
    assert_eq!(reply.source, SerpId::HUB);
}
