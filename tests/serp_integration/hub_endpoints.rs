// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::wire::{message::Message, method::Method, serpid::SerpId, status};

use crate::serp_integration::common::{connect, discover_id, spawn_hub};

/// `/clients/<id>` reports a connected peer as present.
#[tokio::test]
async fn clients_lookup_reports_connected_peer() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let mut b = connect(addr).await.unwrap();

    let id_a = discover_id(&mut a, 1).await.unwrap();
    let id_b = discover_id(&mut b, 1).await.unwrap();

    a.send(Message::request(
        id_a,
        SerpId::HUB,
        3,
        Method::Get,
        format!("/clients/{id_b}"),
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::OK);
    assert!(resp.body.is_empty());
    assert_eq!(reply.correlation, 3);
}

/// `/clients/<id>` reports 404 for an id nobody holds.
#[tokio::test]
async fn clients_lookup_reports_missing_peer() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let id_a = discover_id(&mut a, 1).await.unwrap();

    let missing = SerpId::new(if id_a.get() == 1 { 2 } else { 1 });

    a.send(Message::request(
        id_a,
        SerpId::HUB,
        4,
        Method::Get,
        format!("/clients/{missing}"),
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::NOT_FOUND);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains(&missing.to_string()));
}

/// `/clients/<not-a-number>` is a 400, not a 404.
#[tokio::test]
async fn clients_lookup_rejects_malformed_id() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let id_a = discover_id(&mut a, 1).await.unwrap();

    a.send(Message::request(
        id_a,
        SerpId::HUB,
        5,
        Method::Get,
        "/clients/not-a-number",
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::BAD_REQUEST);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains("not a valid SerpID"));
}

/// Any other target addressed to the hub is a 404 naming the target.
#[tokio::test]
async fn unknown_hub_target_is_404() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let id_a = discover_id(&mut a, 1).await.unwrap();

    a.send(Message::request(
        id_a,
        SerpId::HUB,
        6,
        Method::Get,
        "/nonexistent",
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::NOT_FOUND);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains("/nonexistent"));
}

/// A recognised hub target addressed with a non-`GET` method falls through
/// to the generic 404, same as an unrecognised target entirely.
#[tokio::test]
async fn non_get_method_on_recognised_target_is_404() {
    let addr = spawn_hub().await.expect("hub failed to start");
    let mut a = connect(addr).await.unwrap();
    let id_a = discover_id(&mut a, 1).await.unwrap();

    a.send(Message::request(
        id_a,
        SerpId::HUB,
        7,
        Method::Post,
        "/ping",
        Bytes::new(),
    ))
    .await
    .unwrap();

    let reply = a.next().await.expect("connection closed").unwrap();
    let resp = reply.as_response().expect("expected a Response");
    assert_eq!(resp.status, status::NOT_FOUND);
    assert_eq!(reply.correlation, 7);
    let body = std::str::from_utf8(&resp.body).unwrap();
    assert!(body.contains("/ping"));
}
