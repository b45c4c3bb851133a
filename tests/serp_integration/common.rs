// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::net::SocketAddr;

use anyhow::Result;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serp_hub::{
    cfg::config::{DaemonConfig, HubConfig, ListenConfig, RuntimeConfig},
    hub::server::HubServer,
    wire::{codec::SerpCodec, message::Message, method::Method, serpid::SerpId},
};
use tokio::net::TcpStream;
use tokio_util::{codec::Framed, sync::CancellationToken};

pub type ClientLink = Framed<TcpStream, SerpCodec>;

/// Bind a hub on an OS-assigned port and spawn its accept loop in the
/// background. The returned cancellation token is armed for the duration
/// of the test; dropping the runtime at the end of `#[tokio::test]` tears
/// the task down regardless.
pub async fn spawn_hub() -> Result<SocketAddr> {
    spawn_hub_with(false).await
}

pub async fn spawn_hub_with(reject_duplicate_addresses: bool) -> Result<SocketAddr> {
    let cfg = HubConfig {
        listen: ListenConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        runtime: RuntimeConfig {
            reject_duplicate_addresses,
            ..RuntimeConfig::default()
        },
        daemon: DaemonConfig::default(),
    };

    let server = HubServer::bind("127.0.0.1:0".parse()?, &cfg).await?;
    let addr = server.local_addr()?;
    let shutdown = CancellationToken::new();
    tokio::spawn(async move {
        let _ = server.run(shutdown).await;
    });
    Ok(addr)
}

pub async fn connect(addr: SocketAddr) -> Result<ClientLink> {
    let stream = TcpStream::connect(addr).await?;
    Ok(Framed::new(stream, SerpCodec::default()))
}

/// `GET /serpID` is the canonical way a freshly connected client learns the
/// id the hub assigned it (S2 in the test plan).
pub async fn discover_id(link: &mut ClientLink, correlation: u32) -> Result<SerpId> {
    link.send(Message::request(
        SerpId::HUB,
        SerpId::HUB,
        correlation,
        Method::Get,
        "/serpID",
        Bytes::new(),
    ))
    .await?;
    let reply = link.next().await.expect("connection closed")?;
    let resp = reply.as_response().expect("serpID reply must be a Response");
    let id: u16 = std::str::from_utf8(&resp.body)?.parse()?;
    Ok(SerpId::new(id))
}
