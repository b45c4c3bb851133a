// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The accept loop: binds the listening port, allocates ids for new
//! connections, and ticks the reaper. §4.3 "Accept path" / §5 "Scheduling
//! model".

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    cfg::config::HubConfig,
    hub::{registry::Registry, session},
    wire::codec::SerpCodec,
};

/// Interval between reaper sweeps of the disconnected set. The original
/// polls its listening socket with a ~5s timeout and reaps on every main
/// loop tick; we decouple the two with an independent interval so a quiet
/// listener doesn't also delay reaping.
const REAP_INTERVAL: Duration = Duration::from_secs(5);

pub struct HubServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    codec: SerpCodec,
}

impl HubServer {
    pub async fn bind(addr: SocketAddr, cfg: &HubConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!(%addr, "hub listening");

        Ok(Self {
            listener,
            registry: Arc::new(Registry::new(cfg.runtime.reject_duplicate_addresses)),
            codec: SerpCodec::with_max_message_len(cfg.runtime.max_message_len),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let mut reap_tick = tokio::time::interval(REAP_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("hub shutdown requested, stopping accept loop");
                    break;
                },
                _ = reap_tick.tick() => {
                    self.registry.reap().await;
                },
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept(stream, addr).await,
                        Err(e) => error!("accept failed: {e}"),
                    }
                },
            }
        }

        Ok(())
    }

    /// Mirrors the original's `connectClient`: reject a duplicate address
    /// (when the policy is enabled) before spending a retry budget on id
    /// allocation, then draw an id and spawn the session pair.
    async fn accept(&self, stream: TcpStream, addr: SocketAddr) {
        if self.registry.reject_duplicate_addresses() && self.registry.has_address(&addr) {
            debug!(%addr, "duplicate address, refusing connection silently");
            return;
        }

        let Some(id) = self.registry.allocate_id() else {
            warn!(%addr, "serpID space exhausted, dropping connection");
            return;
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(%addr, "failed to set TCP_NODELAY: {e}");
        }

        let session = session::spawn(stream, addr, id, self.registry.clone(), self.codec).await;
        self.registry.insert(session);
        info!(%addr, %id, "client connected");
    }
}
