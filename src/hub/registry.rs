// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The hub's single source of truth for which clients are connected.
//!
//! Mirrors the shape of the client library's `Pool` (a `DashMap` keyed by
//! session id, wrapped in `Arc` for shared ownership across tasks) but adds
//! the disconnected-set / reaper machinery §4.2–§4.3 require: a session
//! leaving `sessions` is not destroyed immediately, it is parked in
//! `disconnected` until its receiver task has fully drained.

use std::net::SocketAddr;

use dashmap::DashMap;

use crate::{hub::session::Session, wire::serpid::SerpId};
use std::sync::Arc;

/// Id → session lookup, plus the disconnected set awaiting reaping and the
/// address table used for the optional duplicate-connection policy.
pub struct Registry {
    sessions: DashMap<SerpId, Arc<Session>>,
    disconnected: DashMap<SerpId, Arc<Session>>,
    addresses: DashMap<SocketAddr, SerpId>,
    reject_duplicate_addresses: bool,
}

impl Registry {
    pub fn new(reject_duplicate_addresses: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            disconnected: DashMap::new(),
            addresses: DashMap::new(),
            reject_duplicate_addresses,
        }
    }

    #[inline]
    pub fn reject_duplicate_addresses(&self) -> bool {
        self.reject_duplicate_addresses
    }

    #[inline]
    pub fn has_address(&self, addr: &SocketAddr) -> bool {
        self.addresses.contains_key(addr)
    }

    /// Draw an unused id via the bounded-retry scheme, checking against the
    /// live registry only — a disconnected-but-not-yet-reaped session does
    /// not hold its id back, matching the original's `getClient` semantics.
    pub fn allocate_id(&self) -> Option<SerpId> {
        SerpId::allocate(|id| self.sessions.contains_key(&id))
    }

    pub fn insert(&self, session: Arc<Session>) {
        self.addresses.insert(session.addr(), session.id());
        self.sessions.insert(session.id(), session);
    }

    pub fn get(&self, id: SerpId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|e| Arc::clone(e.value()))
    }

    #[inline]
    pub fn contains(&self, id: SerpId) -> bool {
        self.sessions.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Move a session out of the live registry and into the disconnected
    /// set. Idempotent — a session already moved (or never inserted) is a
    /// no-op.
    pub fn disconnect(&self, id: SerpId) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            self.addresses.remove(&session.addr());
            session.disconnect();
            self.disconnected.insert(id, session);
        }
    }

    /// One reaper sweep: for every disconnected session whose receiver task
    /// has finished, join its sender task and drop the session entirely.
    pub async fn reap(&self) {
        let finished: Vec<SerpId> = self
            .disconnected
            .iter()
            .filter(|e| e.value().receiver_done())
            .map(|e| *e.key())
            .collect();

        for id in finished {
            if let Some((_, session)) = self.disconnected.remove(&id) {
                session.join_sender().await;
            }
        }
    }

    #[cfg(test)]
    pub fn disconnected_len(&self) -> usize {
        self.disconnected.len()
    }
}
