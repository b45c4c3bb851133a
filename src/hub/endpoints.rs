// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Requests addressed to `destination == 0` (the hub itself). §4.4.

use bytes::Bytes;

use crate::{
    hub::{registry::Registry, session::Session},
    wire::{
        message::{Message, Request},
        method::Method,
        serpid::SerpId,
        status,
    },
};

/// Answer a request addressed to the hub and enqueue the reply back onto
/// the requesting session. Never fails: every branch, including malformed
/// input, produces a response.
pub fn handle(registry: &Registry, source: &Session, correlation: u32, req: &Request) {
    let (status, body) = answer(registry, source, req);
    let reply = Message::response(SerpId::HUB, source.id(), correlation, status, body);
    source.enqueue(reply);
}

fn answer(registry: &Registry, source: &Session, req: &Request) -> (u16, Bytes) {
    let target = req.target.as_str();
    let segments: Vec<&str> =
        target.trim_start_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["ping"] if req.method == Method::Get => (status::OK, Bytes::new()),
        ["serpID"] if req.method == Method::Get => {
            (status::OK, Bytes::from(source.id().to_string()))
        },
        ["clients", raw_id] if req.method == Method::Get => {
            answer_client_lookup(registry, raw_id)
        },
        _ => (
            status::NOT_FOUND,
            Bytes::from(format!("Did not find target \"{target}\"")),
        ),
    }
}

fn answer_client_lookup(registry: &Registry, raw_id: &str) -> (u16, Bytes) {
    match raw_id.parse::<u16>() {
        Ok(id) if registry.contains(SerpId::new(id)) => (status::OK, Bytes::new()),
        Ok(id) => (
            status::NOT_FOUND,
            Bytes::from(format!("no client with serpID {id} is currently connected.")),
        ),
        Err(_) => (
            status::BAD_REQUEST,
            Bytes::from(format!("\"{raw_id}\" is not a valid SerpID!")),
        ),
    }
}
