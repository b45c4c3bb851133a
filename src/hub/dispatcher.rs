// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Message classification and routing (§4.3). Runs inline on the receiver
//! task of the session that produced the message — there is no separate
//! dispatch task, matching the original's "dispatcher runs inline on
//! receiver threads" design.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::{
    hub::{endpoints, registry::Registry, session::Session},
    wire::{
        message::{Body, Message},
        serpid::SerpId,
        status,
    },
};

pub async fn dispatch(registry: &Registry, source: &Arc<Session>, msg: Message) {
    match &msg.body {
        Body::Response(_) => relay_response(registry, msg),
        Body::Request(_) if msg.is_multi_send() => relay_multi(registry, source, msg),
        Body::Request(req) if msg.destination.is_hub() => {
            endpoints::handle(registry, source, msg.correlation, req)
        },
        Body::Request(_) => relay_single(registry, source, msg),
    }
}

/// Single-destination request relay. Validates `source`, then either
/// enqueues onto the destination's outbox or synthesises `404`.
fn relay_single(registry: &Registry, source: &Session, msg: Message) {
    if msg.source != source.id() {
        reply_bad_request(source, msg.correlation);
        return;
    }

    let destination = msg.destination;
    match registry.get(destination) {
        Some(dest) => dest.enqueue(msg),
        None => reply_not_found(source, msg.correlation, destination),
    }
}

/// Multi-destination fan-out. Builds one fresh per-destination `Message`
/// per target rather than mutating `msg` in place and resending it — the
/// original hub clears the multi-send flag on the shared message and
/// reuses it as a single-destination template, which is the bug the design
/// notes call out and this redesign avoids.
fn relay_multi(registry: &Registry, source: &Session, msg: Message) {
    let destinations = msg.destinations.clone().unwrap_or_default();

    if msg.source != source.id() {
        // One synthesised 400 per destination in the fan-out list, matching
        // `relay_single`'s one-destination case scaled up.
        for _ in &destinations {
            reply_bad_request(source, msg.correlation);
        }
        return;
    }

    for destination in destinations {
        match registry.get(destination) {
            Some(dest) => dest.enqueue(msg.fanned_out_to(destination)),
            None => reply_not_found(source, msg.correlation, destination),
        }
    }
}

/// Responses carry no source validation and raise no synthesised error on a
/// routing miss — a response to a client that has since departed is simply
/// dropped.
fn relay_response(registry: &Registry, msg: Message) {
    match registry.get(msg.destination) {
        Some(dest) => dest.enqueue(msg),
        None => debug!(destination = %msg.destination, "dropping response: destination gone"),
    }
}

fn reply_bad_request(source: &Session, correlation: u32) {
    let body = Bytes::from_static(
        b"Attempted to relay message but gave incorrect serpID as source!",
    );
    source.enqueue(Message::response(
        SerpId::HUB,
        source.id(),
        correlation,
        status::BAD_REQUEST,
        body,
    ));
}

fn reply_not_found(source: &Session, correlation: u32, missing: SerpId) {
    let body = format!("no client with serpID {missing} is currently connected.");
    source.enqueue(Message::response(
        SerpId::HUB,
        source.id(),
        correlation,
        status::NOT_FOUND,
        Bytes::from(body),
    ));
}
