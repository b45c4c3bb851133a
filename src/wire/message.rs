// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed SERP messages, decoded from or destined for the wire.
//!
//! A [`Message`] pairs routing metadata (`source`, `destination`,
//! `correlation`, and — for multi-destination requests — the fan-out list)
//! with a [`Body`] that is either a [`Request`] or a [`Response`].

use bytes::Bytes;

use crate::wire::{method::Method, serpid::SerpId};

/// A single `method target body` request, addressed to one peer or (via
/// [`Message::destinations`]) to several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub body: Bytes,
}

/// A `status body` reply to a previously sent [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

/// The two shapes a SERP message body can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Request(Request),
    Response(Response),
}

/// A fully decoded (or not-yet-encoded) SERP message, including the routing
/// envelope that lives in the fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: SerpId,
    pub destination: SerpId,
    pub correlation: u32,
    /// `Some` only for multi-send requests; holds the fan-out destination
    /// set carried alongside the header. Kept as a separate field rather
    /// than folded into `destination` so the codec never has to mutate a
    /// decoded message in place to turn it into per-destination copies —
    /// the dispatcher builds fresh [`Message`] values instead.
    pub destinations: Option<Vec<SerpId>>,
    pub body: Body,
}

impl Message {
    pub fn request(
        source: SerpId,
        destination: SerpId,
        correlation: u32,
        method: Method,
        target: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            source,
            destination,
            correlation,
            destinations: None,
            body: Body::Request(Request {
                method,
                target: target.into(),
                body: body.into(),
            }),
        }
    }

    pub fn multi_request(
        source: SerpId,
        destinations: Vec<SerpId>,
        correlation: u32,
        method: Method,
        target: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            source,
            destination: SerpId::HUB,
            correlation,
            destinations: Some(destinations),
            body: Body::Request(Request {
                method,
                target: target.into(),
                body: body.into(),
            }),
        }
    }

    pub fn response(
        source: SerpId,
        destination: SerpId,
        correlation: u32,
        status: u16,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            source,
            destination,
            correlation,
            destinations: None,
            body: Body::Response(Response {
                status,
                body: body.into(),
            }),
        }
    }

    #[inline]
    pub fn is_multi_send(&self) -> bool {
        self.destinations.is_some()
    }

    /// Build the single-destination copy of a multi-send request that gets
    /// relayed to one member of the fan-out set. The source message is left
    /// untouched; this always allocates a fresh [`Message`].
    pub fn fanned_out_to(&self, destination: SerpId) -> Self {
        Self {
            source: self.source,
            destination,
            correlation: self.correlation,
            destinations: None,
            body: self.body.clone(),
        }
    }

    pub fn as_request(&self) -> Option<&Request> {
        match &self.body {
            Body::Request(r) => Some(r),
            Body::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match &self.body {
            Body::Response(r) => Some(r),
            Body::Request(_) => None,
        }
    }
}
