// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The fixed 20-byte header that precedes every message body on the wire.
//!
//! ```text
//!  0        2        4        6        8       10       12       14       16       18     20
//! +--------+--------+--------+--------+--------+--------+--------+--------+--------+--------+
//! | source          | destination     | flags           | reserved        | length          |
//! +--------+--------+--------+--------+--------+--------+--------+--------+--------+--------+
//! | kind   | reserved                 | correlation                                          |
//! +--------+--------+--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! All multi-byte fields are big-endian (network order). `source` and
//! `destination` are [`SerpId`](super::serpid::SerpId) values; `length` is
//! the body length in bytes, not counting this header; `correlation` lets a
//! client match a `Response` back to the `Request` that produced it.

use anyhow::{Result, anyhow, bail};
use zerocopy::{BigEndian, FromBytes, Immutable, IntoBytes, KnownLayout, U16, U32};

use crate::wire::kind::{Kind, RawKind, UnknownKind};

pub const HEADER_LEN: usize = 20;

/// Set when a `Request` carries a list of destinations in its body rather
/// than a single recipient (see [`crate::wire::message::Body::Multi`]).
///
/// The hub clears this bit on every per-destination copy it relays, so a
/// client never observes `MULTI_SEND` on a message it receives.
pub const FLAG_MULTI_SEND: u16 = 0b0000_0001;

/// Zero-copy, wire-exact representation of the SERP header.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct RawSerpHeader {
    pub source: U16<BigEndian>,
    pub destination: U16<BigEndian>,
    pub flags: U16<BigEndian>,
    reserved0: U16<BigEndian>,
    pub length: U32<BigEndian>,
    pub kind: RawKind,
    reserved1: [u8; 3],
    pub correlation: U32<BigEndian>,
}

impl RawSerpHeader {
    pub fn new(
        source: u16,
        destination: u16,
        kind: Kind,
        length: u32,
        correlation: u32,
    ) -> Self {
        Self {
            source: U16::new(source),
            destination: U16::new(destination),
            flags: U16::new(0),
            reserved0: U16::new(0),
            length: U32::new(length),
            kind: RawKind::from(kind),
            reserved1: [0; 3],
            correlation: U32::new(correlation),
        }
    }

    #[inline]
    pub fn multi_send(&self) -> bool {
        self.flags.get() & FLAG_MULTI_SEND != 0
    }

    #[inline]
    pub fn set_multi_send(&mut self, on: bool) {
        let mut flags = self.flags.get();
        if on {
            flags |= FLAG_MULTI_SEND;
        } else {
            flags &= !FLAG_MULTI_SEND;
        }
        self.flags.set(flags);
    }

    #[inline]
    pub fn kind(&self) -> Result<Kind, UnknownKind> {
        self.kind.kind()
    }

    /// `true` if either reserved region carries a nonzero bit. The codec
    /// treats this as a `MalformedHeader` (§4.1) rather than silently
    /// accepting bits a future protocol revision might assign meaning to.
    #[inline]
    pub fn reserved_nonzero(&self) -> bool {
        self.reserved0.get() != 0 || self.reserved1 != [0u8; 3]
    }

    pub fn to_bytes(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != HEADER_LEN {
            bail!("buffer length must be {HEADER_LEN}, got {}", buf.len());
        }
        buf.copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Self::read_from_bytes(buf).map_err(|e| anyhow!("failed to parse SERP header: {e}"))
    }
}
