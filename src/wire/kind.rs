// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The single byte that tells a [`super::message::Message`] apart as either
//! a request travelling toward its target or a response travelling back.

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Returned when a message's `kind` byte does not match a known variant.
#[derive(Debug, Error)]
#[error("unknown message kind: 0x{0:02x}")]
pub struct UnknownKind(pub u8);

/// Discriminates the two message shapes SERP ever puts on the wire.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    #[default]
    Request = 0x00,
    Response = 0x01,
}

impl Kind {
    #[inline]
    pub fn from_u8(v: u8) -> Result<Self, UnknownKind> {
        match v {
            0x00 => Ok(Self::Request),
            0x01 => Ok(Self::Response),
            other => Err(UnknownKind(other)),
        }
    }
}

/// Wire-safe, zero-copy byte carrying a [`Kind`] discriminant.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct RawKind(u8);

impl RawKind {
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn from_raw(v: u8) -> Self {
        Self(v)
    }

    #[inline]
    pub fn kind(self) -> Result<Kind, UnknownKind> {
        Kind::from_u8(self.0)
    }

    #[inline]
    pub fn set_kind(&mut self, k: Kind) {
        self.0 = k as u8;
    }
}

impl From<Kind> for RawKind {
    fn from(k: Kind) -> Self {
        Self(k as u8)
    }
}
