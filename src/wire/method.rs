// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The verb byte carried by every [`super::message::Request`].

use thiserror::Error;

/// Returned when a request's method byte does not match a known verb.
#[derive(Debug, Error)]
#[error("invalid method: 0x{0:02x}")]
pub struct InvalidMethod(pub u8);

/// HTTP-style verbs SERP requests carry. The hub's own endpoints
/// (§4.4 of the wire format) only ever answer `Get`; the other verbs exist
/// so peer-to-peer requests can express intent the way an HTTP method does.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get = 0x00,
    Post = 0x01,
    Put = 0x02,
    Delete = 0x03,
}

impl Method {
    #[inline]
    pub fn from_u8(v: u8) -> Result<Self, InvalidMethod> {
        match v {
            0x00 => Ok(Self::Get),
            0x01 => Ok(Self::Post),
            0x02 => Ok(Self::Put),
            0x03 => Ok(Self::Delete),
            other => Err(InvalidMethod(other)),
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
