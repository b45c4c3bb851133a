// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The 16-bit endpoint identifier space.
//!
//! `0` is reserved for the hub itself (requests addressed to it are answered
//! locally instead of being relayed). `1..=9999` is the pool handed out to
//! connecting clients, matching the original server's `numberOfRetriesSerpID`
//! bounded-retry allocation scheme.

use core::fmt;

use rand::Rng;

/// Reserved destination/source value meaning "the hub".
pub const HUB_ID: u16 = 0;

/// Inclusive lower bound of the client id pool.
pub const CLIENT_ID_MIN: u16 = 1;
/// Inclusive upper bound of the client id pool.
pub const CLIENT_ID_MAX: u16 = 9999;

/// Number of random draws attempted before `allocate` gives up.
pub const MAX_ALLOCATION_RETRIES: usize = 10;

/// A 16-bit endpoint identifier assigned to a connected client, or [`HUB_ID`]
/// for messages addressed to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SerpId(u16);

impl SerpId {
    pub const HUB: SerpId = SerpId(HUB_ID);

    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_hub(self) -> bool {
        self.0 == HUB_ID
    }

    /// Draw a random id in `[CLIENT_ID_MIN, CLIENT_ID_MAX]`, retrying up to
    /// [`MAX_ALLOCATION_RETRIES`] times against the `taken` predicate.
    ///
    /// Mirrors the original hub's bounded retry loop: giving up rather than
    /// scanning the whole space keeps allocation O(1) under normal load and
    /// only degrades when the pool is nearly exhausted.
    pub fn allocate(mut taken: impl FnMut(SerpId) -> bool) -> Option<SerpId> {
        let mut rng = rand::rng();
        for _ in 0..MAX_ALLOCATION_RETRIES {
            let candidate = SerpId(rng.random_range(CLIENT_ID_MIN..=CLIENT_ID_MAX));
            if !taken(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

impl fmt::Display for SerpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for SerpId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<SerpId> for u16 {
    fn from(id: SerpId) -> Self {
        id.0
    }
}
