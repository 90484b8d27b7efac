//! Cached children and the identities they are stored under.
//!
//! A parent addresses its children through two disjoint namespaces:
//!
//! ```text
//!   explicit / minted key ──► keyed:   { SlotKey → Child<T> }
//!   no key (arrival order)  ──► unkeyed: [ Child<T>, Child<T>, ... ]
//! ```
//!
//! [`Child::Placeholder`] stands in for a conditionally absent render so that
//! later unkeyed siblings keep their positions. It has no payload and is never
//! handed to a disposal callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A cached child: either a placeholder or a real payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child<T> {
    /// Conditionally absent render; only preserves positional alignment.
    Placeholder,
    /// Disposable payload.
    Payload(T),
}

impl<T> Child<T> {
    /// Returns `true` for [`Child::Placeholder`].
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Child::Placeholder)
    }

    /// Returns the payload, if any.
    #[inline]
    pub fn payload(&self) -> Option<&T> {
        match self {
            Child::Payload(value) => Some(value),
            Child::Placeholder => None,
        }
    }

    /// Returns the payload mutably, if any.
    #[inline]
    pub fn payload_mut(&mut self) -> Option<&mut T> {
        match self {
            Child::Payload(value) => Some(value),
            Child::Placeholder => None,
        }
    }

    /// Consumes the child, returning its payload.
    #[inline]
    pub fn into_payload(self) -> Option<T> {
        match self {
            Child::Payload(value) => Some(value),
            Child::Placeholder => None,
        }
    }
}

impl<T> From<Option<T>> for Child<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Child::Payload(value),
            None => Child::Placeholder,
        }
    }
}

/// Identity of a keyed child.
///
/// Minted keys live in their own variant, so an explicit key can never equal
/// one regardless of its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    /// Key supplied by the caller.
    Explicit(String),
    /// Key minted by a cache in suggest-keys mode.
    Auto(AutoKey),
}

impl SlotKey {
    /// Returns `true` if the key was minted by a cache.
    #[inline]
    pub fn is_auto(&self) -> bool {
        matches!(self, SlotKey::Auto(_))
    }

    /// Returns the minted identity, if any.
    #[inline]
    pub fn as_auto(&self) -> Option<&AutoKey> {
        match self {
            SlotKey::Auto(auto) => Some(auto),
            SlotKey::Explicit(_) => None,
        }
    }
}

/// Minted key identity.
///
/// Only a cache can create one. Each minting cache draws a process-unique
/// owner id, so keys minted by two caches never compare equal even when
/// their sequence numbers match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AutoKey {
    pub(crate) owner: u64,
    pub(crate) seq: u64,
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

impl AutoKey {
    /// Draws a fresh owner id for a minting cache. Never returns zero.
    pub(crate) fn next_owner() -> u64 {
        NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
    }

    /// Position of this key in its cache's minting order, starting at zero.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for AutoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.owner, self.seq)
    }
}

impl From<&str> for SlotKey {
    fn from(key: &str) -> Self {
        SlotKey::Explicit(key.to_owned())
    }
}

impl From<String> for SlotKey {
    fn from(key: String) -> Self {
        SlotKey::Explicit(key)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Explicit(key) => f.write_str(key),
            SlotKey::Auto(auto) => fmt::Display::fmt(auto, f),
        }
    }
}
