//! Error types for the slotkit library.
//!
//! ## Key Components
//!
//! - [`InvalidChildError`]: Returned by the dynamic insertion boundary when a
//!   value is not a [`Child`](crate::child::Child) of the cache's payload type.
//! - [`DanglingMarkError`]: Returned by `mark` when the identity being retained
//!   was never inserted in the current cache state.
//! - [`InvariantError`]: Returned by `check_invariants` when pass bookkeeping
//!   disagrees with the cached children.
//! - [`RenderError`]: Failure of a render pass driven by
//!   [`RenderNode`](crate::render::RenderNode).
//!
//! Both protocol errors are caller bugs. Nothing here is retried or swallowed.
//!
//! ## Example Usage
//!
//! ```
//! use slotkit::error::DanglingMarkError;
//! use slotkit::policy::mark_sweep::SlotCache;
//!
//! let mut cache: SlotCache<u32> = SlotCache::new();
//!
//! // Nothing was cached, so there is nothing to retain.
//! let err: DanglingMarkError = cache.mark(None).unwrap_err();
//! assert!(err.key().is_none());
//! ```

use std::fmt;

use crate::child::SlotKey;

// ---------------------------------------------------------------------------
// InvalidChildError
// ---------------------------------------------------------------------------

/// Error returned when a value cannot be stored as a cached child.
///
/// Produced by [`SlotCache::put_child_dyn`](crate::policy::mark_sweep::SlotCache::put_child_dyn)
/// when the boxed value does not carry the placeholder/payload discriminant.
/// Typed callers cannot hit this error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChildError(String);

impl InvalidChildError {
    /// Creates a new `InvalidChildError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvalidChildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidChildError {}

// ---------------------------------------------------------------------------
// DanglingMarkError
// ---------------------------------------------------------------------------

/// Error returned when a retention mark references a slot that does not exist.
///
/// Carries the identity that was being marked (`None` for a positional mark)
/// and a human-readable description of why it dangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingMarkError {
    key: Option<SlotKey>,
    msg: String,
}

impl DanglingMarkError {
    /// Creates a new `DanglingMarkError` for `key`.
    #[inline]
    pub fn new(key: Option<SlotKey>, msg: impl Into<String>) -> Self {
        Self {
            key,
            msg: msg.into(),
        }
    }

    /// Returns the identity that failed to mark, `None` if positional.
    #[inline]
    pub fn key(&self) -> Option<&SlotKey> {
        self.key.as_ref()
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for DanglingMarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "dangling mark for key `{}`: {}", key, self.msg),
            None => write!(f, "dangling positional mark: {}", self.msg),
        }
    }
}

impl std::error::Error for DanglingMarkError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`SlotCache::check_invariants`](crate::policy::mark_sweep::SlotCache::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// RenderError
// ---------------------------------------------------------------------------

/// Error returned by a render pass.
///
/// A failed pass is abandoned: the node's cache is reset without evicting
/// anything and the error propagates to whoever started the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The render node broke the mark protocol of its children cache.
    DanglingMark(DanglingMarkError),
    /// A template callback aborted the pass.
    Template(String),
}

impl RenderError {
    /// Creates a [`RenderError::Template`] with the given description.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingMark(err) => write!(f, "render protocol violation: {err}"),
            Self::Template(msg) => write!(f, "template failed: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DanglingMark(err) => Some(err),
            Self::Template(_) => None,
        }
    }
}

impl From<DanglingMarkError> for RenderError {
    fn from(err: DanglingMarkError) -> Self {
        Self::DanglingMark(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- InvalidChildError ------------------------------------------------

    #[test]
    fn invalid_child_display_shows_message() {
        let err = InvalidChildError::new("expected Child<u32>");
        assert_eq!(err.to_string(), "expected Child<u32>");
        assert_eq!(err.message(), "expected Child<u32>");
    }

    #[test]
    fn invalid_child_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvalidChildError>();
    }

    // -- DanglingMarkError ------------------------------------------------

    #[test]
    fn dangling_display_names_key() {
        let err = DanglingMarkError::new(Some(SlotKey::from("row-3")), "never inserted");
        assert_eq!(
            err.to_string(),
            "dangling mark for key `row-3`: never inserted"
        );
        assert_eq!(err.key(), Some(&SlotKey::from("row-3")));
    }

    #[test]
    fn dangling_display_positional() {
        let err = DanglingMarkError::new(None, "position 2 of 2");
        assert_eq!(err.to_string(), "dangling positional mark: position 2 of 2");
        assert!(err.key().is_none());
        assert_eq!(err.message(), "position 2 of 2");
    }

    #[test]
    fn dangling_clone_and_eq() {
        let a = DanglingMarkError::new(Some(SlotKey::from("row-4")), "x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("mark cursor past end");
        assert_eq!(err.to_string(), "mark cursor past end");
        assert_eq!(err.message(), "mark cursor past end");
    }

    // -- RenderError ------------------------------------------------------

    #[test]
    fn render_error_wraps_dangling_mark() {
        use std::error::Error;

        let err: RenderError = DanglingMarkError::new(None, "twice").into();
        assert!(matches!(err, RenderError::DanglingMark(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn render_error_template_has_no_source() {
        use std::error::Error;

        let err = RenderError::template("boom");
        assert_eq!(err.to_string(), "template failed: boom");
        assert!(err.source().is_none());
    }
}
