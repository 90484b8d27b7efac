//! # Child Cache Traits
//!
//! Two seams separate a render node from the cache that remembers its
//! children:
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │               ChildCache<T>                  │
//!   │                                              │
//!   │  get_child(&mut, Option<&SlotKey>)           │
//!   │  put_child(&mut, key, Child<T>, suggest)     │
//!   │  replace_child(&mut, key, Child<T>)          │
//!   │  mark(&mut, key) → Result                    │
//!   │  skip(&mut)                                  │
//!   │  retained_mut(&mut, key)                     │
//!   │  clean(&mut, Option<&mut dyn FnMut(T)>)      │
//!   │  reset(&mut)                                 │
//!   │  keyed_count / unkeyed_count                 │
//!   └──────────────────────┬───────────────────────┘
//!                          │ produced by
//!   ┌──────────────────────┴───────────────────────┐
//!   │                 CachePolicy                  │
//!   │  type Cache<T>: ChildCache<T>                │
//!   │  create::<T>(&self) → Self::Cache<T>         │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! A render node is generic over a [`CachePolicy`] handed to it at
//! construction, and every node in the tree asks that policy for its own,
//! independent children cache. No strategy is looked up through global state.
//!
//! ## Pass protocol
//!
//! Per pass, per cache: zero or more `get_child` → (`put_child` |
//! `replace_child`)? → (`mark` | `skip`) cycles, then exactly one `clean`.
//! `reset` abandons a pass without evicting anything.

use crate::child::{Child, SlotKey};
use crate::error::DanglingMarkError;

/// Operations a parent uses to reuse and retire its cached children.
///
/// # Example
///
/// ```
/// use slotkit::child::Child;
/// use slotkit::policy::mark_sweep::SlotCache;
/// use slotkit::traits::ChildCache;
///
/// fn render_all<C: ChildCache<&'static str>>(cache: &mut C, items: &[&'static str]) {
///     for &item in items {
///         if cache.get_child(None).is_none() {
///             cache.put_child(None, Child::Payload(item), false);
///         }
///         cache.mark(None).unwrap();
///     }
///     cache.clean(None);
/// }
///
/// let mut cache = SlotCache::new();
/// render_all(&mut cache, &["a", "b", "c"]);
/// render_all(&mut cache, &["a"]);
/// assert_eq!(cache.unkeyed_count(), 1);
/// ```
pub trait ChildCache<T> {
    /// Looks up a cached child.
    ///
    /// Keyed lookups leave the cursors alone. Positional lookups (`None`)
    /// read the next position and advance the lookup cursor, hit or miss.
    fn get_child(&mut self, key: Option<&SlotKey>) -> Option<&Child<T>>;

    /// Caches `child`, returning the key it was stored under.
    ///
    /// Explicitly keyed children, and non-placeholder children when
    /// `suggest_keys` is set, go to the keyed namespace (the latter under a
    /// freshly minted key). Everything else is appended positionally and
    /// `None` is returned. Never marks.
    fn put_child(&mut self, key: Option<SlotKey>, child: Child<T>, suggest_keys: bool)
    -> Option<SlotKey>;

    /// Installs `child` in the slot most recently looked up for `key`,
    /// returning whatever it displaced. Never marks.
    fn replace_child(&mut self, key: Option<&SlotKey>, child: Child<T>) -> Option<Child<T>>;

    /// Retains the child at `key` (or the next position) through the next sweep.
    fn mark(&mut self, key: Option<&SlotKey>) -> Result<(), DanglingMarkError>;

    /// Consumes the next position without retaining it.
    fn skip(&mut self);

    /// Returns the child most recently marked for `key` in this pass.
    fn retained_mut(&mut self, key: Option<&SlotKey>) -> Option<&mut Child<T>>;

    /// Evicts every child not marked this pass and resets pass state.
    ///
    /// `on_remove` receives each evicted payload; placeholders are dropped
    /// without a call. With `None`, payloads are dropped.
    fn clean(&mut self, on_remove: Option<&mut dyn FnMut(T)>);

    /// Clears pass-local state without evicting anything.
    fn reset(&mut self);

    /// Number of keyed entries.
    fn keyed_count(&self) -> usize;

    /// Number of positional entries, placeholders included.
    fn unkeyed_count(&self) -> usize;

    /// Total cached entries.
    fn len(&self) -> usize {
        self.keyed_count() + self.unkeyed_count()
    }

    /// Returns `true` if nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Factory for the children cache of every node in a render tree.
///
/// The policy value is cloned into each node, so configuration carried by
/// it (such as capacity hints) applies tree-wide.
pub trait CachePolicy: Clone {
    /// The cache type produced for children of type `T`.
    type Cache<T>: ChildCache<T>;

    /// Creates an empty cache.
    fn create<T>(&self) -> Self::Cache<T>;
}
