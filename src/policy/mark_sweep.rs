//! Mark-and-sweep slot cache for the children of one render node.
//!
//! Each render pass of a parent looks its children up, confirms the ones it
//! keeps with a retention mark, and finishes with a sweep that evicts every
//! child left unmarked. Children are addressed either by key or by arrival
//! order; the two namespaces never overlap.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          SlotCache<T> Layout                                │
//! │                                                                             │
//! │   persistent (survives passes until swept)                                  │
//! │   ┌──────────────────────────────────┐   ┌───────────────────────────────┐  │
//! │   │ keyed: FxHashMap<SlotKey, Child> │   │ unkeyed: Vec<Child>           │  │
//! │   │   "row-1" → Payload(a)           │   │  [0] Payload(x)               │  │
//! │   │   #1.0    → Payload(b)  (minted) │   │  [1] Placeholder              │  │
//! │   └──────────────────────────────────┘   │  [2] Payload(y)               │  │
//! │                                          └───────────────────────────────┘  │
//! │   pass-local (cleared by reset)                                             │
//! │   ┌──────────────────────────────────┐   ┌───────────────────────────────┐  │
//! │   │ retained_keys: {"row-1"}         │   │ retained_positions: 1 0 1     │  │
//! │   └──────────────────────────────────┘   │ get_cursor: 3  mark_cursor: 3 │  │
//! │                                          └───────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Pass Flow (per child)
//! ─────────────────────
//!
//!   get_child(key)       keyed: map lookup
//!                        positional: read unkeyed[get_cursor], get_cursor += 1
//!   put_child(..)        only on a miss; appends / inserts, never marks
//!   replace_child(..)    only when the cached candidate is unsuitable
//!   mark(key) | skip()   retain, or consume the position without retaining
//!
//! Sweep Flow
//! ──────────
//!
//!   clean(on_remove):
//!     keyed:   move retained entries into a spare map, hand the rest to
//!              on_remove, swap the maps (batched here)
//!     unkeyed: walk once with a logical position, keep retained entries
//!              in order, hand the rest to on_remove
//!     reset()
//! ```
//!
//! ## Operations
//!
//! | Operation        | Time   | Notes                                         |
//! |------------------|--------|-----------------------------------------------|
//! | `get_child`      | O(1)   | Positional lookups advance `get_cursor`       |
//! | `put_child`      | O(1)*  | *Amortized; may mint a key                    |
//! | `replace_child`  | O(1)   | Swaps in place, returns the displaced child   |
//! | `mark` / `skip`  | O(1)*  | *Amortized bitmap growth                      |
//! | `clean`          | O(n)   | One pass over each namespace                  |
//! | `reset`          | O(n/64)| Keeps bitmap and set allocations              |
//!
//! ## Example Usage
//!
//! ```
//! use slotkit::child::{Child, SlotKey};
//! use slotkit::policy::mark_sweep::SlotCache;
//!
//! let mut cache = SlotCache::new();
//!
//! // First pass: everything misses, so insert then confirm.
//! for name in ["a", "b", "c"] {
//!     assert!(cache.get_child(None).is_none());
//!     cache.put_child(None, Child::Payload(name), false);
//!     cache.mark(None).unwrap();
//! }
//! cache.clean(None);
//!
//! // Second pass keeps only the first child.
//! assert_eq!(cache.get_child(None), Some(&Child::Payload("a")));
//! cache.mark(None).unwrap();
//!
//! let mut removed = Vec::new();
//! cache.clean(Some(&mut |child| removed.push(child)));
//! assert_eq!(removed, ["b", "c"]);
//! assert_eq!(cache.unkeyed_count(), 1);
//!
//! // Keyed children are independent of position.
//! let key = SlotKey::from("header");
//! cache.put_child(Some(key.clone()), Child::Payload("h"), false);
//! cache.mark(Some(&key)).unwrap();
//! assert_eq!(cache.keyed_count(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! - [`SlotCache`]: Not thread-safe. One cache belongs to one render node and
//!   is driven by that node's single in-flight pass.
//! - The disposal callback runs while the cache is mutably borrowed, so it
//!   cannot re-enter the same cache.
//!
//! ## Implementation Notes
//!
//! - The keyed map is allocated on the first keyed insert.
//! - Keyed evictions are deferred to `clean`, one batch per pass. A sweep
//!   that retains every keyed child leaves the map untouched.
//! - Minted keys carry an owner id drawn once per cache, so a key minted
//!   elsewhere and handed back explicitly cannot collide with this cache's
//!   own mints.
//! - Both namespaces compact survivors into spare storage that is kept for
//!   the next sweep, so steady-state passes do not allocate.

use std::fmt;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::child::{AutoKey, Child, SlotKey};
use crate::ds::RetainedBits;
use crate::error::{DanglingMarkError, InvariantError};
use crate::traits::{CachePolicy, ChildCache};

/// Counters for slot cache operations.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct SlotCacheMetrics {
    /// Number of `get_child` calls.
    pub lookups: u64,
    /// Lookups that found a cached child.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Number of `put_child` calls.
    pub inserts: u64,
    /// Keys minted in suggest-keys mode.
    pub keys_minted: u64,
    /// Number of `replace_child` calls that displaced a child.
    pub replacements: u64,
    /// Successful marks.
    pub marks: u64,
    /// Marks rejected as dangling.
    pub dangling_marks: u64,
    /// Number of `skip` calls.
    pub skips: u64,
    /// Number of `clean` calls.
    pub sweeps: u64,
    /// Entries removed by sweeps, placeholders included.
    pub evicted: u64,
    /// Payloads handed to a disposal callback.
    pub disposed: u64,
}

#[cfg(feature = "metrics")]
impl fmt::Display for SlotCacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hit_rate = if self.lookups > 0 {
            (self.hits as f64 / self.lookups as f64) * 100.0
        } else {
            0.0
        };

        write!(
            f,
            "SlotCacheMetrics {{ lookups: {}, hits: {}, misses: {}, hit_rate: {:.2}%, inserts: {}, \
             keys_minted: {}, replacements: {}, marks: {}, dangling_marks: {}, skips: {}, \
             sweeps: {}, evicted: {}, disposed: {} }}",
            self.lookups,
            self.hits,
            self.misses,
            hit_rate,
            self.inserts,
            self.keys_minted,
            self.replacements,
            self.marks,
            self.dangling_marks,
            self.skips,
            self.sweeps,
            self.evicted,
            self.disposed
        )
    }
}

/// Children cache of a single render node.
///
/// # Type Parameters
///
/// - `T`: Payload type. The cache never inspects it; reuse decisions belong
///   to the caller.
///
/// # Example
///
/// ```
/// use slotkit::child::Child;
/// use slotkit::policy::mark_sweep::SlotCache;
///
/// let mut cache = SlotCache::new();
/// cache.put_child(None, Child::Payload(1), false);
/// cache.put_child(None, Child::Placeholder, false);
/// cache.put_child(None, Child::Payload(3), false);
///
/// // Placeholders keep later siblings at their positions.
/// assert_eq!(cache.get_child(None), Some(&Child::Payload(1)));
/// assert_eq!(cache.get_child(None), Some(&Child::Placeholder));
/// assert_eq!(cache.get_child(None), Some(&Child::Payload(3)));
/// ```
pub struct SlotCache<T> {
    /// Explicit and minted keys; allocated on first keyed insert
    keyed: Option<FxHashMap<SlotKey, Child<T>>>,
    /// Positional children in arrival order
    unkeyed: Vec<Child<T>>,
    /// Compaction buffer reused across sweeps
    spare: Vec<Child<T>>,
    /// Next position read by a positional lookup
    get_cursor: usize,
    /// Next position confirmed by a positional mark or skip
    mark_cursor: usize,
    retained_keys: FxHashSet<SlotKey>,
    retained_positions: RetainedBits,
    /// Survivor map swapped with `keyed` by sweeps that evict
    spare_keyed: FxHashMap<SlotKey, Child<T>>,
    /// Owner id of minted keys; zero until the first mint
    auto_owner: u64,
    auto_key_counter: u64,
    keyed_capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: SlotCacheMetrics,
}

impl<T> SlotCache<T> {
    /// Creates an empty cache.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let cache: SlotCache<String> = SlotCache::new();
    /// assert!(cache.is_empty());
    /// assert_eq!(cache.get_cursor(), 0);
    /// assert_eq!(cache.mark_cursor(), 0);
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates an empty cache sized for the expected number of children.
    ///
    /// The keyed map is still allocated lazily; `keyed` only sizes it once
    /// the first keyed child arrives.
    pub fn with_capacity(keyed: usize, unkeyed: usize) -> Self {
        Self {
            keyed: None,
            unkeyed: Vec::with_capacity(unkeyed),
            spare: Vec::with_capacity(unkeyed),
            get_cursor: 0,
            mark_cursor: 0,
            retained_keys: FxHashSet::with_capacity_and_hasher(keyed, Default::default()),
            retained_positions: RetainedBits::with_capacity(unkeyed),
            spare_keyed: FxHashMap::default(),
            auto_owner: 0,
            auto_key_counter: 0,
            keyed_capacity: keyed,
            #[cfg(feature = "metrics")]
            metrics: SlotCacheMetrics::default(),
        }
    }

    /// Looks up a cached child by key, or by position when `key` is `None`.
    ///
    /// A positional lookup advances the lookup cursor whether or not it
    /// finds anything, which keeps later siblings aligned with render order.
    /// Nothing is marked.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::{Child, SlotKey};
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    /// cache.put_child(Some("k".into()), Child::Payload('k'), false);
    ///
    /// assert_eq!(cache.get_child(Some(&SlotKey::from("k"))), Some(&Child::Payload('k')));
    /// assert_eq!(cache.get_child(Some(&SlotKey::from("nope"))), None);
    ///
    /// // A positional miss still consumes a position.
    /// assert_eq!(cache.get_child(None), None);
    /// assert_eq!(cache.get_cursor(), 1);
    /// ```
    pub fn get_child(&mut self, key: Option<&SlotKey>) -> Option<&Child<T>> {
        let found = match key {
            Some(key) => self.keyed.as_ref().and_then(|keyed| keyed.get(key)),
            None => {
                let pos = self.get_cursor;
                self.get_cursor += 1;
                self.unkeyed.get(pos)
            },
        };

        #[cfg(feature = "metrics")]
        {
            self.metrics.lookups += 1;
            if found.is_some() {
                self.metrics.hits += 1;
            } else {
                self.metrics.misses += 1;
            }
        }

        found
    }

    /// Caches `child` and returns the key it was stored under.
    ///
    /// - Explicit `key`: stored in the keyed namespace; a previous child at
    ///   the same key is replaced (last writer wins).
    /// - No key, `suggest_keys` set, not a placeholder: stored under a newly
    ///   minted [`SlotKey::Auto`], which is returned. Minted keys are unique
    ///   to this cache, so no caller-supplied key can equal one it has not
    ///   handed out itself.
    /// - Otherwise: appended positionally, `None` returned.
    ///
    /// The new child is not retained; it still needs a `mark`.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::{Child, SlotKey};
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    ///
    /// assert_eq!(cache.put_child(None, Child::Payload(1), false), None);
    /// let minted = cache.put_child(None, Child::Payload(2), true);
/// assert!(minted.is_some_and(|key| key.is_auto()));
    /// assert_eq!(cache.put_child(None, Child::Placeholder, true), None);
    /// assert_eq!(
    ///     cache.put_child(Some("x".into()), Child::Payload(3), true),
    ///     Some(SlotKey::from("x"))
    /// );
    ///
    /// assert_eq!(cache.keyed_count(), 2);
    /// assert_eq!(cache.unkeyed_count(), 2);
    /// ```
    pub fn put_child(
        &mut self,
        key: Option<SlotKey>,
        child: Child<T>,
        suggest_keys: bool,
    ) -> Option<SlotKey> {
        #[cfg(feature = "metrics")]
        {
            self.metrics.inserts += 1;
        }

        let key = match key {
            Some(key) => Some(key),
            None if suggest_keys && !child.is_placeholder() => Some(self.mint_key()),
            None => None,
        };

        match key {
            Some(key) => {
                if self.keyed_mut().insert(key.clone(), child).is_some() {
                    debug!("slot cache: key `{key}` overwritten by a later insert");
                }
                Some(key)
            },
            None => {
                self.unkeyed.push(child);
                None
            },
        }
    }

    /// Installs `child` in the slot most recently looked up for `key`.
    ///
    /// Keyed: inserts under `key` and returns the previous child there.
    /// Positional: swaps the entry at the position read by the last
    /// positional lookup and returns it. If that lookup ran past the end of
    /// the cached children, `child` is appended instead and `None` returned.
    ///
    /// Like `put_child`, this never marks.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::Child;
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    /// cache.put_child(None, Child::Payload("old"), false);
    /// cache.clean(None); // never marked, so evicted
    /// cache.put_child(None, Child::Payload("old"), false);
    ///
    /// // The candidate at position 0 is unsuitable: swap it out in place.
    /// assert!(cache.get_child(None).is_some());
    /// let displaced = cache.replace_child(None, Child::Payload("new"));
    /// assert_eq!(displaced, Some(Child::Payload("old")));
    /// cache.mark(None).unwrap();
    /// assert_eq!(cache.unkeyed_count(), 1);
    /// ```
    pub fn replace_child(&mut self, key: Option<&SlotKey>, child: Child<T>) -> Option<Child<T>> {
        let displaced = match key {
            Some(key) => self.keyed_mut().insert(key.clone(), child),
            None => {
                let slot = self
                    .get_cursor
                    .checked_sub(1)
                    .and_then(|pos| self.unkeyed.get_mut(pos));
                match slot {
                    Some(slot) => Some(std::mem::replace(slot, child)),
                    None => {
                        self.unkeyed.push(child);
                        None
                    },
                }
            },
        };

        if displaced.is_some() {
            debug!(
                "slot cache: replaced child at {}",
                key.map_or_else(|| format!("position {}", self.get_cursor - 1), |k| k.to_string())
            );
            #[cfg(feature = "metrics")]
            {
                self.metrics.replacements += 1;
            }
        }
        displaced
    }

    /// Retains a child through the next sweep.
    ///
    /// Keyed: the key must have been inserted. Positional: there must be a
    /// cached child at the mark cursor, which then advances. On error the
    /// cache is left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::{Child, SlotKey};
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    /// cache.put_child(None, Child::Payload(1), false);
    ///
    /// assert!(cache.mark(None).is_ok());
    /// // Only one child was cached.
    /// assert!(cache.mark(None).is_err());
    /// // No keyed child was ever inserted.
    /// assert!(cache.mark(Some(&SlotKey::from("a"))).is_err());
    /// ```
    pub fn mark(&mut self, key: Option<&SlotKey>) -> Result<(), DanglingMarkError> {
        let result = match key {
            Some(key) => self.mark_keyed(key),
            None => self.mark_position(),
        };

        #[cfg(feature = "metrics")]
        {
            if result.is_ok() {
                self.metrics.marks += 1;
            } else {
                self.metrics.dangling_marks += 1;
            }
        }

        if let Err(err) = &result {
            debug!("slot cache: rejected mark: {err}");
        }
        result
    }

    fn mark_keyed(&mut self, key: &SlotKey) -> Result<(), DanglingMarkError> {
        let Some(keyed) = self.keyed.as_ref() else {
            return Err(DanglingMarkError::new(
                Some(key.clone()),
                "no keyed children have been cached",
            ));
        };
        if !keyed.contains_key(key) {
            return Err(DanglingMarkError::new(
                Some(key.clone()),
                "key was never inserted",
            ));
        }
        self.retained_keys.insert(key.clone());
        Ok(())
    }

    fn mark_position(&mut self) -> Result<(), DanglingMarkError> {
        if self.mark_cursor >= self.unkeyed.len() {
            return Err(DanglingMarkError::new(
                None,
                format!(
                    "position {} marked but only {} unkeyed children are cached",
                    self.mark_cursor,
                    self.unkeyed.len()
                ),
            ));
        }
        self.retained_positions.set(self.mark_cursor);
        self.mark_cursor += 1;
        Ok(())
    }

    /// Consumes the next position without retaining it.
    ///
    /// The child there (if any) is evicted by the next sweep, while the mark
    /// cursor stays aligned for the following sibling.
    #[inline]
    pub fn skip(&mut self) {
        self.mark_cursor += 1;

        #[cfg(feature = "metrics")]
        {
            self.metrics.skips += 1;
        }
    }

    /// Returns the child most recently marked for `key` in this pass.
    ///
    /// Keyed: the entry at `key` if it was marked. Positional: the entry at
    /// the last marked position, if the last cursor step was a mark rather
    /// than a skip.
    pub fn retained_mut(&mut self, key: Option<&SlotKey>) -> Option<&mut Child<T>> {
        match key {
            Some(key) => {
                if !self.retained_keys.contains(key) {
                    return None;
                }
                self.keyed.as_mut()?.get_mut(key)
            },
            None => {
                let pos = self.mark_cursor.checked_sub(1)?;
                if !self.retained_positions.get(pos) {
                    return None;
                }
                self.unkeyed.get_mut(pos)
            },
        }
    }

    /// Sweeps every child not marked during this pass, then resets pass state.
    ///
    /// `on_remove` is called once per evicted payload, in key-map order for
    /// keyed children and render order for positional ones. Placeholders are
    /// evicted without a call. Surviving positional children are compacted
    /// in order, so the next pass sees them at consecutive positions.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::Child;
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    /// for c in ['a', 'b', 'c', 'd', 'e'] {
    ///     cache.put_child(None, Child::Payload(c), false);
    /// }
    /// cache.mark(None).unwrap();
    /// cache.skip();
    /// cache.skip();
    /// cache.skip();
    /// cache.mark(None).unwrap();
    ///
    /// let mut removed = Vec::new();
    /// cache.clean(Some(&mut |c| removed.push(c)));
    /// assert_eq!(removed, ['b', 'c', 'd']);
    ///
    /// assert_eq!(cache.get_child(None), Some(&Child::Payload('a')));
    /// assert_eq!(cache.get_child(None), Some(&Child::Payload('e')));
    /// ```
    pub fn clean(&mut self, mut on_remove: Option<&mut dyn FnMut(T)>) {
        let mut evicted = 0usize;
        let mut disposed = 0usize;

        // Every retained key is cached, so equal sizes mean nothing to evict.
        if let Some(keyed) = self
            .keyed
            .as_mut()
            .filter(|keyed| self.retained_keys.len() < keyed.len())
        {
            let mut survivors = std::mem::take(&mut self.spare_keyed);
            survivors.clear();
            for (key, child) in keyed.drain() {
                if self.retained_keys.contains(&key) {
                    survivors.insert(key, child);
                } else {
                    evicted += 1;
                    if dispose(&mut on_remove, child) {
                        disposed += 1;
                    }
                }
            }
            std::mem::swap(keyed, &mut survivors);
            self.spare_keyed = survivors;
        }

        // Logical position indexes the retention bitmap; survivors are pushed
        // into `spare`, whose length is the physical position after compaction.
        let mut spare = std::mem::take(&mut self.spare);
        spare.clear();
        for (logical, child) in self.unkeyed.drain(..).enumerate() {
            if self.retained_positions.get(logical) {
                spare.push(child);
            } else {
                evicted += 1;
                if dispose(&mut on_remove, child) {
                    disposed += 1;
                }
            }
        }
        std::mem::swap(&mut self.unkeyed, &mut spare);
        self.spare = spare;

        trace!(
            "slot cache: swept {evicted} children ({disposed} disposed), {} keyed and {} unkeyed remain",
            self.keyed_count(),
            self.unkeyed.len()
        );

        #[cfg(feature = "metrics")]
        {
            self.metrics.sweeps += 1;
            self.metrics.evicted += evicted as u64;
            self.metrics.disposed += disposed as u64;
        }

        self.reset();
    }

    /// Clears pass-local state without evicting anything.
    ///
    /// Retained keys and positions are forgotten and both cursors return to
    /// zero; cached children stay. Allocations are kept.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::Child;
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache = SlotCache::new();
    /// cache.put_child(None, Child::Payload(1), false);
    /// cache.get_child(None);
    /// cache.mark(None).unwrap();
    ///
    /// cache.reset();
    /// assert_eq!(cache.get_cursor(), 0);
    /// assert_eq!(cache.mark_cursor(), 0);
    ///
    /// // The mark was forgotten, so a sweep now evicts the child.
    /// cache.clean(None);
    /// assert_eq!(cache.unkeyed_count(), 0);
    /// ```
    pub fn reset(&mut self) {
        self.retained_keys.clear();
        self.retained_positions.clear();
        self.get_cursor = 0;
        self.mark_cursor = 0;
    }

    /// Number of keyed entries.
    #[inline]
    pub fn keyed_count(&self) -> usize {
        self.keyed.as_ref().map_or(0, |keyed| keyed.len())
    }

    /// Number of positional entries, placeholders included.
    #[inline]
    pub fn unkeyed_count(&self) -> usize {
        self.unkeyed.len()
    }

    /// Total cached entries across both namespaces.
    #[inline]
    pub fn len(&self) -> usize {
        self.keyed_count() + self.unkeyed.len()
    }

    /// Returns `true` if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next position a positional lookup will read.
    #[inline]
    pub fn get_cursor(&self) -> usize {
        self.get_cursor
    }

    /// Next position a positional mark will retain.
    #[inline]
    pub fn mark_cursor(&self) -> usize {
        self.mark_cursor
    }

    /// Returns the metrics collected since creation or the last reset.
    #[cfg(feature = "metrics")]
    #[inline]
    pub fn metrics(&self) -> &SlotCacheMetrics {
        &self.metrics
    }

    /// Resets collected metrics to zero.
    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics = SlotCacheMetrics::default();
    }

    /// Validates pass bookkeeping against the cached children.
    ///
    /// Meant for tests and debug checks between protocol steps; a positional
    /// lookup that has missed but not yet been followed by its insert is
    /// outside what this checks.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.mark_cursor > self.unkeyed.len() {
            return Err(InvariantError::new(format!(
                "mark cursor {} is past {} unkeyed children",
                self.mark_cursor,
                self.unkeyed.len()
            )));
        }
        if self.retained_positions.len() > self.unkeyed.len() {
            return Err(InvariantError::new(format!(
                "{} positions recorded for {} unkeyed children",
                self.retained_positions.len(),
                self.unkeyed.len()
            )));
        }
        if self.retained_positions.len() > self.mark_cursor {
            return Err(InvariantError::new(format!(
                "position {} retained ahead of mark cursor {}",
                self.retained_positions.len() - 1,
                self.mark_cursor
            )));
        }
        for key in &self.retained_keys {
            let cached = self
                .keyed
                .as_ref()
                .is_some_and(|keyed| keyed.contains_key(key));
            if !cached {
                return Err(InvariantError::new(format!(
                    "retained key `{key}` has no cached child"
                )));
            }
        }
        Ok(())
    }

    fn keyed_mut(&mut self) -> &mut FxHashMap<SlotKey, Child<T>> {
        let capacity = self.keyed_capacity;
        self.keyed
            .get_or_insert_with(|| FxHashMap::with_capacity_and_hasher(capacity, Default::default()))
    }

    fn mint_key(&mut self) -> SlotKey {
        if self.auto_owner == 0 {
            self.auto_owner = AutoKey::next_owner();
        }
        let key = SlotKey::Auto(AutoKey {
            owner: self.auto_owner,
            seq: self.auto_key_counter,
        });
        self.auto_key_counter += 1;

        #[cfg(feature = "metrics")]
        {
            self.metrics.keys_minted += 1;
        }

        key
    }
}

/// Hands a swept payload to the callback; returns whether it was called.
fn dispose<T>(on_remove: &mut Option<&mut dyn FnMut(T)>, child: Child<T>) -> bool {
    match (on_remove.as_deref_mut(), child) {
        (Some(callback), Child::Payload(value)) => {
            callback(value);
            true
        },
        _ => false,
    }
}

impl<T> Default for SlotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCache")
            .field("keyed", &self.keyed_count())
            .field("unkeyed", &self.unkeyed.len())
            .field("get_cursor", &self.get_cursor)
            .field("mark_cursor", &self.mark_cursor)
            .field("retained_keys", &self.retained_keys.len())
            .field("retained_positions", &self.retained_positions.count_ones())
            .finish_non_exhaustive()
    }
}

impl<T> ChildCache<T> for SlotCache<T> {
    #[inline]
    fn get_child(&mut self, key: Option<&SlotKey>) -> Option<&Child<T>> {
        SlotCache::get_child(self, key)
    }

    #[inline]
    fn put_child(
        &mut self,
        key: Option<SlotKey>,
        child: Child<T>,
        suggest_keys: bool,
    ) -> Option<SlotKey> {
        SlotCache::put_child(self, key, child, suggest_keys)
    }

    #[inline]
    fn replace_child(&mut self, key: Option<&SlotKey>, child: Child<T>) -> Option<Child<T>> {
        SlotCache::replace_child(self, key, child)
    }

    #[inline]
    fn mark(&mut self, key: Option<&SlotKey>) -> Result<(), DanglingMarkError> {
        SlotCache::mark(self, key)
    }

    #[inline]
    fn skip(&mut self) {
        SlotCache::skip(self)
    }

    #[inline]
    fn retained_mut(&mut self, key: Option<&SlotKey>) -> Option<&mut Child<T>> {
        SlotCache::retained_mut(self, key)
    }

    fn clean(&mut self, on_remove: Option<&mut dyn FnMut(T)>) {
        SlotCache::clean(self, on_remove)
    }

    fn reset(&mut self) {
        SlotCache::reset(self)
    }

    #[inline]
    fn keyed_count(&self) -> usize {
        SlotCache::keyed_count(self)
    }

    #[inline]
    fn unkeyed_count(&self) -> usize {
        SlotCache::unkeyed_count(self)
    }
}

/// The mark-and-sweep caching policy: every node gets its own [`SlotCache`].
///
/// # Example
///
/// ```
/// use slotkit::policy::mark_sweep::MarkSweep;
/// use slotkit::traits::{CachePolicy, ChildCache};
///
/// let policy = MarkSweep { keyed_capacity: 8, unkeyed_capacity: 32 };
/// let cache = policy.create::<u64>();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkSweep {
    /// Capacity hint for keyed children of each node.
    pub keyed_capacity: usize,
    /// Capacity hint for positional children of each node.
    pub unkeyed_capacity: usize,
}

impl CachePolicy for MarkSweep {
    type Cache<T> = SlotCache<T>;

    fn create<T>(&self) -> SlotCache<T> {
        SlotCache::with_capacity(self.keyed_capacity, self.unkeyed_capacity)
    }
}
