//! Dynamic insertion boundary.
//!
//! Typed callers hand [`Child<T>`] values to
//! [`SlotCache::put_child`](crate::policy::mark_sweep::SlotCache::put_child)
//! and cannot produce an invalid child. Values arriving through a type-erased
//! channel (scripting bridges, plugin hosts) are checked here instead: only a
//! boxed `Child<T>` carries the placeholder/payload discriminant, and anything
//! else, including a bare `T`, is rejected before it reaches the cache.

use std::any::{Any, type_name};

use crate::child::{Child, SlotKey};
use crate::error::InvalidChildError;
use crate::policy::mark_sweep::SlotCache;

impl<T: 'static> SlotCache<T> {
    /// Caches a type-erased child, checking that it is a `Child<T>`.
    ///
    /// On success behaves exactly like `put_child`. On failure the cache is
    /// untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use slotkit::child::Child;
    /// use slotkit::policy::mark_sweep::SlotCache;
    ///
    /// let mut cache: SlotCache<u32> = SlotCache::new();
    ///
    /// assert!(cache.put_child_dyn(None, Box::new(Child::Payload(1u32)), false).is_ok());
    /// assert!(cache.put_child_dyn(None, Box::new(true), false).is_err());
    /// assert!(cache.put_child_dyn(None, Box::new(7u32), false).is_err());
    /// assert_eq!(cache.unkeyed_count(), 1);
    /// ```
    pub fn put_child_dyn(
        &mut self,
        key: Option<SlotKey>,
        child: Box<dyn Any>,
        suggest_keys: bool,
    ) -> Result<Option<SlotKey>, InvalidChildError> {
        let child = child.downcast::<Child<T>>().map_err(|_| {
            InvalidChildError::new(format!(
                "expected `{}`: value has no placeholder/payload discriminant",
                type_name::<Child<T>>()
            ))
        })?;
        Ok(self.put_child(key, *child, suggest_keys))
    }
}
