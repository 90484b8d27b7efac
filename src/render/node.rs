//! Render tree nodes.
//!
//! A [`RenderNode`] owns exactly one children cache, created through the
//! [`CachePolicy`] it was constructed with. Each call to
//! [`render`](RenderNode::render) is one pass over its children:
//!
//! ```text
//!   render(f)
//!     │
//!     ├─ f(&mut Pass)          child()/placeholder()/skip() per slot:
//!     │                          lookup → reuse | create | replace → mark
//!     │
//!     ├─ Ok  → children.clean(dispose)   unmarked children torn down
//!     └─ Err → children.reset()          nothing evicted, error returned
//! ```
//!
//! Rendering a node re-renders only its own subtree, so a node whose local
//! state changed can be refreshed without touching its parent's pass.

use std::any::Any;
use std::fmt;

use log::{debug, trace};

use crate::child::SlotKey;
use crate::error::RenderError;
use crate::render::pass::Pass;
use crate::traits::{CachePolicy, ChildCache};

/// Options shared by every node of a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Mint keys for children rendered without one.
    ///
    /// Such children are stored in the keyed namespace and are only reused
    /// when the caller passes the returned key back on the next pass.
    pub suggest_keys: bool,
}

/// A node of the render tree.
///
/// # Type Parameters
///
/// - `S`: Shape. Two requests with equal shapes may share a node; a different
///   shape at the same slot replaces it.
/// - `P`: Caching policy, injected at construction and inherited by children.
///
/// # Example
///
/// ```
/// use slotkit::policy::mark_sweep::MarkSweep;
/// use slotkit::render::{ChildStatus, RenderNode, RenderOptions};
///
/// let mut root = RenderNode::root("app", MarkSweep::default(), RenderOptions::default());
///
/// root.render(|pass| {
///     pass.child(None, "header", |_| Ok(()))?;
///     pass.child(None, "body", |_| Ok(()))?;
///     Ok(())
/// })
/// .unwrap();
///
/// // Same shapes at the same positions: both children are reused.
/// root.render(|pass| {
///     assert_eq!(pass.child(None, "header", |_| Ok(()))?.status, ChildStatus::Reused);
///     assert_eq!(pass.child(None, "body", |_| Ok(()))?.status, ChildStatus::Reused);
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(root.child_count(), 2);
/// ```
pub struct RenderNode<S, P: CachePolicy> {
    shape: S,
    key: Option<SlotKey>,
    pub(crate) children: P::Cache<RenderNode<S, P>>,
    policy: P,
    pub(crate) options: RenderOptions,
    on_removed: Option<Box<dyn FnOnce()>>,
    bucket: Option<Box<dyn Any>>,
    passes: u64,
}

impl<S, P: CachePolicy> RenderNode<S, P> {
    /// Creates the root of a tree.
    pub fn root(shape: S, policy: P, options: RenderOptions) -> Self {
        Self::with_parts(shape, None, policy, options)
    }

    fn with_parts(shape: S, key: Option<SlotKey>, policy: P, options: RenderOptions) -> Self {
        Self {
            shape,
            key,
            children: policy.create(),
            policy,
            options,
            on_removed: None,
            bucket: None,
            passes: 0,
        }
    }

    /// Creates a detached node for a child slot of `self`.
    pub(crate) fn spawn(&self, shape: S, key: Option<SlotKey>) -> Self {
        Self::with_parts(shape, key, self.policy.clone(), self.options)
    }

    /// The shape this node was created for.
    #[inline]
    pub fn shape(&self) -> &S {
        &self.shape
    }

    /// Key in the parent's cache: explicit, minted, or `None` if positional.
    #[inline]
    pub fn key(&self) -> Option<&SlotKey> {
        self.key.as_ref()
    }

    pub(crate) fn set_key(&mut self, key: Option<SlotKey>) {
        self.key = key;
    }

    /// Options this node renders with.
    #[inline]
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// The node's children cache.
    #[inline]
    pub fn children(&self) -> &P::Cache<RenderNode<S, P>> {
        &self.children
    }

    /// Number of cached children, placeholders included.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of passes completed successfully.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Registers a hook run once when the node is disposed.
    ///
    /// Replaces any previously registered hook.
    pub fn on_removed(&mut self, hook: impl FnOnce() + 'static) {
        self.on_removed = Some(Box::new(hook));
    }

    /// Per-node state that persists across passes, if it holds a `V`.
    pub fn bucket<V: 'static>(&self) -> Option<&V> {
        self.bucket.as_ref()?.downcast_ref()
    }

    /// Mutable per-node state, if it holds a `V`.
    pub fn bucket_mut<V: 'static>(&mut self) -> Option<&mut V> {
        self.bucket.as_mut()?.downcast_mut()
    }

    /// Stores per-node state, replacing whatever was there.
    pub fn set_bucket<V: 'static>(&mut self, value: V) {
        self.bucket = Some(Box::new(value));
    }

    /// Tears the node down: runs its removal hook, then disposes every
    /// cached child, depth first.
    pub fn dispose(mut self) {
        if let Some(hook) = self.on_removed.take() {
            hook();
        }
        // Nothing is marked after a reset, so the sweep evicts everything.
        self.children.reset();
        self.children.clean(Some(&mut |child: RenderNode<S, P>| child.dispose()));
    }
}

impl<S: PartialEq, P: CachePolicy> RenderNode<S, P> {
    /// Runs one render pass over this node's children.
    ///
    /// `f` emits the children for this pass. When it succeeds, children it
    /// did not emit are swept and disposed. When it fails, the pass is
    /// abandoned: nothing is evicted and the children cache starts the next
    /// pass fresh.
    pub fn render<F>(&mut self, f: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Pass<'_, S, P>) -> Result<(), RenderError>,
    {
        let result = f(&mut Pass::new(self));

        match result {
            Ok(()) => {
                self.children
                    .clean(Some(&mut |child: RenderNode<S, P>| child.dispose()));
                self.passes += 1;
                trace!(
                    "render node: pass {} done, {} children cached",
                    self.passes,
                    self.children.len()
                );
                Ok(())
            },
            Err(err) => {
                debug!("render node: pass abandoned: {err}");
                self.children.reset();
                Err(err)
            },
        }
    }
}

impl<S: fmt::Debug, P: CachePolicy> fmt::Debug for RenderNode<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("shape", &self.shape)
            .field("key", &self.key)
            .field("children", &self.children.len())
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}
