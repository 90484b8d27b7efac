//! slotkit: mark-and-sweep caching of render-tree children.
//!
//! A parent node keeps the children it rendered last time in a
//! [`SlotCache`](policy::mark_sweep::SlotCache), looks them up again on the
//! next pass, marks the ones it keeps and sweeps the rest. See
//! [`policy::mark_sweep`] for the cache and [`render`] for the tree built on
//! top of it.

pub mod child;
pub mod ds;
pub mod dynamic;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod render;
pub mod traits;

pub use crate::child::{AutoKey, Child, SlotKey};
pub use crate::ds::RetainedBits;
pub use crate::error::{DanglingMarkError, InvalidChildError, InvariantError, RenderError};
pub use crate::policy::mark_sweep::{MarkSweep, SlotCache};
#[cfg(feature = "metrics")]
pub use crate::policy::mark_sweep::SlotCacheMetrics;
pub use crate::render::{ChildOutcome, ChildStatus, Pass, RenderNode, RenderOptions};
