pub use crate::child::{AutoKey, Child, SlotKey};
pub use crate::error::{DanglingMarkError, InvalidChildError, InvariantError, RenderError};
#[cfg(feature = "metrics")]
pub use crate::policy::mark_sweep::SlotCacheMetrics;
pub use crate::policy::mark_sweep::{MarkSweep, SlotCache};
pub use crate::render::{ChildOutcome, ChildStatus, Pass, RenderNode, RenderOptions};
pub use crate::traits::{CachePolicy, ChildCache};
