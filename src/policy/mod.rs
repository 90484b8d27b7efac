//! Caching policies for render-tree children.
//!
//! | Policy        | Cache          | Identity                       |
//! |---------------|----------------|--------------------------------|
//! | [`MarkSweep`] | [`SlotCache`]  | explicit/minted key, or order  |

pub mod mark_sweep;

pub use mark_sweep::{MarkSweep, SlotCache};
#[cfg(feature = "metrics")]
pub use mark_sweep::SlotCacheMetrics;
