//! Render tree built on the child cache.
//!
//! | Type              | Role                                              |
//! |-------------------|---------------------------------------------------|
//! | [`RenderNode`]    | Owns one children cache and drives its passes     |
//! | [`Pass`]          | Emits children, placeholders and skips in a pass  |
//! | [`ChildOutcome`]  | Key used and whether the slot was reused          |
//! | [`RenderOptions`] | Tree-wide settings inherited by every child       |

pub mod node;
pub mod pass;

pub use node::{RenderNode, RenderOptions};
pub use pass::{ChildOutcome, ChildStatus, Pass};
