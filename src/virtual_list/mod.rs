//! Headless list virtualization.
//!
//! Computes which rows of a long, growing list intersect the viewport and
//! where each of them sits, so only that window is rendered. Sizes are
//! abstract units; the caller decides whether they are pixels or terminal
//! rows.

pub mod types;
pub mod virtualizer;

pub use types::{Align, VirtualItem, VirtualRange};
pub use virtualizer::{should_fetch_more, Virtualizer};
