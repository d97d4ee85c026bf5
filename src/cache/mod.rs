//! Query result cache.
//!
//! Entries are addressed by a composite [`QueryKey`] (resource kind plus
//! query variant) and hold shared immutable values:
//! - the page sequence of the infinite task list
//! - individual tasks looked up by id
//!
//! Besides plain reads and writes the cache offers the primitives the
//! optimistic mutation protocol needs: snapshot/restore, invalidation,
//! removal, and cancellation of in-flight fetches via per-entry epochs.

mod key;
mod store;
mod value;

pub use key::{QueryKey, ResourceKind, Variant};
pub use store::QueryCache;
pub use value::{CachedValue, InfiniteData};

#[cfg(test)]
pub(crate) use value::fixtures;
