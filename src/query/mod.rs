//! Async queries and mutations over the task collection.
//!
//! Inspired by TanStack Query: results live in the shared
//! [`QueryCache`](crate::cache::QueryCache), while each query handle tracks
//! the status of its own fetches. Fetches run on the tokio runtime and are
//! collected by calling `poll()` from the UI tick, so cache writes only ever
//! happen on the UI thread.
//!
//! # Example
//!
//! ```ignore
//! let mut list = TaskListQuery::new(client.clone(), cache.clone(), 20);
//! list.fetch();
//!
//! // In event loop tick
//! if list.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match list.status() {
//!     QueryStatus::Loading => render_skeleton(),
//!     QueryStatus::Success => render_rows(list.data()),
//!     QueryStatus::Error => render_error(list.error()),
//!     QueryStatus::Idle => {}
//! }
//! ```

pub mod fetch;
pub mod item;
pub mod list;
pub mod mutation;
pub mod task_mutations;

pub use item::TaskQuery;
pub use list::TaskListQuery;
pub use mutation::{Mutation, MutationRunner, MutationState};
pub use task_mutations::{CreateTask, DeleteTask, TaskUpdate, UpdateTask};

/// Lifecycle of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Query has not been started
  Idle,
  /// First fetch running, no data yet
  Loading,
  /// Data available
  Success,
  /// Last fetch failed; earlier data, if any, is still available
  Error,
}

/// Poll until the closure reports a state change.
#[cfg(test)]
pub(crate) async fn poll_until(mut poll: impl FnMut() -> bool) {
  for _ in 0..400 {
    if poll() {
      return;
    }
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  }
  panic!("query did not settle within 2s");
}
