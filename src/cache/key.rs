use crate::tasks::TaskId;
use std::fmt;

/// Resource collections the cache knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
  Tasks,
}

impl ResourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ResourceKind::Tasks => "tasks",
    }
  }
}

/// Which query of a resource an entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
  /// The paginated, infinitely growing list
  InfiniteList,
  /// A single item looked up by id
  Item(TaskId),
}

/// Composite cache key: resource kind plus query variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
  pub kind: ResourceKind,
  pub variant: Variant,
}

impl QueryKey {
  pub const fn task_list() -> Self {
    Self {
      kind: ResourceKind::Tasks,
      variant: Variant::InfiniteList,
    }
  }

  pub const fn task(id: TaskId) -> Self {
    Self {
      kind: ResourceKind::Tasks,
      variant: Variant::Item(id),
    }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.variant {
      Variant::InfiniteList => write!(f, "{}/infinite", self.kind.as_str()),
      Variant::Item(id) => write!(f, "{}/{}", self.kind.as_str(), id),
    }
  }
}
