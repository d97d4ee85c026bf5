use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned task identifier
pub type TaskId = u64;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

impl Priority {
  pub const ALL: [Priority; 4] = [
    Priority::Low,
    Priority::Medium,
    Priority::High,
    Priority::Critical,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Priority::Low => "low",
      Priority::Medium => "medium",
      Priority::High => "high",
      Priority::Critical => "critical",
    }
  }

  /// Next priority in display order, wrapping around
  pub fn next(self) -> Self {
    match self {
      Priority::Low => Priority::Medium,
      Priority::Medium => Priority::High,
      Priority::High => Priority::Critical,
      Priority::Critical => Priority::Low,
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A task as stored by the backend collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: TaskId,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub completed: bool,
  pub created_at: DateTime<Utc>,
  pub user_id: u64,
  /// Older records may predate priorities
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority: Option<Priority>,
}

impl Task {
  /// Priority with the creation default applied
  pub fn effective_priority(&self) -> Priority {
    self.priority.unwrap_or_default()
  }
}

/// User-supplied fields for a new task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFormData {
  pub title: String,
  pub description: String,
  pub completed: Option<bool>,
  pub priority: Option<Priority>,
}

/// Partial update of a task.
///
/// Only mutable fields exist here; `id`, `createdAt` and `userId` cannot be
/// patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<Priority>,
}

impl TaskPatch {
  pub fn completed(completed: bool) -> Self {
    Self {
      completed: Some(completed),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.completed.is_none()
      && self.priority.is_none()
  }

  /// Return a copy of `task` with this patch applied
  pub fn apply(&self, task: &Task) -> Task {
    let mut patched = task.clone();
    if let Some(title) = &self.title {
      patched.title = title.clone();
    }
    if let Some(description) = &self.description {
      patched.description = description.clone();
    }
    if let Some(completed) = self.completed {
      patched.completed = completed;
    }
    if let Some(priority) = self.priority {
      patched.priority = Some(priority);
    }
    patched
  }
}

/// One page of the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
  pub tasks: Vec<Task>,
  pub has_more: bool,
  /// Cursor for the following page, present iff `has_more`
  pub next_cursor: Option<usize>,
  pub total: usize,
}

impl Page {
  /// Build a page from a list response fetched at `cursor`.
  pub fn from_response(cursor: usize, tasks: Vec<Task>, total: usize) -> Self {
    let reached = cursor + tasks.len();
    let has_more = reached < total;
    Self {
      tasks,
      has_more,
      next_cursor: has_more.then_some(reached),
      total,
    }
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;
  use chrono::TimeZone;

  pub fn task(id: TaskId) -> Task {
    Task {
      id,
      title: format!("Task {}", id),
      description: format!("Description of task {}", id),
      completed: false,
      created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
      user_id: 1,
      priority: Some(Priority::Medium),
    }
  }

  pub fn tasks(ids: impl IntoIterator<Item = TaskId>) -> Vec<Task> {
    ids.into_iter().map(task).collect()
  }
}
