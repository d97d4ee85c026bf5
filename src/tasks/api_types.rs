//! Wire types for the task collection.
//!
//! The list and item endpoints return [`Task`](super::types::Task) JSON
//! directly; only request bodies and headers need their own shapes.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;

use super::types::{Priority, TaskFormData};

/// Header carrying the collection size on list responses
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// POST body for a new task, with the server-required defaults filled in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskBody {
  pub title: String,
  pub description: String,
  pub completed: bool,
  pub priority: Priority,
  pub created_at: DateTime<Utc>,
  pub user_id: u64,
}

impl NewTaskBody {
  pub fn from_form(form: TaskFormData, user_id: u64, now: DateTime<Utc>) -> Self {
    Self {
      title: form.title,
      description: form.description,
      completed: form.completed.unwrap_or(false),
      priority: form.priority.unwrap_or_default(),
      created_at: now,
      user_id,
    }
  }
}

/// Read the total count header. `None` when missing or not a number.
pub fn total_count(headers: &HeaderMap) -> Option<usize> {
  headers
    .get(TOTAL_COUNT_HEADER)?
    .to_str()
    .ok()?
    .trim()
    .parse()
    .ok()
}
