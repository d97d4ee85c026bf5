use crate::cache::{QueryCache, QueryKey};
use crate::query::fetch::{InFlight, Poll};
use crate::query::QueryStatus;
use crate::tasks::{ApiError, Task, TaskClient, TaskId};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct PendingFetch {
  epoch: u64,
  handle: InFlight<Result<Task, ApiError>>,
}

/// Single task lookup by id.
///
/// Inactive (never fetches, never subscribes) when constructed without a
/// valid id.
pub struct TaskQuery {
  client: TaskClient,
  cache: QueryCache,
  key: Option<QueryKey>,
  status: QueryStatus,
  error: Option<ApiError>,
  pending: Option<PendingFetch>,
  seen_invalidations: u64,
}

impl TaskQuery {
  pub fn new(client: TaskClient, cache: QueryCache, id: Option<TaskId>) -> Self {
    // Ids are server-assigned and start at 1
    let key = id.filter(|id| *id != 0).map(QueryKey::task);
    let mut status = QueryStatus::Idle;
    let mut seen_invalidations = 0;
    if let Some(key) = key {
      cache.subscribe(key);
      seen_invalidations = cache.invalidations(&key);
      if cache.get(&key).is_some() {
        status = QueryStatus::Success;
      }
    }

    Self {
      client,
      cache,
      key,
      status,
      error: None,
      pending: None,
      seen_invalidations,
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.key.is_some()
  }

  pub fn id(&self) -> Option<TaskId> {
    self.key.and_then(|key| match key.variant {
      crate::cache::Variant::Item(id) => Some(id),
      crate::cache::Variant::InfiniteList => None,
    })
  }

  pub fn data(&self) -> Option<Arc<Task>> {
    self.id().and_then(|id| self.cache.task(id))
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_fetching(&self) -> bool {
    self.pending.is_some()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Fetch unless fresh data is already cached.
  pub fn fetch(&mut self) {
    let Some(key) = self.key else { return };
    if self.pending.is_some() {
      return;
    }
    if self.cache.is_stale(&key) {
      self.start(key);
    } else {
      self.status = QueryStatus::Success;
    }
  }

  /// Force a fetch, superseding any running one.
  pub fn refetch(&mut self) {
    let Some(key) = self.key else { return };
    self.pending = None;
    self.start(key);
  }

  fn start(&mut self, key: QueryKey) {
    let Some(id) = self.id() else { return };
    debug!(id, "fetching task");
    if self.data().is_none() {
      self.status = QueryStatus::Loading;
    }
    self.seen_invalidations = self.cache.invalidations(&key);
    let client = self.client.clone();
    self.pending = Some(PendingFetch {
      epoch: self.cache.epoch(&key),
      handle: InFlight::spawn(async move { client.get(id).await }),
    });
  }

  /// Collect a finished fetch, or start one the cache asked for.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(key) = self.key else { return false };
    let Some(pending) = self.pending.as_mut() else {
      if self.cache.invalidations(&key) != self.seen_invalidations {
        debug!(%key, "task invalidated, refetching");
        self.start(key);
        return true;
      }
      return false;
    };

    if self.cache.epoch(&key) != pending.epoch {
      debug!(%key, "task fetch superseded by a mutation");
      self.pending = None;
      self.status = match (&self.error, self.data()) {
        (Some(_), _) => QueryStatus::Error,
        (None, Some(_)) => QueryStatus::Success,
        (None, None) => QueryStatus::Idle,
      };
      return true;
    }

    let result = match pending.handle.poll() {
      Poll::Pending => return false,
      Poll::Ready(result) => result,
      Poll::Lost => Err(ApiError::Network {
        message: "fetch task ended without a result".to_string(),
      }),
    };
    self.pending = None;

    match result {
      Ok(task) => {
        self.cache.set(key, task);
        self.error = None;
        self.status = QueryStatus::Success;
      }
      Err(e) => {
        warn!(%key, error = %e, "task fetch failed");
        self.error = Some(e);
        self.status = QueryStatus::Error;
      }
    }
    true
  }
}

impl Drop for TaskQuery {
  fn drop(&mut self) {
    if let Some(key) = self.key {
      self.cache.unsubscribe(&key);
    }
  }
}
