//! In-memory query cache shared by the query hooks.

use crate::cache::key::QueryKey;
use crate::cache::value::{CachedValue, InfiniteData};
use crate::config::CacheConfig;
use crate::tasks::{Task, TaskId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Bookkeeping for one query variant.
#[derive(Debug, Default)]
struct CacheEntry {
  value: Option<CachedValue>,
  /// Set by invalidation, cleared by the next write
  stale: bool,
  updated_at: Option<Instant>,
  observers: usize,
  /// When the last observer left
  idle_since: Option<Instant>,
  /// Bumped by `cancel`; fetches started under an older epoch are discarded
  epoch: u64,
  /// Bumped by `invalidate` and `remove`; observers refetch when it moves
  invalidations: u64,
}

#[derive(Debug)]
struct CacheInner {
  entries: HashMap<QueryKey, CacheEntry>,
  stale_time: Duration,
  gc_time: Duration,
}

impl CacheInner {
  /// Entry for `key`; new entries start idle so gc can reclaim them
  fn entry(&mut self, key: QueryKey) -> &mut CacheEntry {
    self.entries.entry(key).or_insert_with(|| CacheEntry {
      idle_since: Some(Instant::now()),
      ..CacheEntry::default()
    })
  }
}

/// Handle to the query cache.
///
/// Cloning is cheap and every clone sees the same entries. The cache lives on
/// the UI thread; values are replaced wholesale, never edited in place, so a
/// `CachedValue` obtained earlier stays valid and unchanged.
#[derive(Debug, Clone)]
pub struct QueryCache {
  inner: Rc<RefCell<CacheInner>>,
}

impl QueryCache {
  pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
    Self {
      inner: Rc::new(RefCell::new(CacheInner {
        entries: HashMap::new(),
        stale_time,
        gc_time,
      })),
    }
  }

  pub fn from_config(config: &CacheConfig) -> Self {
    Self::new(
      Duration::from_secs(config.stale_secs),
      Duration::from_secs(config.gc_secs),
    )
  }

  pub fn get(&self, key: &QueryKey) -> Option<CachedValue> {
    self
      .inner
      .borrow()
      .entries
      .get(key)
      .and_then(|entry| entry.value.clone())
  }

  pub fn task_list(&self) -> Option<Arc<InfiniteData>> {
    self
      .get(&QueryKey::task_list())
      .and_then(|value| value.as_list().cloned())
  }

  pub fn task(&self, id: TaskId) -> Option<Arc<Task>> {
    self
      .get(&QueryKey::task(id))
      .and_then(|value| value.as_item().cloned())
  }

  /// Replace the value of `key` with fresh data.
  pub fn set(&self, key: QueryKey, value: impl Into<CachedValue>) {
    let mut inner = self.inner.borrow_mut();
    let entry = inner.entry(key);
    entry.value = Some(value.into());
    entry.stale = false;
    entry.updated_at = Some(Instant::now());
    debug!(%key, "cache entry written");
  }

  /// Replace the value of `key` with `f(current)`. No-op when nothing is cached.
  pub fn update(&self, key: &QueryKey, f: impl FnOnce(&CachedValue) -> CachedValue) -> bool {
    let mut inner = self.inner.borrow_mut();
    match inner.entries.get_mut(key) {
      Some(CacheEntry {
        value: Some(value), ..
      }) => {
        let next = f(value);
        *value = next;
        debug!(%key, "cache entry patched");
        true
      }
      _ => false,
    }
  }

  /// Typed `update` for the infinite list
  pub fn update_task_list(&self, f: impl FnOnce(&InfiniteData) -> InfiniteData) -> bool {
    self.update(&QueryKey::task_list(), |value| match value {
      CachedValue::List(data) => f(data).into(),
      other => other.clone(),
    })
  }

  /// Typed `update` for a single task
  pub fn update_task(&self, id: TaskId, f: impl FnOnce(&Task) -> Task) -> bool {
    self.update(&QueryKey::task(id), |value| match value {
      CachedValue::Item(task) => f(task).into(),
      other => other.clone(),
    })
  }

  /// Put back exactly what a snapshot captured, including "nothing cached".
  pub fn restore(&self, key: QueryKey, snapshot: Option<CachedValue>) {
    let mut inner = self.inner.borrow_mut();
    let entry = inner.entry(key);
    entry.value = snapshot;
    debug!(%key, "cache entry restored from snapshot");
  }

  /// Mark `key` stale so observers refetch it.
  pub fn invalidate(&self, key: &QueryKey) {
    if let Some(entry) = self.inner.borrow_mut().entries.get_mut(key) {
      entry.stale = true;
      entry.invalidations += 1;
      debug!(%key, "cache entry invalidated");
    }
  }

  /// Drop the cached value of `key`.
  ///
  /// Observer bookkeeping survives so a still-mounted consumer can refetch;
  /// unobserved entries disappear entirely.
  pub fn remove(&self, key: &QueryKey) {
    let mut inner = self.inner.borrow_mut();
    let unobserved = match inner.entries.get_mut(key) {
      Some(entry) => {
        entry.value = None;
        entry.stale = true;
        entry.updated_at = None;
        entry.invalidations += 1;
        entry.observers == 0
      }
      None => return,
    };
    if unobserved {
      inner.entries.remove(key);
    }
    debug!(%key, "cache entry removed");
  }

  /// Drop the cached value of `key` without asking observers to refetch.
  ///
  /// Used while a mutation is pending: a refetch started now could bring the
  /// value straight back before the server has applied the change.
  pub fn clear(&self, key: &QueryKey) {
    if let Some(entry) = self.inner.borrow_mut().entries.get_mut(key) {
      entry.value = None;
      entry.stale = true;
      entry.updated_at = None;
      debug!(%key, "cache entry cleared");
    }
  }

  /// Supersede any fetch of `key` currently in flight.
  pub fn cancel(&self, key: &QueryKey) {
    let mut inner = self.inner.borrow_mut();
    let entry = inner.entry(*key);
    entry.epoch += 1;
    debug!(%key, epoch = entry.epoch, "in-flight fetches cancelled");
  }

  pub fn epoch(&self, key: &QueryKey) -> u64 {
    self
      .inner
      .borrow()
      .entries
      .get(key)
      .map(|entry| entry.epoch)
      .unwrap_or(0)
  }

  pub fn invalidations(&self, key: &QueryKey) -> u64 {
    self
      .inner
      .borrow()
      .entries
      .get(key)
      .map(|entry| entry.invalidations)
      .unwrap_or(0)
  }

  /// Whether `key` needs a fetch: nothing cached, invalidated, or older than
  /// the stale time.
  pub fn is_stale(&self, key: &QueryKey) -> bool {
    let inner = self.inner.borrow();
    match inner.entries.get(key) {
      Some(entry) if entry.value.is_some() => {
        entry.stale
          || entry
            .updated_at
            .map(|t| t.elapsed() > inner.stale_time)
            .unwrap_or(true)
      }
      _ => true,
    }
  }

  pub fn subscribe(&self, key: QueryKey) {
    let mut inner = self.inner.borrow_mut();
    let entry = inner.entry(key);
    entry.observers += 1;
    entry.idle_since = None;
  }

  pub fn unsubscribe(&self, key: &QueryKey) {
    if let Some(entry) = self.inner.borrow_mut().entries.get_mut(key) {
      entry.observers = entry.observers.saturating_sub(1);
      if entry.observers == 0 {
        entry.idle_since = Some(Instant::now());
      }
    }
  }

  pub fn observers(&self, key: &QueryKey) -> usize {
    self
      .inner
      .borrow()
      .entries
      .get(key)
      .map(|entry| entry.observers)
      .unwrap_or(0)
  }

  /// Drop entries nobody has observed for longer than the gc time.
  /// Returns how many entries were reclaimed.
  pub fn gc(&self, now: Instant) -> usize {
    let mut inner = self.inner.borrow_mut();
    let gc_time = inner.gc_time;
    let before = inner.entries.len();
    inner.entries.retain(|_, entry| {
      entry.observers > 0
        || entry
          .idle_since
          .map(|since| now.saturating_duration_since(since) <= gc_time)
          .unwrap_or(true)
    });
    let removed = before - inner.entries.len();
    if removed > 0 {
      debug!(removed, "garbage collected idle cache entries");
    }
    removed
  }

  pub fn len(&self) -> usize {
    self.inner.borrow().entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::value::fixtures::list;
  use crate::tasks::types::fixtures::task;

  fn cache() -> QueryCache {
    QueryCache::new(Duration::from_secs(60), Duration::from_secs(300))
  }

  #[test]
  fn test_set_and_get() {
    let cache = cache();
    cache.set(QueryKey::task(7), task(7));

    assert_eq!(cache.task(7).map(|t| t.id), Some(7));
    assert!(cache.task_list().is_none());
    assert!(!cache.is_stale(&QueryKey::task(7)));
  }

  #[test]
  fn test_update_is_copy_on_write() {
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&[1, 2]], 2));
    let before = cache.task_list().unwrap();

    cache.update_task_list(|data| data.without_task(1));

    let after = cache.task_list().unwrap();
    assert_eq!(before.loaded_count(), 2);
    assert_eq!(after.loaded_count(), 1);
    assert!(!Arc::ptr_eq(&before, &after));
  }

  #[test]
  fn test_update_missing_is_noop() {
    let cache = cache();
    assert!(!cache.update_task(3, |t| t.clone()));
    assert!(cache.task(3).is_none());
  }

  #[test]
  fn test_invalidate_marks_stale_and_counts() {
    let cache = cache();
    let key = QueryKey::task_list();
    cache.set(key, list(&[&[1]], 1));

    cache.invalidate(&key);
    assert!(cache.is_stale(&key));
    assert_eq!(cache.invalidations(&key), 1);
    // Data survives invalidation
    assert!(cache.task_list().is_some());

    cache.set(key, list(&[&[1]], 1));
    assert!(!cache.is_stale(&key));
  }

  #[test]
  fn test_remove_keeps_observed_entry_bookkeeping() {
    let cache = cache();
    let key = QueryKey::task(5);
    cache.subscribe(key);
    cache.set(key, task(5));

    cache.remove(&key);
    assert!(cache.task(5).is_none());
    assert_eq!(cache.observers(&key), 1);
    assert_eq!(cache.invalidations(&key), 1);
  }

  #[test]
  fn test_remove_unobserved_entry_drops_it() {
    let cache = cache();
    cache.set(QueryKey::task(5), task(5));
    cache.remove(&QueryKey::task(5));
    assert_eq!(cache.len(), 0);
  }

  #[test]
  fn test_clear_leaves_observers_alone() {
    let cache = cache();
    let key = QueryKey::task(5);
    cache.subscribe(key);
    cache.set(key, task(5));

    cache.clear(&key);
    assert!(cache.task(5).is_none());
    assert!(cache.is_stale(&key));
    assert_eq!(cache.invalidations(&key), 0);
    assert_eq!(cache.observers(&key), 1);
  }

  #[test]
  fn test_restore_absent_snapshot_clears_value() {
    let cache = cache();
    let key = QueryKey::task(2);
    cache.set(key, task(2));
    cache.restore(key, None);
    assert!(cache.get(&key).is_none());
  }

  #[test]
  fn test_cancel_bumps_epoch() {
    let cache = cache();
    let key = QueryKey::task_list();
    assert_eq!(cache.epoch(&key), 0);
    cache.cancel(&key);
    cache.cancel(&key);
    assert_eq!(cache.epoch(&key), 2);
  }

  #[test]
  fn test_gc_reclaims_only_idle_unobserved_entries() {
    let cache = cache();
    let watched = QueryKey::task_list();
    let idle = QueryKey::task(1);

    cache.subscribe(watched);
    cache.set(watched, list(&[&[1]], 1));
    cache.subscribe(idle);
    cache.set(idle, task(1));
    cache.unsubscribe(&idle);

    let now = Instant::now();
    assert_eq!(cache.gc(now), 0);
    assert_eq!(cache.gc(now + Duration::from_secs(301)), 1);
    assert!(cache.task(1).is_none());
    assert!(cache.task_list().is_some());
  }

  #[test]
  fn test_gc_reclaims_never_observed_entries() {
    let cache = cache();
    cache.set(QueryKey::task(1), task(1));
    cache.restore(QueryKey::task(2), Some(task(2).into()));

    let now = Instant::now();
    assert_eq!(cache.gc(now), 0);
    assert_eq!(cache.gc(now + Duration::from_secs(301)), 2);
    assert_eq!(cache.len(), 0);
  }
}
