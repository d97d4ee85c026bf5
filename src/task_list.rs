//! Glue between the list query and the virtualizer.
//!
//! The logical list has one row per loaded task plus a trailing row that is
//! either a loader (more pages exist) or an end banner (everything loaded).

use crate::cache::{InfiniteData, QueryCache};
use crate::config::ListConfig;
use crate::query::TaskListQuery;
use crate::tasks::{Task, TaskClient};
use crate::virtual_list::{should_fetch_more, Virtualizer};
use std::sync::Arc;
use tracing::debug;

/// What to draw at a logical index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a> {
  Task(&'a Task),
  /// Placeholder for the next page
  Loader { fetching: bool },
  /// Every task has been loaded
  End { loaded: usize },
}

impl Row<'_> {
  /// Text of the trailing row, `None` for task rows
  pub fn banner(&self) -> Option<String> {
    match self {
      Row::Task(_) => None,
      Row::Loader { fetching: true } => Some("Loading more tasks...".to_string()),
      Row::Loader { fetching: false } => Some("Scroll to load more".to_string()),
      Row::End { loaded } => Some(format!("All {loaded} tasks loaded")),
    }
  }
}

/// Figures shown in the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
  /// Collection size reported with the first page
  pub total: usize,
  pub loaded: usize,
}

pub struct TaskListModel {
  query: TaskListQuery,
  virtualizer: Virtualizer,
  data: Option<Arc<InfiniteData>>,
  prefetch_rows: usize,
}

impl TaskListModel {
  pub fn new(client: TaskClient, cache: QueryCache, page_size: usize, config: &ListConfig) -> Self {
    let query = TaskListQuery::new(client, cache, page_size);
    let (regular, compact) = (config.row_height, config.compact_row_height);
    let breakpoint = f64::from(config.compact_breakpoint);
    let virtualizer = Virtualizer::new(0, config.overscan, move |_, width| {
      if width < breakpoint {
        compact
      } else {
        regular
      }
    });

    let mut model = Self {
      query,
      virtualizer,
      data: None,
      prefetch_rows: config.prefetch_rows,
    };
    model.refresh_data();
    model
  }

  pub fn query(&self) -> &TaskListQuery {
    &self.query
  }

  pub fn query_mut(&mut self) -> &mut TaskListQuery {
    &mut self.query
  }

  pub fn virtualizer(&self) -> &Virtualizer {
    &self.virtualizer
  }

  pub fn virtualizer_mut(&mut self) -> &mut Virtualizer {
    &mut self.virtualizer
  }

  pub fn loaded(&self) -> usize {
    self.data.as_ref().map(|data| data.loaded_count()).unwrap_or(0)
  }

  fn has_more(&self) -> bool {
    self.data.as_ref().is_some_and(|data| data.has_next_page())
  }

  pub fn row_count(&self) -> usize {
    let loaded = self.loaded();
    if self.has_more() || loaded > 0 {
      loaded + 1
    } else {
      loaded
    }
  }

  pub fn row(&self, index: usize) -> Option<Row<'_>> {
    let data = self.data.as_ref()?;
    let loaded = data.loaded_count();
    if index < loaded {
      return data.task_at(index).map(Row::Task);
    }
    if index != loaded || index >= self.row_count() {
      return None;
    }
    if data.has_next_page() {
      Some(Row::Loader {
        fetching: self.query.is_fetching_next_page(),
      })
    } else {
      Some(Row::End { loaded })
    }
  }

  pub fn task_at(&self, index: usize) -> Option<&Task> {
    self.data.as_ref().and_then(|data| data.task_at(index))
  }

  pub fn stats(&self) -> ListStats {
    ListStats {
      total: self.data.as_ref().map(|data| data.total()).unwrap_or(0),
      loaded: self.loaded(),
    }
  }

  /// Collect query results, resize the virtualizer and request the next page
  /// once the trailing row comes into the rendered window.
  ///
  /// Returns `true` if anything visible changed.
  pub fn sync(&mut self) -> bool {
    let mut changed = self.query.poll();
    changed |= self.refresh_data();

    let last = self.virtualizer.range().map(|range| range.end);
    let count = self.virtualizer.count();
    if should_fetch_more(
      last,
      count,
      self.has_more(),
      self.query.is_fetching(),
      self.prefetch_rows,
    ) {
      debug!(?last, count, "trailing row visible, loading next page");
      changed |= self.query.fetch_next_page();
    }
    changed
  }

  /// Take a fresh snapshot of the cached pages
  fn refresh_data(&mut self) -> bool {
    let data = self.query.data();
    let same = match (&self.data, &data) {
      (Some(a), Some(b)) => Arc::ptr_eq(a, b),
      (None, None) => true,
      _ => false,
    };
    self.data = data;
    self.virtualizer.set_count(self.row_count());
    !same
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::fixtures::list;
  use crate::cache::QueryKey;
  use crate::config::PaginationDialect;
  use crate::query::poll_until;
  use crate::tasks::client::test_support::{client_for, tasks_json};
  use crate::tasks::TaskId;
  use std::time::Duration;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn cache() -> QueryCache {
    QueryCache::new(Duration::from_secs(60), Duration::from_secs(300))
  }

  fn model_with(cache: QueryCache, uri: &str) -> TaskListModel {
    let client = client_for(uri, PaginationDialect::Offset);
    let mut model = TaskListModel::new(client, cache, 20, &ListConfig::default());
    model.virtualizer_mut().set_viewport(100.0, 40.0);
    model
  }

  #[test]
  fn test_rows_with_more_pages() {
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&[3, 2]], 5));
    let model = model_with(cache, "http://localhost:1");

    assert_eq!(model.row_count(), 3);
    assert!(matches!(model.row(0), Some(Row::Task(t)) if t.id == 3));
    assert_eq!(model.row(2), Some(Row::Loader { fetching: false }));
    assert_eq!(model.row(3), None);
    assert_eq!(model.stats(), ListStats { total: 5, loaded: 2 });
    assert_eq!(model.row(2).and_then(|r| r.banner()).as_deref(), Some("Scroll to load more"));
  }

  #[test]
  fn test_rows_when_exhausted() {
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&[2, 1]], 2));
    let model = model_with(cache, "http://localhost:1");

    assert_eq!(model.row_count(), 3);
    assert_eq!(model.row(2), Some(Row::End { loaded: 2 }));
    assert_eq!(
      model.row(2).and_then(|r| r.banner()).as_deref(),
      Some("All 2 tasks loaded")
    );
  }

  #[test]
  fn test_empty_collection_has_no_rows() {
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&[]], 0));
    let model = model_with(cache, "http://localhost:1");

    assert_eq!(model.row_count(), 0);
    assert_eq!(model.row(0), None);
  }

  #[test]
  fn test_stats_use_first_page_total() {
    let cache = cache();
    let mut data = list(&[&[5, 4], &[3, 2]], 6);
    data.pages[1].total = 9;
    cache.set(QueryKey::task_list(), data);
    let model = model_with(cache, "http://localhost:1");

    assert_eq!(model.stats(), ListStats { total: 6, loaded: 4 });
  }

  #[test]
  fn test_row_height_follows_breakpoint() {
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&[2, 1]], 2));
    let mut model = model_with(cache, "http://localhost:1");

    assert_eq!(model.virtualizer().total_size(), 12.0);
    model.virtualizer_mut().set_viewport(60.0, 40.0);
    assert_eq!(model.virtualizer().total_size(), 15.0);
  }

  #[tokio::test]
  async fn test_next_page_requested_once_while_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks"))
      .and(query_param("_start", "20"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("X-Total-Count", "45")
          .set_body_json(tasks_json((6..=25).rev()))
          .set_delay(Duration::from_millis(50)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let first: Vec<TaskId> = (26..=45).rev().collect();
    let cache = cache();
    cache.set(QueryKey::task_list(), list(&[&first], 45));
    let mut model = model_with(cache, &server.uri());

    // Trailing row out of the window: nothing to do
    assert_eq!(model.row_count(), 21);
    assert!(!model.sync());
    assert!(!model.query().is_fetching());

    model.virtualizer_mut().set_scroll_offset(f64::MAX);
    assert!(model.sync());
    assert_eq!(model.row(20), Some(Row::Loader { fetching: true }));

    // Rapid scroll events before the page arrives
    model.virtualizer_mut().scroll_by(-1.0);
    model.sync();
    model.virtualizer_mut().scroll_by(1.0);
    model.sync();

    poll_until(|| model.sync()).await;
    assert_eq!(model.loaded(), 40);
    assert_eq!(model.row_count(), 41);
  }
}
