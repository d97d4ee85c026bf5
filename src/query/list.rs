use crate::cache::{InfiniteData, QueryCache, QueryKey};
use crate::query::fetch::{InFlight, Poll};
use crate::query::QueryStatus;
use crate::tasks::{ApiError, Page, TaskClient};
use std::sync::Arc;
use tracing::{debug, warn};

const KEY: QueryKey = QueryKey::task_list();

/// What a list fetch produces
#[derive(Debug)]
enum Fetched {
  /// One more page, fetched at `cursor`
  NextPage { cursor: usize, page: Page },
  /// A complete replacement (initial load or refetch)
  Replace(InfiniteData),
}

#[derive(Debug)]
struct PendingFetch {
  next_page: bool,
  /// Cache epoch the fetch started under
  epoch: u64,
  handle: InFlight<Result<Fetched, ApiError>>,
}

/// Infinite task list query.
///
/// Pages live in the [`QueryCache`]; this handle only tracks fetch status.
/// At most one fetch runs at a time, so page `i + 1` is always requested with
/// the cursor page `i` reported.
pub struct TaskListQuery {
  client: TaskClient,
  cache: QueryCache,
  page_size: usize,
  status: QueryStatus,
  error: Option<ApiError>,
  pending: Option<PendingFetch>,
  seen_invalidations: u64,
}

impl TaskListQuery {
  pub fn new(client: TaskClient, cache: QueryCache, page_size: usize) -> Self {
    cache.subscribe(KEY);
    let status = if cache.task_list().is_some() {
      QueryStatus::Success
    } else {
      QueryStatus::Idle
    };
    let seen_invalidations = cache.invalidations(&KEY);

    Self {
      client,
      cache,
      page_size: page_size.max(1),
      status,
      error: None,
      pending: None,
      seen_invalidations,
    }
  }

  pub fn data(&self) -> Option<Arc<InfiniteData>> {
    self.cache.task_list()
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  /// First load in progress, nothing to show yet
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_fetching(&self) -> bool {
    self.pending.is_some()
  }

  pub fn is_fetching_next_page(&self) -> bool {
    self.pending.as_ref().is_some_and(|p| p.next_page)
  }

  pub fn has_next_page(&self) -> bool {
    self.data().is_some_and(|data| data.has_next_page())
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Load the first page, or refresh cached pages that went stale.
  pub fn fetch(&mut self) {
    if self.pending.is_some() {
      return;
    }
    match self.data() {
      None => self.start_refetch(0),
      Some(data) if self.cache.is_stale(&KEY) => self.start_refetch(data.pages.len()),
      Some(_) => self.status = QueryStatus::Success,
    }
  }

  /// Request the page after the last loaded one.
  ///
  /// Returns false (and does nothing) while another fetch is running or when
  /// the server reported no more items.
  pub fn fetch_next_page(&mut self) -> bool {
    if self.pending.is_some() {
      return false;
    }
    let Some(cursor) = self.data().and_then(|data| data.next_cursor()) else {
      return false;
    };

    debug!(cursor, "fetching next task page");
    let client = self.client.clone();
    let limit = self.page_size;
    self.start(true, async move {
      let page = client.list(cursor, limit).await?;
      Ok(Fetched::NextPage { cursor, page })
    });
    true
  }

  /// Reload every loaded page from the start of the list.
  pub fn refetch(&mut self) {
    self.pending = None;
    let pages = self.data().map(|data| data.pages.len()).unwrap_or(0);
    self.start_refetch(pages);
  }

  /// Walk the cursor chain again for up to `pages` pages (at least one).
  fn start_refetch(&mut self, pages: usize) {
    let client = self.client.clone();
    let limit = self.page_size;
    let pages = pages.max(1);
    debug!(pages, "fetching task list");

    if self.data().is_none() {
      self.status = QueryStatus::Loading;
    }
    self.start(false, async move {
      let mut data = InfiniteData::default();
      let mut cursor = 0;
      for _ in 0..pages {
        let page = client.list(cursor, limit).await?;
        let next = page.next_cursor;
        data.pages.push(page);
        data.page_params.push(cursor);
        match next {
          Some(c) => cursor = c,
          None => break,
        }
      }
      Ok(Fetched::Replace(data))
    });
  }

  fn start<Fut>(&mut self, next_page: bool, future: Fut)
  where
    Fut: std::future::Future<Output = Result<Fetched, ApiError>> + Send + 'static,
  {
    self.seen_invalidations = self.cache.invalidations(&KEY);
    self.pending = Some(PendingFetch {
      next_page,
      epoch: self.cache.epoch(&KEY),
      handle: InFlight::spawn(future),
    });
  }

  /// Collect a finished fetch, or start one the cache asked for.
  ///
  /// Returns `true` if the state changed. Call this on every tick.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else {
      return self.refetch_if_invalidated();
    };

    if self.cache.epoch(&KEY) != pending.epoch {
      debug!("task list fetch superseded by a mutation");
      self.pending = None;
      self.status = self.settled_status();
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
      Ok(Fetched::Replace(data)) => {
        self.cache.set(KEY, data);
        self.error = None;
        self.status = QueryStatus::Success;
      }
      Ok(Fetched::NextPage { cursor, page }) => {
        let expected = self.data().and_then(|data| data.next_cursor());
        if expected == Some(cursor) {
          self
            .cache
            .update_task_list(|data| data.with_page(cursor, page));
        } else {
          debug!(cursor, ?expected, "dropping page that no longer continues the list");
        }
        self.error = None;
        self.status = QueryStatus::Success;
      }
      Err(e) => {
        warn!(error = %e, "task list fetch failed");
        self.error = Some(e);
        self.status = QueryStatus::Error;
      }
    }
    true
  }

  fn refetch_if_invalidated(&mut self) -> bool {
    let invalidations = self.cache.invalidations(&KEY);
    if invalidations == self.seen_invalidations {
      return false;
    }
    debug!("task list invalidated, refetching");
    self.refetch();
    true
  }

  fn settled_status(&self) -> QueryStatus {
    match (&self.error, self.data()) {
      (Some(_), _) => QueryStatus::Error,
      (None, Some(_)) => QueryStatus::Success,
      (None, None) => QueryStatus::Idle,
    }
  }
}

impl Drop for TaskListQuery {
  fn drop(&mut self) {
    self.cache.unsubscribe(&KEY);
  }
}
