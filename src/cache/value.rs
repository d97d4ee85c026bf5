//! Values held by cache entries.
//!
//! Everything here is immutable once shared: transforms return new values and
//! leave the receiver untouched, so renders holding an older `Arc` keep a
//! consistent view.

use crate::tasks::{Page, Task, TaskId};
use std::sync::Arc;

/// Pages of the infinite list in request order.
///
/// `page_params[i]` is the cursor page `i` was fetched with, so
/// `page_params[i + 1] == pages[i].next_cursor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfiniteData {
  pub pages: Vec<Page>,
  pub page_params: Vec<usize>,
}

impl InfiniteData {
  pub fn first(page: Page) -> Self {
    Self {
      pages: vec![page],
      page_params: vec![0],
    }
  }

  /// All loaded tasks, concatenated in page order
  pub fn tasks(&self) -> impl Iterator<Item = &Task> {
    self.pages.iter().flat_map(|page| page.tasks.iter())
  }

  pub fn task_at(&self, mut index: usize) -> Option<&Task> {
    for page in &self.pages {
      if index < page.tasks.len() {
        return page.tasks.get(index);
      }
      index -= page.tasks.len();
    }
    None
  }

  pub fn loaded_count(&self) -> usize {
    self.pages.iter().map(|page| page.tasks.len()).sum()
  }

  /// Whether the server reported more items after the last page
  pub fn has_next_page(&self) -> bool {
    self.next_cursor().is_some()
  }

  pub fn next_cursor(&self) -> Option<usize> {
    self
      .pages
      .last()
      .filter(|page| page.has_more)
      .and_then(|page| page.next_cursor)
  }

  /// Collection size as reported by the first page
  pub fn total(&self) -> usize {
    self.pages.first().map(|page| page.total).unwrap_or(0)
  }

  pub fn contains(&self, id: TaskId) -> bool {
    self.tasks().any(|task| task.id == id)
  }

  /// New value with `page` appended, fetched at `cursor`
  pub fn with_page(&self, cursor: usize, page: Page) -> Self {
    let mut next = self.clone();
    next.pages.push(page);
    next.page_params.push(cursor);
    next
  }

  /// New value with `f` applied to every occurrence of task `id`.
  pub fn map_task(&self, id: TaskId, f: impl Fn(&Task) -> Task) -> Self {
    Self {
      pages: self
        .pages
        .iter()
        .map(|page| Page {
          tasks: page
            .tasks
            .iter()
            .map(|task| if task.id == id { f(task) } else { task.clone() })
            .collect(),
          ..page.clone()
        })
        .collect(),
      page_params: self.page_params.clone(),
    }
  }

  /// New value without task `id`; cursors and totals are left as fetched.
  pub fn without_task(&self, id: TaskId) -> Self {
    Self {
      pages: self
        .pages
        .iter()
        .map(|page| Page {
          tasks: page
            .tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect(),
          ..page.clone()
        })
        .collect(),
      page_params: self.page_params.clone(),
    }
  }
}

/// Shared, immutable value of a cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
  List(Arc<InfiniteData>),
  Item(Arc<Task>),
}

impl CachedValue {
  pub fn as_list(&self) -> Option<&Arc<InfiniteData>> {
    match self {
      CachedValue::List(data) => Some(data),
      CachedValue::Item(_) => None,
    }
  }

  pub fn as_item(&self) -> Option<&Arc<Task>> {
    match self {
      CachedValue::Item(task) => Some(task),
      CachedValue::List(_) => None,
    }
  }
}

impl From<InfiniteData> for CachedValue {
  fn from(data: InfiniteData) -> Self {
    CachedValue::List(Arc::new(data))
  }
}

impl From<Task> for CachedValue {
  fn from(task: Task) -> Self {
    CachedValue::Item(Arc::new(task))
  }
}


#[cfg(test)]
mod tests {
  use super::fixtures::list;
  use super::*;

  fn ids(data: &InfiniteData) -> Vec<TaskId> {
    data.tasks().map(|t| t.id).collect()
  }

  #[test]
  fn test_concatenation_in_page_order() {
    let data = list(&[&[10, 9, 8], &[7, 6, 5]], 10);
    assert_eq!(ids(&data), vec![10, 9, 8, 7, 6, 5]);
    assert_eq!(data.loaded_count(), 6);
    assert_eq!(data.task_at(4).map(|t| t.id), Some(6));
    assert_eq!(data.task_at(6), None);
  }

  #[test]
  fn test_cursor_chain() {
    let data = list(&[&[10, 9, 8], &[7, 6, 5]], 10);
    assert_eq!(data.page_params, vec![0, 3]);
    assert_eq!(data.pages[0].next_cursor, Some(data.page_params[1]));
    assert_eq!(data.next_cursor(), Some(6));
    assert!(data.has_next_page());
  }

  #[test]
  fn test_map_task_leaves_original_untouched() {
    let data = list(&[&[3, 2], &[1]], 3);
    let patched = data.map_task(2, |t| Task {
      completed: true,
      ..t.clone()
    });

    assert!(patched.tasks().find(|t| t.id == 2).unwrap().completed);
    assert!(!data.tasks().find(|t| t.id == 2).unwrap().completed);
    assert_eq!(patched.page_params, data.page_params);
  }

  #[test]
  fn test_without_task_keeps_cursors() {
    let data = list(&[&[3, 2], &[1]], 5);
    let removed = data.without_task(2);

    assert_eq!(ids(&removed), vec![3, 1]);
    assert_eq!(removed.next_cursor(), data.next_cursor());
    assert!(!removed.contains(2));
    assert!(data.contains(2));
  }

  #[test]
  fn test_total_from_first_page() {
    let mut data = list(&[&[3, 2]], 5);
    data = data.with_page(2, Page::from_response(2, vec![], 7));
    assert_eq!(data.total(), 5);
  }
}
