use crate::virtual_list::types::{Align, VirtualItem, VirtualRange};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

/// Estimated size of item `index` for a viewport of the given width
pub type SizeEstimator = Box<dyn Fn(usize, f64) -> f64>;

/// Window computation over a list of variable-size items.
///
/// Item starts are kept as prefix sums that are rebuilt lazily from the
/// first index whose size changed, so scrolling alone never recomputes
/// them.
pub struct Virtualizer {
  count: usize,
  overscan: usize,
  width: f64,
  height: f64,
  scroll_offset: f64,
  estimate: SizeEstimator,
  measured: HashMap<usize, f64>,
  /// `offsets[i]` is the start of item `i`; `offsets[count]` is the total size
  offsets: RefCell<Vec<f64>>,
  /// Number of leading entries of `offsets` that are up to date
  valid: Cell<usize>,
}

impl fmt::Debug for Virtualizer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Virtualizer")
      .field("count", &self.count)
      .field("overscan", &self.overscan)
      .field("viewport", &(self.width, self.height))
      .field("scroll_offset", &self.scroll_offset)
      .field("measured", &self.measured.len())
      .finish()
  }
}

impl Virtualizer {
  pub fn new(count: usize, overscan: usize, estimate: impl Fn(usize, f64) -> f64 + 'static) -> Self {
    Self {
      count,
      overscan,
      width: 0.0,
      height: 0.0,
      scroll_offset: 0.0,
      estimate: Box::new(estimate),
      measured: HashMap::new(),
      offsets: RefCell::new(vec![0.0]),
      valid: Cell::new(1),
    }
  }

  pub fn count(&self) -> usize {
    self.count
  }

  pub fn scroll_offset(&self) -> f64 {
    self.scroll_offset
  }

  pub fn viewport_height(&self) -> f64 {
    self.height
  }

  /// Change the number of items. Shrinking clamps the scroll offset to the
  /// new content size.
  pub fn set_count(&mut self, count: usize) {
    if count == self.count {
      return;
    }
    let first_changed = count.min(self.count);
    self.count = count;
    self.measured.retain(|&index, _| index < count);
    self.invalidate_from(first_changed);
    self.clamp_scroll();
  }

  /// Resize the viewport. A width change drops every measurement, since
  /// sizes depend on the width.
  pub fn set_viewport(&mut self, width: f64, height: f64) {
    if width != self.width {
      self.width = width;
      self.measured.clear();
      self.invalidate_from(0);
    }
    self.height = height.max(0.0);
    self.clamp_scroll();
  }

  pub fn set_scroll_offset(&mut self, offset: f64) {
    self.scroll_offset = offset;
    self.clamp_scroll();
  }

  pub fn scroll_by(&mut self, delta: f64) {
    self.set_scroll_offset(self.scroll_offset + delta);
  }

  /// Scroll so item `index` is visible according to `align`.
  pub fn scroll_to_index(&mut self, index: usize, align: Align) {
    if self.count == 0 {
      return;
    }
    let index = index.min(self.count - 1);
    let start = self.offset_of(index);
    let end = start + self.size_of(index);

    let target = match align {
      Align::Start => start,
      Align::End => end - self.height,
      Align::Auto => {
        if start < self.scroll_offset {
          start
        } else if end > self.scroll_offset + self.height {
          end - self.height
        } else {
          return;
        }
      }
    };
    self.set_scroll_offset(target);
  }

  /// Record the real size of a rendered item. Returns true if it changed.
  pub fn measure(&mut self, index: usize, size: f64) -> bool {
    if index >= self.count || self.size_of(index) == size {
      return false;
    }
    self.measured.insert(index, size);
    self.invalidate_from(index);
    self.clamp_scroll();
    true
  }

  pub fn size_of(&self, index: usize) -> f64 {
    match self.measured.get(&index) {
      Some(size) => *size,
      None => (self.estimate)(index, self.width).max(0.0),
    }
  }

  /// Start of item `index`; `offset_of(count)` is the total size.
  pub fn offset_of(&self, index: usize) -> f64 {
    let index = index.min(self.count);
    self.ensure_offsets();
    self.offsets.borrow()[index]
  }

  pub fn total_size(&self) -> f64 {
    self.offset_of(self.count)
  }

  pub fn max_scroll_offset(&self) -> f64 {
    (self.total_size() - self.height).max(0.0)
  }

  /// Index of the item covering `offset`, clamped to the last item.
  pub fn item_at_offset(&self, offset: f64) -> Option<usize> {
    if self.count == 0 {
      return None;
    }
    self.ensure_offsets();
    let offsets = self.offsets.borrow();
    // Items whose start is <= offset, minus one
    let after = offsets[..self.count].partition_point(|&start| start <= offset);
    Some(after.saturating_sub(1))
  }

  /// Items intersecting the viewport, without overscan.
  ///
  /// The bottom edge is inclusive: an item starting exactly at
  /// `scroll_offset + height` counts as visible.
  pub fn visible_range(&self) -> Option<VirtualRange> {
    let start = self.item_at_offset(self.scroll_offset)?;
    let end = self
      .item_at_offset(self.scroll_offset + self.height)?
      .max(start);
    Some(VirtualRange { start, end })
  }

  /// Visible range widened by the overscan and clamped to `[0, count)`.
  pub fn range(&self) -> Option<VirtualRange> {
    let visible = self.visible_range()?;
    Some(VirtualRange {
      start: visible.start.saturating_sub(self.overscan),
      end: (visible.end + self.overscan).min(self.count - 1),
    })
  }

  /// Items to render, in index order.
  pub fn virtual_items(&self) -> Vec<VirtualItem> {
    let Some(range) = self.range() else {
      return Vec::new();
    };
    self.ensure_offsets();
    let offsets = self.offsets.borrow();
    (range.start..=range.end)
      .map(|index| VirtualItem {
        index,
        offset: offsets[index],
        size: offsets[index + 1] - offsets[index],
      })
      .collect()
  }

  /// Forget offsets that depend on the size of item `index` or later.
  fn invalidate_from(&self, index: usize) {
    // offsets[i] only depends on items before i
    let keep = index + 1;
    if keep < self.valid.get() {
      self.valid.set(keep);
    }
  }

  fn ensure_offsets(&self) {
    let len = self.count + 1;
    let valid = self.valid.get().min(len);
    if valid == len && self.offsets.borrow().len() == len {
      return;
    }

    let mut offsets = self.offsets.borrow_mut();
    offsets.truncate(valid);
    let mut running = offsets[valid - 1];
    for index in valid - 1..self.count {
      running += self.size_of(index);
      offsets.push(running);
    }
    self.valid.set(len);
  }

  fn clamp_scroll(&mut self) {
    self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll_offset());
  }
}

/// Whether the rendered window reached the end of the list and the next page
/// should be requested.
///
/// `threshold` starts the fetch that many rows before the last one. Never
/// fires while a fetch is in flight, so repeated scroll events before it
/// settles are ignored.
pub fn should_fetch_more(
  last_index: Option<usize>,
  count: usize,
  has_more: bool,
  in_flight: bool,
  threshold: usize,
) -> bool {
  let Some(last_index) = last_index else {
    return false;
  };
  has_more && !in_flight && count > 0 && last_index + threshold >= count - 1
}
