/// One rendered entry of a virtualized list.
///
/// `offset` is the distance from the top of the scrollable content, in the
/// same units as the viewport (terminal rows for the TUI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualItem {
  pub index: usize,
  pub offset: f64,
  pub size: f64,
}

impl VirtualItem {
  pub fn end(&self) -> f64 {
    self.offset + self.size
  }
}

/// Inclusive index range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualRange {
  pub start: usize,
  pub end: usize,
}

impl VirtualRange {
  pub fn contains(&self, index: usize) -> bool {
    self.start <= index && index <= self.end
  }
}

/// Where `scroll_to_index` puts the target item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
  /// Item at the top of the viewport
  Start,
  /// Item at the bottom of the viewport
  End,
  /// Scroll as little as possible; no-op if already fully visible
  #[default]
  Auto,
}
