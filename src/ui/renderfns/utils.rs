use crate::tasks::Priority;
use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
  }
}

/// Break `text` into at most `max_lines` lines of `width` characters; the
/// last line is truncated if text remains.
pub fn wrap(text: &str, width: usize, max_lines: usize) -> Vec<String> {
  if width == 0 || max_lines == 0 {
    return Vec::new();
  }

  let mut lines: Vec<String> = Vec::new();
  let mut current = String::new();
  for word in text.split_whitespace() {
    let needed = if current.is_empty() {
      word.chars().count()
    } else {
      current.chars().count() + 1 + word.chars().count()
    };
    if needed > width && !current.is_empty() {
      lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(word);
  }
  if !current.is_empty() {
    lines.push(current);
  }

  if lines.len() > max_lines {
    // Squash the overflow into the last line so truncation marks it
    let rest = lines.split_off(max_lines - 1).join(" ");
    lines.push(rest);
  }
  lines
    .into_iter()
    .map(|line| truncate(&line, width))
    .collect()
}

pub fn priority_color(priority: Priority) -> Color {
  match priority {
    Priority::Low => Color::Gray,
    Priority::Medium => Color::Blue,
    Priority::High => Color::Yellow,
    Priority::Critical => Color::Red,
  }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
  date.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ééééééé", 5), "éé...");
  }

  #[test]
  fn test_wrap_breaks_on_words() {
    assert_eq!(wrap("one two three four", 9, 3), vec!["one two", "three", "four"]);
  }

  #[test]
  fn test_wrap_truncates_overflow() {
    let lines = wrap("one two three four five", 9, 2);
    assert_eq!(lines, vec!["one two", "three..."]);
  }

  #[test]
  fn test_wrap_empty() {
    assert!(wrap("", 10, 2).is_empty());
    assert!(wrap("text", 10, 0).is_empty());
  }

  #[test]
  fn test_priority_colors() {
    assert_eq!(priority_color(Priority::Low), Color::Gray);
    assert_eq!(priority_color(Priority::Medium), Color::Blue);
    assert_eq!(priority_color(Priority::High), Color::Yellow);
    assert_eq!(priority_color(Priority::Critical), Color::Red);
  }
}
