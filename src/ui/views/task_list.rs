use crate::app::AppContext;
use crate::query::{MutationRunner, QueryStatus, TaskUpdate, UpdateTask};
use crate::task_list::{ListStats, Row, TaskListModel};
use crate::tasks::{Task, TaskPatch};
use crate::ui::renderfns::{format_date, priority_color, truncate, wrap};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{TaskDetailView, TaskFormView};
use crate::virtual_list::Align;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Lines moved per mouse wheel notch
const SCROLL_STEP: f64 = 3.0;

/// Infinitely scrolling task list; the root view.
pub struct TaskListView {
  ctx: AppContext,
  model: TaskListModel,
  selected: usize,
  toggle: MutationRunner<UpdateTask>,
}

impl TaskListView {
  pub fn new(ctx: AppContext) -> Self {
    let mut model = TaskListModel::new(
      ctx.client.clone(),
      ctx.cache.clone(),
      ctx.page_size,
      &ctx.list,
    );
    model.query_mut().fetch();
    let toggle = MutationRunner::new(UpdateTask::new(ctx.client.clone()), ctx.cache.clone());

    Self {
      ctx,
      model,
      selected: 0,
      toggle,
    }
  }

  fn selected_task(&self) -> Option<&Task> {
    self.model.task_at(self.selected)
  }

  /// Move the selection and keep it on screen. Reaching the last loaded task
  /// also brings the trailing row into view, which requests the next page.
  fn select(&mut self, index: usize) {
    let loaded = self.model.loaded();
    if loaded == 0 {
      self.selected = 0;
      return;
    }
    self.selected = index.min(loaded - 1);

    let virtualizer = self.model.virtualizer_mut();
    if self.selected + 1 == loaded && virtualizer.count() > loaded {
      virtualizer.scroll_to_index(loaded, Align::Auto);
    }
    virtualizer.scroll_to_index(self.selected, Align::Auto);
  }

  /// Rows that fit in the viewport, at least one
  fn page_rows(&self) -> usize {
    self
      .model
      .virtualizer()
      .visible_range()
      .map(|range| (range.end - range.start).max(1))
      .unwrap_or(1)
  }

  fn toggle_selected(&mut self) {
    let Some(task) = self.selected_task() else {
      return;
    };
    let update = TaskUpdate {
      id: task.id,
      patch: TaskPatch::completed(!task.completed),
    };
    self.toggle.mutate(update);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.model.query().status() {
      QueryStatus::Loading => " Tasks (loading...) ".to_string(),
      _ if self.model.query().is_fetching() => " Tasks (refreshing...) ".to_string(),
      _ => " Tasks ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    self
      .model
      .virtualizer_mut()
      .set_viewport(f64::from(inner.width), f64::from(inner.height));

    if self.model.row_count() == 0 {
      let content = if self.model.query().is_loading() {
        "Loading tasks...".to_string()
      } else if let Some(e) = self.model.query().error() {
        format!("Failed to load tasks: {}\n\nPress 'r' to retry.", e)
      } else {
        "No tasks yet. Press 'n' to create one.".to_string()
      };
      let paragraph = Paragraph::new(content)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
      frame.render_widget(paragraph, inner);
      return;
    }

    let canvas = self.canvas(inner.width as usize, inner.height as usize);
    frame.render_widget(Paragraph::new(canvas), inner);
  }

  /// Lay the rendered window out on `height` terminal lines, clipping rows
  /// that are partly scrolled out.
  fn canvas(&self, width: usize, height: usize) -> Vec<Line<'static>> {
    let mut canvas = vec![Line::default(); height];
    let virtualizer = self.model.virtualizer();
    let scroll = virtualizer.scroll_offset();

    for item in virtualizer.virtual_items() {
      let top = (item.offset - scroll).floor() as i64;
      let size = item.size.round().max(1.0) as usize;
      let Some(row) = self.model.row(item.index) else {
        continue;
      };
      let lines = match row {
        Row::Task(task) => task_card(task, item.index == self.selected, width, size),
        other => banner(&other, size),
      };
      for (offset, line) in lines.into_iter().enumerate() {
        let y = top + offset as i64;
        if (0..height as i64).contains(&y) {
          canvas[y as usize] = line;
        }
      }
    }
    canvas
  }
}

/// A task rendered on `size` lines: title, wrapped description, metadata
/// and a spacer.
fn task_card(task: &Task, selected: bool, width: usize, size: usize) -> Vec<Line<'static>> {
  let priority = task.effective_priority();
  let (marker, base) = if selected {
    ("▌", Style::default().bg(Color::DarkGray))
  } else {
    (" ", Style::default())
  };
  let title_style = if task.completed {
    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
  } else {
    Style::default().fg(Color::White).bold()
  };
  let tag = format!(" {} ", priority);
  let title_width = width.saturating_sub(6 + tag.len());

  let mut lines = vec![Line::from(vec![
    Span::styled(marker, Style::default().fg(Color::Cyan)),
    Span::raw(if task.completed { "[x] " } else { "[ ] " }),
    Span::styled(truncate(&task.title, title_width), title_style),
    Span::raw(" "),
    Span::styled(tag, Style::default().fg(Color::Black).bg(priority_color(priority))),
  ])];

  let description_lines = size.saturating_sub(3);
  if description_lines > 0 {
    let wrapped = wrap(&task.description, width.saturating_sub(5), description_lines);
    for i in 0..description_lines {
      let text = wrapped.get(i).cloned().unwrap_or_default();
      lines.push(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::raw("    "),
        Span::styled(text, Style::default().fg(Color::Gray)),
      ]));
    }
  }

  if size >= 2 {
    lines.push(Line::from(vec![
      Span::styled(marker, Style::default().fg(Color::Cyan)),
      Span::styled(
        format!("    #{} · {}", task.id, format_date(&task.created_at)),
        Style::default().fg(Color::DarkGray),
      ),
    ]));
  }

  lines.truncate(size);
  let mut lines: Vec<Line<'static>> = lines.into_iter().map(|line| line.style(base)).collect();
  // Spacer between cards stays unhighlighted
  while lines.len() < size {
    lines.push(Line::default());
  }
  lines
}

fn banner(row: &Row<'_>, size: usize) -> Vec<Line<'static>> {
  let style = match row {
    Row::Loader { fetching: true } => Style::default().fg(Color::Yellow),
    _ => Style::default().fg(Color::DarkGray),
  };
  let text = row.banner().unwrap_or_default();
  let mut lines = vec![Line::default(); size];
  lines[size / 2] = Line::from(Span::styled(text, style)).centered();
  lines
}

impl View for TaskListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.select(self.selected + 1),
      KeyCode::Char('k') | KeyCode::Up => self.select(self.selected.saturating_sub(1)),
      KeyCode::PageDown => self.select(self.selected + self.page_rows()),
      KeyCode::PageUp => self.select(self.selected.saturating_sub(self.page_rows())),
      KeyCode::Char('g') | KeyCode::Home => self.select(0),
      KeyCode::Char('G') | KeyCode::End => self.select(usize::MAX),
      KeyCode::Char(' ') => self.toggle_selected(),
      KeyCode::Char('r') => self.model.query_mut().refetch(),
      KeyCode::Char('n') => return ViewAction::Push(Box::new(TaskFormView::create(self.ctx.clone()))),
      KeyCode::Enter => {
        if let Some(task) = self.selected_task() {
          return ViewAction::Push(Box::new(TaskDetailView::new(self.ctx.clone(), task.id)));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_scroll(&mut self, lines: i32) {
    self
      .model
      .virtualizer_mut()
      .scroll_by(f64::from(lines) * SCROLL_STEP);
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Tasks".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.toggle.poll();
    self.model.sync();

    // Deletes can shrink the list under the selection
    let loaded = self.model.loaded();
    if loaded > 0 && self.selected >= loaded {
      self.selected = loaded - 1;
    }
    ViewAction::None
  }

  fn error(&self) -> Option<String> {
    if let Some(e) = self.toggle.state().error() {
      return Some(format!("Could not update task: {}", e));
    }
    self
      .model
      .query()
      .error()
      .map(|e| format!("Could not load tasks: {}", e))
  }

  fn stats(&self) -> Option<ListStats> {
    Some(self.model.stats())
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("n", "new").with_priority(20),
      Shortcut::new("space", "done").with_priority(30),
      Shortcut::new("enter", "open").with_priority(40),
      Shortcut::new("r", "refresh").with_priority(50),
      Shortcut::new("q", "quit").with_priority(60),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::test_support::context;
  use crate::cache::fixtures::list;
  use crate::cache::QueryKey;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::buffer::Buffer;
  use ratatui::Terminal;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn screen(buffer: &Buffer) -> String {
    buffer
      .content
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn draw(view: &mut TaskListView, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    screen(terminal.backend().buffer())
  }

  #[test]
  fn test_renders_window_and_end_banner() {
    let ctx = context();
    ctx.cache.set(QueryKey::task_list(), list(&[&[3, 2, 1]], 3));
    let mut view = TaskListView::new(ctx);

    let text = draw(&mut view, 100, 20);
    assert!(text.contains("Task 3"));
    assert!(text.contains("Task 1"));
    assert!(text.contains("All 3 tasks loaded"));
    assert_eq!(view.stats(), Some(ListStats { total: 3, loaded: 3 }));
  }

  #[test]
  fn test_only_visible_window_is_rendered() {
    let ctx = context();
    let ids: Vec<u64> = (1..=50).rev().collect();
    ctx.cache.set(QueryKey::task_list(), list(&[&ids], 500));
    let mut view = TaskListView::new(ctx);

    let text = draw(&mut view, 100, 14);
    assert!(text.contains("Task 50"));
    assert!(!text.contains("Task 20"));
    assert!(!text.contains("Scroll to load more"));
  }

  #[test]
  fn test_selection_is_clamped_to_loaded_tasks() {
    let ctx = context();
    ctx.cache.set(QueryKey::task_list(), list(&[&[3, 2, 1]], 3));
    let mut view = TaskListView::new(ctx);
    draw(&mut view, 100, 20);

    view.handle_key(key(KeyCode::Char('G')));
    assert_eq!(view.selected_task().map(|t| t.id), Some(1));
    view.handle_key(key(KeyCode::Char('j')));
    assert_eq!(view.selected_task().map(|t| t.id), Some(1));
    view.handle_key(key(KeyCode::Char('g')));
    assert_eq!(view.selected_task().map(|t| t.id), Some(3));
  }

  #[tokio::test]
  async fn test_space_toggles_completion_optimistically() {
    let ctx = context();
    ctx.cache.set(QueryKey::task_list(), list(&[&[3, 2, 1]], 3));
    let mut view = TaskListView::new(ctx.clone());

    view.handle_key(key(KeyCode::Char('j')));
    view.handle_key(key(KeyCode::Char(' ')));

    let data = ctx.cache.task_list().unwrap();
    let completed: Vec<bool> = data.tasks().map(|t| t.completed).collect();
    assert_eq!(completed, vec![false, true, false]);
  }
}
