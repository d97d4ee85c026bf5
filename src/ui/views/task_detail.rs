use crate::app::AppContext;
use crate::query::{DeleteTask, MutationRunner, MutationState, TaskQuery, TaskUpdate, UpdateTask};
use crate::tasks::{TaskId, TaskPatch};
use crate::ui::components::{ConfirmPrompt, KeyResult};
use crate::ui::renderfns::{format_date, priority_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::TaskFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// One task, loaded through the single-item query
pub struct TaskDetailView {
  ctx: AppContext,
  id: TaskId,
  query: TaskQuery,
  update: MutationRunner<UpdateTask>,
  delete: MutationRunner<DeleteTask>,
  confirm: ConfirmPrompt,
}

impl TaskDetailView {
  pub fn new(ctx: AppContext, id: TaskId) -> Self {
    let mut query = TaskQuery::new(ctx.client.clone(), ctx.cache.clone(), Some(id));
    query.fetch();
    let update = MutationRunner::new(UpdateTask::new(ctx.client.clone()), ctx.cache.clone());
    let delete = MutationRunner::new(DeleteTask::new(ctx.client.clone()), ctx.cache.clone());

    Self {
      ctx,
      id,
      query,
      update,
      delete,
      confirm: ConfirmPrompt::new(),
    }
  }

  fn toggle(&mut self) {
    if let Some(task) = self.query.data() {
      self.update.mutate(TaskUpdate {
        id: self.id,
        patch: TaskPatch::completed(!task.completed),
      });
    }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let activity = if self.delete.is_pending() {
      " (deleting...)"
    } else if self.update.is_pending() {
      " (saving...)"
    } else if self.query.is_fetching() {
      " (loading...)"
    } else {
      ""
    };
    let block = Block::default()
      .title(format!(" Task #{}{} ", self.id, activity))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(task) = self.query.data() else {
      let content = match self.query.error() {
        Some(e) if e.is_not_found() => "This task no longer exists.".to_string(),
        Some(e) => format!("Error: {}\n\nPress 'r' to retry.", e),
        None => "Loading task...".to_string(),
      };
      let paragraph = Paragraph::new(content).style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    };

    let [header_area, _, description_area] = Layout::vertical([
      Constraint::Length(5),
      Constraint::Length(1),
      Constraint::Min(1),
    ])
    .areas(inner);

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let priority = task.effective_priority();
    let (status, status_color) = if task.completed {
      ("Completed", Color::Green)
    } else {
      ("Open", Color::White)
    };

    let header = vec![
      Line::from(Span::styled(
        truncate(&task.title, inner.width as usize),
        Style::default().fg(Color::White).bold(),
      )),
      Line::from(vec![
        label("Status:   "),
        Span::styled(status, Style::default().fg(status_color)),
      ]),
      Line::from(vec![
        label("Priority: "),
        Span::styled(priority.as_str(), Style::default().fg(priority_color(priority))),
      ]),
      Line::from(vec![label("Created:  "), Span::raw(format_date(&task.created_at))]),
      Line::from(vec![label("Owner:    "), Span::raw(format!("user {}", task.user_id))]),
    ];
    frame.render_widget(Paragraph::new(header), header_area);

    let description = if task.description.is_empty() {
      Paragraph::new("No description").style(Style::default().fg(Color::DarkGray))
    } else {
      Paragraph::new(task.description.as_str())
    };
    frame.render_widget(description.wrap(Wrap { trim: true }), description_area);
  }
}

impl View for TaskDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Event(true) => {
        self.delete.mutate(self.id);
        return ViewAction::None;
      }
      KeyResult::Event(false) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char(' ') => self.toggle(),
      KeyCode::Char('d') => {
        if let Some(task) = self.query.data() {
          self
            .confirm
            .ask(format!("Delete \"{}\"?", truncate(&task.title, 40)));
        }
      }
      KeyCode::Char('e') => {
        if let Some(task) = self.query.data() {
          return ViewAction::Push(Box::new(TaskFormView::edit(
            self.ctx.clone(),
            task.as_ref().clone(),
          )));
        }
      }
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.query.data() {
      Some(task) => format!("#{} {}", self.id, truncate(&task.title, 30)),
      None => format!("#{}", self.id),
    }
  }

  fn tick(&mut self) -> ViewAction {
    // Settle the delete first so a successful one never triggers a refetch
    if self.delete.poll() && matches!(self.delete.state(), MutationState::Success(())) {
      return ViewAction::Pop;
    }
    self.update.poll();
    self.query.poll();
    ViewAction::None
  }

  fn error(&self) -> Option<String> {
    if let Some(e) = self.delete.state().error() {
      return Some(format!("Could not delete task: {}", e));
    }
    if let Some(e) = self.update.state().error() {
      return Some(format!("Could not update task: {}", e));
    }
    self
      .query
      .error()
      .filter(|e| !e.is_not_found())
      .map(|e| format!("Could not load task: {}", e))
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("space", "done").with_priority(10),
      Shortcut::new("e", "edit").with_priority(20),
      Shortcut::new("d", "delete").with_priority(30),
      Shortcut::new("r", "refresh").with_priority(40),
      Shortcut::new("q", "back").with_priority(50),
    ]
  }
}
