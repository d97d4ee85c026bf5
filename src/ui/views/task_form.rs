use crate::app::AppContext;
use crate::query::{CreateTask, MutationRunner, MutationState, TaskUpdate, UpdateTask};
use crate::tasks::{ApiError, Priority, Task, TaskFormData, TaskPatch};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::priority_color;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Description,
  Priority,
  Completed,
}

impl Field {
  const ORDER: [Field; 4] = [Field::Title, Field::Description, Field::Priority, Field::Completed];

  fn step(self, delta: isize) -> Self {
    let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
    Self::ORDER[(index + delta).rem_euclid(Self::ORDER.len() as isize) as usize]
  }
}

/// Editable fields, independent of where they are sent
#[derive(Debug, Clone)]
struct TaskForm {
  title: TextInput,
  description: TextInput,
  priority: Priority,
  completed: bool,
  focus: Field,
}

impl TaskForm {
  fn blank() -> Self {
    Self {
      title: TextInput::new(),
      description: TextInput::new(),
      priority: Priority::default(),
      completed: false,
      focus: Field::Title,
    }
  }

  fn from_task(task: &Task) -> Self {
    Self {
      title: TextInput::with_value(&task.title),
      description: TextInput::with_value(&task.description),
      priority: task.effective_priority(),
      completed: task.completed,
      focus: Field::Title,
    }
  }

  fn title(&self) -> Result<String, &'static str> {
    let title = self.title.value().trim().to_string();
    if title.is_empty() {
      Err("Title is required")
    } else {
      Ok(title)
    }
  }

  fn form_data(&self) -> Result<TaskFormData, &'static str> {
    Ok(TaskFormData {
      title: self.title()?,
      description: self.description.value().trim().to_string(),
      completed: Some(self.completed),
      priority: Some(self.priority),
    })
  }

  /// Only the fields that differ from `original`
  fn patch_for(&self, original: &Task) -> Result<TaskPatch, &'static str> {
    let title = self.title()?;
    let description = self.description.value().trim().to_string();
    Ok(TaskPatch {
      title: (title != original.title).then_some(title),
      description: (description != original.description).then_some(description),
      completed: (self.completed != original.completed).then_some(self.completed),
      priority: (self.priority != original.effective_priority()).then_some(self.priority),
    })
  }

  /// Apply a key to the focused field. Returns true on Enter.
  fn handle_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.focus = self.focus.step(1);
        return false;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = self.focus.step(-1);
        return false;
      }
      KeyCode::Enter => return true,
      _ => {}
    }

    match self.focus {
      Field::Title => matches!(self.title.handle_key(key), InputResult::Submitted(_)),
      Field::Description => matches!(self.description.handle_key(key), InputResult::Submitted(_)),
      Field::Priority => {
        match key.code {
          KeyCode::Char(' ') | KeyCode::Right | KeyCode::Char('l') => {
            self.priority = self.priority.next();
          }
          KeyCode::Left | KeyCode::Char('h') => {
            // Three steps forward is one step back
            self.priority = self.priority.next().next().next();
          }
          _ => {}
        }
        false
      }
      Field::Completed => {
        if key.code == KeyCode::Char(' ') {
          self.completed = !self.completed;
        }
        false
      }
    }
  }
}

enum Submit {
  Create(MutationRunner<CreateTask>),
  Edit {
    original: Task,
    runner: MutationRunner<UpdateTask>,
  },
}

/// Create or edit form. Closes itself once the server accepted the change.
pub struct TaskFormView {
  form: TaskForm,
  submit: Submit,
  invalid: Option<&'static str>,
}

impl TaskFormView {
  pub fn create(ctx: AppContext) -> Self {
    Self {
      form: TaskForm::blank(),
      submit: Submit::Create(MutationRunner::new(CreateTask::new(ctx.client), ctx.cache)),
      invalid: None,
    }
  }

  pub fn edit(ctx: AppContext, task: Task) -> Self {
    Self {
      form: TaskForm::from_task(&task),
      submit: Submit::Edit {
        original: task,
        runner: MutationRunner::new(UpdateTask::new(ctx.client), ctx.cache),
      },
      invalid: None,
    }
  }

  fn is_pending(&self) -> bool {
    match &self.submit {
      Submit::Create(runner) => runner.is_pending(),
      Submit::Edit { runner, .. } => runner.is_pending(),
    }
  }

  fn mutation_error(&self) -> Option<&ApiError> {
    match &self.submit {
      Submit::Create(runner) => runner.state().error(),
      Submit::Edit { runner, .. } => runner.state().error(),
    }
  }

  fn save(&mut self) -> ViewAction {
    self.invalid = None;
    let result = match &mut self.submit {
      Submit::Create(runner) => self.form.form_data().map(|data| {
        runner.mutate(data);
      }),
      Submit::Edit { original, runner } => match self.form.patch_for(original) {
        // Nothing changed, nothing to send
        Ok(patch) if patch.is_empty() => return ViewAction::Pop,
        Ok(patch) => {
          runner.mutate(TaskUpdate {
            id: original.id,
            patch,
          });
          Ok(())
        }
        Err(e) => Err(e),
      },
    };
    if let Err(message) = result {
      self.invalid = Some(message);
    }
    ViewAction::None
  }

  fn field_line(&self, field: Field, label: &'static str, value: Vec<Span<'static>>) -> Line<'static> {
    let focused = self.form.focus == field;
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![
      Span::styled(if focused { "> " } else { "  " }, label_style),
      Span::styled(format!("{:<13}", label), label_style),
    ];
    spans.extend(value);
    Line::from(spans)
  }

  fn text_value(input: &TextInput, focused: bool) -> Vec<Span<'static>> {
    if !focused {
      return vec![Span::raw(input.value())];
    }
    let (before, after) = input.split_at_cursor();
    let mut rest = after.chars();
    let under_cursor = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
    vec![
      Span::raw(before),
      Span::styled(under_cursor, Style::default().add_modifier(Modifier::REVERSED)),
      Span::raw(rest.collect::<String>()),
    ]
  }
}

impl View for TaskFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.is_pending() {
      return ViewAction::None;
    }
    if key.code == KeyCode::Esc {
      return ViewAction::Pop;
    }
    let save_chord = key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL);
    if save_chord || self.form.handle_key(key) {
      return self.save();
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match (&self.submit, self.is_pending()) {
      (_, true) => " Saving... ".to_string(),
      (Submit::Create(_), false) => " New task ".to_string(),
      (Submit::Edit { original, .. }, false) => format!(" Edit task #{} ", original.id),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let form = &self.form;
    let priority = Span::styled(
      format!(" {} ", form.priority),
      Style::default().fg(Color::Black).bg(priority_color(form.priority)),
    );
    let completed = Span::raw(if form.completed { "[x]" } else { "[ ]" });

    let mut lines = vec![
      self.field_line(
        Field::Title,
        "Title",
        Self::text_value(&form.title, form.focus == Field::Title),
      ),
      self.field_line(
        Field::Description,
        "Description",
        Self::text_value(&form.description, form.focus == Field::Description),
      ),
      self.field_line(Field::Priority, "Priority", vec![priority]),
      self.field_line(Field::Completed, "Completed", vec![completed]),
      Line::default(),
      Line::from(Span::styled(
        "Tab next field · Space cycle/toggle · Enter save · Esc cancel",
        Style::default().fg(Color::DarkGray),
      )),
    ];
    if let Some(message) = self.invalid {
      lines.push(Line::from(Span::styled(message, Style::default().fg(Color::Red))));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.submit {
      Submit::Create(_) => "New".to_string(),
      Submit::Edit { .. } => "Edit".to_string(),
    }
  }

  fn tick(&mut self) -> ViewAction {
    let settled_ok = match &mut self.submit {
      Submit::Create(runner) => runner.poll() && matches!(runner.state(), MutationState::Success(_)),
      Submit::Edit { runner, .. } => runner.poll() && matches!(runner.state(), MutationState::Success(_)),
    };
    if settled_ok {
      ViewAction::Pop
    } else {
      ViewAction::None
    }
  }

  fn error(&self) -> Option<String> {
    self
      .mutation_error()
      .map(|e| format!("Could not save task: {}", e))
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("tab", "next field").with_priority(10),
      Shortcut::new("enter", "save").with_priority(20),
      Shortcut::new("esc", "cancel").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::test_support::context;
  use crate::tasks::types::fixtures::task;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut TaskForm, text: &str) {
    for c in text.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_blank_title_is_rejected() {
    let mut form = TaskForm::blank();
    type_str(&mut form, "   ");
    assert_eq!(form.form_data(), Err("Title is required"));
  }

  #[test]
  fn test_form_data_defaults() {
    let mut form = TaskForm::blank();
    type_str(&mut form, " Write docs ");
    let data = form.form_data().unwrap();
    assert_eq!(data.title, "Write docs");
    assert_eq!(data.priority, Some(Priority::Medium));
    assert_eq!(data.completed, Some(false));
  }

  #[test]
  fn test_field_navigation_and_toggles() {
    let mut form = TaskForm::blank();
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focus, Field::Description);
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(form.priority, Priority::High);
    form.handle_key(key(KeyCode::Left));
    form.handle_key(key(KeyCode::Left));
    assert_eq!(form.priority, Priority::Low);

    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Char(' ')));
    assert!(form.completed);

    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focus, Field::Title);
    form.handle_key(key(KeyCode::BackTab));
    assert_eq!(form.focus, Field::Completed);
  }

  #[test]
  fn test_patch_contains_only_changes() {
    let original = task(5);
    let mut form = TaskForm::from_task(&original);
    assert!(form.patch_for(&original).unwrap().is_empty());

    type_str(&mut form, "!");
    form.focus = Field::Completed;
    form.handle_key(key(KeyCode::Char(' ')));

    let patch = form.patch_for(&original).unwrap();
    assert_eq!(patch.title.as_deref(), Some("Task 5!"));
    assert_eq!(patch.completed, Some(true));
    assert_eq!(patch.description, None);
    assert_eq!(patch.priority, None);
  }

  #[test]
  fn test_unchanged_edit_closes_without_request() {
    let view = TaskFormView::edit(context(), task(5));
    let mut view = view;
    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::Pop));
  }

  #[test]
  fn test_invalid_create_shows_message() {
    let mut view = TaskFormView::create(context());
    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::None));
    assert_eq!(view.invalid, Some("Title is required"));
    assert!(!view.is_pending());
  }
}
