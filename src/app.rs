use crate::cache::{QueryCache, QueryKey};
use crate::commands::Action;
use crate::config::{Config, ListConfig};
use crate::event::{Event, EventHandler};
use crate::task_list::ListStats;
use crate::tasks::TaskClient;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{TaskFormView, TaskListView};
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Everything a view needs to build queries, mutations and child views
#[derive(Clone)]
pub struct AppContext {
  pub client: TaskClient,
  pub cache: QueryCache,
  pub page_size: usize,
  pub list: ListConfig,
}

/// Main application state
pub struct App {
  /// Navigation stack - the task list is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` palette
  command_input: CommandInput,

  ctx: AppContext,

  title: String,

  /// Feedback from the palette, cleared on the next key
  notice: Option<String>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = TaskClient::new(&config.api)?;
    let ctx = AppContext {
      client,
      cache: QueryCache::from_config(&config.cache),
      page_size: config.api.page_size,
      list: config.list.clone(),
    };

    Ok(Self {
      view_stack: vec![Box::new(TaskListView::new(ctx.clone()))],
      command_input: CommandInput::new(),
      ctx,
      title: config.title().to_string(),
      notice: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    info!(api = %self.ctx.client.base_url(), "ui started");

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    info!("ui stopped");

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Scroll(lines) => {
        if let Some(view) = self.view_stack.last_mut() {
          view.handle_scroll(lines);
        }
      }
      // Layout is recomputed on every draw
      Event::Resize => {}
      Event::Tick => self.on_tick(),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    self.notice = None;

    match self.command_input.handle_key(key) {
      KeyResult::Event(CommandEvent::Run(action)) => return self.execute(action),
      KeyResult::Event(CommandEvent::Unknown(input)) => {
        self.notice = Some(format!("Unknown command: {}", input));
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn execute(&mut self, action: Action) {
    debug!(?action, "running command");
    match action {
      Action::Tasks => self.view_stack.truncate(1),
      Action::New => self
        .view_stack
        .push(Box::new(TaskFormView::create(self.ctx.clone()))),
      // The list observes this key and refetches on its next tick
      Action::Refresh => self.ctx.cache.invalidate(&QueryKey::task_list()),
      Action::Quit => self.should_quit = true,
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Poll every view, then act on what the top one asked for.
  fn on_tick(&mut self) {
    let top = self.view_stack.len().saturating_sub(1);
    let mut requested = ViewAction::None;
    for (index, view) in self.view_stack.iter_mut().enumerate() {
      let action = view.tick();
      if index == top {
        requested = action;
      }
    }
    self.apply(requested);
    self.ctx.cache.gc(Instant::now());
  }

  // Accessors for UI rendering

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn api_url(&self) -> &Url {
    self.ctx.client.base_url()
  }

  pub fn list_stats(&self) -> Option<ListStats> {
    self.view_stack.first().and_then(|view| view.stats())
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  /// Palette feedback, else the current view's last error
  pub fn status_message(&self) -> Option<String> {
    self
      .notice
      .clone()
      .or_else(|| self.view_stack.last().and_then(|view| view.error()))
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use super::*;
  use crate::config::PaginationDialect;
  use crate::tasks::client::test_support::client_for;

  /// Context against an unreachable backend with a 60 s stale time, so
  /// cached data is used without network traffic.
  pub fn context() -> AppContext {
    AppContext {
      client: client_for("http://127.0.0.1:9", PaginationDialect::Offset),
      cache: QueryCache::new(Duration::from_secs(60), Duration::from_secs(300)),
      page_size: 20,
      list: ListConfig::default(),
    }
  }
}
