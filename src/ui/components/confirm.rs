use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Modal yes/no question
#[derive(Debug, Clone, Default)]
pub struct ConfirmPrompt {
  question: Option<String>,
}

impl ConfirmPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.question.is_some()
  }

  pub fn ask(&mut self, question: impl Into<String>) {
    self.question = Some(question.into());
  }

  /// `Event(true)` on y, `Event(false)` on n or Esc; every other key is
  /// swallowed while the prompt is open.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<bool> {
    if !self.is_active() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        self.question = None;
        KeyResult::Event(true)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.question = None;
        KeyResult::Event(false)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(question) = &self.question else {
      return;
    };

    let width = (question.chars().count() as u16 + 6).max(24).min(area.width);
    let popup = Rect::new(
      area.x + area.width.saturating_sub(width) / 2,
      area.y + area.height.saturating_sub(5) / 2,
      width,
      area.height.min(5),
    );

    frame.render_widget(Clear, popup);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");
    let text = vec![
      Line::from(question.as_str()),
      Line::from(vec![
        Span::styled("y", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("n", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];
    let paragraph = Paragraph::new(text)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
  }
}
