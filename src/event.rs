use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Mouse wheel, in lines (negative is up)
  Scroll(i32),
  /// Terminal resized; the next draw picks up the new size
  Resize,
  /// Periodic tick for UI refresh and query polling
  Tick,
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn terminal event reader
    tokio::spawn(async move {
      loop {
        let event = if event::poll(tick_rate).unwrap_or(false) {
          match event::read() {
            Ok(evt) => translate(evt),
            Err(_) => None,
          }
        } else {
          Some(Event::Tick)
        };

        if let Some(event) = event {
          if tx.send(event).is_err() {
            break;
          }
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

fn translate(event: CrosstermEvent) -> Option<Event> {
  match event {
    // Windows reports releases too
    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
    CrosstermEvent::Mouse(mouse) => match mouse.kind {
      MouseEventKind::ScrollUp => Some(Event::Scroll(-1)),
      MouseEventKind::ScrollDown => Some(Event::Scroll(1)),
      _ => None,
    },
    CrosstermEvent::Resize(..) => Some(Event::Resize),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};

  fn mouse(kind: MouseEventKind) -> CrosstermEvent {
    CrosstermEvent::Mouse(MouseEvent {
      kind,
      column: 0,
      row: 0,
      modifiers: KeyModifiers::NONE,
    })
  }

  #[test]
  fn test_wheel_maps_to_scroll() {
    assert!(matches!(translate(mouse(MouseEventKind::ScrollUp)), Some(Event::Scroll(-1))));
    assert!(matches!(translate(mouse(MouseEventKind::ScrollDown)), Some(Event::Scroll(1))));
    assert!(translate(mouse(MouseEventKind::Moved)).is_none());
  }

  #[test]
  fn test_key_press_passes_through() {
    let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
    assert!(matches!(translate(CrosstermEvent::Key(key)), Some(Event::Key(_))));
    assert!(matches!(translate(CrosstermEvent::Resize(80, 24)), Some(Event::Resize)));
  }
}
