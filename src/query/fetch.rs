//! Spawned fetches polled from the UI loop.

use std::future::Future;
use tokio::sync::mpsc;

/// Outcome of polling an [`InFlight`] fetch
#[derive(Debug)]
pub enum Poll<T> {
  /// Still running
  Pending,
  /// Finished with this value
  Ready(T),
  /// The task went away without sending
  Lost,
}

/// A future running on the tokio runtime whose result is collected by polling.
///
/// Dropping the handle cancels delivery: the task may still finish, but its
/// result has nowhere to go.
#[derive(Debug)]
pub struct InFlight<T> {
  receiver: mpsc::UnboundedReceiver<T>,
}

impl<T: Send + 'static> InFlight<T> {
  pub fn spawn<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = T> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(future.await);
    });
    Self { receiver: rx }
  }

  /// Check for a result without blocking.
  pub fn poll(&mut self) -> Poll<T> {
    match self.receiver.try_recv() {
      Ok(value) => Poll::Ready(value),
      Err(mpsc::error::TryRecvError::Empty) => Poll::Pending,
      Err(mpsc::error::TryRecvError::Disconnected) => Poll::Lost,
    }
  }

  /// Wait for the result.
  #[cfg(test)]
  pub async fn wait(&mut self) -> Option<T> {
    self.receiver.recv().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_ready_after_completion() {
    let mut fetch = InFlight::spawn(async { 42 });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(matches!(fetch.poll(), Poll::Ready(42)));
  }

  #[tokio::test]
  async fn test_pending_while_running() {
    let mut fetch = InFlight::spawn(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      1
    });
    assert!(matches!(fetch.poll(), Poll::Pending));
  }
}
