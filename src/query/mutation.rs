//! Generic optimistic mutation executor.
//!
//! A [`Mutation`] describes one write against the backend plus four callback
//! slots. [`MutationRunner`] drives them in a fixed order:
//!
//! 1. `on_optimistic_apply` before the request is sent (cancel, snapshot, patch)
//! 2. the request itself, on the tokio runtime
//! 3. `on_success`, or `on_rollback` with the snapshot on failure
//! 4. `on_settle` in both cases
//!
//! Rollback always happens before the error becomes visible through
//! [`MutationRunner::state`].

use crate::cache::QueryCache;
use crate::query::fetch::{InFlight, Poll};
use crate::tasks::ApiError;
use futures::future::BoxFuture;
use tracing::{debug, warn};

pub trait Mutation {
  type Vars: std::fmt::Debug;
  type Output: Send + 'static;
  /// Whatever `on_rollback` needs to undo `on_optimistic_apply`
  type Snapshot;

  /// The network call
  fn execute(&self, vars: &Self::Vars) -> BoxFuture<'static, Result<Self::Output, ApiError>>;

  fn on_optimistic_apply(&self, cache: &QueryCache, vars: &Self::Vars) -> Self::Snapshot;

  fn on_success(&self, _cache: &QueryCache, _vars: &Self::Vars, _output: &Self::Output) {}

  fn on_rollback(&self, _cache: &QueryCache, _vars: &Self::Vars, _snapshot: Self::Snapshot) {}

  fn on_settle(
    &self,
    _cache: &QueryCache,
    _vars: &Self::Vars,
    _result: Result<&Self::Output, &ApiError>,
  ) {
  }
}

/// Lifecycle of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState<T> {
  Idle,
  Pending,
  Success(T),
  Error(ApiError),
}

impl<T> MutationState<T> {
  pub fn is_pending(&self) -> bool {
    matches!(self, MutationState::Pending)
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}

struct PendingMutation<M: Mutation> {
  vars: M::Vars,
  snapshot: M::Snapshot,
  handle: InFlight<Result<M::Output, ApiError>>,
}

/// Runs one mutation at a time against the shared cache.
pub struct MutationRunner<M: Mutation> {
  mutation: M,
  cache: QueryCache,
  state: MutationState<M::Output>,
  pending: Option<PendingMutation<M>>,
}

impl<M: Mutation> MutationRunner<M> {
  pub fn new(mutation: M, cache: QueryCache) -> Self {
    Self {
      mutation,
      cache,
      state: MutationState::Idle,
      pending: None,
    }
  }

  pub fn state(&self) -> &MutationState<M::Output> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Forget the last outcome
  pub fn reset(&mut self) {
    if self.pending.is_none() {
      self.state = MutationState::Idle;
    }
  }

  /// Apply the optimistic update and send the request.
  ///
  /// Refused (returns false) while a previous call is still pending.
  pub fn mutate(&mut self, vars: M::Vars) -> bool {
    if self.pending.is_some() {
      return false;
    }

    debug!(?vars, "mutation started");
    let snapshot = self.mutation.on_optimistic_apply(&self.cache, &vars);
    let handle = InFlight::spawn(self.mutation.execute(&vars));
    self.pending = Some(PendingMutation {
      vars,
      snapshot,
      handle,
    });
    self.state = MutationState::Pending;
    true
  }

  /// Collect the request outcome and run the remaining callbacks.
  ///
  /// Returns `true` when the mutation settled during this call.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else {
      return false;
    };

    let result = match pending.handle.poll() {
      Poll::Pending => return false,
      Poll::Ready(result) => result,
      Poll::Lost => Err(lost()),
    };

    if let Some(pending) = self.pending.take() {
      self.settle(pending.vars, pending.snapshot, result);
    }
    true
  }

  /// Wait for the request and settle.
  #[cfg(test)]
  pub async fn wait(&mut self) -> &MutationState<M::Output> {
    if let Some(mut pending) = self.pending.take() {
      let result = pending.handle.wait().await.unwrap_or_else(|| Err(lost()));
      self.settle(pending.vars, pending.snapshot, result);
    }
    &self.state
  }

  fn settle(&mut self, vars: M::Vars, snapshot: M::Snapshot, result: Result<M::Output, ApiError>) {
    match result {
      Ok(output) => {
        debug!(?vars, "mutation succeeded");
        self.mutation.on_success(&self.cache, &vars, &output);
        self.mutation.on_settle(&self.cache, &vars, Ok(&output));
        self.state = MutationState::Success(output);
      }
      Err(e) => {
        warn!(?vars, error = %e, "mutation failed, rolling back");
        self.mutation.on_rollback(&self.cache, &vars, snapshot);
        self.mutation.on_settle(&self.cache, &vars, Err(&e));
        self.state = MutationState::Error(e);
      }
    }
  }
}

fn lost() -> ApiError {
  ApiError::Network {
    message: "mutation task ended without a result".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::QueryKey;
  use crate::tasks::types::fixtures::task;
  use futures::FutureExt;
  use std::cell::RefCell;
  use std::rc::Rc;
  use std::time::Duration;

  /// Records callback order and succeeds or fails on demand
  struct Probe {
    fail: bool,
    calls: Rc<RefCell<Vec<&'static str>>>,
  }

  impl Mutation for Probe {
    type Vars = u64;
    type Output = u64;
    type Snapshot = &'static str;

    fn execute(&self, vars: &u64) -> BoxFuture<'static, Result<u64, ApiError>> {
      let (fail, vars) = (self.fail, *vars);
      async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if fail {
          Err(ApiError::Http {
            status: 500,
            body: String::new(),
          })
        } else {
          Ok(vars * 2)
        }
      }
      .boxed()
    }

    fn on_optimistic_apply(&self, cache: &QueryCache, vars: &u64) -> &'static str {
      self.calls.borrow_mut().push("apply");
      cache.set(QueryKey::task(*vars), task(*vars));
      "snapshot"
    }

    fn on_success(&self, _cache: &QueryCache, _vars: &u64, _output: &u64) {
      self.calls.borrow_mut().push("success");
    }

    fn on_rollback(&self, cache: &QueryCache, vars: &u64, snapshot: &'static str) {
      assert_eq!(snapshot, "snapshot");
      self.calls.borrow_mut().push("rollback");
      cache.remove(&QueryKey::task(*vars));
    }

    fn on_settle(&self, _cache: &QueryCache, _vars: &u64, _result: Result<&u64, &ApiError>) {
      self.calls.borrow_mut().push("settle");
    }
  }

  fn runner(fail: bool) -> (MutationRunner<Probe>, Rc<RefCell<Vec<&'static str>>>, QueryCache) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let cache = QueryCache::new(Duration::from_secs(60), Duration::from_secs(300));
    let probe = Probe {
      fail,
      calls: calls.clone(),
    };
    (MutationRunner::new(probe, cache.clone()), calls, cache)
  }

  #[tokio::test]
  async fn test_success_callback_order() {
    let (mut runner, calls, _cache) = runner(false);
    assert!(runner.mutate(21));
    assert!(runner.state().is_pending());

    assert_eq!(runner.wait().await, &MutationState::Success(42));
    assert_eq!(*calls.borrow(), vec!["apply", "success", "settle"]);
  }

  #[tokio::test]
  async fn test_failure_rolls_back_before_error_is_visible() {
    let (mut runner, calls, cache) = runner(true);
    runner.mutate(3);
    assert!(cache.task(3).is_some());

    let state = runner.wait().await.clone();
    assert!(matches!(state, MutationState::Error(ApiError::Http { status: 500, .. })));
    assert!(cache.task(3).is_none());
    assert_eq!(*calls.borrow(), vec!["apply", "rollback", "settle"]);
  }

  #[tokio::test]
  async fn test_second_mutate_refused_while_pending() {
    let (mut runner, calls, _cache) = runner(false);
    assert!(runner.mutate(1));
    assert!(!runner.mutate(2));
    runner.wait().await;
    assert_eq!(calls.borrow().iter().filter(|c| **c == "apply").count(), 1);
  }

  #[tokio::test]
  async fn test_poll_settles_once() {
    let (mut runner, _calls, _cache) = runner(false);
    runner.mutate(5);
    crate::query::poll_until(|| runner.poll()).await;
    assert_eq!(runner.state(), &MutationState::Success(10));
    assert!(!runner.poll());

    runner.reset();
    assert_eq!(runner.state(), &MutationState::Idle);
  }
}
