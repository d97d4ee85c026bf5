//! Create, update and delete for tasks, expressed as [`Mutation`]s.

use crate::cache::{CachedValue, QueryCache, QueryKey};
use crate::query::mutation::Mutation;
use crate::tasks::{ApiError, Task, TaskClient, TaskFormData, TaskId, TaskPatch};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Cache values captured before an optimistic write
#[derive(Debug, Clone, Default)]
pub struct TaskSnapshot {
  pub task: Option<CachedValue>,
  pub list: Option<CachedValue>,
}

impl TaskSnapshot {
  fn capture(cache: &QueryCache, id: TaskId) -> Self {
    Self {
      task: cache.get(&QueryKey::task(id)),
      list: cache.get(&QueryKey::task_list()),
    }
  }

  fn restore(self, cache: &QueryCache, id: TaskId) {
    if let Some(task) = self.task {
      cache.restore(QueryKey::task(id), Some(task));
    }
    if let Some(list) = self.list {
      cache.restore(QueryKey::task_list(), Some(list));
    }
  }
}

/// Stop in-flight reads of the task and the list so a slow response cannot
/// overwrite the optimistic value.
fn cancel_reads(cache: &QueryCache, id: TaskId) {
  cache.cancel(&QueryKey::task(id));
  cache.cancel(&QueryKey::task_list());
}

/// Create a task. The list is invalidated on success; the new row is never
/// inserted optimistically because its position is decided by the server.
#[derive(Clone)]
pub struct CreateTask {
  client: TaskClient,
}

impl CreateTask {
  pub fn new(client: TaskClient) -> Self {
    Self { client }
  }
}

impl Mutation for CreateTask {
  type Vars = TaskFormData;
  type Output = Task;
  type Snapshot = ();

  fn execute(&self, vars: &TaskFormData) -> BoxFuture<'static, Result<Task, ApiError>> {
    let client = self.client.clone();
    let form = vars.clone();
    async move { client.create(form).await }.boxed()
  }

  fn on_optimistic_apply(&self, _cache: &QueryCache, _vars: &TaskFormData) {}

  fn on_success(&self, cache: &QueryCache, _vars: &TaskFormData, _output: &Task) {
    cache.invalidate(&QueryKey::task_list());
  }
}

/// Arguments of [`UpdateTask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
  pub id: TaskId,
  pub patch: TaskPatch,
}

/// Patch a task, showing the result before the server confirms it.
#[derive(Clone)]
pub struct UpdateTask {
  client: TaskClient,
}

impl UpdateTask {
  pub fn new(client: TaskClient) -> Self {
    Self { client }
  }
}

impl Mutation for UpdateTask {
  type Vars = TaskUpdate;
  type Output = Task;
  type Snapshot = TaskSnapshot;

  fn execute(&self, vars: &TaskUpdate) -> BoxFuture<'static, Result<Task, ApiError>> {
    let client = self.client.clone();
    let TaskUpdate { id, patch } = vars.clone();
    async move { client.update(id, &patch).await }.boxed()
  }

  fn on_optimistic_apply(&self, cache: &QueryCache, vars: &TaskUpdate) -> TaskSnapshot {
    cancel_reads(cache, vars.id);
    let snapshot = TaskSnapshot::capture(cache, vars.id);

    cache.update_task(vars.id, |task| vars.patch.apply(task));
    cache.update_task_list(|data| data.map_task(vars.id, |task| vars.patch.apply(task)));
    snapshot
  }

  fn on_rollback(&self, cache: &QueryCache, vars: &TaskUpdate, snapshot: TaskSnapshot) {
    snapshot.restore(cache, vars.id);
  }

  fn on_settle(&self, cache: &QueryCache, vars: &TaskUpdate, _result: Result<&Task, &ApiError>) {
    cache.invalidate(&QueryKey::task(vars.id));
    cache.invalidate(&QueryKey::task_list());
  }
}

/// Delete a task, removing it from every cached page up front.
///
/// While the request is pending the single-task entry is emptied without
/// notifying observers, so nothing refetches it early. It is dropped on
/// settle even when the request failed, so a deleted task can never
/// resurface from cache.
#[derive(Clone)]
pub struct DeleteTask {
  client: TaskClient,
}

impl DeleteTask {
  pub fn new(client: TaskClient) -> Self {
    Self { client }
  }
}

impl Mutation for DeleteTask {
  type Vars = TaskId;
  type Output = ();
  type Snapshot = TaskSnapshot;

  fn execute(&self, vars: &TaskId) -> BoxFuture<'static, Result<(), ApiError>> {
    let client = self.client.clone();
    let id = *vars;
    async move { client.remove(id).await }.boxed()
  }

  fn on_optimistic_apply(&self, cache: &QueryCache, id: &TaskId) -> TaskSnapshot {
    cancel_reads(cache, *id);
    let snapshot = TaskSnapshot::capture(cache, *id);

    cache.update_task_list(|data| data.without_task(*id));
    cache.clear(&QueryKey::task(*id));
    snapshot
  }

  fn on_rollback(&self, cache: &QueryCache, id: &TaskId, snapshot: TaskSnapshot) {
    snapshot.restore(cache, *id);
  }

  fn on_settle(&self, cache: &QueryCache, id: &TaskId, _result: Result<&(), &ApiError>) {
    cache.invalidate(&QueryKey::task_list());
    cache.remove(&QueryKey::task(*id));
  }
}
