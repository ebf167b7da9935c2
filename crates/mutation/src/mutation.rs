// SPDX-License-Identifier: MIT

//! The mutation engine (§4.5): edit/add/delete/reset on a live action's
//! task graph, with surgical invalidation of exactly the transitively
//! reachable downstream set and cooperative cancellation of whatever of
//! that set is currently in flight.
//!
//! A single per-action async lock serializes every operation here — the
//! open question of "what happens when two edits race" (§9) is resolved by
//! making the second edit wait out the first's invalidation, including its
//! cancellation grace window, before it observes the graph.

use crate::error::MutationError;
use orc_core::config::FileOrchestratorConfig;
use orc_core::{config, ActionId, Event, Task, TaskId, TaskSpec, TaskStatus};
use orc_executor::Executor;
use orc_store::{GraphStore, TaskPatch};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Tunables the mutation engine needs, resolved once at startup.
#[derive(Debug, Clone, Copy)]
pub struct MutationConfig {
    /// Bound on how long invalidation waits for a cancelled task's agent to
    /// observe the signal before forcing the claim release (§4.5 step 4).
    pub cancellation_grace: Duration,
}

impl MutationConfig {
    pub fn from_file(file: &FileOrchestratorConfig) -> Self {
        Self {
            cancellation_grace: config::cancellation_grace(file),
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self::from_file(&FileOrchestratorConfig::default())
    }
}

/// Applies edit/add/delete/reset operations to a running or idle action's
/// task graph (§4.5). Cheap to clone: internally `Arc`-backed.
#[derive(Clone)]
pub struct MutationEngine {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn GraphStore>,
    bus: orc_bus::EventBus,
    executor: Executor,
    config: MutationConfig,
    /// One lock per action, created lazily. Never removed: actions are
    /// long-lived relative to the handful of bytes a lock costs.
    locks: SyncMutex<HashMap<ActionId, Arc<AsyncMutex<()>>>>,
}

impl MutationEngine {
    pub fn new(
        store: Arc<dyn GraphStore>,
        bus: orc_bus::EventBus,
        executor: Executor,
        config: MutationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                bus,
                executor,
                config,
                locks: SyncMutex::new(HashMap::new()),
            }),
        }
    }

    async fn lock_for(&self, action_id: ActionId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.locks.lock();
            locks
                .entry(action_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Edit(task_id, patch) (§4.5): validates the patch against the store,
    /// then invalidates `{task_id} ∪ transitive_dependents(task_id)`.
    pub async fn edit(&self, task_id: TaskId, patch: TaskPatch) -> Result<Task, MutationError> {
        let action_id = self.inner.store.get_task(task_id)?.action_id;
        let _guard = self.lock_for(action_id).await;

        self.inner.store.update_task(task_id, patch)?;

        let mut invalidation_set = self.inner.store.transitive_dependents(task_id)?;
        invalidation_set.push(task_id);
        self.invalidate(action_id, &invalidation_set).await?;

        Ok(self.inner.store.get_task(task_id)?)
    }

    /// Reset(task_id) (§4.5): an edit with an identity patch, forcing a
    /// re-run of `task_id` and everything downstream of it.
    pub async fn reset(&self, task_id: TaskId) -> Result<Task, MutationError> {
        self.edit(task_id, TaskPatch::default()).await
    }

    /// Add(task_spec) (§4.5): validated insert, no invalidation — the new
    /// task is already `pending`. Wakes a live run so it can pick the task
    /// up without waiting for an unrelated task to finish first.
    pub async fn add(&self, action_id: ActionId, spec: TaskSpec) -> Result<Task, MutationError> {
        let _guard = self.lock_for(action_id).await;
        let mut created = self.inner.store.create_tasks(action_id, vec![spec])?;
        let task = created.remove(0);
        self.inner.store.recompute_action_status(action_id)?;
        self.inner.executor.notify_ready(action_id);
        Ok(task)
    }

    /// Delete(task_id) (§4.5): only allowed when no other task still
    /// depends on it — the store enforces this and returns
    /// [`orc_store::StoreError::HasDependents`] otherwise, matching the
    /// "must be accompanied by edits of dependents" rule. If the task is
    /// currently running, it is cancelled and given the grace window
    /// before deletion forces the claim release.
    pub async fn delete(&self, task_id: TaskId) -> Result<(), MutationError> {
        let task = self.inner.store.get_task(task_id)?;
        let action_id = task.action_id;
        let _guard = self.lock_for(action_id).await;

        if task.status == TaskStatus::Running {
            self.inner.executor.cancel_task(action_id, task_id);
            self.wait_out_grace(&[task_id]).await;
        }
        self.inner.store.delete_task(task_id)?;
        self.inner.store.recompute_action_status(action_id)?;
        self.inner.executor.notify_ready(action_id);
        Ok(())
    }

    /// Cancel whatever of `ids` is currently `running`, wait out the grace
    /// window, then atomically reset all of them to `pending` regardless
    /// of whether the agent observed cancellation in time (§4.5 steps 4-5).
    /// Emits `task.recovered` for every member whose prior state was
    /// `running` or `completed` — the two states where a client could be
    /// holding now-stale information about this task.
    async fn invalidate(&self, action_id: ActionId, ids: &[TaskId]) -> Result<(), MutationError> {
        let mut needs_recovered = Vec::new();
        let mut running = Vec::new();
        for id in ids {
            let Ok(task) = self.inner.store.get_task(*id) else {
                continue;
            };
            match task.status {
                TaskStatus::Running => {
                    self.inner.executor.cancel_task(action_id, *id);
                    running.push(*id);
                    needs_recovered.push(*id);
                }
                TaskStatus::Completed => needs_recovered.push(*id),
                TaskStatus::Pending | TaskStatus::Failed => {}
            }
        }
        if !running.is_empty() {
            self.wait_out_grace(&running).await;
        }

        self.inner.store.reset_tasks(ids)?;
        for id in needs_recovered {
            self.inner
                .bus
                .publish(action_id, Event::TaskRecovered { task_id: id });
        }
        self.inner.store.recompute_action_status(action_id)?;
        self.inner.executor.notify_ready(action_id);
        Ok(())
    }

    /// Poll until none of `ids` are still `running`, bounded by
    /// `cancellation_grace`. The caller resets unconditionally afterward,
    /// so a task that blows through the grace window is force-released
    /// rather than leaving the mutation stuck.
    async fn wait_out_grace(&self, ids: &[TaskId]) {
        let deadline = Instant::now() + self.inner.config.cancellation_grace;
        loop {
            let still_running = ids.iter().any(|id| {
                self.inner
                    .store
                    .get_task(*id)
                    .map(|t| t.status == TaskStatus::Running)
                    .unwrap_or(false)
            });
            if !still_running || Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
