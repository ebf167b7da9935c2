// SPDX-License-Identifier: MIT

//! The concurrent scheduler: drives one action's task DAG to completion,
//! admitting ready tasks up to a per-action concurrency bound, retrying
//! transient agent failures with full-jitter backoff, and cooperating with
//! externally triggered cancellation (action abort, task invalidation).

use crate::backoff::full_jitter;
use crate::error::ExecutorError;
use orc_agents::{AgentError, AgentInput, AgentRegistry, DependencyOutput, LogSink};
use orc_core::config::FileOrchestratorConfig;
use orc_core::{
    config, ActionId, ActionStatus, ErrorKind, Event, LogLevel, Task, TaskId, TaskStatus,
};
use orc_store::{GraphStore, TaskOutcome};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

/// Tunables the scheduler needs, resolved once at startup from
/// [`orc_core::config`] and held for the executor's lifetime.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_concurrent_tasks_per_action: usize,
    pub task_retry_max_attempts: u32,
    pub task_retry_base_backoff: Duration,
    pub task_timeout: Duration,
    pub cancellation_grace: Duration,
}

impl ExecutorConfig {
    pub fn from_file(file: &FileOrchestratorConfig) -> Self {
        Self {
            max_concurrent_tasks_per_action: config::max_concurrent_tasks_per_action(file),
            task_retry_max_attempts: config::task_retry_max_attempts(file),
            task_retry_base_backoff: config::task_retry_base_backoff(file),
            task_timeout: config::task_timeout(file),
            cancellation_grace: config::cancellation_grace(file),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from_file(&FileOrchestratorConfig::default())
    }
}

struct RunState {
    parent_token: CancellationToken,
    in_flight: Mutex<HashMap<TaskId, CancellationToken>>,
    semaphore: Arc<Semaphore>,
    notify: Notify,
}

struct Inner {
    store: Arc<dyn GraphStore>,
    bus: orc_bus::EventBus,
    registry: AgentRegistry,
    config: ExecutorConfig,
    runs: Mutex<HashMap<ActionId, Arc<RunState>>>,
    retry_attempts: Mutex<HashMap<ActionId, u32>>,
}

/// Drives actions through their task DAGs. Cheap to clone: internally
/// `Arc`-backed, so every component that needs to kick off or observe a run
/// holds its own handle onto the same scheduler state.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

impl Executor {
    pub fn new(
        store: Arc<dyn GraphStore>,
        bus: orc_bus::EventBus,
        registry: AgentRegistry,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                bus,
                registry,
                config,
                runs: Mutex::new(HashMap::new()),
                retry_attempts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start driving `action_id`'s ready set to completion. A no-op if a run
    /// for this action is already in progress; returns `false` in that case.
    pub fn run(&self, action_id: ActionId) -> bool {
        let mut runs = self.inner.runs.lock();
        if runs.contains_key(&action_id) {
            return false;
        }
        let state = Arc::new(RunState {
            parent_token: CancellationToken::new(),
            in_flight: Mutex::new(HashMap::new()),
            semaphore: Arc::new(Semaphore::new(
                self.inner.config.max_concurrent_tasks_per_action.max(1),
            )),
            notify: Notify::new(),
        });
        runs.insert(action_id, state.clone());
        drop(runs);

        let exec = self.clone();
        tokio::spawn(async move { exec.drive(action_id, state).await });
        true
    }

    pub fn is_running(&self, action_id: ActionId) -> bool {
        self.inner.runs.lock().contains_key(&action_id)
    }

    /// Signal cooperative cancellation for a single in-flight task. Returns
    /// `false` if that task isn't part of the current run (already finished,
    /// not yet admitted, or the action isn't running at all).
    pub fn cancel_task(&self, action_id: ActionId, task_id: TaskId) -> bool {
        let runs = self.inner.runs.lock();
        let Some(state) = runs.get(&action_id) else {
            return false;
        };
        let in_flight = state.in_flight.lock();
        match in_flight.get(&task_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Nudge a live run to recompute its ready set without cancelling
    /// anything — used by the mutation engine after a reset/add that didn't
    /// itself cancel an in-flight task (the drive loop would otherwise only
    /// wake up when an admitted task finishes). A no-op if no run is active.
    pub fn notify_ready(&self, action_id: ActionId) {
        if let Some(state) = self.inner.runs.lock().get(&action_id) {
            state.notify.notify_one();
        }
    }

    /// Cancel every task currently in flight for `action_id` and stop
    /// admitting new ones. `drive` checks `parent_token` at the top of each
    /// admission pass, so a still-ready task (dependencies satisfied) is
    /// never re-admitted into an already-cancelled run; the run is removed
    /// without emitting a terminal `action.completed`/`action.failed` event.
    pub fn abort_action(&self, action_id: ActionId) {
        if let Some(state) = self.inner.runs.lock().get(&action_id) {
            state.parent_token.cancel();
        }
    }

    /// Operator-initiated replay of a terminally failed action: resets every
    /// failed task to `pending` and starts a new run. Returns the attempt
    /// number recorded in the `action.retrying` event.
    pub fn retry_action(&self, action_id: ActionId) -> Result<u32, ExecutorError> {
        let action = self.inner.store.get_action(action_id)?;
        if action.status != ActionStatus::Failed {
            return Err(ExecutorError::NotFailed(action_id));
        }
        let failed_ids: Vec<TaskId> = self
            .inner
            .store
            .list_tasks(action_id)?
            .into_iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .map(|t| t.id)
            .collect();
        self.inner.store.reset_tasks(&failed_ids)?;

        let attempt = {
            let mut attempts = self.inner.retry_attempts.lock();
            let entry = attempts.entry(action_id).or_insert(0);
            *entry += 1;
            *entry
        };
        self.inner
            .bus
            .publish(action_id, Event::ActionRetrying { action_id, attempt });
        self.run(action_id);
        Ok(attempt)
    }

    /// The admission loop: repeatedly compute the ready set, admit as many
    /// as the semaphore allows, and sleep on a wake signal (raised by every
    /// finishing task) when nothing more can be admitted right now.
    async fn drive(&self, action_id: ActionId, state: Arc<RunState>) {
        self.inner
            .bus
            .publish(action_id, Event::ActionStarted { action_id });

        loop {
            if state.parent_token.is_cancelled() {
                break;
            }

            let ready = match self.inner.store.ready_tasks(action_id) {
                Ok(r) => r,
                Err(_) => break,
            };

            let mut admitted_any = false;
            for task in ready {
                if state.parent_token.is_cancelled() {
                    break;
                }
                if state.in_flight.lock().contains_key(&task.id) {
                    continue;
                }
                let permit = match state.semaphore.clone().try_acquire_owned() {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let child = state.parent_token.child_token();
                state.in_flight.lock().insert(task.id, child.clone());
                admitted_any = true;

                let exec = self.clone();
                let state = state.clone();
                let task_id = task.id;
                tokio::spawn(async move {
                    exec.run_task(action_id, task, child).await;
                    state.in_flight.lock().remove(&task_id);
                    drop(permit);
                    state.notify.notify_one();
                });
            }

            let anything_in_flight = !state.in_flight.lock().is_empty();
            if !anything_in_flight {
                let still_ready = self
                    .inner
                    .store
                    .ready_tasks(action_id)
                    .map(|r| !r.is_empty())
                    .unwrap_or(false);
                if !still_ready {
                    break;
                }
            }
            if !admitted_any {
                state.notify.notified().await;
            }
        }

        self.inner.runs.lock().remove(&action_id);
        if state.parent_token.is_cancelled() {
            // Aborted, not naturally terminal: no `action.completed`/
            // `action.failed` event. Whoever aborted the run (or a
            // re-plan) is responsible for whatever comes next.
            return;
        }
        if let Ok(action) = self.inner.store.recompute_action_status(action_id) {
            match action.status {
                ActionStatus::Completed => {
                    self.inner
                        .bus
                        .publish(action_id, Event::ActionCompleted { action_id });
                }
                ActionStatus::Failed => {
                    self.inner.bus.publish(
                        action_id,
                        Event::ActionFailed {
                            action_id,
                            reason: "one or more tasks failed".to_string(),
                        },
                    );
                }
                ActionStatus::Draft | ActionStatus::Running => {}
            }
        }
    }

    /// One task's full lifecycle: claim, run (with retry+backoff on
    /// transient failure), commit. Returns once the task reaches a terminal
    /// state, is cooperatively cancelled, or its claim goes stale.
    async fn run_task(&self, action_id: ActionId, task: Task, cancel: CancellationToken) {
        let (task, claim) = match self.inner.store.claim_task(task.id) {
            Ok(v) => v,
            Err(_) => return,
        };
        self.inner.bus.publish(
            action_id,
            Event::TaskStarted { task_id: task.id, action_id },
        );

        let max_attempts = self.inner.config.task_retry_max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            let dependency_outputs = self.gather_dependency_outputs(&task);
            let log_sink: Arc<dyn LogSink> = Arc::new(StoreLogSink {
                store: self.inner.store.clone(),
                bus: self.inner.bus.clone(),
                action_id,
                task_id: task.id,
            });
            let agent = self.inner.registry.resolve(&task.agent_type);
            let input = AgentInput { task: task.clone(), dependency_outputs };

            let agent_fut = tokio::time::timeout(
                self.inner.config.task_timeout,
                agent.run(input, log_sink, cancel.clone()),
            );
            tokio::pin!(agent_fut);
            let outcome = tokio::select! {
                res = &mut agent_fut => res.unwrap_or(Err(AgentError::Timeout)),
                _ = cancel.cancelled() => {
                    match tokio::time::timeout(self.inner.config.cancellation_grace, &mut agent_fut).await {
                        Ok(res) => res.unwrap_or(Err(AgentError::Timeout)),
                        Err(_) => Err(AgentError::Cancelled),
                    }
                }
            };

            match outcome {
                Ok(output) => {
                    let artifact_ids = output.artifacts.iter().map(|a| a.id).collect();
                    let result = self.inner.store.commit_task(
                        task.id,
                        &claim,
                        TaskOutcome::Completed {
                            summary: output.summary.clone(),
                            artifacts: output.artifacts,
                        },
                    );
                    match result {
                        Ok(_) => self.inner.bus.publish(
                            action_id,
                            Event::TaskCompleted {
                                task_id: task.id,
                                output_summary: output.summary,
                                artifact_ids,
                            },
                        ),
                        Err(orc_store::StoreError::StaleClaim(_)) => self
                            .inner
                            .bus
                            .publish(action_id, Event::TaskRecovered { task_id: task.id }),
                        Err(e) => {
                            tracing::error!(task_id = %task.id, error = %e, "commit of completed task failed");
                        }
                    }
                    return;
                }
                Err(AgentError::Cancelled) => {
                    self.inner.store.reset_tasks(&[task.id]).ok();
                    return;
                }
                Err(agent_err) => {
                    if agent_err.is_retryable() && attempt < max_attempts {
                        let delay = full_jitter(self.inner.config.task_retry_base_backoff, attempt - 1);
                        self.inner.bus.publish(
                            action_id,
                            Event::TaskRetrying {
                                task_id: task.id,
                                attempt: attempt + 1,
                                max_attempts,
                            },
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = cancel.cancelled() => {
                                self.inner.store.reset_tasks(&[task.id]).ok();
                                return;
                            }
                        }
                        attempt += 1;
                        continue;
                    }

                    let message = agent_err.to_string();
                    let result = self.inner.store.commit_task(
                        task.id,
                        &claim,
                        TaskOutcome::Failed { error: message.clone() },
                    );
                    match result {
                        Ok(_) => self.inner.bus.publish(
                            action_id,
                            Event::TaskFailed {
                                task_id: task.id,
                                error: message,
                                retry_count: attempt - 1,
                            },
                        ),
                        Err(orc_store::StoreError::StaleClaim(_)) => self
                            .inner
                            .bus
                            .publish(action_id, Event::TaskRecovered { task_id: task.id }),
                        Err(e) => {
                            tracing::error!(task_id = %task.id, error = %e, "commit of failed task failed");
                        }
                    }
                    return;
                }
            }
        }
    }

    fn gather_dependency_outputs(&self, task: &Task) -> Vec<DependencyOutput> {
        task.dependencies
            .iter()
            .filter_map(|dep_id| {
                self.inner.store.get_output(*dep_id).map(|out| DependencyOutput {
                    task_id: *dep_id,
                    summary: out.summary,
                    artifact_ids: out.artifact_ids,
                })
            })
            .collect()
    }
}

/// Routes an agent's log lines through the graph store (durable) and the
/// event bus (live), matching the pairing every other mutation makes.
struct StoreLogSink {
    store: Arc<dyn GraphStore>,
    bus: orc_bus::EventBus,
    action_id: ActionId,
    task_id: TaskId,
}

impl LogSink for StoreLogSink {
    fn log(&self, level: LogLevel, message: String, payload: Option<serde_json::Value>) {
        if self
            .store
            .append_log(self.task_id, level, message.clone(), payload)
            .is_ok()
        {
            self.bus.publish(
                self.action_id,
                Event::LogAppend { task_id: self.task_id, level, message },
            );
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
