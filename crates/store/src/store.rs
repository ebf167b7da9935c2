// SPDX-License-Identifier: MIT

//! The `GraphStore` trait (§4.2): persistent CRUD for actions/tasks/outputs/
//! artifacts/logs, plus the dependency-graph queries the executor and
//! mutation engine need.

use crate::error::StoreError;
use orc_core::{
    Action, ActionId, ActionStatus, Artifact, ArtifactId, LogEntry, LogLevel, Task, TaskId,
    TaskOutput, TaskSpec, TaskStatus,
};

/// Opaque per-attempt token. Matches the executor's claim of a task to the
/// store's idea of "who currently owns this `running` row", so a stale
/// completion after invalidation can be detected and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimToken(pub String);

impl ClaimToken {
    pub fn new() -> Self {
        Self(nanoid::nanoid!(16))
    }
}

impl Default for ClaimToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update applied by [`GraphStore::update_task`]. `None` leaves the
/// field unchanged; `dependencies: Some(_)` replaces the whole list.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub prompt: Option<String>,
    pub agent_type: Option<String>,
    pub model: Option<Option<String>>,
    pub dependencies: Option<Vec<TaskId>>,
}

/// Optional filter for [`GraphStore::list_actions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionFilter {
    pub status: Option<ActionStatus>,
}

/// The result an executor commits for a claimed task.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed {
        summary: String,
        artifacts: Vec<Artifact>,
    },
    Failed {
        error: String,
    },
}

/// Persistent CRUD for the orchestration data model (§4.2).
///
/// Implementations are the sole writer of persistent state; the executor
/// and mutation engine mutate state only through these transactional
/// operations. Every modification is expected to take a short critical
/// section keyed by action id (see the in-memory implementation).
pub trait GraphStore: Send + Sync {
    fn create_action(&self, title: String, root_prompt: String) -> Action;

    fn get_action(&self, id: ActionId) -> Result<Action, StoreError>;

    fn list_actions(&self, filter: ActionFilter) -> Vec<Action>;

    fn delete_action(&self, id: ActionId) -> Result<(), StoreError>;

    /// Re-plan target: replace title/root_prompt on a draft action.
    fn patch_action(
        &self,
        id: ActionId,
        title: Option<String>,
        root_prompt: Option<String>,
    ) -> Result<Action, StoreError>;

    fn get_task(&self, id: TaskId) -> Result<Task, StoreError>;

    fn list_tasks(&self, action_id: ActionId) -> Result<Vec<Task>, StoreError>;

    /// Atomic insert of one or more tasks. Rejects if any spec's
    /// dependencies are missing or the resulting graph has a cycle.
    fn create_tasks(
        &self,
        action_id: ActionId,
        specs: Vec<TaskSpec>,
    ) -> Result<Vec<Task>, StoreError>;

    /// Atomic patch; validates the resulting graph remains acyclic and
    /// dependency-closed.
    fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Remove a task and its output/logs. Rejects with
    /// [`StoreError::HasDependents`] if another task still names it in
    /// `dependencies` — the mutation engine must edit those away first
    /// (§4.5's delete operation).
    fn delete_task(&self, task_id: TaskId) -> Result<(), StoreError>;

    /// CAS `pending -> running`. Returns the new claim token on success.
    fn claim_task(&self, task_id: TaskId) -> Result<(Task, ClaimToken), StoreError>;

    /// Commit a claimed task's terminal outcome. Fails with
    /// [`StoreError::StaleClaim`] if the task is no longer `running` under
    /// this exact claim (it was invalidated or already completed/failed).
    fn commit_task(
        &self,
        task_id: TaskId,
        claim: &ClaimToken,
        outcome: TaskOutcome,
    ) -> Result<Task, StoreError>;

    /// Reset tasks to `pending`, clearing claim tokens, summaries, and
    /// detaching (not deleting) their outputs. Used by invalidation.
    fn reset_tasks(&self, task_ids: &[TaskId]) -> Result<(), StoreError>;

    fn get_output(&self, task_id: TaskId) -> Option<TaskOutput>;

    fn append_log(
        &self,
        task_id: TaskId,
        level: LogLevel,
        message: String,
        payload: Option<serde_json::Value>,
    ) -> Result<LogEntry, StoreError>;

    fn list_logs(&self, task_id: TaskId) -> Result<Vec<LogEntry>, StoreError>;

    fn get_artifact(&self, id: ArtifactId) -> Option<Artifact>;

    /// Direct dependents of `task_id` (tasks naming it in `dependencies`).
    fn dependents(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError>;

    /// Transitive closure of [`GraphStore::dependents`].
    fn transitive_dependents(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError>;

    /// Transitive closure of dependencies (ancestors).
    fn ancestors(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError>;

    /// Tasks that are `pending` with every dependency `completed`.
    fn ready_tasks(&self, action_id: ActionId) -> Result<Vec<Task>, StoreError>;

    /// Recompute and persist the action's status from its current task set
    /// (§3's invariant). Called by the executor/mutation engine after any
    /// task status change.
    fn recompute_action_status(&self, action_id: ActionId) -> Result<Action, StoreError>;

    /// Serialize the full materialized state, zstd-compressed.
    fn snapshot(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the materialized state from a snapshot produced by
    /// [`GraphStore::snapshot`]. Any task left `running` is reset to
    /// `pending` (best-effort restart semantics, no exactly-once claim).
    fn restore(&self, bytes: &[u8]) -> Result<(), StoreError>;
}
