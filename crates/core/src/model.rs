// SPDX-License-Identifier: MIT

//! The orchestration data model: Action, Task, TaskOutput, Artifact, LogEntry.
//!
//! These are plain data types. The graph store is the only thing that
//! mutates them; this module just defines their shape and the invariants
//! a store implementation must uphold (see `orc-store`).

use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct ActionId("act-");
}

crate::define_id! {
    pub struct TaskId("tsk-");
}

crate::define_id! {
    pub struct ArtifactId("art-");
}

crate::define_id! {
    pub struct LogEntryId("log-");
}

/// Status of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    ActionStatus {
        Draft => "draft",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Status of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// `true` for `completed`/`failed` — states invalidation must reset from.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// The wire name of this status, for error messages that need a
    /// `&'static str` rather than an allocation.
    pub fn as_static_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// A user-initiated workflow rooted in a natural-language prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub title: String,
    pub root_prompt: String,
    pub status: ActionStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// A node in an action's task DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub action_id: ActionId,
    pub prompt: String,
    pub agent_type: String,
    pub model: Option<String>,
    pub status: TaskStatus,
    /// Ordered set of task ids this task depends on. All belong to `action_id`.
    pub dependencies: Vec<TaskId>,
    pub output_summary: Option<String>,
    /// Opaque token identifying the current `running` attempt, if any.
    /// Set on claim, cleared on any terminal transition or reset.
    pub claim_token: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Task {
    /// A task is ready when it is pending and every dependency is completed.
    pub fn is_ready(&self, dependency_statuses: &[TaskStatus]) -> bool {
        self.status == TaskStatus::Pending
            && dependency_statuses.iter().all(|s| *s == TaskStatus::Completed)
    }
}

/// The durable result of a task that reached `completed`.
///
/// Overwritten (not appended) on re-run: at most one row per task exists at
/// any time, consistent with the "discarded atomically with the transition
/// to running" rule in the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: TaskId,
    pub summary: String,
    pub artifact_ids: Vec<ArtifactId>,
    pub created_at_ms: u64,
}

/// A file/image/markdown blob produced by a task, stored outside the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub task_id: TaskId,
    pub mime_type: String,
    pub storage_path: String,
    pub size_bytes: u64,
}

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// One append-only log line emitted by a task's agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub task_id: TaskId,
    pub level: LogLevel,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub created_at_ms: u64,
}

/// A planner-produced or user-submitted task to be inserted into an action's graph.
///
/// `id` is chosen by the caller rather than the store: a batch of specs
/// passed to the store's `create_tasks` operation together can reference
/// each other's `id`s in `dependencies` before any of them exist in the
/// store yet (the planner resolves its own index-based references into
/// fresh ids this way). The store rejects a batch that reuses an id
/// already present in the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: TaskId,
    pub prompt: String,
    pub agent_type: String,
    pub model: Option<String>,
    pub dependencies: Vec<TaskId>,
}

crate::builder! {
    pub struct ActionBuilder => Action {
        into {
            title: String = "untitled action",
            root_prompt: String = "do something",
        }
        set {
            status: ActionStatus = ActionStatus::Draft,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        computed {
            id: ActionId = ActionId::new(),
        }
    }
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            prompt: String = "do a thing",
            agent_type: String = "generic",
        }
        set {
            action_id: ActionId = ActionId::new(),
            model: Option<String> = None,
            status: TaskStatus = TaskStatus::Pending,
            dependencies: Vec<TaskId> = Vec::new(),
            output_summary: Option<String> = None,
            claim_token: Option<String> = None,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        computed {
            id: TaskId = TaskId::new(),
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
