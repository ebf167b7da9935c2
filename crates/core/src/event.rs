// SPDX-License-Identifier: MIT

//! Events that flow through the event bus, one stream per action.
//!
//! Serializes with `{"type": "task.started", ...fields}` framing, matching
//! the SSE event names fixed by the external interface (snapshot, `task.*`,
//! `action.*`, `log.append`, `ping`).

use crate::model::{Action, ActionId, LogLevel, Task, TaskId};
use serde::{Deserialize, Serialize};

/// One state transition (or keepalive) broadcast on an action's topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "snapshot")]
    Snapshot {
        action: Action,
        tasks: Vec<Task>,
    },

    #[serde(rename = "action.started")]
    ActionStarted { action_id: ActionId },

    #[serde(rename = "action.completed")]
    ActionCompleted { action_id: ActionId },

    #[serde(rename = "action.failed")]
    ActionFailed { action_id: ActionId, reason: String },

    #[serde(rename = "action.retrying")]
    ActionRetrying { action_id: ActionId, attempt: u32 },

    #[serde(rename = "task.started")]
    TaskStarted { task_id: TaskId, action_id: ActionId },

    #[serde(rename = "task.completed")]
    TaskCompleted {
        task_id: TaskId,
        output_summary: String,
        artifact_ids: Vec<crate::model::ArtifactId>,
    },

    #[serde(rename = "task.failed")]
    TaskFailed {
        task_id: TaskId,
        error: String,
        retry_count: u32,
    },

    #[serde(rename = "task.retrying")]
    TaskRetrying {
        task_id: TaskId,
        attempt: u32,
        max_attempts: u32,
    },

    #[serde(rename = "task.recovered")]
    TaskRecovered { task_id: TaskId },

    #[serde(rename = "log.append")]
    LogAppend {
        task_id: TaskId,
        level: LogLevel,
        message: String,
    },

    #[serde(rename = "ping")]
    Ping { ts_ms: u64 },

    /// Bus-internal marker inserted in place of events dropped by the
    /// drop-oldest-with-marker overflow policy. `dropped` coalesces
    /// consecutive drops into a single counter.
    #[serde(rename = "lag")]
    Lag { action_id: ActionId, dropped: u32 },
}

impl Event {
    /// The action this event belongs to, if it carries one directly.
    ///
    /// `Snapshot` carries its action id inside `action.id`; callers that
    /// need the id for both cases should prefer matching on the action
    /// field directly rather than this helper when they already hold a
    /// snapshot.
    pub fn action_id(&self) -> Option<ActionId> {
        match self {
            Event::Snapshot { action, .. } => Some(action.id),
            Event::ActionStarted { action_id }
            | Event::ActionCompleted { action_id }
            | Event::ActionFailed { action_id, .. }
            | Event::ActionRetrying { action_id, .. }
            | Event::TaskStarted { action_id, .. }
            | Event::Lag { action_id, .. } => Some(*action_id),
            Event::TaskCompleted { .. }
            | Event::TaskFailed { .. }
            | Event::TaskRetrying { .. }
            | Event::TaskRecovered { .. }
            | Event::LogAppend { .. }
            | Event::Ping { .. } => None,
        }
    }

    /// `true` for events that name a single task and mark its lifecycle.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Event::TaskStarted { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskFailed { task_id, .. }
            | Event::TaskRetrying { task_id, .. }
            | Event::TaskRecovered { task_id } => Some(*task_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
