// SPDX-License-Identifier: MIT

use orc_core::{ActionId, Kind, TaskId};
use thiserror::Error;

/// Errors raised by a [`crate::GraphStore`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("action {0} not found")]
    ActionNotFound(ActionId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("task {dependency} is not a member of action {action}")]
    ForeignDependency { action: ActionId, dependency: TaskId },

    #[error("task graph would contain a cycle through {0}")]
    Cycle(TaskId),

    #[error("invalid transition for task {task}: {from} -> {to}")]
    InvalidTransition {
        task: TaskId,
        from: &'static str,
        to: &'static str,
    },

    #[error("stale claim for task {0}: task was invalidated or already completed")]
    StaleClaim(TaskId),

    #[error("task {0} has dependents; delete those or their edges first")]
    HasDependents(TaskId),

    #[error("empty prompt for task in action {0}")]
    EmptyPrompt(ActionId),

    #[error("task id {0} already exists")]
    DuplicateTaskId(TaskId),

    #[error("snapshot could not be decoded: {0}")]
    Corrupt(String),
}

impl orc_core::ErrorKind for StoreError {
    fn kind(&self) -> Kind {
        match self {
            StoreError::ActionNotFound(_)
            | StoreError::TaskNotFound(_)
            | StoreError::ForeignDependency { .. }
            | StoreError::Cycle(_)
            | StoreError::InvalidTransition { .. }
            | StoreError::HasDependents(_)
            | StoreError::EmptyPrompt(_)
            | StoreError::DuplicateTaskId(_) => Kind::Validation,
            StoreError::StaleClaim(_) => Kind::Cancellation,
            StoreError::Corrupt(_) => Kind::Fatal,
        }
    }
}
