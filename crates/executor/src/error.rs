// SPDX-License-Identifier: MIT

use orc_core::{ActionId, ErrorKind, Kind, TaskId};
use orc_store::StoreError;
use thiserror::Error;

/// Errors raised by the scheduler's synchronous entry points. Failures that
/// happen mid-run (a task's agent erroring, a stale claim) never reach the
/// caller this way — they are resolved internally and surfaced as events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("action {0} not found")]
    ActionNotFound(ActionId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("action {0} is not in a failed state")]
    NotFailed(ActionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorKind for ExecutorError {
    fn kind(&self) -> Kind {
        match self {
            ExecutorError::ActionNotFound(_)
            | ExecutorError::TaskNotFound(_)
            | ExecutorError::NotFailed(_) => Kind::Validation,
            ExecutorError::Store(e) => e.kind(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
