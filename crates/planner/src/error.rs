// SPDX-License-Identifier: MIT

use crate::chat::ChatError;
use orc_core::{ErrorKind, Kind};
use thiserror::Error;

/// Raised only by validation of a raw plan; `Planner::plan` itself never
/// returns an error to its caller — exhausting retries falls back to the
/// single-task degraded plan (§4.3) instead of propagating one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("provider returned output that did not parse as a task list: {0}")]
    Malformed(String),

    #[error("empty task list")]
    EmptyPlan,

    #[error("task {0} has an empty prompt")]
    EmptyPrompt(usize),

    #[error("task {index} depends on {dependency}, which is not an earlier task")]
    ForwardReference { index: usize, dependency: usize },

    #[error("plan has {0} tasks, exceeding the configured maximum of {1}")]
    TooManyTasks(usize, usize),

    #[error("provider call failed: {0}")]
    Provider(#[from] ChatError),
}

impl ErrorKind for PlannerError {
    fn kind(&self) -> Kind {
        match self {
            PlannerError::Provider(e) => e.kind(),
            PlannerError::Malformed(_)
            | PlannerError::EmptyPlan
            | PlannerError::EmptyPrompt(_)
            | PlannerError::ForwardReference { .. }
            | PlannerError::TooManyTasks(..) => Kind::Validation,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
