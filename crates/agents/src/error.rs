// SPDX-License-Identifier: MIT

use orc_core::{ErrorKind, Kind};
use thiserror::Error;

/// Failure tagged transient/permanent by the agent itself (§7's
/// agent-internal kind). The executor asks `kind()` for the retry
/// classification rather than re-deriving it from a message or status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("transient agent failure: {0}")]
    Transient(String),

    #[error("permanent agent failure: {0}")]
    Permanent(String),

    /// The agent observed its cancellation signal and stopped cooperatively.
    /// Not a failure in the §7 sense; the executor treats it as a reset.
    #[error("agent run cancelled")]
    Cancelled,

    /// The agent missed its deadline (`task.timeout`). Synthesized by the
    /// executor around the agent invocation, not raised by agents directly.
    #[error("agent run timed out")]
    Timeout,
}

impl ErrorKind for AgentError {
    fn kind(&self) -> Kind {
        match self {
            AgentError::Transient(_) => Kind::AgentInternal { transient: true },
            AgentError::Permanent(_) => Kind::AgentInternal { transient: false },
            AgentError::Cancelled => Kind::Cancellation,
            // A missed deadline is a transient I/O-shaped failure: the
            // executor's retry/backoff path treats it exactly like one.
            AgentError::Timeout => Kind::TransientIo,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
