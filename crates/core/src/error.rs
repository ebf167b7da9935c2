// SPDX-License-Identifier: MIT

//! The shared error-kind taxonomy (§7).
//!
//! Every per-crate `thiserror` enum (`StoreError`, `PlannerError`,
//! `ExecutorError`, `AgentError`, `MutationError`) implements
//! [`ErrorKind`] so the executor can ask "is this retryable" without
//! string-matching a message or re-deriving it from an HTTP status code.

/// The taxonomy an error is classified into, independent of which crate
/// raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Bad input: cycles, unknown agent type, empty prompt. Non-retryable,
    /// surfaced synchronously to the caller.
    Validation,
    /// Network, timeout, provider 5xx, rate-limit. Retryable with backoff.
    TransientIo,
    /// Auth failure, 4xx other than 429. Not retryable.
    PermanentIo,
    /// Explicit agent failure; the agent itself tags transient/permanent.
    AgentInternal { transient: bool },
    /// Not a failure; produces `task.recovered` or a silent reset.
    Cancellation,
    /// Store unavailable, out-of-memory. Stops scheduling entirely.
    Fatal,
}

impl Kind {
    /// Whether the executor should retry an attempt that failed with this kind.
    ///
    /// An error the boundary cannot classify defaults to permanent —
    /// fail closed rather than retry-loop on an unclassifiable error.
    pub fn is_retryable(self) -> bool {
        match self {
            Kind::TransientIo => true,
            Kind::AgentInternal { transient } => transient,
            Kind::Validation
            | Kind::PermanentIo
            | Kind::Cancellation
            | Kind::Fatal => false,
        }
    }
}

/// Implemented by each crate's error enum to answer the retry question.
pub trait ErrorKind {
    fn kind(&self) -> Kind;

    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
