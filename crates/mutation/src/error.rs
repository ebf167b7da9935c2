// SPDX-License-Identifier: MIT

use orc_core::{ErrorKind, Kind};
use orc_store::StoreError;
use thiserror::Error;

/// Errors raised by [`crate::MutationEngine`]'s edit/add/delete operations.
/// All structural validation (cycles, foreign dependencies, empty prompts,
/// remaining dependents on delete) is delegated to the graph store; this
/// enum exists so callers classify a mutation failure without reaching
/// into `orc_store` directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorKind for MutationError {
    fn kind(&self) -> Kind {
        match self {
            MutationError::Store(e) => e.kind(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
