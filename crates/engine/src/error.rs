// SPDX-License-Identifier: MIT

use orc_core::{ErrorKind, Kind};
use orc_executor::ExecutorError;
use orc_mutation::MutationError;
use orc_store::StoreError;
use thiserror::Error;

/// Errors raised by [`crate::Engine`]'s operations. Each variant wraps the
/// lower crate that actually rejected the call; this enum exists so a
/// caller one layer up (an HTTP handler) classifies a failure without
/// reaching into `orc-store`/`orc-executor`/`orc-mutation` directly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl ErrorKind for EngineError {
    fn kind(&self) -> Kind {
        match self {
            EngineError::Store(e) => e.kind(),
            EngineError::Mutation(e) => e.kind(),
            EngineError::Executor(e) => e.kind(),
        }
    }
}
