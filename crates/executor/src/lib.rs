// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-executor: the concurrent scheduler that drives an action's task DAG
//! to completion against a `GraphStore`, an `EventBus`, and an
//! `AgentRegistry`.

mod backoff;
mod error;
mod executor;

pub use error::ExecutorError;
pub use executor::{Executor, ExecutorConfig};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
