// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-engine: the `Engine` facade (§6) composing `GraphStore`, `Planner`,
//! `EventBus`, `Executor`, and `MutationEngine` into the single surface an
//! HTTP layer (out of scope here) would call directly.

mod engine;
mod error;

pub use engine::{ActionView, Engine};
pub use error::EngineError;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
