// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-planner: the `Planner` (§4.3) that turns a root prompt into a
//! validated task DAG through the `ChatClient` abstraction, with retry and
//! degraded fallback.

mod chat;
mod error;
mod planner;
mod raw;
mod validate;

pub use chat::{ChatClient, ChatError, ChatRole, ChatTurn};
pub use error::PlannerError;
pub use planner::{PlanOutcome, PlanRequest, Planner};
pub use raw::{parse_raw_plan, RawTaskSpec};
pub use validate::{normalize_agent_types, validate_raw_plan};

#[cfg(any(test, feature = "test-support"))]
mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::ScriptedChatClient;
