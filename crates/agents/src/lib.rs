// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-agents: the `Agent` contract (§4.6), an in-process agent registry,
//! and the generic fallback agent every unknown `agent_type` resolves to.

mod agent;
mod error;
mod generic;
mod registry;

pub use agent::{Agent, AgentInput, AgentRunOutput, DependencyOutput, LogSink};
pub use error::AgentError;
pub use generic::{GenericAgent, GENERIC_AGENT_TYPE};
pub use registry::AgentRegistry;

#[cfg(any(test, feature = "test-support"))]
mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{FailingAgent, RecordingLogSink, ScriptedAgent};
