// SPDX-License-Identifier: MIT

//! The generic fallback agent: the registry's entry for any `agent_type`
//! it doesn't recognise, and the agent type the planner's degraded-fallback
//! task uses when structured-output repair is exhausted (§4.3, §4.6, §9).

use crate::agent::{Agent, AgentInput, AgentRunOutput, LogSink};
use crate::error::AgentError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const GENERIC_AGENT_TYPE: &str = "generic";

/// Echoes the task prompt back as its output summary. Stands in for "do
/// something with this prompt" when no specialised agent is registered for
/// a task's declared `agent_type`, so a task created against a registry
/// that hasn't learned a new type yet still runs to completion.
#[derive(Debug, Default)]
pub struct GenericAgent;

#[async_trait]
impl Agent for GenericAgent {
    async fn run(
        &self,
        input: AgentInput,
        log_sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Result<AgentRunOutput, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        log_sink.info(format!("generic agent handling: {}", input.task.prompt));
        Ok(AgentRunOutput {
            summary: input.task.prompt,
            artifacts: Vec::new(),
        })
    }
}

#[cfg(test)]
#[path = "generic_tests.rs"]
mod tests;
