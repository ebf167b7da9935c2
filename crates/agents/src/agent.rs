// SPDX-License-Identifier: MIT

//! The `Agent` contract (§4.6): every agent consumes a task plus the
//! completed outputs of its dependencies and produces an output summary
//! plus zero or more artifacts, logging through a sink and observing a
//! cooperative cancellation signal.

use crate::error::AgentError;
use async_trait::async_trait;
use orc_core::{Artifact, ArtifactId, LogLevel, Task, TaskId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The completed output of one of a task's dependencies, handed to the
/// agent as input context.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyOutput {
    pub task_id: TaskId,
    pub summary: String,
    pub artifact_ids: Vec<ArtifactId>,
}

/// Everything an agent needs to run one attempt of a task.
#[derive(Debug, Clone)]
pub struct AgentInput {
    pub task: Task,
    /// Outputs of `task.dependencies`, in dependency order.
    pub dependency_outputs: Vec<DependencyOutput>,
}

/// What an agent returns on success: a short summary plus any artifacts it
/// produced. The executor persists both atomically with the `completed`
/// transition.
#[derive(Debug, Clone, Default)]
pub struct AgentRunOutput {
    pub summary: String,
    pub artifacts: Vec<Artifact>,
}

/// Forwards one log line to the `log.append` event stream (§4.6). Agents
/// never see the event bus directly; the executor supplies a sink that
/// writes through the graph store and publishes the corresponding event.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: String, payload: Option<serde_json::Value>);

    fn info(&self, message: String) {
        self.log(LogLevel::Info, message, None);
    }

    fn warn(&self, message: String) {
        self.log(LogLevel::Warn, message, None);
    }

    fn error(&self, message: String) {
        self.log(LogLevel::Error, message, None);
    }
}

/// A specialised executor for one `agent_type`, resolved by the registry.
///
/// Implementations must check `cancel` at cooperative points and abort
/// promptly; the executor never forcibly terminates a running future, it
/// only signals and waits out the cancellation grace window (§4.5).
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(
        &self,
        input: AgentInput,
        log_sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Result<AgentRunOutput, AgentError>;
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
