// SPDX-License-Identifier: MIT

//! Reference agent implementations and test doubles used by this crate's
//! own tests and by the executor/mutation crates' integration tests.
//! Gated behind `test-support` so production binaries never link them in.

use crate::agent::{Agent, AgentInput, AgentRunOutput, LogSink};
use crate::error::AgentError;
use async_trait::async_trait;
use orc_core::LogLevel;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Captures every log line passed to it, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }
}

impl LogSink for RecordingLogSink {
    fn log(&self, level: LogLevel, message: String, _payload: Option<serde_json::Value>) {
        self.lines.lock().push((level, message));
    }
}

/// An agent whose outcome on each call is taken from a fixed script,
/// looping on the last entry once exhausted. Used to drive Scenario C
/// (retry-then-success) and similar attempt-sequenced tests.
pub struct ScriptedAgent {
    script: Vec<Result<String, AgentError>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<Result<String, AgentError>>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep before returning, to exercise cancellation mid-flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn run(
        &self,
        input: AgentInput,
        log_sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Result<AgentRunOutput, AgentError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        let idx = attempt.min(self.script.len().saturating_sub(1));
        log_sink.info(format!("attempt {attempt} for {}", input.task.id));

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            }
        } else if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        match &self.script[idx] {
            Ok(summary) => Ok(AgentRunOutput {
                summary: summary.clone(),
                artifacts: Vec::new(),
            }),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Always fails permanently. Used for partial-failure scenarios.
#[derive(Debug, Default)]
pub struct FailingAgent {
    pub message: String,
}

impl FailingAgent {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    async fn run(
        &self,
        _input: AgentInput,
        log_sink: Arc<dyn LogSink>,
        _cancel: CancellationToken,
    ) -> Result<AgentRunOutput, AgentError> {
        log_sink.error(self.message.clone());
        Err(AgentError::Permanent(self.message.clone()))
    }
}
