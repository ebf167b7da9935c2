// SPDX-License-Identifier: MIT

//! Converts a root prompt into a validated task DAG via a structured-output
//! LLM call (§4.3): retry with a corrective follow-up on invalid output or
//! provider error, falling back to a single degraded task once retries are
//! exhausted.

use crate::chat::{ChatClient, ChatTurn};
use crate::raw::{parse_raw_plan, RawTaskSpec};
use crate::validate::{normalize_agent_types, validate_raw_plan};
use orc_agents::{AgentRegistry, GENERIC_AGENT_TYPE};
use orc_core::{Task, TaskId, TaskSpec};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a planner. Decompose the user's goal into an ordered JSON array of tasks. \
Each task object has: \"prompt\" (string, non-empty), \"agent_type\" (string), \
\"dependencies\" (array of integer indices into this same array, each strictly less than \
the task's own index), and optionally \"model\" (string). Output only the JSON array, no prose.";

/// Input to [`Planner::plan`].
pub struct PlanRequest<'a> {
    pub root_prompt: &'a str,
    /// Context for a re-plan: the action's current tasks, if any.
    pub existing_tasks: Option<&'a [Task]>,
}

/// Result of a planning attempt, successful or degraded.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub tasks: Vec<TaskSpec>,
    /// `true` if retries were exhausted and the fallback single task was used.
    pub used_fallback: bool,
    /// Number of provider calls made (including the one that finally succeeded).
    pub attempts: u32,
}

pub struct Planner {
    chat: Arc<dyn ChatClient>,
    registry: AgentRegistry,
    max_tasks: usize,
    max_retries: u32,
}

impl Planner {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        registry: AgentRegistry,
        max_tasks: usize,
        max_retries: u32,
    ) -> Self {
        Self { chat, registry, max_tasks, max_retries }
    }

    pub async fn plan(&self, request: PlanRequest<'_>) -> PlanOutcome {
        if request.root_prompt.trim().is_empty() {
            return fallback_plan(request.root_prompt);
        }

        let mut turns = vec![ChatTurn::user(initial_prompt(&request))];
        let mut attempts = 0u32;

        // `max_retries` corrective follow-ups in addition to the first try.
        for attempt in 0..=self.max_retries {
            attempts += 1;
            let outcome = self.attempt_once(&turns).await;
            match outcome {
                Ok(raw) => {
                    let mut raw = raw;
                    normalize_agent_types(&mut raw, &self.registry);
                    tracing::info!(attempt, task_count = raw.len(), "planner produced valid dag");
                    return PlanOutcome {
                        tasks: resolve_plan(raw),
                        used_fallback: false,
                        attempts,
                    };
                }
                Err((correction, raw_text)) => {
                    tracing::warn!(attempt, error = %correction, "planner attempt rejected, retrying");
                    if attempt < self.max_retries {
                        if let Some(text) = raw_text {
                            turns.push(ChatTurn::assistant(text));
                        }
                        turns.push(ChatTurn::user(format!(
                            "Output a valid acyclic DAG, matching the schema exactly. {correction}"
                        )));
                    }
                }
            }
        }

        tracing::warn!(
            root_prompt = request.root_prompt,
            "planner exhausted retries; falling back to a single generic task"
        );
        let mut fallback = fallback_plan(request.root_prompt);
        fallback.attempts = attempts;
        fallback
    }

    /// One provider round-trip plus parse+validate. `Ok` carries the
    /// validated raw plan; `Err` carries a human-readable correction plus
    /// the raw assistant text (if any) to thread back into the conversation.
    async fn attempt_once(
        &self,
        turns: &[ChatTurn],
    ) -> Result<Vec<RawTaskSpec>, (String, Option<String>)> {
        let text = self
            .chat
            .complete(SYSTEM_PROMPT, turns)
            .await
            .map_err(|e| (e.to_string(), None))?;

        let raw = parse_raw_plan(&text).map_err(|e| (e.to_string(), Some(text.clone())))?;

        validate_raw_plan(&raw, self.max_tasks).map_err(|e| (e.to_string(), Some(text)))?;

        Ok(raw)
    }
}

fn initial_prompt(request: &PlanRequest<'_>) -> String {
    match request.existing_tasks {
        None => request.root_prompt.to_string(),
        Some(tasks) => {
            let summary: Vec<String> = tasks
                .iter()
                .map(|t| format!("- [{}] {} ({})", t.id, t.prompt, t.agent_type))
                .collect();
            format!(
                "Re-plan for: {}\n\nExisting tasks:\n{}",
                request.root_prompt,
                summary.join("\n")
            )
        }
    }
}

/// Resolve index-based dependencies into freshly generated `TaskId`s and
/// assign each task its own id, so the whole batch can be handed to the
/// store in one `create_tasks` call with cross-references intact.
fn resolve_plan(raw: Vec<RawTaskSpec>) -> Vec<TaskSpec> {
    let ids: Vec<TaskId> = (0..raw.len()).map(|_| TaskId::new()).collect();
    raw.into_iter()
        .enumerate()
        .map(|(i, task)| TaskSpec {
            id: ids[i],
            prompt: task.prompt,
            agent_type: task.agent_type,
            model: task.model,
            dependencies: task.dependencies.iter().map(|&d| ids[d]).collect(),
        })
        .collect()
}

/// The degraded single-task plan used once retries are exhausted.
fn fallback_plan(root_prompt: &str) -> PlanOutcome {
    PlanOutcome {
        tasks: vec![TaskSpec {
            id: TaskId::new(),
            prompt: root_prompt.to_string(),
            agent_type: GENERIC_AGENT_TYPE.to_string(),
            model: None,
            dependencies: Vec::new(),
        }],
        used_fallback: true,
        attempts: 0,
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
