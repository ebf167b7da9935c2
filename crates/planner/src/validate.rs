// SPDX-License-Identifier: MIT

//! Validation rules applied to a raw plan, in the order §4.3 fixes them.

use crate::error::PlannerError;
use crate::raw::RawTaskSpec;
use orc_agents::AgentRegistry;

/// Applies validation rules 1-3 in order, short-circuiting on the first
/// failure. Rule 1's "unknown agent type falls back to generic" is not a
/// validation failure — it is applied as a normalisation in
/// [`crate::planner::resolve_plan`] after this function passes.
pub fn validate_raw_plan(
    raw: &[RawTaskSpec],
    max_tasks: usize,
) -> Result<(), PlannerError> {
    if raw.is_empty() {
        return Err(PlannerError::EmptyPlan);
    }
    for (i, task) in raw.iter().enumerate() {
        if task.prompt.trim().is_empty() {
            return Err(PlannerError::EmptyPrompt(i));
        }
        for &dep in &task.dependencies {
            if dep >= i {
                return Err(PlannerError::ForwardReference { index: i, dependency: dep });
            }
        }
    }
    if raw.len() > max_tasks {
        return Err(PlannerError::TooManyTasks(raw.len(), max_tasks));
    }
    Ok(())
}

/// Replace any `agent_type` the registry doesn't recognise with the generic
/// fallback type, rather than rejecting the plan (§4.3 rule 1, §4.6).
pub fn normalize_agent_types(raw: &mut [RawTaskSpec], registry: &AgentRegistry) {
    for task in raw.iter_mut() {
        if !registry.is_known(&task.agent_type) {
            task.agent_type = orc_agents::GENERIC_AGENT_TYPE.to_string();
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
