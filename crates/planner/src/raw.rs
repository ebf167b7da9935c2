// SPDX-License-Identifier: MIT

//! The shape of one task as it comes back from the structured-output LLM
//! call, before the planner resolves index-based dependencies into real
//! `TaskId`s and hands specs to the store.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskSpec {
    pub prompt: String,
    pub agent_type: String,
    /// Indices into the same response list; must be strictly less than
    /// this task's own index (validation rule 2 — guarantees acyclicity).
    #[serde(default)]
    pub dependencies: Vec<usize>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Parse the raw JSON text returned by [`crate::chat::ChatClient::complete`]
/// into an ordered list of [`RawTaskSpec`]. Any shape other than a bare JSON
/// array of task objects is a parse failure, handled the same as an
/// invalid-output retry by the caller.
pub fn parse_raw_plan(text: &str) -> Result<Vec<RawTaskSpec>, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
#[path = "raw_tests.rs"]
mod tests;
