// SPDX-License-Identifier: MIT

//! The in-process agent registry (§4.6, §9): `agent_type` strings resolve
//! to statically compiled implementations rather than dynamically loaded
//! user code. An unknown type resolves to the configured fallback, never
//! to an error.

use crate::agent::Agent;
use crate::generic::{GenericAgent, GENERIC_AGENT_TYPE};
use std::collections::HashMap;
use std::sync::Arc;

/// `agent_type` -> implementation, populated at process startup from a
/// static list of compiled-in agents.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
    fallback: Arc<dyn Agent>,
}

impl AgentRegistry {
    /// An empty registry backed only by the generic fallback — every
    /// `agent_type` resolves to it until specific agents are registered.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            fallback: Arc::new(GenericAgent),
        }
    }

    /// Register `agent` under `agent_type`, replacing any prior entry.
    pub fn register(&mut self, agent_type: impl Into<String>, agent: Arc<dyn Agent>) {
        self.agents.insert(agent_type.into(), agent);
    }

    /// Resolve `agent_type` to its implementation. Unknown types fall back
    /// to the generic agent (§4.3 validation rule 1, §4.6).
    pub fn resolve(&self, agent_type: &str) -> Arc<dyn Agent> {
        self.agents
            .get(agent_type)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// `true` if `agent_type` has a specific implementation registered
    /// (as opposed to resolving to the fallback).
    pub fn is_known(&self, agent_type: &str) -> bool {
        agent_type == GENERIC_AGENT_TYPE || self.agents.contains_key(agent_type)
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
