// SPDX-License-Identifier: MIT

use super::*;
use crate::generic::GENERIC_AGENT_TYPE;
use crate::test_support::FailingAgent;

#[test]
fn unknown_agent_type_resolves_to_fallback() {
    let registry = AgentRegistry::new();
    let agent = registry.resolve("arxiv_search");
    // Can't downcast `dyn Agent`; assert indirectly via `is_known`.
    assert!(!registry.is_known("arxiv_search"));
    drop(agent);
}

#[test]
fn generic_is_always_known() {
    let registry = AgentRegistry::new();
    assert!(registry.is_known(GENERIC_AGENT_TYPE));
}

#[test]
fn registered_type_is_known_and_resolves_to_it() {
    let mut registry = AgentRegistry::new();
    registry.register("reporter", Arc::new(FailingAgent::new("boom")));
    assert!(registry.is_known("reporter"));
}

#[test]
fn registering_twice_replaces_the_entry() {
    let mut registry = AgentRegistry::new();
    registry.register("reporter", Arc::new(FailingAgent::new("first")));
    registry.register("reporter", Arc::new(FailingAgent::new("second")));
    assert!(registry.is_known("reporter"));
}
