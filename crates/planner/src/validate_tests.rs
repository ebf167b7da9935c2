// SPDX-License-Identifier: MIT

use super::*;
use crate::raw::RawTaskSpec;
use orc_agents::AgentRegistry;

fn task(prompt: &str, deps: Vec<usize>) -> RawTaskSpec {
    RawTaskSpec {
        prompt: prompt.to_string(),
        agent_type: "generic".to_string(),
        dependencies: deps,
        model: None,
    }
}

#[test]
fn rejects_empty_plan() {
    assert_eq!(validate_raw_plan(&[], 8), Err(PlannerError::EmptyPlan));
}

#[test]
fn rejects_empty_prompt() {
    let raw = vec![task("", vec![])];
    assert_eq!(validate_raw_plan(&raw, 8), Err(PlannerError::EmptyPrompt(0)));
}

#[test]
fn rejects_forward_reference() {
    // T0 depends on T1, which comes later: a cycle-shaped reference.
    let raw = vec![task("a", vec![1]), task("b", vec![])];
    assert_eq!(
        validate_raw_plan(&raw, 8),
        Err(PlannerError::ForwardReference { index: 0, dependency: 1 })
    );
}

#[test]
fn rejects_self_reference() {
    let raw = vec![task("a", vec![0])];
    assert_eq!(
        validate_raw_plan(&raw, 8),
        Err(PlannerError::ForwardReference { index: 0, dependency: 0 })
    );
}

#[test]
fn rejects_plan_exceeding_max_tasks() {
    let raw = vec![task("a", vec![]), task("b", vec![]), task("c", vec![])];
    assert_eq!(validate_raw_plan(&raw, 2), Err(PlannerError::TooManyTasks(3, 2)));
}

#[test]
fn accepts_a_valid_chain() {
    let raw = vec![task("a", vec![]), task("b", vec![0])];
    assert!(validate_raw_plan(&raw, 8).is_ok());
}

#[test]
fn normalize_replaces_unknown_agent_types_with_generic() {
    let mut raw = vec![RawTaskSpec {
        agent_type: "arxiv_search".to_string(),
        ..task("a", vec![])
    }];
    let registry = AgentRegistry::new();
    normalize_agent_types(&mut raw, &registry);
    assert_eq!(raw[0].agent_type, orc_agents::GENERIC_AGENT_TYPE);
}

#[test]
fn normalize_leaves_known_agent_types_alone() {
    let mut raw = vec![task("a", vec![])]; // already "generic", always known
    let registry = AgentRegistry::new();
    normalize_agent_types(&mut raw, &registry);
    assert_eq!(raw[0].agent_type, "generic");
}
