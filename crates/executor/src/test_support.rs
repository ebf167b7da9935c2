// SPDX-License-Identifier: MIT

//! Fixtures for wiring an [`Executor`] against an in-memory store in tests,
//! reused by this crate's own tests, the mutation engine, and the
//! root integration suite.

use crate::{Executor, ExecutorConfig};
use orc_agents::AgentRegistry;
use orc_core::{ActionId, FakeClock, TaskId, TaskSpec};
use orc_store::{GraphStore, InMemoryStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Short backoff and timeouts so retry/timeout paths don't make tests slow.
pub fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        max_concurrent_tasks_per_action: 4,
        task_retry_max_attempts: 3,
        task_retry_base_backoff: Duration::from_millis(5),
        task_timeout: Duration::from_secs(5),
        cancellation_grace: Duration::from_millis(50),
    }
}

/// A store, bus, and executor sharing one in-memory backing.
pub fn test_executor(registry: AgentRegistry) -> (Arc<dyn GraphStore>, orc_bus::EventBus, Executor) {
    let store: Arc<dyn GraphStore> = Arc::new(InMemoryStore::with_clock(FakeClock::new()));
    let bus = orc_bus::EventBus::new(64);
    let executor = Executor::new(store.clone(), bus.clone(), registry, fast_config());
    (store, bus, executor)
}

/// Create an action with one task per prompt, each depending on the one
/// before it.
pub fn seed_linear_chain(
    store: &Arc<dyn GraphStore>,
    agent_type: &str,
    prompts: &[&str],
) -> Result<(ActionId, Vec<TaskId>), StoreError> {
    let action = store.create_action("test action".into(), "test".into());
    let ids: Vec<TaskId> = prompts.iter().map(|_| TaskId::new()).collect();
    let specs: Vec<TaskSpec> = prompts
        .iter()
        .enumerate()
        .map(|(i, prompt)| TaskSpec {
            id: ids[i],
            prompt: (*prompt).to_string(),
            agent_type: agent_type.to_string(),
            model: None,
            dependencies: if i == 0 { Vec::new() } else { vec![ids[i - 1]] },
        })
        .collect();
    store.create_tasks(action.id, specs)?;
    Ok((action.id, ids))
}

/// Create an action with two independent tasks and a third depending on both
/// (a diamond's bottom half without the shared ancestor), for concurrency
/// and partial-failure tests.
pub fn seed_fan_in(
    store: &Arc<dyn GraphStore>,
    agent_type: &str,
    branch_a: &str,
    branch_b: &str,
    join: &str,
) -> Result<(ActionId, TaskId, TaskId, TaskId), StoreError> {
    let action = store.create_action("test action".into(), "test".into());
    let a = TaskId::new();
    let b = TaskId::new();
    let c = TaskId::new();
    let specs = vec![
        TaskSpec {
            id: a,
            prompt: branch_a.to_string(),
            agent_type: agent_type.to_string(),
            model: None,
            dependencies: Vec::new(),
        },
        TaskSpec {
            id: b,
            prompt: branch_b.to_string(),
            agent_type: agent_type.to_string(),
            model: None,
            dependencies: Vec::new(),
        },
        TaskSpec {
            id: c,
            prompt: join.to_string(),
            agent_type: agent_type.to_string(),
            model: None,
            dependencies: vec![a, b],
        },
    ];
    store.create_tasks(action.id, specs)?;
    Ok((action.id, a, b, c))
}
