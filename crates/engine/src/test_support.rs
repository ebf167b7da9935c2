// SPDX-License-Identifier: MIT

//! Fixtures for wiring a fully composed [`Engine`] against an in-memory
//! store and a scripted chat client in tests, mirroring
//! `orc_executor::test_support`'s `test_executor`.

use crate::Engine;
use orc_agents::AgentRegistry;
use orc_core::FakeClock;
use orc_executor::test_support::fast_config;
use orc_executor::Executor;
use orc_mutation::{MutationConfig, MutationEngine};
use orc_planner::{ChatClient, Planner};
use orc_store::{GraphStore, InMemoryStore};
use std::sync::Arc;
use std::time::Duration;

/// A fully wired engine over a fresh in-memory store and the given chat
/// client and agent registry, with short retry/backoff/grace windows so
/// tests run fast.
pub fn test_engine(
    chat: Arc<dyn ChatClient>,
    registry: AgentRegistry,
    max_tasks: usize,
    max_retries: u32,
) -> Engine {
    let store: Arc<dyn GraphStore> = Arc::new(InMemoryStore::with_clock(FakeClock::new()));
    let bus = orc_bus::EventBus::new(64);
    let planner = Planner::new(chat, registry.clone(), max_tasks, max_retries);
    let executor = Executor::new(store.clone(), bus.clone(), registry.clone(), fast_config());
    let mutation = MutationEngine::new(
        store.clone(),
        bus.clone(),
        executor.clone(),
        MutationConfig { cancellation_grace: Duration::from_millis(50) },
    );
    Engine::new(store, bus, registry, planner, executor, mutation)
}
