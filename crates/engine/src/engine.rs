// SPDX-License-Identifier: MIT

//! The composition root (§6): wires `GraphStore` + `Planner` + `EventBus` +
//! `Executor` + `MutationEngine` behind the operations an HTTP layer (out
//! of scope here) would call directly — create/get/list/patch an action,
//! add/edit a task, run an action, subscribe to its events, fetch logs and
//! artifacts.

use crate::error::EngineError;
use orc_agents::{AgentRegistry, GENERIC_AGENT_TYPE};
use orc_core::config::{self, FileOrchestratorConfig};
use orc_core::{Action, ActionId, Artifact, ArtifactId, Event, LogEntry, Task, TaskId, TaskSpec};
use orc_executor::{Executor, ExecutorConfig};
use orc_mutation::{MutationConfig, MutationEngine};
use orc_planner::{ChatClient, PlanRequest, Planner};
use orc_store::{ActionFilter, GraphStore, TaskPatch};
use std::sync::Arc;

/// An action bundled with its current task list — the shape every
/// action-returning operation in §6's table hands back.
#[derive(Debug, Clone)]
pub struct ActionView {
    pub action: Action,
    pub tasks: Vec<Task>,
}

/// The single surface composing the orchestrator's lower crates (§6).
/// Cheap to clone: every field is itself `Arc`-backed or a handle onto
/// shared state, so holding one `Engine` per request is fine.
pub struct Engine {
    store: Arc<dyn GraphStore>,
    bus: orc_bus::EventBus,
    registry: AgentRegistry,
    planner: Planner,
    executor: Executor,
    mutation: MutationEngine,
}

impl Engine {
    pub fn new(
        store: Arc<dyn GraphStore>,
        bus: orc_bus::EventBus,
        registry: AgentRegistry,
        planner: Planner,
        executor: Executor,
        mutation: MutationEngine,
    ) -> Self {
        Self { store, bus, registry, planner, executor, mutation }
    }

    /// Build a fully wired engine from a chat client and a resolved config
    /// file, the same way each lower crate's own `*Config::from_file`
    /// resolves its options from env-then-file-then-default.
    pub fn from_file(chat: Arc<dyn ChatClient>, file: &FileOrchestratorConfig) -> Self {
        let store: Arc<dyn GraphStore> = Arc::new(orc_store::InMemoryStore::from_file(file));
        let bus = orc_bus::EventBus::from_file(file);
        let registry = AgentRegistry::new();
        let planner = Planner::new(
            chat,
            registry.clone(),
            config::planner_max_tasks(file),
            config::planner_max_retries(file),
        );
        let executor = Executor::new(
            store.clone(),
            bus.clone(),
            registry.clone(),
            ExecutorConfig::from_file(file),
        );
        let mutation = MutationEngine::new(
            store.clone(),
            bus.clone(),
            executor.clone(),
            MutationConfig::from_file(file),
        );
        Self::new(store, bus, registry, planner, executor, mutation)
    }

    /// Create action (§6): plans the initial task graph from `root_prompt`
    /// and persists both in one call. Does not start a run — `run_action`
    /// is a separate, explicit step.
    pub async fn create_action(
        &self,
        root_prompt: String,
        title: Option<String>,
    ) -> Result<ActionView, EngineError> {
        let action = self
            .store
            .create_action(title.unwrap_or_else(|| "untitled action".into()), root_prompt.clone());
        let outcome = self
            .planner
            .plan(PlanRequest { root_prompt: &root_prompt, existing_tasks: None })
            .await;
        let tasks = self.store.create_tasks(action.id, outcome.tasks)?;
        let action = self.store.recompute_action_status(action.id)?;
        Ok(ActionView { action, tasks })
    }

    pub fn get_action(&self, action_id: ActionId) -> Result<ActionView, EngineError> {
        let action = self.store.get_action(action_id)?;
        let tasks = self.store.list_tasks(action_id)?;
        Ok(ActionView { action, tasks })
    }

    pub fn list_actions(&self, filter: ActionFilter) -> Vec<Action> {
        self.store.list_actions(filter)
    }

    /// Patch action (§6): updates `title`/`root_prompt`. A changed
    /// `root_prompt` re-plans the action from scratch — aborting any live
    /// run, discarding the current task set leaf-first (so `delete_task`'s
    /// `HasDependents` check never trips), and persisting the fresh plan.
    pub async fn patch_action(
        &self,
        action_id: ActionId,
        title: Option<String>,
        root_prompt: Option<String>,
    ) -> Result<ActionView, EngineError> {
        let before = self.store.get_action(action_id)?;
        let replan_prompt = root_prompt
            .as_ref()
            .filter(|p| **p != before.root_prompt)
            .cloned();

        let action = self.store.patch_action(action_id, title, root_prompt)?;

        let Some(new_prompt) = replan_prompt else {
            let tasks = self.store.list_tasks(action_id)?;
            return Ok(ActionView { action, tasks });
        };

        self.executor.abort_action(action_id);
        let existing = self.store.list_tasks(action_id)?;
        let outcome = self
            .planner
            .plan(PlanRequest { root_prompt: &new_prompt, existing_tasks: Some(&existing) })
            .await;

        self.delete_leaf_first(existing)?;

        let tasks = self.store.create_tasks(action_id, outcome.tasks)?;
        let action = self.store.recompute_action_status(action_id)?;
        Ok(ActionView { action, tasks })
    }

    /// Delete `tasks` in dependency-closed order: repeatedly remove every
    /// task nothing left in the set still depends on, so each
    /// `delete_task` call sees no remaining dependent.
    fn delete_leaf_first(&self, mut remaining: Vec<Task>) -> Result<(), EngineError> {
        while !remaining.is_empty() {
            let deletable: Vec<TaskId> = remaining
                .iter()
                .filter(|t| !remaining.iter().any(|other| other.dependencies.contains(&t.id)))
                .map(|t| t.id)
                .collect();
            if deletable.is_empty() {
                break;
            }
            for id in &deletable {
                self.store.delete_task(*id)?;
            }
            remaining.retain(|t| !deletable.contains(&t.id));
        }
        Ok(())
    }

    /// Add task (§6): inserts a new pending task, falling back to the
    /// generic agent for an unregistered `agent_type` (§4.3 validation
    /// rule 1, mirrored here so a caller never has to know the registry's
    /// contents up front).
    pub async fn add_task(
        &self,
        action_id: ActionId,
        prompt: String,
        agent_type: Option<String>,
        dependencies: Vec<TaskId>,
    ) -> Result<Task, EngineError> {
        let requested = agent_type.unwrap_or_else(|| GENERIC_AGENT_TYPE.to_string());
        let agent_type = if self.registry.is_known(&requested) {
            requested
        } else {
            GENERIC_AGENT_TYPE.to_string()
        };
        let spec = TaskSpec { id: TaskId::new(), prompt, agent_type, model: None, dependencies };
        Ok(self.mutation.add(action_id, spec).await?)
    }

    /// Edit task (§6): triggers invalidation of the task and its
    /// transitive dependents, per [`MutationEngine::edit`].
    pub async fn edit_task(&self, task_id: TaskId, patch: TaskPatch) -> Result<Task, EngineError> {
        Ok(self.mutation.edit(task_id, patch).await?)
    }

    /// Run action (§6): starts driving the action's ready set. Returns
    /// `false` if a run is already in progress.
    pub fn run_action(&self, action_id: ActionId) -> bool {
        self.executor.run(action_id)
    }

    /// Subscribe (§6): registers a live subscription and delivers a
    /// snapshot of the action's current state as its first event.
    pub fn subscribe(&self, action_id: ActionId) -> Result<orc_bus::Subscription, EngineError> {
        let action = self.store.get_action(action_id)?;
        let tasks = self.store.list_tasks(action_id)?;
        Ok(self.bus.subscribe(action_id, Event::Snapshot { action, tasks }))
    }

    pub fn get_logs(&self, task_id: TaskId) -> Result<Vec<LogEntry>, EngineError> {
        Ok(self.store.list_logs(task_id)?)
    }

    pub fn get_artifact(&self, artifact_id: ArtifactId) -> Option<Artifact> {
        self.store.get_artifact(artifact_id)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
