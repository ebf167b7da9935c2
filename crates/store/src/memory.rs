// SPDX-License-Identifier: MIT

//! In-process, event-sourced [`GraphStore`] implementation (§4.2).
//!
//! Every mutating call first builds a small [`StoreEvent`] describing the
//! state change, applies it to the in-memory table set, and only then
//! returns success — "apply the event, state is derived from facts" rather
//! than mutating fields ad hoc. The event itself is not retained; a real
//! persistence layer would instead append it to a WAL before applying it.
//! `snapshot`/`restore` (zstd-compressed) let a caller persist and later
//! rehydrate the full materialized state.

use crate::error::StoreError;
use crate::store::{ActionFilter, ClaimToken, GraphStore, TaskOutcome, TaskPatch};
use orc_core::config::{self, FileOrchestratorConfig};
use orc_core::{
    Action, ActionId, ActionStatus, Artifact, ArtifactId, Clock, LogEntry, LogEntryId, LogLevel,
    SystemClock, Task, TaskId, TaskOutput, TaskSpec, TaskStatus,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

/// Default retained log rows per task when a store is built without an
/// explicit config (§6's `ORC_LOG_RETENTION_PER_TASK` default).
const DEFAULT_LOG_RETENTION_PER_TASK: usize = 1000;

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct MaterializedState {
    actions: indexmap::IndexMap<ActionId, Action>,
    tasks: indexmap::IndexMap<TaskId, Task>,
    /// Creation-order task ids per action — the admission order the
    /// executor's ready set is stable by.
    action_tasks: HashMap<ActionId, Vec<TaskId>>,
    outputs: HashMap<TaskId, TaskOutput>,
    artifacts: HashMap<ArtifactId, Artifact>,
    logs: HashMap<TaskId, VecDeque<LogEntry>>,
}

/// Describes one state change before it is applied. Mirrors the shape a
/// durable WAL entry would take; this in-memory implementation applies it
/// immediately and does not retain the log.
enum StoreEvent {
    ActionCreated(Action),
    ActionPatched {
        id: ActionId,
        title: Option<String>,
        root_prompt: Option<String>,
        updated_at_ms: u64,
    },
    ActionStatusSet {
        id: ActionId,
        status: ActionStatus,
        updated_at_ms: u64,
    },
    ActionDeleted(ActionId),
    TasksCreated {
        action_id: ActionId,
        tasks: Vec<Task>,
    },
    TaskPatched {
        id: TaskId,
        patch: TaskPatch,
        updated_at_ms: u64,
    },
    TaskClaimed {
        id: TaskId,
        token: String,
        updated_at_ms: u64,
    },
    TaskCompleted {
        id: TaskId,
        output: TaskOutput,
        artifacts: Vec<Artifact>,
        updated_at_ms: u64,
    },
    TaskFailed {
        id: TaskId,
        error: String,
        updated_at_ms: u64,
    },
    TasksReset {
        ids: Vec<TaskId>,
        updated_at_ms: u64,
    },
    TaskDeleted {
        id: TaskId,
        action_id: ActionId,
    },
    LogAppended {
        entry: LogEntry,
        retention: usize,
    },
}

impl MaterializedState {
    fn apply(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::ActionCreated(action) => {
                self.action_tasks.insert(action.id, Vec::new());
                self.actions.insert(action.id, action);
            }
            StoreEvent::ActionPatched {
                id,
                title,
                root_prompt,
                updated_at_ms,
            } => {
                if let Some(action) = self.actions.get_mut(&id) {
                    if let Some(t) = title {
                        action.title = t;
                    }
                    if let Some(p) = root_prompt {
                        action.root_prompt = p;
                    }
                    action.updated_at_ms = updated_at_ms;
                }
            }
            StoreEvent::ActionStatusSet {
                id,
                status,
                updated_at_ms,
            } => {
                if let Some(action) = self.actions.get_mut(&id) {
                    action.status = status;
                    action.updated_at_ms = updated_at_ms;
                }
            }
            StoreEvent::ActionDeleted(id) => {
                if let Some(ids) = self.action_tasks.remove(&id) {
                    for tid in ids {
                        self.tasks.shift_remove(&tid);
                        self.outputs.remove(&tid);
                        self.logs.remove(&tid);
                    }
                }
                self.actions.shift_remove(&id);
            }
            StoreEvent::TasksCreated { action_id, tasks } => {
                let list = self.action_tasks.entry(action_id).or_default();
                for task in tasks {
                    list.push(task.id);
                    self.tasks.insert(task.id, task);
                }
            }
            StoreEvent::TaskPatched {
                id,
                patch,
                updated_at_ms,
            } => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    if let Some(prompt) = patch.prompt {
                        task.prompt = prompt;
                    }
                    if let Some(agent_type) = patch.agent_type {
                        task.agent_type = agent_type;
                    }
                    if let Some(model) = patch.model {
                        task.model = model;
                    }
                    if let Some(deps) = patch.dependencies {
                        task.dependencies = deps;
                    }
                    task.updated_at_ms = updated_at_ms;
                }
            }
            StoreEvent::TaskClaimed {
                id,
                token,
                updated_at_ms,
            } => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.status = TaskStatus::Running;
                    task.claim_token = Some(token);
                    task.updated_at_ms = updated_at_ms;
                }
            }
            StoreEvent::TaskCompleted {
                id,
                output,
                artifacts,
                updated_at_ms,
            } => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.status = TaskStatus::Completed;
                    task.claim_token = None;
                    task.output_summary = Some(output.summary.clone());
                    task.updated_at_ms = updated_at_ms;
                }
                for artifact in artifacts {
                    self.artifacts.insert(artifact.id, artifact);
                }
                self.outputs.insert(id, output);
            }
            StoreEvent::TaskFailed {
                id,
                error,
                updated_at_ms,
            } => {
                if let Some(task) = self.tasks.get_mut(&id) {
                    task.status = TaskStatus::Failed;
                    task.claim_token = None;
                    task.output_summary = Some(error);
                    task.updated_at_ms = updated_at_ms;
                }
            }
            StoreEvent::TasksReset { ids, updated_at_ms } => {
                for id in ids {
                    if let Some(task) = self.tasks.get_mut(&id) {
                        task.status = TaskStatus::Pending;
                        task.claim_token = None;
                        task.output_summary = None;
                        task.updated_at_ms = updated_at_ms;
                    }
                    self.outputs.remove(&id);
                }
            }
            StoreEvent::TaskDeleted { id, action_id } => {
                self.tasks.shift_remove(&id);
                self.outputs.remove(&id);
                self.logs.remove(&id);
                if let Some(ids) = self.action_tasks.get_mut(&action_id) {
                    ids.retain(|t| *t != id);
                }
            }
            StoreEvent::LogAppended { entry, retention } => {
                let queue = self.logs.entry(entry.task_id).or_default();
                queue.push_back(entry);
                while queue.len() > retention {
                    queue.pop_front();
                }
            }
        }
    }
}

/// In-memory [`GraphStore`]. A real deployment swaps the table set for row
/// writes against a concrete relational/key-value schema; this is the
/// reference implementation tests exercise directly.
pub struct InMemoryStore<C: Clock = SystemClock> {
    state: Mutex<MaterializedState>,
    clock: C,
    log_retention_per_task: usize,
}

impl InMemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MaterializedState::default()),
            clock: SystemClock,
            log_retention_per_task: DEFAULT_LOG_RETENTION_PER_TASK,
        }
    }

    /// Build a store with its log retention bound resolved from config
    /// (§6's `ORC_LOG_RETENTION_PER_TASK`), the same env-then-file-then-
    /// default precedence `ExecutorConfig::from_file` and
    /// `MutationConfig::from_file` apply to their own options.
    pub fn from_file(file: &FileOrchestratorConfig) -> Self {
        Self {
            state: Mutex::new(MaterializedState::default()),
            clock: SystemClock,
            log_retention_per_task: config::log_retention_per_task(file),
        }
    }
}

impl Default for InMemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Mutex::new(MaterializedState::default()),
            clock,
            log_retention_per_task: DEFAULT_LOG_RETENTION_PER_TASK,
        }
    }

    /// Build a store with an injectable clock and a config-resolved log
    /// retention bound, for tests that need both.
    pub fn with_clock_and_config(clock: C, file: &FileOrchestratorConfig) -> Self {
        Self {
            state: Mutex::new(MaterializedState::default()),
            clock,
            log_retention_per_task: config::log_retention_per_task(file),
        }
    }

    fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

/// Detects whether `tasks` (the proposed full set for an action, after a
/// patch/insert) forms an acyclic graph via Kahn's algorithm. Returns the
/// id of a task on a cycle, if any.
fn find_cycle(tasks: &indexmap::IndexMap<TaskId, Vec<TaskId>>) -> Option<TaskId> {
    // Build dependents adjacency: dep -> [tasks depending on it].
    let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut indegree: HashMap<TaskId, usize> = HashMap::new();
    for id in tasks.keys() {
        indegree.insert(*id, 0);
    }
    for (id, deps) in tasks {
        for dep in deps {
            dependents.entry(*dep).or_default().push(*id);
            *indegree.entry(*id).or_insert(0) += 1;
        }
    }
    let mut queue: VecDeque<TaskId> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        if let Some(next) = dependents.get(&id) {
            for n in next {
                if let Some(deg) = indegree.get_mut(n) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*n);
                    }
                }
            }
        }
    }
    if visited == tasks.len() {
        None
    } else {
        indegree
            .into_iter()
            .find(|(_, deg)| *deg > 0)
            .map(|(id, _)| id)
    }
}

impl<C: Clock> GraphStore for InMemoryStore<C> {
    fn create_action(&self, title: String, root_prompt: String) -> Action {
        let now = self.now();
        let action = Action {
            id: ActionId::new(),
            title,
            root_prompt,
            status: ActionStatus::Draft,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let mut state = self.state.lock();
        state.apply(StoreEvent::ActionCreated(action.clone()));
        action
    }

    fn get_action(&self, id: ActionId) -> Result<Action, StoreError> {
        self.state
            .lock()
            .actions
            .get(&id)
            .cloned()
            .ok_or(StoreError::ActionNotFound(id))
    }

    fn list_actions(&self, filter: ActionFilter) -> Vec<Action> {
        self.state
            .lock()
            .actions
            .values()
            .filter(|a| match filter.status {
                Some(s) => s == a.status,
                None => true,
            })
            .cloned()
            .collect()
    }

    fn delete_action(&self, id: ActionId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if !state.actions.contains_key(&id) {
            return Err(StoreError::ActionNotFound(id));
        }
        state.apply(StoreEvent::ActionDeleted(id));
        Ok(())
    }

    fn patch_action(
        &self,
        id: ActionId,
        title: Option<String>,
        root_prompt: Option<String>,
    ) -> Result<Action, StoreError> {
        let mut state = self.state.lock();
        let mut action = state
            .actions
            .get(&id)
            .cloned()
            .ok_or(StoreError::ActionNotFound(id))?;
        let now = self.now();
        if let Some(t) = &title {
            action.title = t.clone();
        }
        if let Some(p) = &root_prompt {
            action.root_prompt = p.clone();
        }
        action.updated_at_ms = now;
        state.apply(StoreEvent::ActionPatched {
            id,
            title,
            root_prompt,
            updated_at_ms: now,
        });
        Ok(action)
    }

    fn get_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.state
            .lock()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))
    }

    fn list_tasks(&self, action_id: ActionId) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock();
        let ids = state
            .action_tasks
            .get(&action_id)
            .ok_or(StoreError::ActionNotFound(action_id))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    fn create_tasks(
        &self,
        action_id: ActionId,
        specs: Vec<TaskSpec>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut state = self.state.lock();
        if !state.actions.contains_key(&action_id) {
            return Err(StoreError::ActionNotFound(action_id));
        }
        if specs.iter().any(|s| s.prompt.trim().is_empty()) {
            return Err(StoreError::EmptyPrompt(action_id));
        }
        let existing_ids: HashSet<TaskId> = state
            .action_tasks
            .get(&action_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        for spec in &specs {
            if existing_ids.contains(&spec.id) {
                return Err(StoreError::DuplicateTaskId(spec.id));
            }
        }
        {
            let mut seen_in_batch = HashSet::new();
            for spec in &specs {
                if !seen_in_batch.insert(spec.id) {
                    return Err(StoreError::DuplicateTaskId(spec.id));
                }
            }
        }

        let now = self.now();
        let new_tasks: Vec<Task> = specs
            .into_iter()
            .map(|spec| Task {
                id: spec.id,
                action_id,
                prompt: spec.prompt,
                agent_type: spec.agent_type,
                model: spec.model,
                status: TaskStatus::Pending,
                dependencies: spec.dependencies,
                output_summary: None,
                claim_token: None,
                created_at_ms: now,
                updated_at_ms: now,
            })
            .collect();

        let new_ids: HashSet<TaskId> = new_tasks.iter().map(|t| t.id).collect();
        for task in &new_tasks {
            for dep in &task.dependencies {
                if !existing_ids.contains(dep) && !new_ids.contains(dep) {
                    return Err(StoreError::ForeignDependency {
                        action: action_id,
                        dependency: *dep,
                    });
                }
            }
        }

        let mut combined: indexmap::IndexMap<TaskId, Vec<TaskId>> = state
            .tasks
            .values()
            .filter(|t| t.action_id == action_id)
            .map(|t| (t.id, t.dependencies.clone()))
            .collect();
        for task in &new_tasks {
            combined.insert(task.id, task.dependencies.clone());
        }
        if let Some(offender) = find_cycle(&combined) {
            return Err(StoreError::Cycle(offender));
        }

        state.apply(StoreEvent::TasksCreated {
            action_id,
            tasks: new_tasks.clone(),
        });
        Ok(new_tasks)
    }

    fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut state = self.state.lock();
        let current = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(task_id))?;
        let action_id = current.action_id;

        if let Some(deps) = &patch.dependencies {
            let existing_ids: HashSet<TaskId> = state
                .tasks
                .values()
                .filter(|t| t.action_id == action_id)
                .map(|t| t.id)
                .collect();
            for dep in deps {
                if *dep == task_id {
                    return Err(StoreError::Cycle(task_id));
                }
                if !existing_ids.contains(dep) {
                    return Err(StoreError::ForeignDependency {
                        action: action_id,
                        dependency: *dep,
                    });
                }
            }
            let mut combined: indexmap::IndexMap<TaskId, Vec<TaskId>> = state
                .tasks
                .values()
                .filter(|t| t.action_id == action_id)
                .map(|t| {
                    if t.id == task_id {
                        (t.id, deps.clone())
                    } else {
                        (t.id, t.dependencies.clone())
                    }
                })
                .collect();
            combined.insert(task_id, deps.clone());
            if let Some(offender) = find_cycle(&combined) {
                return Err(StoreError::Cycle(offender));
            }
        }
        if let Some(prompt) = &patch.prompt {
            if prompt.trim().is_empty() {
                return Err(StoreError::EmptyPrompt(action_id));
            }
        }

        let now = self.now();
        let mut updated = current;
        if let Some(prompt) = patch.prompt.clone() {
            updated.prompt = prompt;
        }
        if let Some(agent_type) = patch.agent_type.clone() {
            updated.agent_type = agent_type;
        }
        if let Some(model) = patch.model.clone() {
            updated.model = model;
        }
        if let Some(deps) = patch.dependencies.clone() {
            updated.dependencies = deps;
        }
        updated.updated_at_ms = now;
        state.apply(StoreEvent::TaskPatched {
            id: task_id,
            patch,
            updated_at_ms: now,
        });
        Ok(updated)
    }

    fn delete_task(&self, task_id: TaskId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(task_id))?;
        let has_dependents = state.tasks.values().any(|t| t.dependencies.contains(&task_id));
        if has_dependents {
            return Err(StoreError::HasDependents(task_id));
        }
        state.apply(StoreEvent::TaskDeleted {
            id: task_id,
            action_id: task.action_id,
        });
        Ok(())
    }

    fn claim_task(&self, task_id: TaskId) -> Result<(Task, ClaimToken), StoreError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::Pending {
            return Err(StoreError::InvalidTransition {
                task: task_id,
                from: task.status.as_static_str(),
                to: "running",
            });
        }
        let dep_statuses: Vec<TaskStatus> = task
            .dependencies
            .iter()
            .filter_map(|id| state.tasks.get(id).map(|t| t.status))
            .collect();
        if !dep_statuses.iter().all(|s| *s == TaskStatus::Completed) {
            return Err(StoreError::InvalidTransition {
                task: task_id,
                from: task.status.as_static_str(),
                to: "running",
            });
        }
        let token = ClaimToken::new();
        let now = self.now();
        state.apply(StoreEvent::TaskClaimed {
            id: task_id,
            token: token.0.clone(),
            updated_at_ms: now,
        });
        let mut updated = task;
        updated.status = TaskStatus::Running;
        updated.claim_token = Some(token.0.clone());
        updated.updated_at_ms = now;
        Ok((updated, token))
    }

    fn commit_task(
        &self,
        task_id: TaskId,
        claim: &ClaimToken,
        outcome: TaskOutcome,
    ) -> Result<Task, StoreError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::Running || task.claim_token.as_deref() != Some(claim.0.as_str())
        {
            return Err(StoreError::StaleClaim(task_id));
        }
        let now = self.now();
        let mut updated = task;
        updated.claim_token = None;
        updated.updated_at_ms = now;
        match outcome {
            TaskOutcome::Completed { summary, artifacts } => {
                let output = TaskOutput {
                    task_id,
                    summary: summary.clone(),
                    artifact_ids: artifacts.iter().map(|a| a.id).collect(),
                    created_at_ms: now,
                };
                updated.status = TaskStatus::Completed;
                updated.output_summary = Some(summary);
                state.apply(StoreEvent::TaskCompleted {
                    id: task_id,
                    output,
                    artifacts,
                    updated_at_ms: now,
                });
            }
            TaskOutcome::Failed { error } => {
                updated.status = TaskStatus::Failed;
                updated.output_summary = Some(error.clone());
                state.apply(StoreEvent::TaskFailed {
                    id: task_id,
                    error,
                    updated_at_ms: now,
                });
            }
        }
        Ok(updated)
    }

    fn reset_tasks(&self, task_ids: &[TaskId]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        for id in task_ids {
            if !state.tasks.contains_key(id) {
                return Err(StoreError::TaskNotFound(*id));
            }
        }
        let now = self.now();
        state.apply(StoreEvent::TasksReset {
            ids: task_ids.to_vec(),
            updated_at_ms: now,
        });
        Ok(())
    }

    fn get_output(&self, task_id: TaskId) -> Option<TaskOutput> {
        self.state.lock().outputs.get(&task_id).cloned()
    }

    fn append_log(
        &self,
        task_id: TaskId,
        level: LogLevel,
        message: String,
        payload: Option<serde_json::Value>,
    ) -> Result<LogEntry, StoreError> {
        let mut state = self.state.lock();
        if !state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        let entry = LogEntry {
            id: LogEntryId::new(),
            task_id,
            level,
            message,
            payload,
            created_at_ms: self.now(),
        };
        state.apply(StoreEvent::LogAppended {
            entry: entry.clone(),
            retention: self.log_retention_per_task,
        });
        Ok(entry)
    }

    fn list_logs(&self, task_id: TaskId) -> Result<Vec<LogEntry>, StoreError> {
        let state = self.state.lock();
        if !state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Ok(state
            .logs
            .get(&task_id)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn get_artifact(&self, id: ArtifactId) -> Option<Artifact> {
        self.state.lock().artifacts.get(&id).cloned()
    }

    fn dependents(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError> {
        let state = self.state.lock();
        if !state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Ok(state
            .tasks
            .values()
            .filter(|t| t.dependencies.contains(&task_id))
            .map(|t| t.id)
            .collect())
    }

    fn transitive_dependents(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError> {
        let state = self.state.lock();
        if !state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        let mut seen = HashSet::new();
        let mut frontier = vec![task_id];
        let mut out = Vec::new();
        while let Some(id) = frontier.pop() {
            for t in state.tasks.values() {
                if t.dependencies.contains(&id) && seen.insert(t.id) {
                    out.push(t.id);
                    frontier.push(t.id);
                }
            }
        }
        Ok(out)
    }

    fn ancestors(&self, task_id: TaskId) -> Result<Vec<TaskId>, StoreError> {
        let state = self.state.lock();
        let mut seen = HashSet::new();
        let mut frontier = vec![task_id];
        let mut out = Vec::new();
        while let Some(id) = frontier.pop() {
            let Some(task) = state.tasks.get(&id) else {
                if id == task_id {
                    return Err(StoreError::TaskNotFound(task_id));
                }
                continue;
            };
            for dep in &task.dependencies {
                if seen.insert(*dep) {
                    out.push(*dep);
                    frontier.push(*dep);
                }
            }
        }
        Ok(out)
    }

    fn ready_tasks(&self, action_id: ActionId) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock();
        let ids = state
            .action_tasks
            .get(&action_id)
            .ok_or(StoreError::ActionNotFound(action_id))?;
        let mut out = Vec::new();
        for id in ids {
            let Some(task) = state.tasks.get(id) else {
                continue;
            };
            if task.status != TaskStatus::Pending {
                continue;
            }
            let ready = task
                .dependencies
                .iter()
                .all(|d| state.tasks.get(d).map(|t| t.status) == Some(TaskStatus::Completed));
            if ready {
                out.push(task.clone());
            }
        }
        Ok(out)
    }

    fn recompute_action_status(&self, action_id: ActionId) -> Result<Action, StoreError> {
        let mut state = self.state.lock();
        let mut action = state
            .actions
            .get(&action_id)
            .cloned()
            .ok_or(StoreError::ActionNotFound(action_id))?;
        let ids = state
            .action_tasks
            .get(&action_id)
            .cloned()
            .unwrap_or_default();
        let tasks: Vec<Task> = ids
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect();

        let any_running = tasks.iter().any(|t| t.status == TaskStatus::Running);
        let any_ready = tasks.iter().any(|t| {
            t.status == TaskStatus::Pending
                && t.dependencies.iter().all(|d| {
                    tasks
                        .iter()
                        .find(|o| o.id == *d)
                        .map(|o| o.status == TaskStatus::Completed)
                        .unwrap_or(false)
                })
        });
        let any_failed = tasks.iter().any(|t| t.status == TaskStatus::Failed);
        let all_completed =
            !tasks.is_empty() && tasks.iter().all(|t| t.status == TaskStatus::Completed);

        let current = action.status;
        let next = if any_running || any_ready {
            ActionStatus::Running
        } else if any_failed {
            ActionStatus::Failed
        } else if all_completed {
            ActionStatus::Completed
        } else {
            current
        };

        if next != current {
            let now = self.now();
            state.apply(StoreEvent::ActionStatusSet {
                id: action_id,
                status: next,
                updated_at_ms: now,
            });
            action.status = next;
            action.updated_at_ms = now;
        }
        Ok(action)
    }

    fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let state = self.state.lock();
        let json = serde_json::to_vec(&*state)
            .map_err(|e| StoreError::Corrupt(format!("encoding snapshot: {e}")))?;
        zstd::stream::encode_all(json.as_slice(), 0)
            .map_err(|e| StoreError::Corrupt(format!("compressing snapshot: {e}")))
    }

    fn restore(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let json = zstd::stream::decode_all(bytes)
            .map_err(|e| StoreError::Corrupt(format!("decompressing snapshot: {e}")))?;
        let mut restored: MaterializedState = serde_json::from_slice(&json)
            .map_err(|e| StoreError::Corrupt(format!("decoding snapshot: {e}")))?;
        // Best-effort restart semantics: no exactly-once claim survives a
        // restart, so any task left mid-flight resumes from `pending`.
        for task in restored.tasks.values_mut() {
            if task.status == TaskStatus::Running {
                task.status = TaskStatus::Pending;
                task.claim_token = None;
            }
        }
        *self.state.lock() = restored;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
