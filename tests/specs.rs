// SPDX-License-Identifier: MIT

//! Workspace-level integration tests driving the crates together the way a
//! real caller would: planner -> store -> executor -> bus, with the
//! mutation engine cutting in mid-run. One test per §8 scenario.

use orc_agents::{AgentRegistry, FailingAgent, ScriptedAgent};
use orc_core::{Event, TaskStatus};
use orc_executor::test_support::{fast_config, seed_fan_in, seed_linear_chain, test_executor};
use orc_executor::Executor;
use orc_mutation::{MutationConfig, MutationEngine};
use orc_planner::{ChatError, PlanRequest, Planner, ScriptedChatClient};
use orc_store::{GraphStore, TaskPatch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}

async fn drain(sub: &mut orc_bus::Subscription, timeout: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(timeout, sub.recv()).await {
        events.push(event);
    }
    events
}

fn event_tag(event: &Event) -> &'static str {
    match event {
        Event::Snapshot { .. } => "snapshot",
        Event::ActionStarted { .. } => "action.started",
        Event::ActionCompleted { .. } => "action.completed",
        Event::ActionFailed { .. } => "action.failed",
        Event::ActionRetrying { .. } => "action.retrying",
        Event::TaskStarted { .. } => "task.started",
        Event::TaskCompleted { .. } => "task.completed",
        Event::TaskFailed { .. } => "task.failed",
        Event::TaskRetrying { .. } => "task.retrying",
        Event::TaskRecovered { .. } => "task.recovered",
        Event::LogAppend { .. } => "log.append",
        Event::Ping { .. } => "ping",
        Event::Lag { .. } => "lag",
    }
}

/// Scenario A (§8): a linear two-task chain runs to completion with the
/// expected event order and at most one task `running` at a time.
#[tokio::test]
async fn scenario_a_linear_chain_runs_in_order() {
    let mut registry = AgentRegistry::new();
    registry.register(
        "data_retrieval",
        Arc::new(ScriptedAgent::new(vec![Ok("fetched SF 2024 weather".into())])),
    );
    registry.register(
        "code_execution",
        Arc::new(ScriptedAgent::new(vec![Ok("fit a sine".into())])),
    );
    let (store, bus, executor) = test_executor(registry);
    let (action_id, ids) = seed_linear_chain(&store, "data_retrieval", &["fetch weather"]).unwrap();
    // seed_linear_chain gives every task the same agent_type; add the
    // second task directly so it can carry `code_execution` instead.
    let t1 = ids[0];
    let spec = orc_core::TaskSpec {
        id: orc_core::TaskId::new(),
        prompt: "fit a sine".into(),
        agent_type: "code_execution".into(),
        model: None,
        dependencies: vec![t1],
    };
    let mut created = store.create_tasks(action_id, vec![spec]).unwrap();
    let t2 = created.remove(0).id;

    let mut sub = bus.subscribe(
        action_id,
        Event::Snapshot {
            action: store.get_action(action_id).unwrap(),
            tasks: store.list_tasks(action_id).unwrap(),
        },
    );

    assert!(executor.run(action_id));
    wait_until(|| !executor.is_running(action_id)).await;

    let events = drain(&mut sub, Duration::from_millis(50)).await;
    let tags: Vec<&str> = events.iter().map(event_tag).collect();

    let idx = |needle: &str| tags.iter().position(|t| *t == needle);
    let action_started = idx("action.started").expect("action.started");
    let t1_started = tags
        .iter()
        .enumerate()
        .find(|(_, t)| **t == "task.started")
        .map(|(i, _)| i)
        .expect("a task.started");
    let action_completed = idx("action.completed").expect("action.completed");
    assert!(action_started < t1_started);
    assert!(t1_started < action_completed);

    // Exactly one task.started precedes t2's, and t1 must complete before
    // t2 starts (no forward overlap in a strict chain).
    let started_positions: Vec<usize> = tags
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == "task.started")
        .map(|(i, _)| i)
        .collect();
    let completed_positions: Vec<usize> = tags
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == "task.completed")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(started_positions.len(), 2);
    assert_eq!(completed_positions.len(), 2);
    assert!(completed_positions[0] < started_positions[1]);

    assert_eq!(store.get_task(t1).unwrap().status, TaskStatus::Completed);
    assert_eq!(store.get_task(t2).unwrap().status, TaskStatus::Completed);
    assert_eq!(store.get_action(action_id).unwrap().status, orc_core::ActionStatus::Completed);
}

/// Scenario B (§8): a diamond graph runs its two middle branches
/// concurrently and the join task waits for both.
#[tokio::test]
async fn scenario_b_diamond_runs_independent_branches_concurrently() {
    let max_observed = Arc::new(AtomicUsize::new(0));
    let current = Arc::new(AtomicUsize::new(0));

    struct TrackingAgent {
        current: Arc<AtomicUsize>,
        max_observed: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl orc_agents::Agent for TrackingAgent {
        async fn run(
            &self,
            input: orc_agents::AgentInput,
            log_sink: Arc<dyn orc_agents::LogSink>,
            _cancel: tokio_util::sync::CancellationToken,
        ) -> Result<orc_agents::AgentRunOutput, orc_agents::AgentError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_observed.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            log_sink.info(format!("ran {}", input.task.id));
            Ok(orc_agents::AgentRunOutput { summary: "ok".into(), artifacts: vec![] })
        }
    }

    let mut registry = AgentRegistry::new();
    registry.register(
        "track",
        Arc::new(TrackingAgent {
            current: current.clone(),
            max_observed: max_observed.clone(),
            delay: Duration::from_millis(60),
        }),
    );
    let (store, _bus, executor) = test_executor(registry);
    let (action_id, _a, _b, c) = seed_fan_in(&store, "track", "branch a", "branch b", "join").unwrap();

    executor.run(action_id);
    wait_until(|| !executor.is_running(action_id)).await;

    assert!(
        max_observed.load(Ordering::SeqCst) >= 2,
        "expected the two independent branches to overlap at least once"
    );
    assert_eq!(store.get_task(c).unwrap().status, TaskStatus::Completed);
    assert_eq!(store.get_action(action_id).unwrap().status, orc_core::ActionStatus::Completed);
}

/// Scenario C (§8): two transient failures then a success, with the
/// expected `task.retrying` attempt numbers and backoff gaps.
#[tokio::test]
async fn scenario_c_retries_then_succeeds() {
    let mut registry = AgentRegistry::new();
    registry.register(
        "flaky",
        Arc::new(ScriptedAgent::new(vec![
            Err(orc_agents::AgentError::Transient("boom 1".into())),
            Err(orc_agents::AgentError::Transient("boom 2".into())),
            Ok("finally".into()),
        ])),
    );
    let (store, bus, executor) = test_executor(registry);
    let (action_id, ids) = seed_linear_chain(&store, "flaky", &["t1"]).unwrap();
    let t1 = ids[0];

    let mut sub = bus.subscribe(
        action_id,
        Event::Snapshot {
            action: store.get_action(action_id).unwrap(),
            tasks: store.list_tasks(action_id).unwrap(),
        },
    );

    let started_at = tokio::time::Instant::now();
    executor.run(action_id);
    wait_until(|| !executor.is_running(action_id)).await;
    let elapsed = started_at.elapsed();

    let events = drain(&mut sub, Duration::from_millis(50)).await;
    let retrying: Vec<(u32, u32)> = events
        .iter()
        .filter_map(|e| match e {
            Event::TaskRetrying { attempt, max_attempts, .. } => Some((*attempt, *max_attempts)),
            _ => None,
        })
        .collect();
    assert_eq!(retrying, vec![(2, 3), (3, 3)]);
    assert_eq!(store.get_task(t1).unwrap().status, TaskStatus::Completed);

    // Two backoff gaps at `base_backoff_ms` (5ms in fast_config) with full
    // jitter: the floor is 0 per attempt, so just assert the run took long
    // enough to have actually slept rather than raced through synchronously.
    assert!(elapsed >= Duration::from_millis(1));
}

/// Scenario D (§8): one of two independent tasks fails permanently; the
/// other still completes and persists its output; the action ends failed.
#[tokio::test]
async fn scenario_d_partial_failure_does_not_block_independent_progress() {
    let mut registry = AgentRegistry::new();
    registry.register("failer", Arc::new(FailingAgent::new("permanent boom")));
    registry.register("succeeder", Arc::new(ScriptedAgent::new(vec![Ok("b done".into())])));

    let (store, _bus, executor) = test_executor(registry);
    let action = store.create_action("partial failure".into(), "root".into());
    let a = orc_core::TaskId::new();
    let b = orc_core::TaskId::new();
    store
        .create_tasks(
            action.id,
            vec![
                orc_core::TaskSpec {
                    id: a,
                    prompt: "a".into(),
                    agent_type: "failer".into(),
                    model: None,
                    dependencies: Vec::new(),
                },
                orc_core::TaskSpec {
                    id: b,
                    prompt: "b".into(),
                    agent_type: "succeeder".into(),
                    model: None,
                    dependencies: Vec::new(),
                },
            ],
        )
        .unwrap();

    executor.run(action.id);
    wait_until(|| !executor.is_running(action.id)).await;

    assert_eq!(store.get_task(a).unwrap().status, TaskStatus::Failed);
    assert_eq!(store.get_task(b).unwrap().status, TaskStatus::Completed);
    assert!(store.get_output(b).is_some());
    assert_eq!(store.get_action(action.id).unwrap().status, orc_core::ActionStatus::Failed);
}

/// Scenario E (§8): editing a running task's prompt cancels it, resets it
/// (and its dependents stay pending), emits `task.recovered`, and preserves
/// the upstream task's completed output. A subsequent run finishes the
/// chain.
#[tokio::test]
async fn scenario_e_edit_during_run_cancels_and_recovers() {
    let mut registry = AgentRegistry::new();
    registry.register("fast", Arc::new(ScriptedAgent::new(vec![Ok("t1 done".into())])));
    registry.register(
        "slow",
        Arc::new(ScriptedAgent::new(vec![Ok("t2 done".into())]).with_delay(Duration::from_secs(10))),
    );

    let store: Arc<dyn GraphStore> = Arc::new(orc_store::InMemoryStore::with_clock(orc_core::FakeClock::new()));
    let bus = orc_bus::EventBus::new(64);
    let executor = Executor::new(store.clone(), bus.clone(), registry, fast_config());
    let mutation = MutationEngine::new(
        store.clone(),
        bus.clone(),
        executor.clone(),
        MutationConfig { cancellation_grace: Duration::from_millis(100) },
    );

    let action = store.create_action("edit during run".into(), "root".into());
    let t1 = orc_core::TaskId::new();
    let t2 = orc_core::TaskId::new();
    let t3 = orc_core::TaskId::new();
    store
        .create_tasks(
            action.id,
            vec![
                orc_core::TaskSpec {
                    id: t1,
                    prompt: "t1".into(),
                    agent_type: "fast".into(),
                    model: None,
                    dependencies: Vec::new(),
                },
                orc_core::TaskSpec {
                    id: t2,
                    prompt: "t2".into(),
                    agent_type: "slow".into(),
                    model: None,
                    dependencies: vec![t1],
                },
                orc_core::TaskSpec {
                    id: t3,
                    prompt: "t3".into(),
                    agent_type: "fast".into(),
                    model: None,
                    dependencies: vec![t2],
                },
            ],
        )
        .unwrap();

    let mut sub = bus.subscribe(
        action.id,
        Event::Snapshot {
            action: store.get_action(action.id).unwrap(),
            tasks: store.list_tasks(action.id).unwrap(),
        },
    );

    executor.run(action.id);
    wait_until(|| store.get_task(t2).map(|t| t.status) == Ok(TaskStatus::Running)).await;

    mutation
        .edit(t2, TaskPatch { prompt: Some("t2 v2".into()), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(store.get_task(t2).unwrap().status, TaskStatus::Pending);
    assert_eq!(store.get_task(t3).unwrap().status, TaskStatus::Pending);
    let t1_after = store.get_task(t1).unwrap();
    assert_eq!(t1_after.status, TaskStatus::Completed);
    assert!(store.get_output(t1).is_some());

    let events = drain(&mut sub, Duration::from_millis(150)).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TaskRecovered { task_id } if *task_id == t2)));

    // Swap t2's agent for a fast one before re-running, since the mutation
    // only changed its prompt; re-register under a fresh executor so the
    // delayed script from the first attempt can't leak into this run.
    store
        .update_task(t2, TaskPatch { agent_type: Some("fast".into()), ..Default::default() })
        .unwrap();
    let mut registry2 = AgentRegistry::new();
    registry2.register("fast", Arc::new(ScriptedAgent::new(vec![Ok("t2 done v2".into())])));
    let executor2 = Executor::new(store.clone(), bus.clone(), registry2, fast_config());
    executor2.run(action.id);
    wait_until(|| !executor2.is_running(action.id)).await;

    assert_eq!(store.get_task(t2).unwrap().status, TaskStatus::Completed);
    assert_eq!(store.get_task(t3).unwrap().status, TaskStatus::Completed);
    assert_eq!(store.get_action(action.id).unwrap().status, orc_core::ActionStatus::Completed);
}

/// Scenario F (§8): the planner's structured output carries a cycle on
/// every attempt; after exhausting retries it falls back to a single
/// generic task carrying the root prompt.
#[tokio::test]
async fn scenario_f_planner_falls_back_on_persistent_cycle() {
    let cyclic = r#"[{"prompt":"t0","agent_type":"generic","dependencies":[1]},
                      {"prompt":"t1","agent_type":"generic","dependencies":[0]}]"#;
    let chat = ScriptedChatClient::new(vec![
        Ok(cyclic.to_string()),
        Ok(cyclic.to_string()),
        Ok(cyclic.to_string()),
    ]);
    let planner = Planner::new(Arc::new(chat), AgentRegistry::new(), 8, 2);

    let outcome = planner
        .plan(PlanRequest { root_prompt: "do the thing", existing_tasks: None })
        .await;

    assert!(outcome.used_fallback);
    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.tasks[0].prompt, "do the thing");
    assert_eq!(outcome.tasks[0].agent_type, orc_agents::GENERIC_AGENT_TYPE);
    assert!(outcome.tasks[0].dependencies.is_empty());
}

/// Planner errors surface transient provider failures distinctly from
/// structural ones, and the retry loop still lands on a valid plan once
/// the provider stops erroring.
#[tokio::test]
async fn planner_retries_past_a_transient_provider_error_to_a_valid_plan() {
    let chat = ScriptedChatClient::new(vec![
        Err(ChatError::Transient("rate limited".into())),
        Ok(r#"[{"prompt":"only task","agent_type":"generic","dependencies":[]}]"#.to_string()),
    ]);
    let planner = Planner::new(Arc::new(chat), AgentRegistry::new(), 8, 2);

    let outcome = planner
        .plan(PlanRequest { root_prompt: "root", existing_tasks: None })
        .await;

    assert!(!outcome.used_fallback);
    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.tasks[0].prompt, "only task");
}

/// End-to-end: a planner-produced plan persists into the store unchanged
/// (property 4, §8) and then runs to completion through the executor.
#[tokio::test]
async fn plan_persist_run_round_trips_through_the_whole_stack() {
    let chat = ScriptedChatClient::new(vec![Ok(r#"
        [{"prompt":"fetch data","agent_type":"generic","dependencies":[]},
         {"prompt":"summarize","agent_type":"generic","dependencies":[0]}]
    "#.to_string())]);
    let registry_for_planner = AgentRegistry::new();
    let planner = Planner::new(Arc::new(chat), registry_for_planner, 8, 2);
    let outcome = planner
        .plan(PlanRequest { root_prompt: "fetch then summarize", existing_tasks: None })
        .await;
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.tasks.len(), 2);

    let (store, _bus, executor) = test_executor(AgentRegistry::new());
    let action = store.create_action("round trip".into(), "fetch then summarize".into());
    let created = store.create_tasks(action.id, outcome.tasks.clone()).unwrap();
    assert_eq!(created.len(), 2);
    // Same logical DAG: same prompts, same agent types, same edge shape.
    for (spec, task) in outcome.tasks.iter().zip(created.iter()) {
        assert_eq!(spec.prompt, task.prompt);
        assert_eq!(spec.agent_type, task.agent_type);
        assert_eq!(spec.dependencies, task.dependencies);
    }

    executor.run(action.id);
    wait_until(|| !executor.is_running(action.id)).await;
    assert_eq!(store.get_action(action.id).unwrap().status, orc_core::ActionStatus::Completed);
}

/// End-to-end through the `Engine` facade (§6): create plans and persists,
/// run drives the plan to completion, and patching `root_prompt` discards
/// the old plan for a freshly planned one rather than just mutating
/// metadata fields.
#[tokio::test]
async fn engine_facade_creates_runs_and_replans_an_action() {
    let mut registry = AgentRegistry::new();
    registry.register("generic", Arc::new(ScriptedAgent::new(vec![Ok("ok".into())])));

    let engine = orc_engine::test_support::test_engine(
        Arc::new(ScriptedChatClient::new(vec![
            Ok(r#"[{"prompt":"fetch data","agent_type":"generic","dependencies":[]}]"#.to_string()),
            Ok(r#"[{"prompt":"step one","agent_type":"generic","dependencies":[]},
                    {"prompt":"step two","agent_type":"generic","dependencies":[0]}]"#.to_string()),
        ])),
        registry,
        8,
        2,
    );

    let created = engine.create_action("fetch some data".into(), Some("fetch job".into())).await.unwrap();
    assert_eq!(created.tasks.len(), 1);
    assert_eq!(created.action.title, "fetch job");

    assert!(engine.run_action(created.action.id));
    wait_until(|| engine.get_action(created.action.id).unwrap().action.status == orc_core::ActionStatus::Completed).await;

    let replanned = engine
        .patch_action(created.action.id, None, Some("do something completely different".into()))
        .await
        .unwrap();
    assert_eq!(replanned.tasks.len(), 2);
    for old in &created.tasks {
        assert!(replanned.tasks.iter().all(|t| t.id != old.id));
    }
    assert_eq!(
        engine.get_action(created.action.id).unwrap().action.root_prompt,
        "do something completely different"
    );
}
