// SPDX-License-Identifier: MIT

//! Centralized configuration access for the orchestrator crates (§6).
//!
//! Each option is a small free function with a documented env var name and
//! default, following the same convention as the rest of the ambient stack
//! rather than a config-file framework. A `toml` project file may override
//! the same keys for local development; env vars always take precedence.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

/// `[orchestrator]` table parsed from a project config file, all fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub orchestrator: FileOrchestratorConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileOrchestratorConfig {
    pub max_concurrent_tasks_per_action: Option<u64>,
    pub task_retry_max_attempts: Option<u64>,
    pub task_retry_base_backoff_ms: Option<u64>,
    pub task_timeout_seconds: Option<u64>,
    pub planner_max_tasks: Option<u64>,
    pub planner_max_retries: Option<u64>,
    pub event_queue_capacity: Option<u64>,
    pub log_retention_per_task: Option<u64>,
    pub cancellation_grace_ms: Option<u64>,
    pub ping_interval_seconds: Option<u64>,
}

/// Parse a `toml` file at `path` into a [`FileConfig`]. Missing file yields defaults.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let parsed: FileConfig = toml::from_str(&contents)?;
    Ok(parsed)
}

/// Resolve a `u64`-shaped option: env var > file override > default.
fn resolve(env_name: &str, file_value: Option<u64>, default: u64) -> u64 {
    env_u64(env_name).or(file_value).unwrap_or(default)
}

/// Admission bound per action (`ORC_MAX_CONCURRENT_TASKS`, default 8).
pub fn max_concurrent_tasks_per_action(file: &FileOrchestratorConfig) -> usize {
    resolve(
        "ORC_MAX_CONCURRENT_TASKS",
        file.max_concurrent_tasks_per_action,
        8,
    ) as usize
}

/// Inclusive of the first try (`ORC_TASK_RETRY_MAX_ATTEMPTS`, default 3).
pub fn task_retry_max_attempts(file: &FileOrchestratorConfig) -> u32 {
    resolve(
        "ORC_TASK_RETRY_MAX_ATTEMPTS",
        file.task_retry_max_attempts,
        3,
    ) as u32
}

/// Exponential backoff base (`ORC_TASK_RETRY_BASE_BACKOFF_MS`, default 500).
pub fn task_retry_base_backoff(file: &FileOrchestratorConfig) -> Duration {
    Duration::from_millis(resolve(
        "ORC_TASK_RETRY_BASE_BACKOFF_MS",
        file.task_retry_base_backoff_ms,
        500,
    ))
}

/// Per-attempt deadline (`ORC_TASK_TIMEOUT_SECONDS`, default 300).
pub fn task_timeout(file: &FileOrchestratorConfig) -> Duration {
    Duration::from_secs(resolve(
        "ORC_TASK_TIMEOUT_SECONDS",
        file.task_timeout_seconds,
        300,
    ))
}

/// Hard cap on generated graph size (`ORC_PLANNER_MAX_TASKS`, default 8).
pub fn planner_max_tasks(file: &FileOrchestratorConfig) -> usize {
    resolve("ORC_PLANNER_MAX_TASKS", file.planner_max_tasks, 8) as usize
}

/// Structured-output repair attempts (`ORC_PLANNER_MAX_RETRIES`, default 2).
pub fn planner_max_retries(file: &FileOrchestratorConfig) -> u32 {
    resolve("ORC_PLANNER_MAX_RETRIES", file.planner_max_retries, 2) as u32
}

/// Per-subscriber ring capacity (`ORC_EVENT_QUEUE_CAPACITY`, default 256).
pub fn event_queue_capacity(file: &FileOrchestratorConfig) -> usize {
    resolve(
        "ORC_EVENT_QUEUE_CAPACITY",
        file.event_queue_capacity,
        256,
    ) as usize
}

/// Max retained log rows per task (`ORC_LOG_RETENTION_PER_TASK`, default 1000).
pub fn log_retention_per_task(file: &FileOrchestratorConfig) -> usize {
    resolve(
        "ORC_LOG_RETENTION_PER_TASK",
        file.log_retention_per_task,
        1000,
    ) as usize
}

/// Grace window for cooperative cancellation during invalidation
/// (`ORC_CANCELLATION_GRACE_MS`, default 5000).
pub fn cancellation_grace(file: &FileOrchestratorConfig) -> Duration {
    Duration::from_millis(resolve(
        "ORC_CANCELLATION_GRACE_MS",
        file.cancellation_grace_ms,
        5000,
    ))
}

/// Event bus keepalive cadence (`ORC_PING_INTERVAL_SECONDS`, default 15).
pub fn ping_interval(file: &FileOrchestratorConfig) -> Duration {
    Duration::from_secs(resolve(
        "ORC_PING_INTERVAL_SECONDS",
        file.ping_interval_seconds,
        15,
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
