// SPDX-License-Identifier: MIT

//! A scripted [`ChatClient`] for driving the planner deterministically in
//! tests: each call pops the next response off a fixed script.

use crate::chat::{ChatClient, ChatError, ChatTurn};
use async_trait::async_trait;
use parking_lot::Mutex;

pub struct ScriptedChatClient {
    script: Mutex<Vec<Result<String, ChatError>>>,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedChatClient {
    pub fn new(script: Vec<Result<String, ChatError>>) -> Self {
        Self { script: Mutex::new(script), calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        turns: &[ChatTurn],
    ) -> Result<String, ChatError> {
        self.calls.lock().push(turns.to_vec());
        let mut script = self.script.lock();
        if script.is_empty() {
            return Err(ChatError::Permanent("script exhausted".into()));
        }
        script.remove(0)
    }
}
