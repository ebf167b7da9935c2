// SPDX-License-Identifier: MIT

//! The `ChatClient` abstraction the planner plans through (§4.3): one
//! method, given a system prompt and conversation turns, returns structured
//! output text or an error tagged transient/permanent. No concrete provider
//! SDK (OpenAI/Anthropic/local) is referenced by this crate.

use async_trait::async_trait;
use orc_core::{ErrorKind, Kind};
use thiserror::Error;

/// A single turn in the conversation sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Provider-level failure, tagged transient/permanent per §7: 429 and 5xx
/// are transient; other 4xx and auth failures are permanent; anything the
/// boundary cannot classify defaults to permanent (fail closed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("transient provider error: {0}")]
    Transient(String),

    #[error("permanent provider error: {0}")]
    Permanent(String),
}

impl ErrorKind for ChatError {
    fn kind(&self) -> Kind {
        match self {
            ChatError::Transient(_) => Kind::TransientIo,
            ChatError::Permanent(_) => Kind::PermanentIo,
        }
    }
}

/// A single structured-output chat completion call. Implementations wrap a
/// concrete provider (OpenAI, Anthropic, a local model server); the planner
/// itself depends only on this trait.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[ChatTurn],
    ) -> Result<String, ChatError>;
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
