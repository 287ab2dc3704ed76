//! Model-capability interface.
//!
//! Streaming is a cooperative single-consumer pull protocol: the runtime
//! drains `next_chunk` until a completed turn arrives. Implementations wrap
//! whatever wire protocol the model endpoint speaks.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::conversation::ChatMessage;

/// One tool invocation requested by the model. `arguments` is the raw JSON
/// argument string as produced by the model, parsed at dispatch time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

/// A completed assistant turn: text content plus zero or more tool calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssistantTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelChunk {
    TextDelta(String),
    Completed(AssistantTurn),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model rate limit exceeded")]
    RateLimited,
    #[error("model call failed: {0}")]
    Call(String),
    #[error("model stream ended without a completed turn")]
    IncompleteStream,
}

#[async_trait]
pub trait ModelStream: Send {
    /// `Ok(None)` means the stream closed. A well-formed stream yields a
    /// `Completed` chunk before closing.
    async fn next_chunk(&mut self) -> Result<Option<ModelChunk>, ModelError>;
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<Box<dyn ModelStream>, ModelError>;
}

/// Retry schedule for rate-limited model calls: shift-and-cap exponential
/// delay, a fixed number of attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl BackoffPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}
