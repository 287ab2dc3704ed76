//! The orchestration loop.
//!
//! One `respond_stream` call handles exactly one inbound request. The loop
//! alternates between model turns and sequential tool execution until the
//! model produces a turn with no tool calls, the iteration cap is hit, or the
//! event receiver goes away (treated as cancellation).

use std::sync::Arc;

use scout_core::instructions::SYSTEM_PROMPT;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::conversation::{ChatMessage, ConversationState, OutputEvent, OutputItem};
use crate::llm::{AssistantTurn, BackoffPolicy, ModelChunk, ModelClient, ModelError, ModelStream};
use crate::tools::ToolRegistry;

pub const MAX_ITERATIONS: u32 = 10;

pub const ITERATION_LIMIT_MESSAGE: &str =
    "Max iterations reached. Please try a more specific question.";
pub const RUN_FAILURE_MESSAGE: &str =
    "I'm having trouble processing your request right now. Please try again or rephrase your question.";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("run canceled by the caller")]
    Canceled,
    #[error("orchestration failure: {0}")]
    Internal(String),
}

pub struct AgentRuntime {
    model: Arc<dyn ModelClient>,
    registry: ToolRegistry,
    backoff: BackoffPolicy,
    max_iterations: u32,
}

impl AgentRuntime {
    pub fn new(model: Arc<dyn ModelClient>, registry: ToolRegistry) -> Self {
        Self { model, registry, backoff: BackoffPolicy::default(), max_iterations: MAX_ITERATIONS }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Streams one run's output events into `events`. Internal failures are
    /// converted into a single user-safe final message; a closed receiver
    /// stops the run at the next safe boundary.
    pub async fn respond_stream(
        &self,
        turns: Vec<ChatMessage>,
        events: &UnboundedSender<OutputEvent>,
    ) {
        match self.run_loop(turns, events).await {
            Ok(()) => {}
            Err(RunError::Canceled) => {
                debug!(event_name = "agent.run_canceled");
            }
            Err(RunError::Internal(reason)) => {
                warn!(event_name = "agent.run_failed", reason = %reason);
                let _ = events.send(OutputEvent::ItemDone(assistant_item(RUN_FAILURE_MESSAGE)));
            }
        }
    }

    /// Non-streaming entry point: collects every completed item, in order.
    pub async fn respond(&self, turns: Vec<ChatMessage>) -> Vec<OutputItem> {
        let (sender, mut receiver) = unbounded_channel();
        self.respond_stream(turns, &sender).await;
        drop(sender);

        let mut items = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let OutputEvent::ItemDone(item) = event {
                items.push(item);
            }
        }
        items
    }

    async fn run_loop(
        &self,
        turns: Vec<ChatMessage>,
        events: &UnboundedSender<OutputEvent>,
    ) -> Result<(), RunError> {
        let correlation_id = Uuid::new_v4();
        let mut state = ConversationState::new(SYSTEM_PROMPT, turns);
        let schemas = self.registry.schemas();

        for iteration in 0..self.max_iterations {
            if events.is_closed() {
                return Err(RunError::Canceled);
            }

            debug!(
                event_name = "agent.model_call",
                correlation_id = %correlation_id,
                iteration,
                history_len = state.messages().len()
            );

            let turn = self.stream_model_turn(&state, &schemas, events).await?;
            let tool_calls = turn.tool_calls.clone();
            let content = turn.content.clone();
            state.push_assistant(turn);

            if tool_calls.is_empty() {
                send(events, OutputEvent::ItemDone(assistant_item(&content)))?;
                return Ok(());
            }

            if !content.is_empty() {
                send(events, OutputEvent::ItemDone(assistant_item(&content)))?;
            }

            // Strictly sequential: each result lands in history before the
            // next call runs, and a tool-call item is never emitted without
            // its matching result.
            for call in tool_calls {
                if events.is_closed() {
                    return Err(RunError::Canceled);
                }

                let _ = events.send(OutputEvent::ItemDone(OutputItem::ToolCall {
                    call_id: call.call_id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                }));

                let result = self.registry.dispatch(&call.name, &call.arguments).await;
                state.push_tool_result(&call.call_id, &result);

                let _ = events.send(OutputEvent::ItemDone(OutputItem::ToolResult {
                    call_id: call.call_id,
                    content: result,
                }));
            }
        }

        warn!(event_name = "agent.iteration_limit", correlation_id = %correlation_id);
        send(events, OutputEvent::ItemDone(assistant_item(ITERATION_LIMIT_MESSAGE)))?;
        Ok(())
    }

    async fn stream_model_turn(
        &self,
        state: &ConversationState,
        schemas: &[Value],
        events: &UnboundedSender<OutputEvent>,
    ) -> Result<AssistantTurn, RunError> {
        let mut stream = self.open_stream_with_backoff(state, schemas).await?;

        loop {
            match stream.next_chunk().await {
                Ok(Some(ModelChunk::TextDelta(delta))) => {
                    let _ = events.send(OutputEvent::TextDelta(delta));
                }
                Ok(Some(ModelChunk::Completed(turn))) => return Ok(turn),
                Ok(None) => {
                    return Err(RunError::Internal(ModelError::IncompleteStream.to_string()))
                }
                Err(error) => return Err(RunError::Internal(error.to_string())),
            }
        }
    }

    /// Only rate limits are retried; every other model error fails the run
    /// and is converted to the user-safe failure message upstream.
    async fn open_stream_with_backoff(
        &self,
        state: &ConversationState,
        schemas: &[Value],
    ) -> Result<Box<dyn ModelStream>, RunError> {
        let mut attempt = 0;
        loop {
            match self.model.stream_turn(state.messages(), schemas).await {
                Ok(stream) => return Ok(stream),
                Err(ModelError::RateLimited) if attempt + 1 < self.backoff.max_attempts => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        event_name = "agent.model_rate_limited",
                        attempt,
                        delay_ms = delay.as_millis() as u64
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(RunError::Internal(error.to_string())),
            }
        }
    }
}

fn assistant_item(content: &str) -> OutputItem {
    OutputItem::AssistantMessage { id: Uuid::new_v4().to_string(), content: content.to_string() }
}

fn send(events: &UnboundedSender<OutputEvent>, event: OutputEvent) -> Result<(), RunError> {
    events.send(event).map_err(|_| RunError::Canceled)
}
