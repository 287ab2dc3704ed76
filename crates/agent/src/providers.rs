//! OpenAI-compatible chat-completions client.
//!
//! Talks to any endpoint that speaks the chat-completions protocol with
//! function tools. The request is issued non-streaming; the response is
//! adapted into the pull-protocol stream as a single completed turn, which is
//! all the orchestration loop requires.

use std::time::Duration;

use async_trait::async_trait;
use scout_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::conversation::ChatMessage;
use crate::llm::{AssistantTurn, ModelChunk, ModelClient, ModelError, ModelStream, ToolCallRequest};

pub struct OpenAiCompatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiCompatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ModelError::Call(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    async fn stream_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<Box<dyn ModelStream>, ModelError> {
        let body = json!({
            "model": self.model,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
            "tools": tools,
            "stream": false,
        });

        debug!(event_name = "llm.request", model = %self.model, message_count = messages.len());

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|err| ModelError::Call(err.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            return Err(ModelError::Call(format!("model endpoint returned status {status}")));
        }

        let completion: ChatCompletion =
            response.json().await.map_err(|err| ModelError::Call(err.to_string()))?;

        let turn = completion.into_turn()?;
        Ok(Box::new(SingleTurnStream { turn: Some(turn) }))
    }
}

fn wire_message(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::System { content } => json!({"role": "system", "content": content}),
        ChatMessage::User { content } => json!({"role": "user", "content": content}),
        ChatMessage::Assistant { content, tool_calls } => {
            if tool_calls.is_empty() {
                json!({"role": "assistant", "content": content})
            } else {
                let calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.call_id,
                            "type": "function",
                            "function": {"name": call.name, "arguments": call.arguments}
                        })
                    })
                    .collect();
                json!({"role": "assistant", "content": content, "tool_calls": calls})
            }
        }
        ChatMessage::ToolResult { call_id, content } => {
            json!({"role": "tool", "tool_call_id": call_id, "content": content})
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireAssistantMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WireAssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

impl ChatCompletion {
    fn into_turn(self) -> Result<AssistantTurn, ModelError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ModelError::Call("model response contained no choices".to_string()))?;

        Ok(AssistantTurn {
            content: message.content.unwrap_or_default(),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|call| ToolCallRequest {
                    call_id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
        })
    }
}

struct SingleTurnStream {
    turn: Option<AssistantTurn>,
}

#[async_trait]
impl ModelStream for SingleTurnStream {
    async fn next_chunk(&mut self) -> Result<Option<ModelChunk>, ModelError> {
        Ok(self.turn.take().map(ModelChunk::Completed))
    }
}
