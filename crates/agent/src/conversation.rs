//! Conversation history and the outbound event model.

use crate::llm::{AssistantTurn, ToolCallRequest};

/// One message in the conversation history sent to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String, tool_calls: Vec<ToolCallRequest> },
    ToolResult { call_id: String, content: String },
}

/// History for one orchestration run. Owned exclusively by that run; never
/// shared across requests.
#[derive(Clone, Debug, Default)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new(preamble: &str, turns: Vec<ChatMessage>) -> Self {
        let mut messages = vec![ChatMessage::System { content: preamble.to_string() }];
        messages.extend(turns);
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_assistant(&mut self, turn: AssistantTurn) {
        self.messages
            .push(ChatMessage::Assistant { content: turn.content, tool_calls: turn.tool_calls });
    }

    pub fn push_tool_result(&mut self, call_id: &str, content: &str) {
        self.messages.push(ChatMessage::ToolResult {
            call_id: call_id.to_string(),
            content: content.to_string(),
        });
    }
}

/// A completed item in the run's output list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputItem {
    AssistantMessage { id: String, content: String },
    ToolCall { call_id: String, name: String, arguments: String },
    ToolResult { call_id: String, content: String },
}

/// Events emitted during a run, in production order. `TextDelta` carries
/// partial assistant text; every completed item also arrives as `ItemDone`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    TextDelta(String),
    ItemDone(OutputItem),
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, ConversationState};
    use crate::llm::{AssistantTurn, ToolCallRequest};

    #[test]
    fn new_state_seeds_the_preamble_first() {
        let state = ConversationState::new(
            "preamble",
            vec![ChatMessage::User { content: "question".to_string() }],
        );

        assert_eq!(state.messages().len(), 2);
        assert!(matches!(
            &state.messages()[0],
            ChatMessage::System { content } if content == "preamble"
        ));
    }

    #[test]
    fn turns_append_in_order() {
        let mut state = ConversationState::new("preamble", Vec::new());
        state.push_assistant(AssistantTurn {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                call_id: "call-1".to_string(),
                name: "search_salesforce_accounts".to_string(),
                arguments: "{\"query\":\"Tesla\"}".to_string(),
            }],
        });
        state.push_tool_result("call-1", "Found 1 result(s)");

        assert!(matches!(&state.messages()[1], ChatMessage::Assistant { .. }));
        assert!(matches!(
            &state.messages()[2],
            ChatMessage::ToolResult { call_id, .. } if call_id == "call-1"
        ));
    }
}
