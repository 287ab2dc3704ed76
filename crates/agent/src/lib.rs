//! Agentic orchestration for Scout.
//!
//! The runtime drives one conversation turn: seed history with the
//! instruction preamble, stream a model turn, execute any requested tools
//! through the registry, append results, and repeat until the model stops
//! asking for tools or the iteration cap is hit. Output is a stream of
//! discrete events so callers can render progress as it happens.

pub mod conversation;
pub mod llm;
pub mod providers;
pub mod runtime;
pub mod tools;

pub use conversation::{ChatMessage, ConversationState, OutputEvent, OutputItem};
pub use llm::{AssistantTurn, BackoffPolicy, ModelChunk, ModelClient, ModelError, ModelStream, ToolCallRequest};
pub use runtime::{AgentRuntime, RunError};
pub use tools::{SearchBackend, ToolRegistry};
