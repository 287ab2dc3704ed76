//! One-shot question answering: wires the configured search and model
//! clients into an agent runtime and streams the run's events to the
//! terminal.

use std::io::Write;
use std::sync::Arc;

use scout_agent::conversation::{ChatMessage, OutputEvent, OutputItem};
use scout_agent::providers::OpenAiCompatClient;
use scout_agent::runtime::AgentRuntime;
use scout_agent::tools::ToolRegistry;
use scout_core::config::{AppConfig, LoadOptions};
use scout_search::client::SearchClient;
use tokio::sync::mpsc::unbounded_channel;

use super::{CommandResult, ErrorClass};

pub fn run(question: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("ask", ErrorClass::Config, error.to_string(), 2)
        }
    };

    crate::init_logging(&config);

    let search = match SearchClient::from_config(&config.search) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("ask", ErrorClass::SearchClient, error.to_string(), 2)
        }
    };
    let model = match OpenAiCompatClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("ask", ErrorClass::ModelClient, error.to_string(), 2)
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("ask", ErrorClass::Runtime, error.to_string(), 1)
        }
    };

    let agent = AgentRuntime::new(Arc::new(model), ToolRegistry::new(Arc::new(search)));
    let turns = vec![ChatMessage::User { content: question.to_string() }];

    runtime.block_on(async move {
        let (sender, mut receiver) = unbounded_channel();

        let printer = tokio::spawn(async move {
            let mut streamed_text = false;
            while let Some(event) = receiver.recv().await {
                match event {
                    OutputEvent::TextDelta(delta) => {
                        streamed_text = true;
                        print!("{delta}");
                        let _ = std::io::stdout().flush();
                    }
                    OutputEvent::ItemDone(OutputItem::AssistantMessage { content, .. }) => {
                        // Deltas already rendered this message when streaming.
                        if streamed_text {
                            println!();
                        } else {
                            println!("{content}");
                        }
                        streamed_text = false;
                    }
                    OutputEvent::ItemDone(OutputItem::ToolCall { name, .. }) => {
                        eprintln!("[searching] {name}");
                    }
                    OutputEvent::ItemDone(OutputItem::ToolResult { .. }) => {}
                }
            }
        });

        agent.respond_stream(turns, &sender).await;
        drop(sender);
        let _ = printer.await;
    });

    CommandResult { exit_code: 0, output: String::new() }
}
