pub mod ask;
pub mod config;
pub mod doctor;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// Which stage of command setup failed. The `ask` command wires config, the
/// search client, the model client, and a tokio runtime in that order; each
/// gets its own class so operators can tell them apart in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Config,
    SearchClient,
    ModelClient,
    Runtime,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: ErrorClass,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: ErrorClass,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class,
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{CommandResult, ErrorClass};

    #[test]
    fn failure_payload_carries_the_error_class_and_exit_code() {
        let result = CommandResult::failure(
            "ask",
            ErrorClass::SearchClient,
            "search.instance is required",
            2,
        );

        assert_eq!(result.exit_code, 2);
        let payload: Value =
            serde_json::from_str(&result.output).expect("failure output should be JSON");
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "search_client");
        assert_eq!(payload["message"], "search.instance is required");
    }
}
