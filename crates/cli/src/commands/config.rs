use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use scout_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: &str, env_key: Option<&str>| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("search.instance", &config.search.instance, Some("SCOUT_SEARCH_INSTANCE"));
    push(
        "search.api_token",
        &redact_token(config.search.api_token.expose_secret()),
        Some("SCOUT_SEARCH_API_TOKEN"),
    );
    push(
        "search.timeout_secs",
        &config.search.timeout_secs.to_string(),
        Some("SCOUT_SEARCH_TIMEOUT_SECS"),
    );
    push(
        "search.max_snippet_size",
        &config.search.max_snippet_size.to_string(),
        Some("SCOUT_SEARCH_MAX_SNIPPET_SIZE"),
    );
    push(
        "search.facet_bucket_size",
        &config.search.facet_bucket_size.to_string(),
        Some("SCOUT_SEARCH_FACET_BUCKET_SIZE"),
    );

    push("llm.endpoint", &config.llm.endpoint, Some("SCOUT_LLM_ENDPOINT"));
    push("llm.model", &config.llm.model, Some("SCOUT_LLM_MODEL"));
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    push("llm.api_key", llm_api_key, Some("SCOUT_LLM_API_KEY"));
    push("llm.timeout_secs", &config.llm.timeout_secs.to_string(), Some("SCOUT_LLM_TIMEOUT_SECS"));
    push("llm.max_retries", &config.llm.max_retries.to_string(), Some("SCOUT_LLM_MAX_RETRIES"));

    push("logging.level", &config.logging.level, Some("SCOUT_LOGGING_LEVEL"));
    push("logging.format", &format!("{:?}", config.logging.format), Some("SCOUT_LOGGING_FORMAT"));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("scout.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/scout.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
