use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

/// Enterprise-search backend settings. `instance` is either a bare deployment
/// name or a full hostname; URL derivation happens in the search client.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub instance: String,
    pub api_token: SecretString,
    pub timeout_secs: u64,
    pub max_snippet_size: u32,
    pub facet_bucket_size: u32,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub search_instance: Option<String>,
    pub search_api_token: Option<String>,
    pub llm_endpoint: Option<String>,
    pub llm_model: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                instance: String::new(),
                api_token: String::new().into(),
                timeout_secs: 30,
                max_snippet_size: 4000,
                facet_bucket_size: 100,
            },
            llm: LlmConfig {
                endpoint: "http://localhost:11434/v1".to_string(),
                api_key: None,
                model: "llama3.1".to_string(),
                timeout_secs: 60,
                max_retries: 5,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Loads configuration in layers: defaults, then `scout.toml` (with
    /// `${VAR}` interpolation), then environment variables, then programmatic
    /// overrides, then validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("scout.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(search) = patch.search {
            if let Some(instance) = search.instance {
                self.search.instance = instance;
            }
            if let Some(api_token_value) = search.api_token {
                self.search.api_token = secret_value(api_token_value);
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
            if let Some(max_snippet_size) = search.max_snippet_size {
                self.search.max_snippet_size = max_snippet_size;
            }
            if let Some(facet_bucket_size) = search.facet_bucket_size {
                self.search.facet_bucket_size = facet_bucket_size;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(endpoint) = llm.endpoint {
                self.llm.endpoint = endpoint;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // GLEAN_* / LLM_ENDPOINT are the names existing deployments already
        // export; SCOUT_* wins when both are present.
        let instance =
            read_env("SCOUT_SEARCH_INSTANCE").or_else(|| read_env("GLEAN_INSTANCE"));
        if let Some(value) = instance {
            self.search.instance = value;
        }
        let api_token =
            read_env("SCOUT_SEARCH_API_TOKEN").or_else(|| read_env("GLEAN_API_TOKEN"));
        if let Some(value) = api_token {
            self.search.api_token = secret_value(value);
        }
        if let Some(value) = read_env("SCOUT_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("SCOUT_SEARCH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_SEARCH_MAX_SNIPPET_SIZE") {
            self.search.max_snippet_size = parse_u32("SCOUT_SEARCH_MAX_SNIPPET_SIZE", &value)?;
        }
        if let Some(value) = read_env("SCOUT_SEARCH_FACET_BUCKET_SIZE") {
            self.search.facet_bucket_size = parse_u32("SCOUT_SEARCH_FACET_BUCKET_SIZE", &value)?;
        }

        let endpoint = read_env("SCOUT_LLM_ENDPOINT").or_else(|| read_env("LLM_ENDPOINT"));
        if let Some(value) = endpoint {
            self.llm.endpoint = value;
        }
        if let Some(value) = read_env("SCOUT_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SCOUT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SCOUT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SCOUT_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SCOUT_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("SCOUT_LLM_MAX_RETRIES", &value)?;
        }

        let log_level = read_env("SCOUT_LOGGING_LEVEL").or_else(|| read_env("SCOUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("SCOUT_LOGGING_FORMAT").or_else(|| read_env("SCOUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(search_instance) = overrides.search_instance {
            self.search.instance = search_instance;
        }
        if let Some(search_api_token) = overrides.search_api_token {
            self.search.api_token = secret_value(search_api_token);
        }
        if let Some(llm_endpoint) = overrides.llm_endpoint {
            self.llm.endpoint = llm_endpoint;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_search(&self.search)?;
        validate_llm(&self.llm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("scout.toml"), PathBuf::from("config/scout.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.instance.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search.instance is required. Set it to your deployment name (e.g. `acme`) or the full search hostname".to_string(),
        ));
    }

    if search.api_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "search.api_token is required. Issue a search-scoped API token from your admin console"
                .to_string(),
        ));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if search.max_snippet_size == 0 {
        return Err(ConfigError::Validation(
            "search.max_snippet_size must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let endpoint = llm.endpoint.trim();
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    search: Option<SearchPatch>,
    llm: Option<LlmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    instance: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
    max_snippet_size: Option<u32>,
    facet_bucket_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
