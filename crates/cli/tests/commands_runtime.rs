use std::env;
use std::sync::{Mutex, OnceLock};

use scout_cli::commands::{config, doctor};
use serde_json::Value;

#[test]
fn doctor_passes_with_valid_env() {
    with_env(
        &[("SCOUT_SEARCH_INSTANCE", "acme"), ("SCOUT_SEARCH_API_TOKEN", "glean-test")],
        || {
            let output = doctor::run(true);
            let payload: Value =
                serde_json::from_str(&output).expect("doctor output should be valid JSON");

            assert_eq!(payload["overall_status"], "pass");
            assert_eq!(payload["checks"][0]["name"], "config_validation");
            assert!(payload["checks"][1]["details"]
                .as_str()
                .expect("details should be a string")
                .contains("acme-be.glean.com"));
        },
    );
}

#[test]
fn doctor_fails_without_credentials() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor output should be valid JSON");

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn config_command_redacts_the_search_token() {
    with_env(
        &[("SCOUT_SEARCH_INSTANCE", "acme"), ("SCOUT_SEARCH_API_TOKEN", "glean-secret123")],
        || {
            let output = config::run();

            assert!(output.contains("search.api_token = glean-*** "));
            assert!(!output.contains("glean-secret123"));
            assert!(output.contains("env (SCOUT_SEARCH_API_TOKEN)"));
            assert!(output.contains("search.instance = acme"));
        },
    );
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SCOUT_SEARCH_INSTANCE",
        "SCOUT_SEARCH_API_TOKEN",
        "SCOUT_SEARCH_TIMEOUT_SECS",
        "SCOUT_SEARCH_MAX_SNIPPET_SIZE",
        "SCOUT_SEARCH_FACET_BUCKET_SIZE",
        "SCOUT_LLM_ENDPOINT",
        "SCOUT_LLM_API_KEY",
        "SCOUT_LLM_MODEL",
        "SCOUT_LLM_TIMEOUT_SECS",
        "SCOUT_LLM_MAX_RETRIES",
        "SCOUT_LOGGING_LEVEL",
        "SCOUT_LOGGING_FORMAT",
        "SCOUT_LOG_LEVEL",
        "SCOUT_LOG_FORMAT",
        "GLEAN_INSTANCE",
        "GLEAN_API_TOKEN",
        "LLM_ENDPOINT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, previous) in previous_values {
        match previous {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
