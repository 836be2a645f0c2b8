// crates/subscription-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for subscription-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;

use subscription_config::ConfigError;
use subscription_config::ServiceConfig;

/// Parses a TOML string into a `ServiceConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<ServiceConfig, ConfigError> {
    ServiceConfig::from_toml_str(toml_str)
}

/// Returns a config with defaults and the minimum required store settings.
pub fn minimal_config() -> Result<ServiceConfig, ConfigError> {
    config_from_toml("[store]\ndsn = \"postgres://localhost/subscriptions\"\n")
}

/// Builds an override lookup over a fixed key/value set.
pub fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

/// Asserts that a validation result failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
