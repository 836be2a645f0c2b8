//! Default and example config tests for subscription-config.
// crates/subscription-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults Tests
// Description: Validate defaults and the canonical example.
// Purpose: Keep documented defaults and the example in sync with the model.
// =============================================================================

use subscription_config::LogFormat;
use subscription_config::LogLevel;
use subscription_config::ServiceConfig;
use subscription_config::StoreBackend;
use subscription_config::config_toml_example;

mod common;

type TestResult = Result<(), String>;

#[test]
fn defaults_match_documented_values() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    if config.http.port != 8080 || config.http.bind != "0.0.0.0" {
        return Err(format!("unexpected listener defaults: {:?}", config.http));
    }
    if config.http.base_path != "/v1/subscriptions" {
        return Err("unexpected base path default".to_string());
    }
    if config.http.read_timeout_ms != 5_000 || config.http.write_timeout_ms != 5_000 {
        return Err("unexpected deadline defaults".to_string());
    }
    if config.http.shutdown_grace_ms != 10_000 || config.http.max_body_bytes != 65_536 {
        return Err("unexpected shutdown or body defaults".to_string());
    }
    if config.log.level != LogLevel::Info || config.log.format != LogFormat::Json {
        return Err("unexpected log defaults".to_string());
    }
    if config.store.backend != StoreBackend::Postgres || config.store.max_connections != 16 {
        return Err("unexpected store defaults".to_string());
    }
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn empty_file_parses_but_fails_validation_on_dsn() -> TestResult {
    let config = common::config_from_toml("").map_err(|err| err.to_string())?;
    common::assert_invalid(config.validate(), "store.dsn is required")
}

#[test]
fn example_config_is_valid() -> TestResult {
    let config =
        ServiceConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config != ServiceConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())? {
        return Err("example parse is not deterministic".to_string());
    }
    Ok(())
}

#[test]
fn example_config_matches_defaults_except_dsn() -> TestResult {
    let example =
        ServiceConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())?;
    let mut defaults = ServiceConfig::default();
    defaults.store.dsn.clone_from(&example.store.dsn);
    if example != defaults {
        return Err("example drifted from model defaults".to_string());
    }
    Ok(())
}

#[test]
fn unknown_enum_values_fail_parse() -> TestResult {
    let result = common::config_from_toml("[log]\nformat = \"xml\"\n");
    if result.is_ok() {
        return Err("expected parse failure for unknown log format".to_string());
    }
    Ok(())
}
