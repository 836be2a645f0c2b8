//! Environment override tests for subscription-config.
// crates/subscription-config/tests/env_overrides.rs
// =============================================================================
// Module: Environment Override Tests
// Description: Validate APP_* overlay semantics.
// Purpose: Ensure overrides win over file values and bad values fail closed.
// =============================================================================

use subscription_config::ENV_OVERRIDE_KEYS;
use subscription_config::LogFormat;
use subscription_config::LogLevel;
use subscription_config::StoreBackend;

mod common;

type TestResult = Result<(), String>;

#[test]
fn overrides_replace_file_values() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    let lookup = common::lookup_from(&[
        ("APP_HTTP_PORT", "9090"),
        ("APP_HTTP_BIND", "127.0.0.1"),
        ("APP_HTTP_BASE_PATH", "/api/subscriptions"),
        ("APP_HTTP_READ_TIMEOUT_MS", "1500"),
        ("APP_HTTP_WRITE_TIMEOUT_MS", "2500"),
        ("APP_HTTP_SHUTDOWN_GRACE_MS", "3000"),
        ("APP_LOG_LEVEL", "DEBUG"),
        ("APP_LOG_FORMAT", "pretty"),
        ("APP_STORE_BACKEND", "sqlite"),
        ("APP_STORE_DSN", "data/subscriptions.sqlite"),
        ("APP_STORE_MAX_CONNECTIONS", "4"),
    ]);
    config.apply_overrides(lookup).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;

    let http = &config.http;
    if http.port != 9090 || http.bind != "127.0.0.1" || http.base_path != "/api/subscriptions" {
        return Err(format!("listener overrides not applied: {http:?}"));
    }
    if http.read_timeout_ms != 1_500 || http.write_timeout_ms != 2_500 {
        return Err("deadline overrides not applied".to_string());
    }
    if http.shutdown_grace_ms != 3_000 {
        return Err("shutdown override not applied".to_string());
    }
    if config.log.level != LogLevel::Debug || config.log.format != LogFormat::Pretty {
        return Err("log overrides not applied".to_string());
    }
    if config.store.backend != StoreBackend::Sqlite
        || config.store.dsn != "data/subscriptions.sqlite"
        || config.store.max_connections != 4
    {
        return Err("store overrides not applied".to_string());
    }
    Ok(())
}

#[test]
fn absent_overrides_keep_file_values() -> TestResult {
    let mut config = common::config_from_toml("[http]\nport = 7000\n[store]\ndsn = \"pg\"\n")
        .map_err(|err| err.to_string())?;
    config.apply_overrides(|_| None).map_err(|err| err.to_string())?;
    if config.http.port != 7_000 || config.store.dsn != "pg" {
        return Err("file values changed without overrides".to_string());
    }
    Ok(())
}

#[test]
fn dsn_can_come_from_environment_only() -> TestResult {
    let mut config = common::config_from_toml("").map_err(|err| err.to_string())?;
    config
        .apply_overrides(common::lookup_from(&[("APP_STORE_DSN", "postgres://db/subs")]))
        .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn malformed_overrides_fail_closed() -> TestResult {
    for (key, value) in [
        ("APP_HTTP_PORT", "eighty"),
        ("APP_HTTP_PORT", "70000"),
        ("APP_HTTP_READ_TIMEOUT_MS", "-1"),
        ("APP_LOG_LEVEL", "verbose"),
        ("APP_LOG_FORMAT", "xml"),
        ("APP_STORE_BACKEND", "mysql"),
        ("APP_STORE_MAX_CONNECTIONS", "many"),
    ] {
        let mut config = common::minimal_config().map_err(|err| err.to_string())?;
        common::assert_invalid(
            config.apply_overrides(common::lookup_from(&[(key, value)])),
            key,
        )?;
    }
    Ok(())
}

#[test]
fn every_documented_key_is_consulted() -> TestResult {
    let consulted = std::cell::RefCell::new(Vec::new());
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config
        .apply_overrides(|key| {
            consulted.borrow_mut().push(key.to_string());
            None
        })
        .map_err(|err| err.to_string())?;
    let consulted = consulted.into_inner();
    if consulted != ENV_OVERRIDE_KEYS {
        return Err(format!("consulted keys {consulted:?} differ from documented keys"));
    }
    Ok(())
}
