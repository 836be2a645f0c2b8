// crates/subscription-config/src/config.rs
// ============================================================================
// Module: Subscription Service Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with `APP_*` environment variables, then validated. Missing
//! or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "subscription-service.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "SUBSCRIPTION_SERVICE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum accepted timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum accepted timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 300_000;
/// Maximum store pool size.
pub(crate) const MAX_STORE_CONNECTIONS: u32 = 256;
/// Maximum request body limit in bytes.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;

/// Liveness route served outside the base path.
pub const HEALTH_PATH: &str = "/healthz";

/// Environment override keys, in the order they are applied.
pub const ENV_OVERRIDE_KEYS: &[&str] = &[
    "APP_HTTP_PORT",
    "APP_HTTP_BIND",
    "APP_HTTP_BASE_PATH",
    "APP_HTTP_READ_TIMEOUT_MS",
    "APP_HTTP_WRITE_TIMEOUT_MS",
    "APP_HTTP_SHUTDOWN_GRACE_MS",
    "APP_LOG_LEVEL",
    "APP_LOG_FORMAT",
    "APP_STORE_BACKEND",
    "APP_STORE_DSN",
    "APP_STORE_MAX_CONNECTIONS",
];

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Subscription service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl ServiceConfig {
    /// Loads configuration from disk, applies environment overrides, and
    /// validates the result.
    ///
    /// Path resolution: explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// `subscription-service.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays `APP_*` values obtained from `lookup` onto this config.
    ///
    /// Unset keys leave the file value in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_HTTP_PORT") {
            self.http.port = parse_override("APP_HTTP_PORT", &value)?;
        }
        if let Some(value) = lookup("APP_HTTP_BIND") {
            self.http.bind = value;
        }
        if let Some(value) = lookup("APP_HTTP_BASE_PATH") {
            self.http.base_path = value;
        }
        if let Some(value) = lookup("APP_HTTP_READ_TIMEOUT_MS") {
            self.http.read_timeout_ms = parse_override("APP_HTTP_READ_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("APP_HTTP_WRITE_TIMEOUT_MS") {
            self.http.write_timeout_ms = parse_override("APP_HTTP_WRITE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("APP_HTTP_SHUTDOWN_GRACE_MS") {
            self.http.shutdown_grace_ms = parse_override("APP_HTTP_SHUTDOWN_GRACE_MS", &value)?;
        }
        if let Some(value) = lookup("APP_LOG_LEVEL") {
            self.log.level = parse_override("APP_LOG_LEVEL", &value)?;
        }
        if let Some(value) = lookup("APP_LOG_FORMAT") {
            self.log.format = parse_override("APP_LOG_FORMAT", &value)?;
        }
        if let Some(value) = lookup("APP_STORE_BACKEND") {
            self.store.backend = parse_override("APP_STORE_BACKEND", &value)?;
        }
        if let Some(value) = lookup("APP_STORE_DSN") {
            self.store.dsn = value;
        }
        if let Some(value) = lookup("APP_STORE_MAX_CONNECTIONS") {
            self.store.max_connections = parse_override("APP_STORE_MAX_CONNECTIONS", &value)?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: HTTP Config
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route prefix for subscription endpoints.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Deadline for read operations, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Deadline for write operations, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Grace period for in-flight requests on shutdown, in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            base_path: default_base_path(),
            read_timeout_ms: default_timeout_ms(),
            write_timeout_ms: default_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl HttpConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.bind.trim().parse::<IpAddr>().map_err(|_| {
            ConfigError::Invalid(format!("http.bind must be an ip address: {}", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validates listener settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.port == 0 {
            return Err(ConfigError::Invalid("http.port must be non-zero".to_string()));
        }
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::Invalid("http.base_path must start with '/'".to_string()));
        }
        if self.base_path.len() > 1 && self.base_path.ends_with('/') {
            return Err(ConfigError::Invalid("http.base_path must not end with '/'".to_string()));
        }
        if self.base_path == "/" {
            return Err(ConfigError::Invalid("http.base_path must not be '/'".to_string()));
        }
        if self.base_path.contains(['{', '}', '*', '?', '#', ':', ' ']) {
            return Err(ConfigError::Invalid(
                "http.base_path contains reserved characters".to_string(),
            ));
        }
        if self.base_path == HEALTH_PATH {
            return Err(ConfigError::Invalid(format!("http.base_path must not be {HEALTH_PATH}")));
        }
        validate_timeout("http.read_timeout_ms", self.read_timeout_ms)?;
        validate_timeout("http.write_timeout_ms", self.write_timeout_ms)?;
        validate_timeout("http.shutdown_grace_ms", self.shutdown_grace_ms)?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "http.max_body_bytes must be between 1 and {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// Returns the default listener port.
const fn default_port() -> u16 {
    8080
}

/// Returns the default route prefix.
fn default_base_path() -> String {
    "/v1/subscriptions".to_string()
}

/// Returns the default read/write deadline.
const fn default_timeout_ms() -> u64 {
    5_000
}

/// Returns the default shutdown grace period.
const fn default_shutdown_grace_ms() -> u64 {
    10_000
}

/// Returns the default request body limit.
const fn default_max_body_bytes() -> usize {
    64 * 1024
}

// ============================================================================
// SECTION: Log Config
// ============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace and above.
    Trace,
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level emitted.
    #[serde(default)]
    pub level: LogLevel,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

// ============================================================================
// SECTION: Store Config
// ============================================================================

/// Record store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Pooled Postgres.
    #[default]
    Postgres,
    /// SQLite file.
    Sqlite,
}

impl StoreBackend {
    /// Returns the configuration label for this backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Postgres connection string, or SQLite file path.
    #[serde(default)]
    pub dsn: String,
    /// Maximum pooled connections (Postgres).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connect timeout in milliseconds (Postgres).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Server-side statement timeout in milliseconds (Postgres).
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// Lock wait timeout in milliseconds (SQLite).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dsn: String::new(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Validates store settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let dsn = self.dsn.trim();
        if dsn.is_empty() {
            return Err(ConfigError::Invalid("store.dsn is required".to_string()));
        }
        if self.backend == StoreBackend::Sqlite {
            validate_path(Path::new(dsn))?;
        }
        if self.max_connections == 0 || self.max_connections > MAX_STORE_CONNECTIONS {
            return Err(ConfigError::Invalid(format!(
                "store.max_connections must be between 1 and {MAX_STORE_CONNECTIONS}"
            )));
        }
        validate_timeout("store.connect_timeout_ms", self.connect_timeout_ms)?;
        validate_timeout("store.statement_timeout_ms", self.statement_timeout_ms)?;
        validate_timeout("store.busy_timeout_ms", self.busy_timeout_ms)?;
        Ok(())
    }
}

/// Returns the default pool size.
const fn default_max_connections() -> u32 {
    16
}

/// Returns the default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Returns the default statement timeout.
const fn default_statement_timeout_ms() -> u64 {
    30_000
}

/// Returns the default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a millisecond timeout against the shared bounds.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Parses an environment override value.
fn parse_override<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid(format!("{key} has an invalid value: {value}")))
}
