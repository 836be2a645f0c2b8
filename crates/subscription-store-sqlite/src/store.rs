// crates/subscription-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Subscription Store
// Description: Durable SubscriptionStore backed by SQLite.
// Purpose: Persist subscription rows and answer the overlap-sum aggregate.
// Dependencies: subscription-core, rusqlite, thiserror, time
// ============================================================================

//! ## Overview
//! Rows live in a single `subscriptions` table. Identifiers and user ids are
//! stored as hyphenated lowercase UUID text, dates as `YYYY-MM-DD` text (their
//! lexical order is chronological), and `updated_at` as Unix microseconds.
//! Rows read back are decoded strictly; anything that fails to parse is
//! reported as corruption rather than skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use subscription_core::CalendarDate;
use subscription_core::DeleteOutcome;
use subscription_core::SqlDialect;
use subscription_core::SqlValue;
use subscription_core::StoreError;
use subscription_core::Subscription;
use subscription_core::SubscriptionDraft;
use subscription_core::SubscriptionId;
use subscription_core::SubscriptionStore;
use subscription_core::SumQuery;
use subscription_core::UserId;
use subscription_core::sum_price_query;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Journal and sync pragmas applied to every connection.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = wal; PRAGMA synchronous = full;";
/// Column list shared by every row-returning statement.
const SELECT_COLUMNS: &str =
    "id, service_name, price, user_id, start_date, end_date, updated_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` subscription store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Builds a configuration for `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Row contents failed to decode.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Update targeted an absent row.
    #[error("sqlite store row not found")]
    NotFound,
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Invalid(format!("schema version mismatch: {message}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::NotFound => Self::NotFound,
        }
    }
}

/// Maps a `rusqlite` error into a store error.
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed subscription store.
#[derive(Clone)]
pub struct SqliteSubscriptionStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSubscriptionStore {
    /// Opens (and if needed initializes) an `SQLite` subscription store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or its
    /// schema version is unsupported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads a row by identifier.
    fn load_row(&self, id: &SubscriptionId) -> Result<Option<Subscription>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id.to_string()],
                read_raw_row,
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        row.map(RawRow::decode).transpose()
    }

    /// Inserts a new row under a fresh identifier.
    fn insert_row(&self, draft: &SubscriptionDraft) -> Result<Subscription, SqliteStoreError> {
        let id = SubscriptionId::generate();
        let price = price_to_column(draft.price)?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO subscriptions (id, service_name, price, user_id, start_date, \
                 end_date, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
                params![
                    id.to_string(),
                    draft.service_name,
                    price,
                    draft.user_id.to_string(),
                    draft.start_date.to_string(),
                    draft.end_date.to_string(),
                ],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(Subscription::from_draft(id, draft.clone()))
    }

    /// Overwrites a row and stamps `updated_at` in the same statement.
    fn update_row(
        &self,
        id: &SubscriptionId,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, SqliteStoreError> {
        let price = price_to_column(draft.price)?;
        let now = unix_micros(OffsetDateTime::now_utc())?;
        let guard = self.lock()?;
        let stamp: Option<i64> = guard
            .query_row(
                "UPDATE subscriptions SET service_name = ?2, price = ?3, user_id = ?4, \
                 start_date = ?5, end_date = ?6, updated_at = MAX(?7, COALESCE(updated_at + 1, \
                 ?7)) WHERE id = ?1 RETURNING updated_at",
                params![
                    id.to_string(),
                    draft.service_name,
                    price,
                    draft.user_id.to_string(),
                    draft.start_date.to_string(),
                    draft.end_date.to_string(),
                    now,
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        let Some(stamp) = stamp else {
            return Err(SqliteStoreError::NotFound);
        };
        Ok(Subscription {
            updated_at: Some(from_unix_micros(stamp)?),
            ..Subscription::from_draft(*id, draft.clone())
        })
    }

    /// Deletes a row by identifier.
    fn delete_row(&self, id: &SubscriptionId) -> Result<DeleteOutcome, SqliteStoreError> {
        let guard = self.lock()?;
        let affected = guard
            .execute("DELETE FROM subscriptions WHERE id = ?1", params![id.to_string()])
            .map_err(db_error)?;
        drop(guard);
        Ok(if affected == 0 { DeleteOutcome::Missing } else { DeleteOutcome::Deleted })
    }

    /// Runs the overlap-sum aggregate.
    fn sum_rows(&self, query: &SumQuery) -> Result<u64, SqliteStoreError> {
        let rendered = sum_price_query(query, SqlDialect::Sqlite);
        let values = rendered.params.into_iter().map(|value| match value {
            SqlValue::Text(text) => Value::Text(text),
            SqlValue::Uuid(uuid) => Value::Text(uuid.to_string()),
        });
        let guard = self.lock()?;
        let total: i64 = guard
            .query_row(&rendered.sql, params_from_iter(values), |row| row.get(0))
            .map_err(db_error)?;
        drop(guard);
        u64::try_from(total)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative price sum: {total}")))
    }
}

impl SubscriptionStore for SqliteSubscriptionStore {
    fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        self.load_row(id).map_err(StoreError::from)
    }

    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        self.insert_row(draft).map_err(StoreError::from)
    }

    fn update(
        &self,
        id: &SubscriptionId,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        self.update_row(id, draft).map_err(StoreError::from)
    }

    fn delete(&self, id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        self.delete_row(id).map_err(StoreError::from)
    }

    fn sum_price(&self, query: &SumQuery) -> Result<u64, StoreError> {
        self.sum_rows(query).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Column values as stored, before domain decoding.
struct RawRow {
    /// `id` column.
    id: String,
    /// `service_name` column.
    service_name: String,
    /// `price` column.
    price: i64,
    /// `user_id` column.
    user_id: String,
    /// `start_date` column.
    start_date: String,
    /// `end_date` column.
    end_date: String,
    /// `updated_at` column (Unix microseconds).
    updated_at: Option<i64>,
}

impl RawRow {
    /// Decodes stored text into domain types.
    fn decode(self) -> Result<Subscription, SqliteStoreError> {
        let id = self
            .id
            .parse::<SubscriptionId>()
            .map_err(|_| SqliteStoreError::Corrupt(format!("invalid id: {}", self.id)))?;
        let user_id = self
            .user_id
            .parse::<UserId>()
            .map_err(|_| SqliteStoreError::Corrupt(format!("invalid user_id for {id}")))?;
        let price = u64::try_from(self.price)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative price for {id}")))?;
        let start_date = CalendarDate::parse(&self.start_date)
            .map_err(|_| SqliteStoreError::Corrupt(format!("invalid start_date for {id}")))?;
        let end_date = CalendarDate::parse(&self.end_date)
            .map_err(|_| SqliteStoreError::Corrupt(format!("invalid end_date for {id}")))?;
        let updated_at = self.updated_at.map(from_unix_micros).transpose()?;
        Ok(Subscription {
            id,
            service_name: self.service_name,
            price,
            user_id,
            start_date,
            end_date,
            updated_at,
        })
    }
}

/// Reads one row in [`SELECT_COLUMNS`] order.
fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        service_name: row.get(1)?,
        price: row.get(2)?,
        user_id: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a price into the signed column type.
fn price_to_column(price: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(price).map_err(|_| SqliteStoreError::Invalid("price exceeds i64".to_string()))
}

/// Converts a timestamp to Unix microseconds.
fn unix_micros(timestamp: OffsetDateTime) -> Result<i64, SqliteStoreError> {
    i64::try_from(timestamp.unix_timestamp_nanos() / 1_000)
        .map_err(|_| SqliteStoreError::Invalid("timestamp exceeds i64 range".to_string()))
}

/// Converts Unix microseconds to a UTC timestamp.
fn from_unix_micros(micros: i64) -> Result<OffsetDateTime, SqliteStoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(|_| SqliteStoreError::Corrupt(format!("invalid updated_at: {micros}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch(CONNECTION_PRAGMAS).map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS subscriptions (
                    id TEXT PRIMARY KEY,
                    service_name TEXT NOT NULL,
                    price INTEGER NOT NULL CHECK (price >= 0),
                    user_id TEXT NOT NULL,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    updated_at INTEGER NULL DEFAULT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_subscriptions_user_id
                    ON subscriptions (user_id);
                CREATE INDEX IF NOT EXISTS idx_subscriptions_range
                    ON subscriptions (start_date, end_date);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
