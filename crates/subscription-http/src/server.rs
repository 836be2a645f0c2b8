// crates/subscription-http/src/server.rs
// ============================================================================
// Module: Subscription Server
// Description: Store wiring, listener binding, and graceful shutdown.
// Purpose: Run the HTTP service from validated configuration.
// Dependencies: axum, tokio, tracing, subscription-store-sqlite, subscription-store-postgres
// ============================================================================

//! ## Overview
//! [`SubscriptionServer`] opens the configured record store once, injects it
//! into the router state, and serves until a shutdown signal arrives. After
//! the signal the listener stops accepting connections and in-flight requests
//! get up to `http.shutdown_grace_ms` to finish before the store is dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use subscription_config::ServiceConfig;
use subscription_config::StoreBackend;
use subscription_config::StoreConfig;
use subscription_core::SharedSubscriptionStore;
use subscription_core::SubscriptionService;
use subscription_store_postgres::PostgresStoreConfig;
use subscription_store_postgres::shared_postgres_store;
use subscription_store_sqlite::SqliteStoreConfig;
use subscription_store_sqlite::SqliteSubscriptionStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::handlers::AppState;
use crate::router::build_router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Subscription HTTP server.
pub struct SubscriptionServer {
    /// Validated service configuration.
    config: ServiceConfig,
    /// Store handle shared by all requests.
    store: SharedSubscriptionStore,
}

impl SubscriptionServer {
    /// Validates configuration and opens the configured store.
    ///
    /// Store construction runs on the blocking pool since both backends open
    /// connections synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the store
    /// cannot be opened.
    pub async fn from_config(config: ServiceConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store_config = config.store.clone();
        let store = tokio::task::spawn_blocking(move || build_store(&store_config))
            .await
            .map_err(|err| ServerError::Init(format!("store initialization aborted: {err}")))??;
        info!(backend = config.store.backend.as_str(), "subscription store opened");
        Ok(Self {
            config,
            store,
        })
    }

    /// Builds a server over an already-open store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when configuration is invalid.
    pub fn with_store(
        config: ServiceConfig,
        store: SharedSubscriptionStore,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            config,
            store,
        })
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Binds the configured listener address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the address is invalid or unavailable.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr =
            self.config.http.socket_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed on {addr}: {err}")))
    }

    /// Serves on an existing listener until `signal` resolves, then drains
    /// in-flight requests for at most the configured grace period.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the server fails.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        let grace_ms = self.config.http.shutdown_grace_ms;
        let service = SubscriptionService::new(self.store.clone());
        let state = AppState::from_config(service, &self.config.http);
        let app = build_router(state, &self.config.http);

        let (notify, signalled) = watch::channel(false);
        let shutdown = async move {
            signal.await;
            info!("shutdown signal received, draining in-flight requests");
            let _ = notify.send(true);
        };

        info!(
            addr = ?local_addr,
            base_path = %self.config.http.base_path,
            "subscription service listening"
        );
        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown).into_future();
        let result = tokio::select! {
            result = server => result.map_err(|err| {
                error!(error = %err, "http server failed");
                ServerError::Transport(format!("http server failed: {err}"))
            }),
            () = grace_expired(signalled, Duration::from_millis(grace_ms)) => {
                warn!(grace_ms, "shutdown grace period exceeded");
                Ok(())
            }
        };
        drop(self.store);
        info!("subscription service stopped");
        result
    }
}

/// Opens the store selected by configuration.
fn build_store(config: &StoreConfig) -> Result<SharedSubscriptionStore, ServerError> {
    match config.backend {
        StoreBackend::Postgres => {
            let postgres = PostgresStoreConfig {
                connection: config.dsn.clone(),
                max_connections: config.max_connections,
                connect_timeout_ms: config.connect_timeout_ms,
                statement_timeout_ms: config.statement_timeout_ms,
            };
            shared_postgres_store(&postgres).map_err(|err| ServerError::Init(err.to_string()))
        }
        StoreBackend::Sqlite => {
            let mut sqlite = SqliteStoreConfig::new(config.dsn.trim());
            sqlite.busy_timeout_ms = config.busy_timeout_ms;
            let store = SqliteSubscriptionStore::new(&sqlite)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedSubscriptionStore::from_store(store))
        }
    }
}

/// Resolves `grace` after the shutdown signal fires; never resolves otherwise.
async fn grace_expired(mut signalled: watch::Receiver<bool>, grace: Duration) {
    if signalled.wait_for(|fired| *fired).await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

// ============================================================================
// SECTION: Signals
// ============================================================================

/// Resolves on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
