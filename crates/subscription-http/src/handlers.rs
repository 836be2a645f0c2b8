// crates/subscription-http/src/handlers.rs
// ============================================================================
// Module: Subscription Handlers
// Description: Axum handlers for subscription CRUD and the sum query.
// Purpose: Parse untrusted input and translate service results to HTTP.
// Dependencies: axum, tokio, tracing, subscription-core
// ============================================================================

//! ## Overview
//! Handlers parse path ids, JSON bodies, and query strings, then run the
//! service call on tokio's blocking pool under a deadline. Reads use the
//! read deadline and writes the write deadline. An expired deadline surfaces
//! as [`StoreError::Cancelled`]; a blocking task that fails to join becomes
//! [`ApiError::Unknown`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use serde::Serialize;
use subscription_config::HttpConfig;
use subscription_core::DeleteOutcome;
use subscription_core::ServiceError;
use subscription_core::StoreError;
use subscription_core::Subscription;
use subscription_core::SubscriptionId;
use subscription_core::SubscriptionPayload;
use subscription_core::SubscriptionService;
use subscription_core::SumQueryParams;
use tracing::error;
use tracing::warn;

use crate::error::ApiError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Subscription operations over the injected store.
    service: SubscriptionService,
    /// Deadline for read operations.
    read_timeout: Duration,
    /// Deadline for write operations.
    write_timeout: Duration,
}

impl AppState {
    /// Creates handler state with explicit deadlines.
    #[must_use]
    pub const fn new(
        service: SubscriptionService,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            service,
            read_timeout,
            write_timeout,
        }
    }

    /// Creates handler state with deadlines taken from HTTP configuration.
    #[must_use]
    pub const fn from_config(service: SubscriptionService, config: &HttpConfig) -> Self {
        Self::new(
            service,
            Duration::from_millis(config.read_timeout_ms),
            Duration::from_millis(config.write_timeout_ms),
        )
    }
}

// ============================================================================
// SECTION: Response Bodies
// ============================================================================

/// Body returned by a successful create.
#[derive(Debug, Serialize)]
struct CreatedResponse {
    /// Always `true`.
    success: bool,
    /// Store-assigned identifier.
    id: SubscriptionId,
}

/// Body returned by a successful update.
#[derive(Debug, Serialize)]
struct UpdatedResponse {
    /// Always `true`.
    success: bool,
}

/// Body returned by a delete.
#[derive(Debug, Serialize)]
struct DeletedResponse {
    /// Always `true`; deleting an absent id succeeds.
    success: bool,
    /// Whether a row was removed.
    deleted: bool,
}

/// Body returned by the sum query.
#[derive(Debug, Serialize)]
struct SumResponse {
    /// Total price of matching subscriptions.
    amount: u64,
}

/// Body returned by the liveness probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    status: &'static str,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Subscription operation, used for log fields and internal error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    /// Lookup by id.
    FindById,
    /// Insert.
    Create,
    /// Overwrite by id.
    Update,
    /// Delete by id.
    Delete,
    /// Price aggregate.
    Sum,
}

impl Operation {
    /// Returns a stable label for logs.
    const fn as_str(self) -> &'static str {
        match self {
            Self::FindById => "find_by_id",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Sum => "sum",
        }
    }

    /// Returns the client-facing message for a failed store call.
    const fn failure_message(self) -> &'static str {
        match self {
            Self::FindById => "failed to get subscription by id",
            Self::Create => "failed to create subscription",
            Self::Update => "failed to update subscription",
            Self::Delete => "failed to delete subscription",
            Self::Sum => "failed to get subscriptions sum",
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET {base}/{id}`: loads one subscription.
///
/// # Errors
///
/// Returns [`ApiError`] for a malformed id, a missing record, or a store
/// failure.
pub async fn find_subscription(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Subscription>, ApiError> {
    let id = parse_id(path)?;
    let service = state.service.clone();
    let found = run_blocking(Operation::FindById, state.read_timeout, move || {
        service.find_by_id(&id)
    })
    .await?;
    found.map(Json).ok_or_else(|| ApiError::NotFound("subscription not found".to_string()))
}

/// `POST {base}`: validates and creates a subscription.
///
/// # Errors
///
/// Returns [`ApiError`] for an unreadable body, invalid fields, or a store
/// failure.
pub async fn create_subscription(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<impl Serialize>, ApiError> {
    let payload = parse_payload(body)?;
    let service = state.service.clone();
    let created = run_blocking(Operation::Create, state.write_timeout, move || {
        service.create(&payload)
    })
    .await?;
    Ok(Json(CreatedResponse {
        success: true,
        id: created.id,
    }))
}

/// `PUT {base}`: validates and overwrites an existing subscription.
///
/// # Errors
///
/// Returns [`ApiError`] for an unreadable body, invalid fields, an unknown
/// id, or a store failure.
pub async fn update_subscription(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<impl Serialize>, ApiError> {
    let payload = parse_payload(body)?;
    let service = state.service.clone();
    run_blocking(Operation::Update, state.write_timeout, move || service.update(&payload)).await?;
    Ok(Json(UpdatedResponse {
        success: true,
    }))
}

/// `DELETE {base}/{id}`: removes a subscription if present.
///
/// # Errors
///
/// Returns [`ApiError`] for a malformed id or a store failure.
pub async fn delete_subscription(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<impl Serialize>, ApiError> {
    let id = parse_id(path)?;
    let service = state.service.clone();
    let outcome =
        run_blocking(Operation::Delete, state.write_timeout, move || service.delete(&id)).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted: outcome == DeleteOutcome::Deleted,
    }))
}

/// `GET {base}/sum`: totals prices over overlapping subscriptions.
///
/// # Errors
///
/// Returns [`ApiError`] for malformed or invalid parameters, or a store
/// failure.
pub async fn sum_subscriptions(
    State(state): State<AppState>,
    query: Result<Query<SumQueryParams>, QueryRejection>,
) -> Result<Json<impl Serialize>, ApiError> {
    let Query(params) = query.map_err(|rejection| {
        warn!(error = %rejection, "invalid request query");
        ApiError::BadRequest("invalid request query".to_string())
    })?;
    let service = state.service.clone();
    let amount =
        run_blocking(Operation::Sum, state.read_timeout, move || service.sum_price(&params))
            .await?;
    Ok(Json(SumResponse {
        amount,
    }))
}

/// `GET /healthz`: liveness probe.
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
    })
}

/// Fallback for unmatched routes.
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a path segment into a subscription id.
fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<SubscriptionId, ApiError> {
    let Path(raw) = path.map_err(|rejection| {
        warn!(error = %rejection, "invalid subscription id");
        ApiError::BadRequest("invalid subscription id".to_string())
    })?;
    raw.parse::<SubscriptionId>().map_err(|err| {
        warn!(id = %raw, error = %err, "invalid subscription id");
        ApiError::BadRequest(format!("invalid subscription id: {raw}"))
    })
}

/// Decodes a JSON write payload.
fn parse_payload(body: Result<Bytes, BytesRejection>) -> Result<SubscriptionPayload, ApiError> {
    let bytes = body.map_err(|rejection| {
        warn!(error = %rejection, "unreadable request body");
        ApiError::BadRequest("invalid request body".to_string())
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        warn!(error = %err, body_bytes = bytes.len(), "invalid request body");
        ApiError::BadRequest("invalid request body".to_string())
    })
}

/// Runs a service call on the blocking pool under a deadline.
///
/// An expired call is abandoned, not interrupted: it runs to completion on the
/// blocking pool and its result is dropped. Store-side bounds
/// (`statement_timeout`, `busy_timeout`) cap how long that can take.
async fn run_blocking<T, F>(
    operation: Operation,
    deadline: Duration,
    call: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    match tokio::time::timeout(deadline, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result.map_err(|err| translate(operation, err)),
        Ok(Err(err)) => {
            error!(operation = operation.as_str(), error = %err, "store task failed to join");
            Err(ApiError::Unknown)
        }
        Err(_) => {
            let reason = format!("deadline of {} ms exceeded", deadline.as_millis());
            Err(translate(operation, ServiceError::Store(StoreError::Cancelled(reason))))
        }
    }
}

/// Maps a service failure to its client-facing error, logging store faults.
fn translate(operation: Operation, err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(err) => {
            warn!(operation = operation.as_str(), error = %err, "validation failed");
            ApiError::BadRequest(err.to_string())
        }
        ServiceError::Store(StoreError::NotFound) => {
            ApiError::NotFound("subscription not found".to_string())
        }
        ServiceError::Store(StoreError::Cancelled(reason)) => {
            warn!(operation = operation.as_str(), reason = %reason, "store call cancelled");
            ApiError::Internal(operation.failure_message().to_string())
        }
        ServiceError::Store(err) => {
            error!(operation = operation.as_str(), error = %err, "store call failed");
            ApiError::Internal(operation.failure_message().to_string())
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
