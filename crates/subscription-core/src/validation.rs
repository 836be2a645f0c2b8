// crates/subscription-core/src/validation.rs
// ============================================================================
// Module: Subscription Validation
// Description: Converts untrusted payloads and query parameters to typed forms.
// Purpose: Reject malformed input before any store call is made.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! Every write path goes through [`validate_create`] or [`validate_update`] and
//! every aggregate request through [`validate_sum_query`]. The error messages
//! are client-facing and stable; they never include raw input beyond what the
//! caller already sent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::CalendarDate;
use crate::model::SubscriptionDraft;
use crate::model::SubscriptionId;
use crate::model::SubscriptionPayload;
use crate::model::SumQuery;
use crate::model::SumQueryParams;
use crate::model::UserId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a service name, in characters.
pub const MAX_SERVICE_NAME_CHARS: usize = 255;

/// Largest price accepted; prices are stored in signed 64-bit columns.
pub const MAX_PRICE: u64 = i64::MAX.unsigned_abs();

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Service name is empty after trimming.
    #[error("service name is required")]
    EmptyServiceName,
    /// Service name exceeds [`MAX_SERVICE_NAME_CHARS`].
    #[error("service name exceeds 255 characters")]
    ServiceNameTooLong,
    /// Price exceeds [`MAX_PRICE`].
    #[error("price exceeds the supported range")]
    PriceOutOfRange,
    /// Start date is missing or not `YYYY-MM-DD`.
    #[error("invalid start date")]
    InvalidStartDate,
    /// End date is missing or not `YYYY-MM-DD`.
    #[error("invalid end date")]
    InvalidEndDate,
    /// Start date falls after end date.
    #[error("start date must not be after end date")]
    DateRangeInverted,
    /// Update payload has no identifier.
    #[error("id is required")]
    MissingId,
    /// User identifier filter is not a UUID.
    #[error("invalid user id")]
    InvalidUserId,
}

// ============================================================================
// SECTION: Payload Validation
// ============================================================================

/// Validates a create payload. Any `id` in the payload is ignored.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first offending field.
pub fn validate_create(payload: &SubscriptionPayload) -> Result<SubscriptionDraft, ValidationError> {
    validate_fields(payload)
}

/// Validates an update payload and extracts its target identifier.
///
/// # Errors
///
/// Returns [`ValidationError::MissingId`] when no identifier is present, or
/// the first field error otherwise.
pub fn validate_update(
    payload: &SubscriptionPayload,
) -> Result<(SubscriptionId, SubscriptionDraft), ValidationError> {
    let id = payload.id.ok_or(ValidationError::MissingId)?;
    let draft = validate_fields(payload)?;
    Ok((id, draft))
}

/// Shared field checks for create and update.
fn validate_fields(payload: &SubscriptionPayload) -> Result<SubscriptionDraft, ValidationError> {
    let service_name = payload.service_name.trim();
    if service_name.is_empty() {
        return Err(ValidationError::EmptyServiceName);
    }
    if service_name.chars().count() > MAX_SERVICE_NAME_CHARS {
        return Err(ValidationError::ServiceNameTooLong);
    }
    if payload.price > MAX_PRICE {
        return Err(ValidationError::PriceOutOfRange);
    }
    let start_date = CalendarDate::parse(&payload.start_date)
        .map_err(|_| ValidationError::InvalidStartDate)?;
    let end_date =
        CalendarDate::parse(&payload.end_date).map_err(|_| ValidationError::InvalidEndDate)?;
    if start_date > end_date {
        return Err(ValidationError::DateRangeInverted);
    }
    Ok(SubscriptionDraft {
        service_name: service_name.to_string(),
        price: payload.price,
        user_id: payload.user_id,
        start_date,
        end_date,
    })
}

// ============================================================================
// SECTION: Query Validation
// ============================================================================

/// Validates raw sum query parameters.
///
/// Empty `userID` or `serviceName` values are treated as absent filters.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidStartDate`],
/// [`ValidationError::InvalidEndDate`], [`ValidationError::DateRangeInverted`],
/// or [`ValidationError::InvalidUserId`].
pub fn validate_sum_query(params: &SumQueryParams) -> Result<SumQuery, ValidationError> {
    let start_date = params
        .start_date
        .as_deref()
        .and_then(|raw| CalendarDate::parse(raw).ok())
        .ok_or(ValidationError::InvalidStartDate)?;
    let end_date = params
        .end_date
        .as_deref()
        .and_then(|raw| CalendarDate::parse(raw).ok())
        .ok_or(ValidationError::InvalidEndDate)?;
    if start_date > end_date {
        return Err(ValidationError::DateRangeInverted);
    }
    let user_id = match params.user_id.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<UserId>().map_err(|_| ValidationError::InvalidUserId)?),
    };
    let service_name = params.service_name.clone().filter(|name| !name.is_empty());
    Ok(SumQuery {
        start_date,
        end_date,
        user_id,
        service_name,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
