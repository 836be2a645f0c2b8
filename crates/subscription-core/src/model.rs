// crates/subscription-core/src/model.rs
// ============================================================================
// Module: Subscription Model
// Description: Identifiers, calendar dates, records, payloads, and queries.
// Purpose: Provide the typed shapes exchanged between handler, service, store.
// Dependencies: serde, time, uuid
// ============================================================================

//! ## Overview
//! Defines the subscription record as persisted, the untrusted write payload
//! accepted from clients, the validated [`SubscriptionDraft`] handed to stores,
//! and the aggregate [`SumQuery`].
//!
//! Wire names follow the public JSON contract (`serviceName`, `userID`,
//! `startDate`, `endDate`, `updatedAt`). Calendar dates are strict
//! `YYYY-MM-DD` strings on the wire and in storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Subscription identifier assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a fresh random (v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SubscriptionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

/// Identifier of the user owning a subscription. Opaque to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

// ============================================================================
// SECTION: Calendar Date
// ============================================================================

/// Error returned when a calendar date string is not a valid `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a YYYY-MM-DD calendar date")]
pub struct CalendarDateError;

/// Calendar date without time or offset, rendered as `YYYY-MM-DD`.
///
/// # Invariants
/// - Parsing accepts exactly ten ASCII characters: four-digit year, two-digit
///   month, two-digit day, separated by `-`.
/// - Ordering is chronological, which matches the lexical order of the
///   rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    /// Parses a strict `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarDateError`] when the text is not a real calendar date
    /// in the expected layout.
    pub fn parse(value: &str) -> Result<Self, CalendarDateError> {
        let bytes = value.as_bytes();
        if bytes.len() != 10 {
            return Err(CalendarDateError);
        }
        let layout_ok = bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
        if !layout_ok {
            return Err(CalendarDateError);
        }
        Date::parse(value, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| CalendarDateError)
    }

    /// Wraps an existing [`Date`].
    #[must_use]
    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// Returns the underlying [`Date`].
    #[must_use]
    pub const fn as_date(&self) -> Date {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarDateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Persisted subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Store-assigned identifier.
    pub id: SubscriptionId,
    /// Name of the subscribed service.
    #[serde(rename = "serviceName")]
    pub service_name: String,
    /// Price in the smallest monetary unit.
    pub price: u64,
    /// Owning user.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// First day the subscription is active.
    #[serde(rename = "startDate")]
    pub start_date: CalendarDate,
    /// Last day the subscription is active.
    #[serde(rename = "endDate")]
    pub end_date: CalendarDate,
    /// Timestamp of the last successful update; `None` until then.
    #[serde(rename = "updatedAt", default, with = "rfc3339_option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Subscription {
    /// Builds a record from a validated draft with no update stamp.
    #[must_use]
    pub fn from_draft(id: SubscriptionId, draft: SubscriptionDraft) -> Self {
        Self {
            id,
            service_name: draft.service_name,
            price: draft.price,
            user_id: draft.user_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            updated_at: None,
        }
    }
}

/// Untrusted write payload as decoded from a request body.
///
/// Dates stay raw so validation can name the offending field. Any
/// `updatedAt` sent by a client is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionPayload {
    /// Target identifier; required for updates, ignored on create.
    #[serde(default)]
    pub id: Option<SubscriptionId>,
    /// Name of the subscribed service.
    #[serde(rename = "serviceName", default)]
    pub service_name: String,
    /// Price in the smallest monetary unit.
    pub price: u64,
    /// Owning user.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Raw start date text.
    #[serde(rename = "startDate", default)]
    pub start_date: String,
    /// Raw end date text.
    #[serde(rename = "endDate", default)]
    pub end_date: String,
}

/// Validated, store-ready subscription fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDraft {
    /// Trimmed, non-empty service name.
    pub service_name: String,
    /// Price that fits a signed 64-bit column.
    pub price: u64,
    /// Owning user.
    pub user_id: UserId,
    /// First active day.
    pub start_date: CalendarDate,
    /// Last active day, never before `start_date`.
    pub end_date: CalendarDate,
}

/// Result of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A row was removed.
    Deleted,
    /// No row matched the identifier.
    Missing,
}

impl DeleteOutcome {
    /// Returns true when a row was removed.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

// ============================================================================
// SECTION: Sum Query
// ============================================================================

/// Validated aggregate query over overlapping subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumQuery {
    /// Inclusive range start.
    pub start_date: CalendarDate,
    /// Inclusive range end.
    pub end_date: CalendarDate,
    /// Optional owner filter.
    pub user_id: Option<UserId>,
    /// Optional exact service name filter.
    pub service_name: Option<String>,
}

/// Raw query-string parameters for the sum endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SumQueryParams {
    /// Raw `startDate` value.
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    /// Raw `endDate` value.
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// Raw `userID` value.
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    /// Raw `serviceName` value.
    #[serde(rename = "serviceName")]
    pub service_name: Option<String>,
}

// ============================================================================
// SECTION: Timestamp Encoding
// ============================================================================

/// RFC 3339 encoding for optional update timestamps.
mod rfc3339_option {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de;
    use serde::ser;
    use time::OffsetDateTime;

    use super::Rfc3339;

    /// Serializes the timestamp as an RFC 3339 string or `null`.
    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(timestamp) => {
                let rendered = timestamp.format(&Rfc3339).map_err(ser::Error::custom)?;
                serializer.serialize_some(&rendered)
            }
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an RFC 3339 string or `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|text| OffsetDateTime::parse(&text, &Rfc3339).map_err(de::Error::custom))
            .transpose()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use proptest::prelude::*;
    use time::Month;

    use super::*;

    #[test]
    fn calendar_date_accepts_strict_layout() {
        let date = CalendarDate::parse("2024-02-29").unwrap();
        assert_eq!(date.as_date(), Date::from_calendar_date(2024, Month::February, 29).unwrap());
        assert_eq!(date.to_string(), "2024-02-29");
    }

    #[test]
    fn calendar_date_rejects_loose_or_impossible_values() {
        for raw in [
            "", "2024-1-01", "2024-01-1", "24-01-01", "2024/01/01", "2024-13-01", "2023-02-29",
            "2024-01-32", "+2024-01-01", "2024-01-01T00:00:00Z", " 2024-01-01", "abcd-ef-gh",
        ] {
            assert!(CalendarDate::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn subscription_serializes_with_wire_names() {
        let record = Subscription {
            id: "6f2d1c3e-7a8b-4c9d-8e0f-1a2b3c4d5e6f".parse().unwrap(),
            service_name: "Netflix".to_string(),
            price: 999,
            user_id: "60601fee-2bf1-4721-ae6f-7636e79a0cba".parse().unwrap(),
            start_date: CalendarDate::parse("2024-01-01").unwrap(),
            end_date: CalendarDate::parse("2024-12-31").unwrap(),
            updated_at: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["serviceName"], "Netflix");
        assert_eq!(value["userID"], "60601fee-2bf1-4721-ae6f-7636e79a0cba");
        assert_eq!(value["startDate"], "2024-01-01");
        assert_eq!(value["endDate"], "2024-12-31");
        assert!(value["updatedAt"].is_null());
    }

    #[test]
    fn updated_at_renders_rfc3339() {
        let stamp = OffsetDateTime::from_unix_timestamp(1_717_200_000).unwrap();
        let record = Subscription {
            id: SubscriptionId::generate(),
            service_name: "Spotify".to_string(),
            price: 1,
            user_id: UserId::from_uuid(Uuid::nil()),
            start_date: CalendarDate::parse("2024-06-01").unwrap(),
            end_date: CalendarDate::parse("2024-06-30").unwrap(),
            updated_at: Some(stamp),
        };
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains("\"updatedAt\":\"2024-06-01T00:00:00Z\""), "{text}");
        let decoded: Subscription = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded.updated_at, Some(stamp));
    }

    #[test]
    fn payload_ignores_client_updated_at() {
        let payload: SubscriptionPayload = serde_json::from_str(
            r#"{"serviceName":"Netflix","price":5,"userID":"60601fee-2bf1-4721-ae6f-7636e79a0cba",
                "startDate":"2024-01-01","endDate":"2024-01-31","updatedAt":"2020-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(payload.id, None);
        assert_eq!(payload.service_name, "Netflix");
    }

    #[test]
    fn payload_rejects_negative_price() {
        let result: Result<SubscriptionPayload, _> = serde_json::from_str(
            r#"{"serviceName":"Netflix","price":-5,"userID":"60601fee-2bf1-4721-ae6f-7636e79a0cba"}"#,
        );
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn calendar_date_display_roundtrips(day in 0i32..200_000) {
            let base = Date::from_calendar_date(1900, Month::January, 1).unwrap();
            let date = base + time::Duration::days(i64::from(day));
            let rendered = CalendarDate::from_date(date).to_string();
            prop_assert_eq!(CalendarDate::parse(&rendered).unwrap().as_date(), date);
        }

        #[test]
        fn calendar_date_order_matches_text_order(a in 0i32..100_000, b in 0i32..100_000) {
            let base = Date::from_calendar_date(1970, Month::January, 1).unwrap();
            let left = CalendarDate::from_date(base + time::Duration::days(i64::from(a)));
            let right = CalendarDate::from_date(base + time::Duration::days(i64::from(b)));
            prop_assert_eq!(left.cmp(&right), left.to_string().cmp(&right.to_string()));
        }
    }
}
