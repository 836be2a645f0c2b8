// crates/subscription-core/src/query.rs
// ============================================================================
// Module: Filter Query Builder
// Description: Positional-parameter SQL assembly for optional filters.
// Purpose: Build the aggregate sum statement without interpolating values.
// Dependencies: crate::model, uuid
// ============================================================================

//! ## Overview
//! A [`FilterQuery`] starts from a fixed base statement and collects
//! predicate/value pairs. Rendering joins the predicates with `AND` and
//! numbers the placeholders in push order for the target [`SqlDialect`].
//!
//! # Invariants
//! - Column names and operators come only from `'static` strings owned by the
//!   caller; bound values never appear in the SQL text.
//! - `params.len()` always equals the number of placeholders in `sql`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use uuid::Uuid;

use crate::model::SumQuery;

// ============================================================================
// SECTION: Types
// ============================================================================

/// SQL dialect targeted by a rendered statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `$1, $2, ...` placeholders.
    Postgres,
    /// `?1, ?2, ...` placeholders.
    Sqlite,
}

impl SqlDialect {
    /// Renders the placeholder for a 1-based parameter index.
    fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::Sqlite => format!("?{index}"),
        }
    }
}

/// Comparison operator for a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
}

impl Comparison {
    /// Returns the SQL operator text.
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
        }
    }
}

/// Value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Text value (dates, names).
    Text(String),
    /// UUID value; backends bind natively or as hyphenated text.
    Uuid(Uuid),
}

/// Single `column op ?` predicate with its bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    /// Column name.
    column: &'static str,
    /// Comparison operator.
    comparison: Comparison,
    /// Bound value.
    value: SqlValue,
}

/// Parameterized statement ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    /// SQL text with positional placeholders.
    pub sql: String,
    /// Values in placeholder order.
    pub params: Vec<SqlValue>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Collects predicates over a fixed base statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    /// Base statement without a `WHERE` clause.
    base: &'static str,
    /// Predicates in push order.
    predicates: Vec<Predicate>,
}

impl FilterQuery {
    /// Starts a query from a base statement.
    #[must_use]
    pub const fn new(base: &'static str) -> Self {
        Self {
            base,
            predicates: Vec::new(),
        }
    }

    /// Adds a predicate.
    pub fn push(
        &mut self,
        column: &'static str,
        comparison: Comparison,
        value: SqlValue,
    ) -> &mut Self {
        self.predicates.push(Predicate {
            column,
            comparison,
            value,
        });
        self
    }

    /// Adds a predicate only when a value is present.
    pub fn push_optional(
        &mut self,
        column: &'static str,
        comparison: Comparison,
        value: Option<SqlValue>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.push(column, comparison, value);
        }
        self
    }

    /// Renders the statement for a dialect.
    #[must_use]
    pub fn render(&self, dialect: SqlDialect) -> RenderedQuery {
        let mut sql = String::from(self.base);
        let mut params = Vec::with_capacity(self.predicates.len());
        for (offset, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if offset == 0 { " WHERE " } else { " AND " });
            sql.push_str(predicate.column);
            sql.push(' ');
            sql.push_str(predicate.comparison.as_sql());
            sql.push(' ');
            sql.push_str(&dialect.placeholder(offset + 1));
            params.push(predicate.value.clone());
        }
        RenderedQuery {
            sql,
            params,
        }
    }
}

// ============================================================================
// SECTION: Sum Query
// ============================================================================

/// Base aggregate for Postgres; `SUM(bigint)` yields `numeric` there.
const POSTGRES_SUM_BASE: &str = "SELECT COALESCE(SUM(price), 0)::BIGINT FROM subscriptions";

/// Base aggregate for SQLite.
const SQLITE_SUM_BASE: &str = "SELECT COALESCE(SUM(price), 0) FROM subscriptions";

/// Builds the overlap-sum statement for a validated query.
///
/// A record overlaps `[start, end]` when `start_date <= end` and
/// `end_date >= start`. Optional filters narrow the match conjunctively.
#[must_use]
pub fn sum_price_query(query: &SumQuery, dialect: SqlDialect) -> RenderedQuery {
    let base = match dialect {
        SqlDialect::Postgres => POSTGRES_SUM_BASE,
        SqlDialect::Sqlite => SQLITE_SUM_BASE,
    };
    let mut filter = FilterQuery::new(base);
    filter
        .push("start_date", Comparison::LessOrEqual, SqlValue::Text(query.end_date.to_string()))
        .push("end_date", Comparison::GreaterOrEqual, SqlValue::Text(query.start_date.to_string()))
        .push_optional(
            "user_id",
            Comparison::Eq,
            query.user_id.map(|user| SqlValue::Uuid(*user.as_uuid())),
        )
        .push_optional("service_name", Comparison::Eq, query.service_name.clone().map(SqlValue::Text));
    filter.render(dialect)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
