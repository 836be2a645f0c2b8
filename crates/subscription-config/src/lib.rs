// crates/subscription-config/src/lib.rs
// ============================================================================
// Module: Subscription Config Library
// Description: Canonical config model, overrides, and validation.
// Purpose: Single source of truth for subscription-service.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `subscription-config` defines the configuration model for the subscription
//! service: HTTP listener and deadlines, logging, and the record store. Files
//! are TOML; `APP_*` environment variables override individual keys; the
//! merged result is validated fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
