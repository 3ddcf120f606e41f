//! Error types for the work entry engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition the engine surfaces to its caller. Conditions that are
//! valid states (empty calendars, zero-duration buckets, fully overridden
//! attendance) never appear here.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::PayloadCategory;

/// The main error type for the work entry engine.
///
/// # Example
///
/// ```
/// use work_entry_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/precedence.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/precedence.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// An interval or window was constructed with `start >= end`.
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        /// The requested start.
        start: DateTime<Utc>,
        /// The requested end.
        end: DateTime<Utc>,
    },

    /// A payload category has no work entry type configured.
    #[error("No work entry type mapped for category '{category}'{}", leave_type_suffix(.leave_type))]
    MissingMapping {
        /// The category that could not be mapped.
        category: PayloadCategory,
        /// The leave type, when the payload was a leave.
        leave_type: Option<String>,
    },

    /// A timezone name could not be parsed.
    #[error("Invalid timezone: {timezone}")]
    InvalidTimezone {
        /// The timezone name that failed to parse.
        timezone: String,
    },

    /// A configured rule is semantically invalid.
    #[error("Invalid rule '{rule_id}': {message}")]
    InvalidRule {
        /// The identifier of the rule.
        rule_id: String,
        /// A description of what made the rule invalid.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An external schedule source failed while fetching inputs.
    #[error("Source '{source_name}' unavailable for employee '{employee_id}': {message}")]
    SourceUnavailable {
        /// The collaborator that failed (e.g. "calendar", "leaves").
        source_name: String,
        /// The employee being resolved.
        employee_id: String,
        /// A description of the failure.
        message: String,
    },

    /// A batch resolution exceeded its per-employee timeout.
    #[error("Resolution for employee '{employee_id}' timed out after {timeout_ms}ms")]
    ResolutionTimeout {
        /// The employee whose resolution timed out.
        employee_id: String,
        /// The timeout that was applied.
        timeout_ms: u64,
    },

    /// A batch worker panicked or was cancelled.
    #[error("Resolution worker for employee '{employee_id}' failed: {message}")]
    WorkerFailed {
        /// The employee whose worker failed.
        employee_id: String,
        /// A description of the failure.
        message: String,
    },
}

fn leave_type_suffix(leave_type: &Option<String>) -> String {
    match leave_type {
        Some(leave_type) => format!(" (leave type '{}')", leave_type),
        None => String::new(),
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
