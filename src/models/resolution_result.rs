//! Resolution result models.
//!
//! This module contains the [`ResolutionResult`] type and its associated
//! structures that capture everything produced by one `(employee, window)`
//! resolution: the work entries, aggregated totals, and an audit trace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ResolutionWindow, WorkEntry};

/// A single step in the audit trace recording a pipeline decision.
///
/// Each step captures the input, output, and reasoning for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the stage or rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the stage or rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during resolution.
///
/// Warnings indicate conditions that were resolved deterministically but may
/// deserve a look (e.g. two indistinguishable leaves).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a resolution.
///
/// # Example
///
/// ```
/// use work_entry_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of pipeline steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during resolution.
    pub warnings: Vec<AuditWarning>,
    /// The total resolution duration in microseconds.
    pub duration_us: u64,
}

/// Aggregated totals over the emitted work entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Hours classified as attendance (calendar, planning, punches).
    pub attendance_hours: Decimal,
    /// Hours classified as any kind of leave.
    pub leave_hours: Decimal,
    /// Hours of overtime, on top of the attendance/leave classification.
    pub overtime_hours: Decimal,
    /// Sum of every entry's duration in seconds.
    pub total_seconds: u64,
}

impl EntryTotals {
    /// Aggregates totals from a list of work entries.
    pub fn from_entries(entries: &[WorkEntry]) -> Self {
        let mut totals = EntryTotals::default();
        for entry in entries {
            let category = entry.category();
            if category == super::PayloadCategory::Overtime {
                totals.overtime_hours += entry.hours();
            } else if category.is_leave() {
                totals.leave_hours += entry.hours();
            } else {
                totals.attendance_hours += entry.hours();
            }
            totals.total_seconds += entry.duration_seconds;
        }
        totals
    }
}

/// The complete result of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Unique identifier for this resolution (also the log correlation id).
    pub resolution_id: Uuid,
    /// When the resolution was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the resolution.
    pub engine_version: String,
    /// The ID of the employee the resolution is for.
    pub employee_id: String,
    /// The requested window.
    pub window: ResolutionWindow,
    /// Work entries sorted by date, category, then start.
    pub work_entries: Vec<WorkEntry>,
    /// Aggregated totals.
    pub totals: EntryTotals,
    /// Complete audit trace of pipeline decisions.
    pub audit_trace: AuditTrace,
}
