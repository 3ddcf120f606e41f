//! Resolution pipeline stages.
//!
//! Each stage is a pure function of its inputs that returns its result
//! together with an [`AuditStep`](crate::models::AuditStep):
//!
//! - [`resolve_schedule`]: merges the base calendar with overriding sources
//! - [`resolve_leave_precedence`]: picks one winning payload per time slice
//! - [`compute_overtime`]: detects excess presence per day or week bucket
//! - [`generate_work_entries`]: slices by local day and maps to work entry types

mod leave_precedence;
mod overtime;
mod schedule_source;
mod work_entry_generator;

pub use leave_precedence::{PrecedenceResolution, resolve_leave_precedence};
pub use overtime::{OvertimeBucket, OvertimeComputation, compute_overtime, period_buckets};
pub use schedule_source::{ScheduleResolution, resolve_schedule};
pub use work_entry_generator::{WorkEntryGeneration, generate_work_entries};

use serde_json::json;

use crate::interval::IntervalSet;

/// Compact JSON description of a set for audit steps.
pub(crate) fn describe_set(set: &IntervalSet) -> serde_json::Value {
    json!({
        "intervals": set.len(),
        "seconds": set.sum_duration().num_seconds(),
    })
}
