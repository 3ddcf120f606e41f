//! Schedule source resolution.
//!
//! This module merges the base resource calendar with the sources declared
//! authoritative by an employee's contract versions (planning shifts or
//! attendance punches). Two sets come out of it: the attendance baseline that
//! becomes work entries, and the contractual expectation used for overtime.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::describe_set;
use crate::interval::IntervalSet;
use crate::models::{AuditStep, EmployeeRef, ResolutionWindow, WorkEntrySource};
use crate::sources::ScheduleSnapshot;

/// The result of merging the calendar with overriding sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleResolution {
    /// Calendar with every override applied; non-overlapping.
    pub attendance: IntervalSet,
    /// Calendar with planning overrides only; the overtime baseline.
    pub expected: IntervalSet,
    /// The audit step recording this stage.
    pub audit_step: AuditStep,
}

#[derive(Debug, Clone, Serialize)]
struct OverrideSummary {
    source: WorkEntrySource,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    intervals: usize,
}

/// Resolves the attendance and expected sets for one employee and window.
///
/// Inside each contract version that declares a non-calendar source, any
/// calendar time covered by that source's intervals is replaced by them, and
/// the overriding intervals are added where the calendar had nothing. Calendar
/// time the override does not cover is kept, split exactly at the override
/// boundaries. A zero-width touch is not an override.
///
/// Weekend and holiday-override lines are classified by the calendar
/// collaborator through [`CalendarLineKind`](crate::models::CalendarLineKind)
/// and pass through unchanged; nothing here infers weekend-ness from dates.
///
/// An employee with no calendar and no override yields empty sets.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::{Interval, IntervalSet};
/// use work_entry_engine::models::{CalendarLineKind, EmployeeRef, PayloadRef, ResolutionWindow};
/// use work_entry_engine::resolution::resolve_schedule;
/// use work_entry_engine::sources::ScheduleSnapshot;
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let employee = EmployeeRef::new("emp_001", chrono_tz::UTC);
/// let window = ResolutionWindow::new(at(0), at(23)).unwrap();
/// let snapshot = ScheduleSnapshot {
///     calendar: IntervalSet::new([Interval::new(
///         at(9),
///         at(17),
///         PayloadRef::Calendar { line_id: 1, kind: CalendarLineKind::Regular },
///     )
///     .unwrap()]),
///     ..ScheduleSnapshot::default()
/// };
///
/// let resolution = resolve_schedule(&employee, &window, &snapshot, 1);
/// assert_eq!(resolution.attendance.sum_duration().num_hours(), 8);
/// assert_eq!(resolution.expected, resolution.attendance);
/// ```
pub fn resolve_schedule(
    employee: &EmployeeRef,
    window: &ResolutionWindow,
    snapshot: &ScheduleSnapshot,
    step_number: u32,
) -> ScheduleResolution {
    let base = snapshot.calendar.merged().clip(window.start(), window.end());

    let mut all_overrides = IntervalSet::empty();
    let mut planning_overrides = IntervalSet::empty();
    let mut summaries = Vec::new();

    for (source, start, end) in employee.override_spans(window) {
        let overriding = match source {
            WorkEntrySource::Planning => snapshot.planning.merged().clip(start, end),
            WorkEntrySource::Attendance => snapshot.punches.merged().clip(start, end),
            WorkEntrySource::Calendar => continue,
        };

        summaries.push(OverrideSummary {
            source,
            start,
            end,
            intervals: overriding.len(),
        });

        if source == WorkEntrySource::Planning {
            planning_overrides = planning_overrides.union(&overriding, false);
        }
        all_overrides = all_overrides.union(&overriding, false);
    }

    let attendance = apply_override(&base, &all_overrides);
    let expected = apply_override(&base, &planning_overrides);

    let reasoning = if summaries.is_empty() {
        format!(
            "No overriding source declared; {} calendar interval(s) used as-is",
            base.len()
        )
    } else {
        format!(
            "{} override span(s) applied over {} calendar interval(s)",
            summaries.len(),
            base.len()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "schedule_source_resolution".to_string(),
        rule_name: "Schedule Source Resolution".to_string(),
        input: json!({
            "employee_id": employee.id,
            "window_start": window.start(),
            "window_end": window.end(),
            "calendar": describe_set(&base),
            "overrides": summaries,
        }),
        output: json!({
            "attendance": describe_set(&attendance),
            "expected": describe_set(&expected),
        }),
        reasoning,
    };

    ScheduleResolution {
        attendance,
        expected,
        audit_step,
    }
}

/// Replaces the time `overrides` covers in `base`, keeping the uncovered rest.
fn apply_override(base: &IntervalSet, overrides: &IntervalSet) -> IntervalSet {
    if overrides.is_empty() {
        return base.clone();
    }
    base.difference(overrides).union(overrides, false)
}
