//! Work entry generation.
//!
//! This module turns the resolved classification and the overtime intervals
//! into day-sliced [`WorkEntry`] records. Overtime is additive: it never
//! replaces the attendance or leave underneath it.

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::describe_set;
use crate::config::WorkEntryTypeMapping;
use crate::error::EngineResult;
use crate::interval::{IntervalSet, split_by_local_day};
use crate::models::{AuditStep, PayloadCategory, WorkEntry};

/// The generated work entries and the audit step recording them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkEntryGeneration {
    /// Work entries sorted by date, category, then start.
    pub work_entries: Vec<WorkEntry>,
    /// The audit step recording this stage.
    pub audit_step: AuditStep,
}

/// Generates work entries from the resolved and overtime sets.
///
/// Every interval is split at each local midnight in `timezone` and every
/// fragment is mapped to a work entry type. The output is sorted by date,
/// category, start, end, then source, so identical inputs always produce an
/// identical list.
///
/// # Errors
///
/// Returns `MissingMapping` when a fragment's payload has no work entry type.
/// Nothing is dropped silently.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::WorkEntryTypeMapping;
/// use work_entry_engine::interval::{Interval, IntervalSet};
/// use work_entry_engine::models::{PayloadCategory, PayloadRef, WorkEntryTypeRef};
/// use work_entry_engine::resolution::generate_work_entries;
/// use chrono::{TimeZone, Utc};
///
/// let mut mapping = WorkEntryTypeMapping::default();
/// mapping
///     .categories
///     .insert(PayloadCategory::AttendancePunch, WorkEntryTypeRef::new("WORK100"));
///
/// let resolved = IntervalSet::new([Interval::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap(),
///     PayloadRef::Attendance { punch_id: 1 },
/// )
/// .unwrap()]);
///
/// let generation =
///     generate_work_entries(&resolved, &IntervalSet::empty(), chrono_tz::UTC, &mapping, 5).unwrap();
/// assert_eq!(generation.work_entries.len(), 2);
/// assert_eq!(generation.work_entries[0].duration_seconds, 7200);
/// assert_eq!(generation.work_entries[1].duration_seconds, 7200);
/// ```
pub fn generate_work_entries(
    resolved: &IntervalSet,
    overtime: &IntervalSet,
    timezone: Tz,
    mapping: &WorkEntryTypeMapping,
    step_number: u32,
) -> EngineResult<WorkEntryGeneration> {
    let combined = resolved.union(overtime, true);

    let mut work_entries = Vec::new();
    for interval in &combined {
        for (date, fragment) in split_by_local_day(interval, timezone) {
            let work_entry_type = mapping.lookup(fragment.payload())?.clone();
            work_entries.push(WorkEntry {
                date,
                start: fragment.start(),
                end: fragment.end(),
                duration_seconds: fragment.duration().num_seconds().unsigned_abs(),
                work_entry_type,
                source: fragment.payload().clone(),
            });
        }
    }

    work_entries.sort_by(|a, b| {
        (a.date, a.category(), a.start, a.end, &a.source).cmp(&(
            b.date,
            b.category(),
            b.start,
            b.end,
            &b.source,
        ))
    });

    let mut seconds_by_category: BTreeMap<PayloadCategory, u64> = BTreeMap::new();
    for entry in &work_entries {
        *seconds_by_category.entry(entry.category()).or_default() += entry.duration_seconds;
    }
    let days = {
        let mut dates: Vec<_> = work_entries.iter().map(|entry| entry.date).collect();
        dates.dedup();
        dates.len()
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "work_entry_generation".to_string(),
        rule_name: "Work Entry Generation".to_string(),
        input: json!({
            "resolved": describe_set(resolved),
            "overtime": describe_set(overtime),
            "timezone": timezone.name(),
        }),
        output: json!({
            "work_entries": work_entries.len(),
            "seconds_by_category": seconds_by_category,
        }),
        reasoning: format!(
            "{} interval(s) sliced into {} work entr{} over {} local day(s)",
            combined.len(),
            work_entries.len(),
            if work_entries.len() == 1 { "y" } else { "ies" },
            days
        ),
    };

    Ok(WorkEntryGeneration {
        work_entries,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::interval::Interval;
    use crate::models::{
        ApprovalState, CalendarLineKind, LeavePriority, LeaveRef, PayloadRef, WorkEntryTypeRef,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn calendar() -> PayloadRef {
        PayloadRef::Calendar {
            line_id: 1,
            kind: CalendarLineKind::Regular,
        }
    }

    fn overtime_payload() -> PayloadRef {
        PayloadRef::Overtime {
            rule_id: "daily".to_string(),
            approval_state: ApprovalState::Pending,
        }
    }

    fn mapping() -> WorkEntryTypeMapping {
        let mut mapping = WorkEntryTypeMapping::default();
        for (category, code) in [
            (PayloadCategory::PlainAttendance, "WORK100"),
            (PayloadCategory::AttendancePunch, "WORK110"),
            (PayloadCategory::EmployeeLeave, "LEAVE100"),
            (PayloadCategory::Overtime, "OVERTIME"),
        ] {
            mapping
                .categories
                .insert(category, WorkEntryTypeRef::new(code));
        }
        mapping
    }

    #[test]
    fn test_empty_input_yields_no_entries() {
        let generation = generate_work_entries(
            &IntervalSet::empty(),
            &IntervalSet::empty(),
            chrono_tz::UTC,
            &mapping(),
            5,
        )
        .unwrap();
        assert!(generation.work_entries.is_empty());
    }

    #[test]
    fn test_day_split_at_utc_midnight() {
        let resolved = IntervalSet::new([Interval::new(at(1, 22), at(2, 2), calendar()).unwrap()]);
        let entries = generate_work_entries(&resolved, &IntervalSet::empty(), chrono_tz::UTC, &mapping(), 5)
            .unwrap()
            .work_entries;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date(1));
        assert_eq!(entries[0].duration_seconds, 7200);
        assert_eq!(entries[1].date, date(2));
        assert_eq!(entries[1].duration_seconds, 7200);
        assert_eq!(entries[1].work_entry_type.code(), "WORK100");
    }

    #[test]
    fn test_day_split_uses_employee_timezone() {
        // 22:00-02:00 UTC is 17:00-21:00 in New York, a single local day
        let resolved = IntervalSet::new([Interval::new(at(1, 22), at(2, 2), calendar()).unwrap()]);
        let entries = generate_work_entries(
            &resolved,
            &IntervalSet::empty(),
            chrono_tz::America::New_York,
            &mapping(),
            5,
        )
        .unwrap()
        .work_entries;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, date(1));
        assert_eq!(entries[0].duration_seconds, 4 * 3600);
    }

    #[test]
    fn test_overtime_is_additive() {
        let resolved = IntervalSet::new([Interval::new(at(1, 9), at(1, 19), calendar()).unwrap()]);
        let overtime =
            IntervalSet::new([Interval::new(at(1, 17), at(1, 19), overtime_payload()).unwrap()]);
        let entries = generate_work_entries(&resolved, &overtime, chrono_tz::UTC, &mapping(), 5)
            .unwrap()
            .work_entries;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].work_entry_type.code(), "WORK100");
        assert_eq!(entries[0].duration_seconds, 10 * 3600);
        assert_eq!(entries[1].work_entry_type.code(), "OVERTIME");
        assert_eq!(entries[1].duration_seconds, 2 * 3600);
    }

    #[test]
    fn test_entries_sorted_by_date_then_category_then_start() {
        let leave = PayloadRef::Leave(LeaveRef {
            leave_id: 1,
            leave_type: "annual".to_string(),
            priority_class: LeavePriority::Employee,
            created_at: at(1, 0),
        });
        let resolved = IntervalSet::new([
            Interval::new(at(2, 9), at(2, 12), calendar()).unwrap(),
            Interval::new(at(2, 13), at(2, 17), leave.clone()).unwrap(),
            Interval::new(at(1, 9), at(1, 17), calendar()).unwrap(),
        ]);
        let entries = generate_work_entries(&resolved, &IntervalSet::empty(), chrono_tz::UTC, &mapping(), 5)
            .unwrap()
            .work_entries;

        let order: Vec<(NaiveDate, &str)> = entries
            .iter()
            .map(|entry| (entry.date, entry.work_entry_type.code()))
            .collect();
        assert_eq!(
            order,
            vec![
                (date(1), "WORK100"),
                (date(2), "LEAVE100"),
                (date(2), "WORK100"),
            ]
        );
    }

    #[test]
    fn test_missing_mapping_is_an_error() {
        let resolved = IntervalSet::new([Interval::new(
            at(1, 9),
            at(1, 17),
            PayloadRef::Planning { slot_id: 4 },
        )
        .unwrap()]);
        let result = generate_work_entries(&resolved, &IntervalSet::empty(), chrono_tz::UTC, &mapping(), 5);
        match result {
            Err(EngineError::MissingMapping { category, .. }) => {
                assert_eq!(category, PayloadCategory::PlanningShift);
            }
            _ => panic!("Expected MissingMapping error"),
        }
    }

    #[test]
    fn test_generation_is_idempotent() {
        let resolved = IntervalSet::new([
            Interval::new(at(1, 20), at(2, 4), calendar()).unwrap(),
            Interval::new(at(3, 9), at(3, 17), PayloadRef::Attendance { punch_id: 2 }).unwrap(),
        ]);
        let overtime =
            IntervalSet::new([Interval::new(at(2, 2), at(2, 4), overtime_payload()).unwrap()]);

        let first = generate_work_entries(&resolved, &overtime, chrono_tz::UTC, &mapping(), 5).unwrap();
        let second = generate_work_entries(&resolved, &overtime, chrono_tz::UTC, &mapping(), 5).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.work_entries).unwrap(),
            serde_json::to_string(&second.work_entries).unwrap()
        );
    }

    #[test]
    fn test_sub_second_bounds_split_without_losing_time() {
        let millis = chrono::Duration::milliseconds(600);
        let resolved = IntervalSet::new([Interval::new(
            at(1, 22) + millis,
            at(2, 2) + millis,
            PayloadRef::Attendance { punch_id: 3 },
        )
        .unwrap()]);

        let entries =
            generate_work_entries(&resolved, &IntervalSet::empty(), chrono_tz::UTC, &mapping(), 5)
                .unwrap()
                .work_entries;
        let durations: Vec<u64> = entries.iter().map(|entry| entry.duration_seconds).collect();
        assert_eq!(durations, vec![7200, 7200]);
        assert_eq!(
            durations.iter().sum::<u64>(),
            resolved.sum_duration().num_seconds() as u64
        );
    }

    /// Offset and length units: milliseconds, minutes, hours.
    const UNITS_MS: [i64; 3] = [1, 60_000, 3_600_000];

    proptest! {
        #[test]
        fn prop_duration_is_conserved(
            raw in prop::collection::vec(
                (0usize..3, 0i64..240, 1i64..120, 0i64..1000, any::<bool>()),
                0..10,
            ),
            tz_index in 0usize..3,
        ) {
            let timezone = [
                chrono_tz::UTC,
                chrono_tz::Europe::Brussels,
                chrono_tz::America::Santiago,
            ][tz_index];
            let origin = Utc.with_ymd_and_hms(2024, 3, 28, 0, 0, 0).unwrap();

            let mut resolved = Vec::new();
            let mut overtime = Vec::new();
            for (unit, offset, length, jitter_ms, is_overtime) in raw {
                let unit = UNITS_MS[unit];
                let start = origin
                    + chrono::Duration::milliseconds(offset * unit + jitter_ms);
                let end = start + chrono::Duration::milliseconds(length * unit);
                let payload = if is_overtime { overtime_payload() } else { calendar() };
                // Spans inside a single second are rejected by construction
                let Ok(interval) = Interval::new(start, end, payload) else {
                    continue;
                };
                if is_overtime {
                    overtime.push(interval);
                } else {
                    resolved.push(interval);
                }
            }
            let resolved = IntervalSet::new(resolved);
            let overtime = IntervalSet::new(overtime);

            let entries = generate_work_entries(&resolved, &overtime, timezone, &mapping(), 5)
                .unwrap()
                .work_entries;
            let total: u64 = entries.iter().map(|entry| entry.duration_seconds).sum();
            let expected = resolved.union(&overtime, true).sum_duration().num_seconds();
            prop_assert_eq!(total, expected as u64);
            for entry in &entries {
                prop_assert_eq!(
                    entry.duration_seconds,
                    (entry.end - entry.start).num_seconds() as u64
                );
            }
        }
    }
}
