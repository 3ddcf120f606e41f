//! Overtime detection.
//!
//! This module compares actual presence against a baseline (the expected
//! schedule or a fixed quantity of hours) inside day or week buckets and
//! emits overtime intervals for the excess. Overtime is always attributed to
//! the trailing end of presence within the bucket.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::json;

use super::describe_set;
use crate::config::{OvertimePeriod, OvertimeRule};
use crate::interval::{Interval, IntervalSet, local_date, local_day_start};
use crate::models::{ApprovalState, AuditStep, PayloadRef, ResolutionWindow};

/// Per-bucket figures recorded for the audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OvertimeBucket {
    /// Inclusive bucket start, clipped to the window.
    pub start: DateTime<Utc>,
    /// Exclusive bucket end, clipped to the window.
    pub end: DateTime<Utc>,
    /// Presence inside the bucket, in seconds.
    pub actual_seconds: i64,
    /// Baseline for the bucket, in seconds.
    pub expected_seconds: i64,
    /// Overtime emitted for the bucket, in seconds.
    pub overtime_seconds: i64,
}

/// The result of applying one overtime rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OvertimeComputation {
    /// Overtime-tagged intervals only.
    pub intervals: IntervalSet,
    /// Figures for every bucket, in chronological order.
    pub buckets: Vec<OvertimeBucket>,
    /// The audit step recording this rule.
    pub audit_step: AuditStep,
}

/// Partitions `window` into day or week buckets in `timezone`.
///
/// Buckets start at local midnight (on `week_start` for weeks) and are clipped
/// to the window, so the first and last bucket may be partial.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::OvertimePeriod;
/// use work_entry_engine::models::ResolutionWindow;
/// use work_entry_engine::resolution::period_buckets;
/// use chrono::{NaiveDate, Weekday};
///
/// let tz = chrono_tz::Europe::Brussels;
/// let window = ResolutionWindow::for_local_days(
///     tz,
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(period_buckets(&window, tz, OvertimePeriod::Day, Weekday::Mon).len(), 14);
/// assert_eq!(period_buckets(&window, tz, OvertimePeriod::Week, Weekday::Mon).len(), 2);
/// assert_eq!(period_buckets(&window, tz, OvertimePeriod::Week, Weekday::Sun).len(), 3);
/// ```
pub fn period_buckets(
    window: &ResolutionWindow,
    timezone: Tz,
    period: OvertimePeriod,
    week_start: Weekday,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let first_day = local_date(timezone, window.start());
    let (mut day, step) = match period {
        OvertimePeriod::Day => (first_day, Days::new(1)),
        OvertimePeriod::Week => (week_start_on_or_before(first_day, week_start), Days::new(7)),
    };

    let mut buckets = Vec::new();
    let mut cursor = local_day_start(timezone, day);
    while cursor < window.end() {
        let Some(next_day) = day.checked_add_days(step) else {
            buckets.push((cursor.max(window.start()), window.end()));
            break;
        };
        let next = local_day_start(timezone, next_day);
        let start = cursor.max(window.start());
        let end = next.min(window.end());
        if start < end {
            buckets.push((start, end));
        }
        day = next_day;
        cursor = next;
    }
    buckets
}

fn week_start_on_or_before(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(offset))).unwrap_or(date)
}

/// Computes overtime for one rule.
///
/// Within each bucket the excess is `actual - baseline`, where the baseline is
/// the expected schedule or, for quantity rules, the fixed hours per bucket.
/// A positive excess below the threshold emits nothing; otherwise it is
/// rounded, capped at the presence in the bucket, and attributed to the
/// trailing portion of presence. A bucket with no baseline but some presence
/// is all overtime.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::{OvertimeBase, OvertimePeriod, OvertimeRule};
/// use work_entry_engine::interval::{Interval, IntervalSet};
/// use work_entry_engine::models::PayloadRef;
/// use work_entry_engine::resolution::compute_overtime;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let actual = IntervalSet::new([Interval::new(at(9), at(19), PayloadRef::Attendance { punch_id: 1 }).unwrap()]);
/// let expected = IntervalSet::new([Interval::new(at(9), at(17), PayloadRef::Planning { slot_id: 1 }).unwrap()]);
/// let rule = OvertimeRule {
///     id: "daily".to_string(),
///     base: OvertimeBase::Schedule,
///     period: OvertimePeriod::Day,
///     threshold_minutes: 0,
///     rate: Decimal::ONE,
///     rounding: None,
///     requires_approval: true,
/// };
///
/// let overtime = compute_overtime(&actual, &expected, &rule, &[(at(0), at(23))], 3);
/// assert_eq!(overtime.intervals.len(), 1);
/// assert_eq!(overtime.intervals.as_slice()[0].start(), at(17));
/// assert_eq!(overtime.intervals.as_slice()[0].end(), at(19));
/// ```
pub fn compute_overtime(
    actual: &IntervalSet,
    expected: &IntervalSet,
    rule: &OvertimeRule,
    buckets: &[(DateTime<Utc>, DateTime<Utc>)],
    step_number: u32,
) -> OvertimeComputation {
    let presence_set = actual.merged();
    let expected_set = expected.merged();
    let fixed_baseline = rule.quantity();
    let approval_state = if rule.requires_approval {
        ApprovalState::Pending
    } else {
        ApprovalState::Approved
    };
    let payload = PayloadRef::Overtime {
        rule_id: rule.id.clone(),
        approval_state,
    };

    let mut intervals = Vec::new();
    let mut figures = Vec::with_capacity(buckets.len());

    for &(start, end) in buckets {
        let presence = presence_set.clip(start, end);
        let actual_duration = presence.sum_duration();
        let expected_duration =
            fixed_baseline.unwrap_or_else(|| expected_set.clip(start, end).sum_duration());

        let overtime = bucket_overtime(rule, actual_duration, expected_duration);
        if overtime > Duration::zero() {
            intervals.extend(trailing_portion(&presence, overtime, &payload));
        }

        figures.push(OvertimeBucket {
            start,
            end,
            actual_seconds: actual_duration.num_seconds(),
            expected_seconds: expected_duration.num_seconds(),
            overtime_seconds: overtime.num_seconds(),
        });
    }

    let intervals = IntervalSet::new(intervals);
    let total = intervals.sum_duration();
    let flagged = figures.iter().filter(|b| b.overtime_seconds > 0).count();

    let reasoning = if flagged == 0 {
        format!("No bucket exceeds its baseline under rule '{}'", rule.id)
    } else {
        format!(
            "{} bucket(s) exceed their baseline under rule '{}': {} minute(s) of overtime, {:?}",
            flagged,
            rule.id,
            total.num_minutes(),
            approval_state
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: format!("overtime_{}", rule.id),
        rule_name: "Overtime Detection".to_string(),
        input: json!({
            "rule": rule,
            "actual": describe_set(&presence_set),
            "expected": describe_set(&expected_set),
            "buckets": buckets.len(),
        }),
        output: json!({
            "overtime": describe_set(&intervals),
            "buckets": figures,
        }),
        reasoning,
    };

    OvertimeComputation {
        intervals,
        buckets: figures,
        audit_step,
    }
}

/// Overtime for one bucket after threshold, rounding and the presence cap.
fn bucket_overtime(rule: &OvertimeRule, actual: Duration, expected: Duration) -> Duration {
    let excess = actual - expected;
    if excess <= Duration::zero() || excess < rule.threshold() {
        return Duration::zero();
    }
    let rounded = match &rule.rounding {
        Some(rounding) => rounding.apply(excess),
        None => excess,
    };
    rounded.min(actual).max(Duration::zero())
}

/// Takes `amount` of time from the end of `presence`, walking backwards.
fn trailing_portion(presence: &IntervalSet, amount: Duration, payload: &PayloadRef) -> Vec<Interval> {
    let mut remaining = amount;
    let mut taken = Vec::new();

    for interval in presence.as_slice().iter().rev() {
        if remaining <= Duration::zero() {
            break;
        }
        let length = interval.duration();
        let start = if length > remaining {
            interval.end() - remaining
        } else {
            interval.start()
        };
        taken.push(Interval::from_ordered(start, interval.end(), payload.clone()));
        remaining = remaining - (interval.end() - start);
    }

    taken.reverse();
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OvertimeBase, OvertimeRounding, RoundingMode};
    use chrono::{TimeZone, Timelike};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn punch(d: u32, start: u32, end: u32) -> Interval {
        Interval::new(at(d, start), at(d, end), PayloadRef::Attendance { punch_id: 1 }).unwrap()
    }

    fn slot(d: u32, start: u32, end: u32) -> Interval {
        Interval::new(at(d, start), at(d, end), PayloadRef::Planning { slot_id: 1 }).unwrap()
    }

    fn daily_rule() -> OvertimeRule {
        OvertimeRule {
            id: "daily".to_string(),
            base: OvertimeBase::Schedule,
            period: OvertimePeriod::Day,
            threshold_minutes: 0,
            rate: dec("1.5"),
            rounding: None,
            requires_approval: true,
        }
    }

    fn one_day() -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        vec![(at(1, 0), at(2, 0))]
    }

    fn spans(set: &IntervalSet) -> Vec<(u32, u32)> {
        set.iter()
            .map(|i| (i.start().hour(), i.end().hour()))
            .collect()
    }

    // ==========================================================================
    // Bucket tests
    // ==========================================================================

    #[test]
    fn test_day_buckets_follow_local_midnight() {
        let tz = chrono_tz::Europe::Brussels;
        let window = ResolutionWindow::for_local_days(
            tz,
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        let buckets = period_buckets(&window, tz, OvertimePeriod::Day, Weekday::Mon);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].1 - buckets[0].0, Duration::hours(24));
        // spring-forward day
        assert_eq!(buckets[1].1 - buckets[1].0, Duration::hours(23));
    }

    #[test]
    fn test_week_buckets_are_clipped_to_window() {
        // 2024-01-03 is a Wednesday
        let window = ResolutionWindow::new(at(3, 0), at(10, 0)).unwrap();
        let buckets = period_buckets(&window, chrono_tz::UTC, OvertimePeriod::Week, Weekday::Mon);
        assert_eq!(buckets, vec![(at(3, 0), at(8, 0)), (at(8, 0), at(10, 0))]);
    }

    #[test]
    fn test_partial_day_window_has_one_bucket() {
        let window = ResolutionWindow::new(at(1, 8), at(1, 20)).unwrap();
        let buckets = period_buckets(&window, chrono_tz::UTC, OvertimePeriod::Day, Weekday::Mon);
        assert_eq!(buckets, vec![(at(1, 8), at(1, 20))]);
    }

    // ==========================================================================
    // Overtime tests
    // ==========================================================================

    #[test]
    fn test_overtime_is_trailing_portion() {
        let actual = IntervalSet::new([punch(1, 9, 19)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 3);
        assert_eq!(spans(&result.intervals), vec![(17, 19)]);
        assert_eq!(result.buckets[0].overtime_seconds, 7200);
    }

    #[test]
    fn test_overtime_spans_several_presence_intervals() {
        // 6h expected, presence 8-12 and 13-17: the last 2h of the afternoon
        let actual = IntervalSet::new([punch(1, 8, 12), punch(1, 13, 17)]);
        let expected = IntervalSet::new([slot(1, 9, 15)]);
        let result = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 3);
        assert_eq!(spans(&result.intervals), vec![(15, 17)]);

        let expected = IntervalSet::new([slot(1, 9, 12)]);
        let result = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 3);
        assert_eq!(spans(&result.intervals), vec![(11, 12), (13, 17)]);
    }

    #[test]
    fn test_zero_expected_is_full_overtime() {
        let actual = IntervalSet::new([punch(1, 10, 13)]);
        let result = compute_overtime(&actual, &IntervalSet::empty(), &daily_rule(), &one_day(), 3);
        assert_eq!(result.intervals.len(), 1);
        assert_eq!(result.intervals.sum_duration(), Duration::hours(3));
    }

    #[test]
    fn test_deficit_emits_nothing() {
        let actual = IntervalSet::new([punch(1, 9, 15)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 3);
        assert!(result.intervals.is_empty());
        assert_eq!(result.buckets[0].overtime_seconds, 0);
    }

    #[test]
    fn test_excess_below_threshold_emits_nothing() {
        let mut rule = daily_rule();
        rule.threshold_minutes = 180;
        let actual = IntervalSet::new([punch(1, 9, 19)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &rule, &one_day(), 3);
        assert!(result.intervals.is_empty());
    }

    #[test]
    fn test_excess_at_threshold_is_emitted() {
        let mut rule = daily_rule();
        rule.threshold_minutes = 120;
        let actual = IntervalSet::new([punch(1, 9, 19)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &rule, &one_day(), 3);
        assert_eq!(result.intervals.sum_duration(), Duration::hours(2));
    }

    #[test]
    fn test_rounding_up_is_capped_at_presence() {
        let mut rule = daily_rule();
        rule.rounding = Some(OvertimeRounding {
            unit_minutes: 240,
            mode: RoundingMode::Up,
        });
        let actual = IntervalSet::new([punch(1, 10, 13)]);
        let result = compute_overtime(&actual, &IntervalSet::empty(), &rule, &one_day(), 3);
        assert_eq!(result.intervals.sum_duration(), Duration::hours(3));
    }

    #[test]
    fn test_rounding_down_can_remove_overtime() {
        let mut rule = daily_rule();
        rule.rounding = Some(OvertimeRounding {
            unit_minutes: 60,
            mode: RoundingMode::Down,
        });
        let start = at(1, 9);
        let actual = IntervalSet::new([Interval::new(
            start,
            at(1, 17) + Duration::minutes(40),
            PayloadRef::Attendance { punch_id: 1 },
        )
        .unwrap()]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &rule, &one_day(), 3);
        assert!(result.intervals.is_empty());
    }

    #[test]
    fn test_approval_state_follows_rule() {
        let actual = IntervalSet::new([punch(1, 9, 19)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);

        let pending = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 3);
        assert_eq!(
            pending.intervals.as_slice()[0].payload(),
            &PayloadRef::Overtime {
                rule_id: "daily".to_string(),
                approval_state: ApprovalState::Pending,
            }
        );

        let mut rule = daily_rule();
        rule.requires_approval = false;
        let approved = compute_overtime(&actual, &expected, &rule, &one_day(), 3);
        assert_eq!(
            approved.intervals.as_slice()[0].payload(),
            &PayloadRef::Overtime {
                rule_id: "daily".to_string(),
                approval_state: ApprovalState::Approved,
            }
        );
    }

    #[test]
    fn test_quantity_base_ignores_schedule() {
        let mut rule = daily_rule();
        rule.base = OvertimeBase::Quantity { hours: dec("7.5") };
        let actual = IntervalSet::new([punch(1, 9, 18)]);
        let expected = IntervalSet::new([slot(1, 9, 18)]);
        let result = compute_overtime(&actual, &expected, &rule, &one_day(), 3);
        assert_eq!(result.intervals.sum_duration(), Duration::minutes(90));
        assert_eq!(result.buckets[0].expected_seconds, 27_000);
    }

    #[test]
    fn test_weekly_buckets_sum_across_days() {
        let mut rule = daily_rule();
        rule.id = "weekly".to_string();
        rule.period = OvertimePeriod::Week;
        rule.base = OvertimeBase::Quantity { hours: dec("20") };
        // three 8h days -> 24h against 20h
        let actual = IntervalSet::new([punch(1, 9, 17), punch(2, 9, 17), punch(3, 9, 17)]);
        let window = ResolutionWindow::new(at(1, 0), at(8, 0)).unwrap();
        let buckets = period_buckets(&window, chrono_tz::UTC, OvertimePeriod::Week, Weekday::Mon);

        let result = compute_overtime(&actual, &IntervalSet::empty(), &rule, &buckets, 3);
        assert_eq!(result.intervals.len(), 1);
        assert_eq!(result.intervals.as_slice()[0].start(), at(3, 13));
        assert_eq!(result.intervals.as_slice()[0].end(), at(3, 17));
    }

    #[test]
    fn test_audit_step_names_the_rule() {
        let actual = IntervalSet::new([punch(1, 9, 19)]);
        let expected = IntervalSet::new([slot(1, 9, 17)]);
        let result = compute_overtime(&actual, &expected, &daily_rule(), &one_day(), 4);
        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "overtime_daily");
        assert!(result.audit_step.reasoning.contains("120 minute(s)"));
    }
}
