//! Leave type precedence resolution.
//!
//! This module decides, for every slice of attendance time, which single
//! payload wins when approved leaves overlap it. Candidates are ordered by
//! their category's rank in the configured [`PrecedenceRule`]; ties go to
//! leaves over attendance, then to the earliest-created leave, then to the
//! lowest leave id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use tracing::warn;

use super::describe_set;
use crate::config::PrecedenceRule;
use crate::interval::{Interval, IntervalSet};
use crate::models::{AuditStep, AuditWarning, PayloadRef};

/// Warning code emitted when two leaves cannot be told apart by category and
/// creation time.
pub const AMBIGUOUS_PRECEDENCE: &str = "AMBIGUOUS_PRECEDENCE";

/// The result of precedence resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecedenceResolution {
    /// One winning payload per slice; non-overlapping.
    pub intervals: IntervalSet,
    /// Ties that were settled by leave id.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this stage.
    pub audit_step: AuditStep,
}

/// Sort key of a candidate payload; the smallest key wins.
type CandidateKey<'a> = (usize, u8, Option<DateTime<Utc>>, &'a PayloadRef);

fn candidate_key<'a>(precedence: &PrecedenceRule, payload: &'a PayloadRef) -> CandidateKey<'a> {
    let rank = precedence.rank(payload.category());
    match payload.as_leave() {
        Some(leave) => (rank, 0, Some(leave.created_at), payload),
        None => (rank, 1, None, payload),
    }
}

/// Resolves overlapping leaves against the attendance set.
///
/// Only time covered by `attendance` is emitted: a leave reaching outside the
/// attendance intervals replaces the overlapping part only, and attendance
/// with no active leave is kept unchanged. The result is independent of the
/// order in which leaves were supplied.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::PrecedenceRule;
/// use work_entry_engine::interval::{Interval, IntervalSet};
/// use work_entry_engine::models::{CalendarLineKind, LeavePriority, LeaveRef, PayloadRef};
/// use work_entry_engine::resolution::resolve_leave_precedence;
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let attendance = IntervalSet::new([Interval::new(
///     at(9),
///     at(17),
///     PayloadRef::Calendar { line_id: 1, kind: CalendarLineKind::Regular },
/// )
/// .unwrap()]);
/// let leaves = IntervalSet::distinct([Interval::new(
///     at(13),
///     at(17),
///     PayloadRef::Leave(LeaveRef {
///         leave_id: 4,
///         leave_type: "annual".to_string(),
///         priority_class: LeavePriority::Employee,
///         created_at: at(0),
///     }),
/// )
/// .unwrap()]);
///
/// let resolution = resolve_leave_precedence(&attendance, &leaves, &PrecedenceRule::default(), 2);
/// assert_eq!(resolution.intervals.len(), 2);
/// assert!(resolution.intervals.as_slice()[1].payload().as_leave().is_some());
/// ```
pub fn resolve_leave_precedence(
    attendance: &IntervalSet,
    leaves: &IntervalSet,
    precedence: &PrecedenceRule,
    step_number: u32,
) -> PrecedenceResolution {
    let leave_slice = leaves.as_slice();
    let mut fragments = Vec::new();
    let mut ambiguous: BTreeSet<(u64, u64)> = BTreeSet::new();
    let mut leave_slices = 0usize;

    for base in attendance.merged().iter() {
        // Leaves are sorted by start, so only a prefix can overlap.
        let reachable = leave_slice.partition_point(|leave| leave.start() < base.end());
        let active: Vec<&Interval> = leave_slice[..reachable]
            .iter()
            .filter(|leave| leave.end() > base.start())
            .collect();

        if active.is_empty() {
            fragments.push(base.clone());
            continue;
        }

        let mut cuts = vec![base.start(), base.end()];
        for leave in &active {
            cuts.push(leave.start().max(base.start()));
            cuts.push(leave.end().min(base.end()));
        }
        cuts.sort();
        cuts.dedup();

        for pair in cuts.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let covering: Vec<&PayloadRef> = active
                .iter()
                .filter(|leave| leave.start() <= from && leave.end() >= to)
                .map(|leave| leave.payload())
                .collect();

            let winner = covering
                .iter()
                .copied()
                .chain(std::iter::once(base.payload()))
                .min_by_key(|payload| candidate_key(precedence, *payload))
                .unwrap_or(base.payload());

            if winner.as_leave().is_some() {
                leave_slices += 1;
                record_ambiguity(winner, &covering, precedence, &mut ambiguous);
            }

            fragments.push(Interval::from_ordered(from, to, winner.clone()));
        }
    }

    let intervals = IntervalSet::new(fragments);

    let warnings: Vec<AuditWarning> = ambiguous
        .iter()
        .map(|(kept, other)| {
            warn!(
                kept_leave_id = *kept,
                other_leave_id = *other,
                "Ambiguous leave precedence settled by leave id"
            );
            AuditWarning {
                code: AMBIGUOUS_PRECEDENCE.to_string(),
                message: format!(
                    "Leaves {} and {} share category and creation time; leave {} wins by id",
                    kept, other, kept
                ),
                severity: "medium".to_string(),
            }
        })
        .collect();

    let audit_step = AuditStep {
        step_number,
        rule_id: "leave_precedence_resolution".to_string(),
        rule_name: "Leave Type Precedence Resolution".to_string(),
        input: json!({
            "attendance": describe_set(attendance),
            "leaves": describe_set(leaves),
            "precedence": precedence.categories(),
        }),
        output: json!({
            "resolved": describe_set(&intervals),
            "leave_slices": leave_slices,
            "ambiguous_ties": warnings.len(),
        }),
        reasoning: if leave_slices == 0 {
            "No approved leave overlaps attendance; attendance kept unchanged".to_string()
        } else {
            format!("{} slice(s) of attendance replaced by a winning leave", leave_slices)
        },
    };

    PrecedenceResolution {
        intervals,
        warnings,
        audit_step,
    }
}

/// Records pairs of distinct leaves that tie with the winner on everything
/// but their id.
fn record_ambiguity(
    winner: &PayloadRef,
    covering: &[&PayloadRef],
    precedence: &PrecedenceRule,
    ambiguous: &mut BTreeSet<(u64, u64)>,
) {
    let Some(kept) = winner.as_leave() else {
        return;
    };
    let (rank, tier, created_at, _) = candidate_key(precedence, winner);

    for other in covering.iter().filter(|payload| **payload != winner) {
        let (other_rank, other_tier, other_created, _) = candidate_key(precedence, other);
        if (other_rank, other_tier, other_created) != (rank, tier, created_at) {
            continue;
        }
        if let Some(leave) = other.as_leave() {
            if leave.leave_id != kept.leave_id {
                ambiguous.insert((kept.leave_id, leave.leave_id));
            }
        }
    }
}
