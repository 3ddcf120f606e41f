//! The work entry engine.
//!
//! [`WorkEntryEngine`] runs the full pipeline for one employee and window:
//! schedule source resolution, leave precedence, every overtime rule, and
//! work entry generation. Each stage adds one step to the audit trace.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConfigLoader, EngineConfig};
use crate::error::EngineResult;
use crate::interval::IntervalSet;
use crate::models::{
    AuditStep, AuditTrace, EmployeeRef, EntryTotals, ResolutionResult, ResolutionWindow,
};
use crate::resolution::{
    compute_overtime, generate_work_entries, period_buckets, resolve_leave_precedence,
    resolve_schedule,
};
use crate::sources::{ScheduleSnapshot, ScheduleSources};

/// Resolves work entries from schedule sources.
///
/// The engine holds only configuration; every resolution is a pure function
/// of the fetched inputs, so one engine can be shared across threads.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::{EngineConfig, PrecedenceRule, WorkEntryTypeMapping};
/// use work_entry_engine::engine::WorkEntryEngine;
/// use work_entry_engine::models::{EmployeeRef, ResolutionWindow};
/// use work_entry_engine::sources::InMemorySources;
/// use chrono::{TimeZone, Utc, Weekday};
///
/// let config = EngineConfig::new(
///     PrecedenceRule::default(),
///     vec![],
///     Weekday::Mon,
///     WorkEntryTypeMapping::default(),
/// )
/// .unwrap();
/// let engine = WorkEntryEngine::new(config);
///
/// let employee = EmployeeRef::new("emp_001", chrono_tz::UTC);
/// let window = ResolutionWindow::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// let result = engine.resolve(&InMemorySources::new(), &employee, &window).unwrap();
/// assert!(result.work_entries.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct WorkEntryEngine {
    config: EngineConfig,
}

impl WorkEntryEngine {
    /// Creates an engine from a configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine from a configuration directory.
    pub fn from_config_dir<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        Ok(Self::new(ConfigLoader::load(path)?.into_config()))
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches every input once and resolves work entries.
    pub fn resolve<S: ScheduleSources + ?Sized>(
        &self,
        sources: &S,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<ResolutionResult> {
        let snapshot = ScheduleSnapshot::fetch(sources, employee, window).inspect_err(|err| {
            warn!(employee_id = %employee.id, error = %err, "Failed to fetch schedule sources");
        })?;
        self.resolve_snapshot(employee, window, &snapshot)
    }

    /// Resolves work entries from already-fetched inputs.
    pub fn resolve_snapshot(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
        snapshot: &ScheduleSnapshot,
    ) -> EngineResult<ResolutionResult> {
        let correlation_id = Uuid::new_v4();
        let start_time = Instant::now();
        info!(
            correlation_id = %correlation_id,
            employee_id = %employee.id,
            window_start = %window.start(),
            window_end = %window.end(),
            "Resolving work entries"
        );

        let mut steps: Vec<AuditStep> = Vec::new();
        let mut step_number: u32 = 1;

        // Attendance baseline and contractual expectation
        let schedule = resolve_schedule(employee, window, snapshot, step_number);
        steps.push(schedule.audit_step);
        step_number += 1;

        // One winning payload per slice
        let precedence = resolve_leave_precedence(
            &schedule.attendance,
            &snapshot.leaves,
            &self.config.precedence,
            step_number,
        );
        steps.push(precedence.audit_step);
        step_number += 1;

        // Overtime per rule; earlier rules keep the time they claim
        let presence = snapshot.punches.merged().clip(window.start(), window.end());
        let mut overtime = IntervalSet::empty();
        for rule in &self.config.overtime_rules {
            let buckets =
                period_buckets(window, employee.timezone, rule.period, self.config.week_start);
            let computation =
                compute_overtime(&presence, &schedule.expected, rule, &buckets, step_number);
            let claimed = computation.intervals.difference(&overtime);
            debug!(
                correlation_id = %correlation_id,
                rule_id = %rule.id,
                overtime_seconds = claimed.sum_duration().num_seconds(),
                "Overtime rule applied"
            );
            overtime = overtime.union(&claimed, false);
            steps.push(computation.audit_step);
            step_number += 1;
        }

        let generation = generate_work_entries(
            &precedence.intervals,
            &overtime,
            employee.timezone,
            &self.config.work_entry_types,
            step_number,
        )
        .inspect_err(|err| {
            warn!(
                correlation_id = %correlation_id,
                employee_id = %employee.id,
                error = %err,
                "Work entry generation failed"
            );
        })?;
        steps.push(generation.audit_step);

        let work_entries = generation.work_entries;
        let totals = EntryTotals::from_entries(&work_entries);
        let duration_us = start_time.elapsed().as_micros() as u64;

        info!(
            correlation_id = %correlation_id,
            employee_id = %employee.id,
            work_entries = work_entries.len(),
            overtime_hours = %totals.overtime_hours,
            warnings = precedence.warnings.len(),
            duration_us = duration_us,
            "Resolution completed successfully"
        );

        Ok(ResolutionResult {
            resolution_id: correlation_id,
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            employee_id: employee.id.clone(),
            window: *window,
            work_entries,
            totals,
            audit_trace: AuditTrace {
                steps,
                warnings: precedence.warnings,
                duration_us,
            },
        })
    }
}
