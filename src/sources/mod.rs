//! External schedule source collaborators.
//!
//! The engine never talks to a calendar, planning, time-clock or leave
//! system directly. It reads them through the [`ScheduleSources`] trait, and
//! every input of one resolution is fetched once into a [`ScheduleSnapshot`].

mod memory;

pub use memory::InMemorySources;

use serde::Serialize;
use tracing::debug;

use crate::error::EngineResult;
use crate::interval::IntervalSet;
use crate::models::{EmployeeRef, ResolutionWindow, WorkEntrySource};

/// Abstraction over the systems that own schedule data.
///
/// Implementations report I/O failures as `SourceUnavailable`; any retry
/// belongs to the implementation, never to the engine. Returned sets may
/// extend past the window; the engine clips them.
pub trait ScheduleSources: Send + Sync {
    /// Expected attendance from the employee's resource calendar.
    fn fetch_calendar_attendance(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet>;

    /// Published planning shifts only.
    fn fetch_planning_shifts(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet>;

    /// Completed punches; a punch without check-out must not be returned.
    fn fetch_attendance_punches(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet>;

    /// Approved leaves, as a keep-distinct set.
    fn fetch_approved_leaves(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet>;
}

/// Every input of one resolution, fetched once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScheduleSnapshot {
    /// Calendar attendance intervals.
    pub calendar: IntervalSet,
    /// Planning shifts; empty unless a contract version uses planning.
    pub planning: IntervalSet,
    /// Attendance punches, the actual presence.
    pub punches: IntervalSet,
    /// Approved leaves, keep-distinct.
    pub leaves: IntervalSet,
}

impl ScheduleSnapshot {
    /// Fetches every input for `employee` over `window`.
    ///
    /// Planning shifts are only requested when a contract version inside the
    /// window declares planning as its source. Punches are always requested
    /// since they are the presence overtime is measured on.
    pub fn fetch<S: ScheduleSources + ?Sized>(
        sources: &S,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<Self> {
        let calendar = sources.fetch_calendar_attendance(employee, window)?;
        let planning = if employee.uses_source(WorkEntrySource::Planning, window) {
            sources.fetch_planning_shifts(employee, window)?
        } else {
            IntervalSet::empty()
        };
        let punches = sources.fetch_attendance_punches(employee, window)?;
        let leaves = sources.fetch_approved_leaves(employee, window)?;

        let snapshot = Self {
            calendar: calendar.clip(window.start(), window.end()),
            planning: planning.clip(window.start(), window.end()),
            punches: punches.clip(window.start(), window.end()),
            leaves: IntervalSet::distinct(leaves.clip(window.start(), window.end())),
        };

        debug!(
            employee_id = %employee.id,
            calendar = snapshot.calendar.len(),
            planning = snapshot.planning.len(),
            punches = snapshot.punches.len(),
            leaves = snapshot.leaves.len(),
            "Fetched schedule snapshot"
        );

        Ok(snapshot)
    }
}
