//! In-memory [`ScheduleSources`] implementation.

use std::collections::{HashMap, HashSet};

use super::ScheduleSources;
use crate::error::{EngineError, EngineResult};
use crate::interval::{Interval, IntervalSet};
use crate::models::{EmployeeRef, ResolutionWindow};

#[derive(Debug, Clone, Default)]
struct EmployeeRecords {
    calendar: Vec<Interval>,
    planning: Vec<Interval>,
    punches: Vec<Interval>,
    leaves: Vec<Interval>,
}

/// Schedule sources held in memory, keyed by employee id.
///
/// Unknown employees have no records, which is a valid empty schedule.
/// Individual sources can be marked unavailable to exercise failure paths.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::Interval;
/// use work_entry_engine::models::{EmployeeRef, PayloadRef, ResolutionWindow};
/// use work_entry_engine::sources::{InMemorySources, ScheduleSources};
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let sources = InMemorySources::new().with_punches(
///     "emp_001",
///     [Interval::new(at(9), at(17), PayloadRef::Attendance { punch_id: 1 }).unwrap()],
/// );
///
/// let employee = EmployeeRef::new("emp_001", chrono_tz::UTC);
/// let window = ResolutionWindow::new(at(12), at(23)).unwrap();
/// let punches = sources.fetch_attendance_punches(&employee, &window).unwrap();
/// assert_eq!(punches.sum_duration().num_hours(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySources {
    records: HashMap<String, EmployeeRecords>,
    unavailable: HashSet<(String, String)>,
}

impl InMemorySources {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    fn records_mut(&mut self, employee_id: &str) -> &mut EmployeeRecords {
        self.records.entry(employee_id.to_string()).or_default()
    }

    /// Adds calendar attendance intervals for an employee.
    pub fn with_calendar(
        mut self,
        employee_id: &str,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        self.records_mut(employee_id).calendar.extend(intervals);
        self
    }

    /// Adds published planning shifts for an employee.
    pub fn with_planning(
        mut self,
        employee_id: &str,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        self.records_mut(employee_id).planning.extend(intervals);
        self
    }

    /// Adds completed attendance punches for an employee.
    pub fn with_punches(
        mut self,
        employee_id: &str,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        self.records_mut(employee_id).punches.extend(intervals);
        self
    }

    /// Adds approved leaves for an employee.
    pub fn with_leaves(
        mut self,
        employee_id: &str,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        self.records_mut(employee_id).leaves.extend(intervals);
        self
    }

    /// Makes one source fail for one employee.
    ///
    /// `source_name` is one of "calendar", "planning", "attendance", "leaves".
    pub fn with_unavailable(mut self, employee_id: &str, source_name: &str) -> Self {
        self.unavailable
            .insert((employee_id.to_string(), source_name.to_string()));
        self
    }

    fn select(
        &self,
        source_name: &str,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
        pick: impl Fn(&EmployeeRecords) -> &[Interval],
    ) -> EngineResult<Vec<Interval>> {
        if self
            .unavailable
            .contains(&(employee.id.clone(), source_name.to_string()))
        {
            return Err(EngineError::SourceUnavailable {
                source_name: source_name.to_string(),
                employee_id: employee.id.clone(),
                message: "source marked unavailable".to_string(),
            });
        }

        Ok(self
            .records
            .get(&employee.id)
            .map(|records| {
                pick(records)
                    .iter()
                    .filter(|interval| {
                        interval.start() < window.end() && interval.end() > window.start()
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl ScheduleSources for InMemorySources {
    fn fetch_calendar_attendance(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet> {
        let intervals = self.select("calendar", employee, window, |r| r.calendar.as_slice())?;
        Ok(IntervalSet::new(intervals).clip(window.start(), window.end()))
    }

    fn fetch_planning_shifts(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet> {
        let intervals = self.select("planning", employee, window, |r| r.planning.as_slice())?;
        Ok(IntervalSet::new(intervals).clip(window.start(), window.end()))
    }

    fn fetch_attendance_punches(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet> {
        let intervals = self.select("attendance", employee, window, |r| r.punches.as_slice())?;
        Ok(IntervalSet::new(intervals).clip(window.start(), window.end()))
    }

    fn fetch_approved_leaves(
        &self,
        employee: &EmployeeRef,
        window: &ResolutionWindow,
    ) -> EngineResult<IntervalSet> {
        let intervals = self.select("leaves", employee, window, |r| r.leaves.as_slice())?;
        Ok(IntervalSet::distinct(intervals).clip(window.start(), window.end()))
    }
}
