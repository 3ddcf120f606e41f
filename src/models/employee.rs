//! Employee references and resolution windows.
//!
//! An [`EmployeeRef`] carries everything the engine needs to know about an
//! employee: an identifier, the timezone used for calendar-day semantics, and
//! the contract versions declaring which source is authoritative for work
//! entries over time.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::interval::{local_day_start, truncate_to_second};

/// The source declared authoritative for an employee's working time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkEntrySource {
    /// The base resource calendar (contracted hours).
    #[default]
    Calendar,
    /// Published planning shifts.
    Planning,
    /// Clocked attendance punches.
    Attendance,
}

/// A contract version with its validity and declared work entry source.
///
/// Date bounds are inclusive local calendar days in the employee's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractVersion {
    /// The first day the version applies.
    pub date_from: NaiveDate,
    /// The last day the version applies, or `None` when open-ended.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// The source declared authoritative while this version applies.
    #[serde(default)]
    pub work_entry_source: WorkEntrySource,
}

impl ContractVersion {
    /// Returns the UTC span this version covers inside `window`, if any.
    pub fn active_span(
        &self,
        timezone: Tz,
        window: &ResolutionWindow,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = local_day_start(timezone, self.date_from).max(window.start());
        let end = match self.date_to.and_then(|d| d.checked_add_days(Days::new(1))) {
            Some(day_after) => local_day_start(timezone, day_after).min(window.end()),
            None => window.end(),
        };
        (start < end).then_some((start, end))
    }
}

/// An employee as seen by the engine.
///
/// # Example
///
/// ```
/// use work_entry_engine::models::{ContractVersion, EmployeeRef, WorkEntrySource};
/// use chrono::NaiveDate;
///
/// let employee = EmployeeRef::with_timezone_name("emp_001", "Europe/Brussels")
///     .unwrap()
///     .with_version(ContractVersion {
///         date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         date_to: None,
///         work_entry_source: WorkEntrySource::Planning,
///     });
/// assert_eq!(employee.versions.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRef {
    /// Unique identifier for the employee.
    pub id: String,
    /// Timezone used for calendar days and period buckets.
    pub timezone: Tz,
    /// Contract versions; empty means calendar-sourced throughout.
    pub versions: Vec<ContractVersion>,
}

impl EmployeeRef {
    /// Creates a calendar-sourced employee in the given timezone.
    pub fn new(id: impl Into<String>, timezone: Tz) -> Self {
        Self {
            id: id.into(),
            timezone,
            versions: Vec::new(),
        }
    }

    /// Creates an employee from an IANA timezone name.
    pub fn with_timezone_name(id: impl Into<String>, timezone: &str) -> EngineResult<Self> {
        let tz: Tz = timezone.parse().map_err(|_| EngineError::InvalidTimezone {
            timezone: timezone.to_string(),
        })?;
        Ok(Self::new(id, tz))
    }

    /// Adds a contract version.
    pub fn with_version(mut self, version: ContractVersion) -> Self {
        self.versions.push(version);
        self
    }

    /// Returns the spans inside `window` where a non-calendar source is
    /// authoritative, in version order.
    pub fn override_spans(
        &self,
        window: &ResolutionWindow,
    ) -> Vec<(WorkEntrySource, DateTime<Utc>, DateTime<Utc>)> {
        self.versions
            .iter()
            .filter(|v| v.work_entry_source != WorkEntrySource::Calendar)
            .filter_map(|v| {
                v.active_span(self.timezone, window)
                    .map(|(start, end)| (v.work_entry_source, start, end))
            })
            .collect()
    }

    /// Returns true if any version inside `window` declares `source`.
    pub fn uses_source(&self, source: WorkEntrySource, window: &ResolutionWindow) -> bool {
        self.override_spans(window)
            .iter()
            .any(|(declared, _, _)| *declared == source)
    }
}

/// A half-open `[start, end)` request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ResolutionWindow {
    /// Creates a window, failing with `InvalidInterval` when `start >= end`.
    /// Bounds are truncated to the second, like interval bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> EngineResult<Self> {
        let (start, end) = (truncate_to_second(start), truncate_to_second(end));
        if start >= end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window covering whole local days `first..=last`.
    pub fn for_local_days(timezone: Tz, first: NaiveDate, last: NaiveDate) -> EngineResult<Self> {
        let start = local_day_start(timezone, first);
        let end = match last.checked_add_days(Days::new(1)) {
            Some(day_after) => local_day_start(timezone, day_after),
            None => start,
        };
        Self::new(start, end)
    }

    /// The inclusive start of the window.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The exclusive end of the window.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
