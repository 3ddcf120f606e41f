//! Payload references attached to intervals.
//!
//! A [`PayloadRef`] identifies the record that produced an interval. It is a
//! read-only foreign key plus the denormalized fields (leave type, priority
//! class, approval state) needed to resolve precedence without re-querying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a calendar attendance line is flagged by the resource calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarLineKind {
    /// Ordinary contracted hours.
    Regular,
    /// Contracted hours falling on a rest day of the calendar.
    Weekend,
    /// A calendar line that carries its own holiday work entry type.
    HolidayOverride,
}

/// The priority class of an approved leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePriority {
    /// A leave whose type explicitly bypasses every other classification.
    ExplicitBypass,
    /// A statutory public holiday.
    StatutoryHoliday,
    /// A leave type that also applies on rest days.
    WeekendBypass,
    /// An ordinary leave requested by the employee.
    Employee,
    /// A company-wide closure applying to every employee.
    Global,
}

/// Approval state of an overtime interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting manager approval.
    Pending,
    /// Approved, either explicitly or because the rule needs no approval.
    Approved,
}

/// Reference to an approved leave.
///
/// Field order matters: the derived ordering compares `leave_id` first, which
/// is the final tie-break between otherwise identical leaves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaveRef {
    /// Identifier of the leave record.
    pub leave_id: u64,
    /// The leave type code (e.g. "sick", "annual").
    pub leave_type: String,
    /// The priority class used for precedence resolution.
    pub priority_class: LeavePriority,
    /// When the leave was created; earlier leaves win ties.
    pub created_at: DateTime<Utc>,
}

/// Tagged identifier of the record that produced an interval.
///
/// # Example
///
/// ```
/// use work_entry_engine::models::{CalendarLineKind, PayloadCategory, PayloadRef};
///
/// let payload = PayloadRef::Calendar { line_id: 7, kind: CalendarLineKind::Weekend };
/// assert_eq!(payload.category(), PayloadCategory::WeekendAttendance);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PayloadRef {
    /// A resource calendar attendance line.
    Calendar {
        /// Identifier of the calendar attendance line.
        line_id: u64,
        /// How the calendar flags this line.
        kind: CalendarLineKind,
    },
    /// A published planning shift.
    Planning {
        /// Identifier of the planning slot.
        slot_id: u64,
    },
    /// A completed clock-in/clock-out pair.
    Attendance {
        /// Identifier of the attendance punch.
        punch_id: u64,
    },
    /// An approved leave.
    Leave(LeaveRef),
    /// Overtime detected by an overtime rule.
    Overtime {
        /// Identifier of the rule that produced the overtime.
        rule_id: String,
        /// Approval state of the overtime.
        approval_state: ApprovalState,
    },
}

impl PayloadRef {
    /// Returns the precedence and mapping category of this payload.
    pub fn category(&self) -> PayloadCategory {
        match self {
            PayloadRef::Calendar { kind, .. } => match kind {
                CalendarLineKind::Regular => PayloadCategory::PlainAttendance,
                CalendarLineKind::Weekend => PayloadCategory::WeekendAttendance,
                CalendarLineKind::HolidayOverride => PayloadCategory::HolidayOverrideOnCalendar,
            },
            PayloadRef::Planning { .. } => PayloadCategory::PlanningShift,
            PayloadRef::Attendance { .. } => PayloadCategory::AttendancePunch,
            PayloadRef::Leave(leave) => match leave.priority_class {
                LeavePriority::ExplicitBypass => PayloadCategory::ExplicitLeaveBypass,
                LeavePriority::StatutoryHoliday => PayloadCategory::StatutoryHoliday,
                LeavePriority::WeekendBypass => PayloadCategory::WeekendBypassLeave,
                LeavePriority::Employee => PayloadCategory::EmployeeLeave,
                LeavePriority::Global => PayloadCategory::GlobalLeave,
            },
            PayloadRef::Overtime { .. } => PayloadCategory::Overtime,
        }
    }

    /// Returns the leave reference when this payload is a leave.
    pub fn as_leave(&self) -> Option<&LeaveRef> {
        match self {
            PayloadRef::Leave(leave) => Some(leave),
            _ => None,
        }
    }
}

/// Closed set of payload categories.
///
/// Categories are the keys of both the precedence order and the work entry
/// type mapping. The declaration order is the final, fixed tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCategory {
    /// Leave that bypasses every other classification.
    ExplicitLeaveBypass,
    /// Statutory public holiday.
    StatutoryHoliday,
    /// Leave that applies on rest days too.
    WeekendBypassLeave,
    /// Ordinary employee leave.
    EmployeeLeave,
    /// Company-wide closure.
    GlobalLeave,
    /// Calendar line carrying a holiday work entry type.
    HolidayOverrideOnCalendar,
    /// Calendar hours on a rest day.
    WeekendAttendance,
    /// Ordinary calendar hours.
    PlainAttendance,
    /// Planning shift hours.
    PlanningShift,
    /// Clocked attendance hours.
    AttendancePunch,
    /// Overtime hours.
    Overtime,
}

impl PayloadCategory {
    /// Every category, in declaration order.
    pub const ALL: [PayloadCategory; 11] = [
        PayloadCategory::ExplicitLeaveBypass,
        PayloadCategory::StatutoryHoliday,
        PayloadCategory::WeekendBypassLeave,
        PayloadCategory::EmployeeLeave,
        PayloadCategory::GlobalLeave,
        PayloadCategory::HolidayOverrideOnCalendar,
        PayloadCategory::WeekendAttendance,
        PayloadCategory::PlainAttendance,
        PayloadCategory::PlanningShift,
        PayloadCategory::AttendancePunch,
        PayloadCategory::Overtime,
    ];

    /// Returns true for leave categories.
    pub fn is_leave(self) -> bool {
        matches!(
            self,
            PayloadCategory::ExplicitLeaveBypass
                | PayloadCategory::StatutoryHoliday
                | PayloadCategory::WeekendBypassLeave
                | PayloadCategory::EmployeeLeave
                | PayloadCategory::GlobalLeave
        )
    }

    /// The snake_case name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadCategory::ExplicitLeaveBypass => "explicit_leave_bypass",
            PayloadCategory::StatutoryHoliday => "statutory_holiday",
            PayloadCategory::WeekendBypassLeave => "weekend_bypass_leave",
            PayloadCategory::EmployeeLeave => "employee_leave",
            PayloadCategory::GlobalLeave => "global_leave",
            PayloadCategory::HolidayOverrideOnCalendar => "holiday_override_on_calendar",
            PayloadCategory::WeekendAttendance => "weekend_attendance",
            PayloadCategory::PlainAttendance => "plain_attendance",
            PayloadCategory::PlanningShift => "planning_shift",
            PayloadCategory::AttendancePunch => "attendance_punch",
            PayloadCategory::Overtime => "overtime",
        }
    }
}

impl std::fmt::Display for PayloadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
