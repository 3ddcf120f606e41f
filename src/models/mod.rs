//! Core data models for the work entry engine.
//!
//! This module contains the value objects exchanged with the engine's
//! collaborators: payload references, employees and windows, work entries,
//! and resolution results.

mod employee;
mod payload;
mod resolution_result;
mod work_entry;

pub use employee::{ContractVersion, EmployeeRef, ResolutionWindow, WorkEntrySource};
pub use payload::{
    ApprovalState, CalendarLineKind, LeavePriority, LeaveRef, PayloadCategory, PayloadRef,
};
pub use resolution_result::{AuditStep, AuditTrace, AuditWarning, EntryTotals, ResolutionResult};
pub use work_entry::{WorkEntry, WorkEntryTypeRef};
