//! Work Entry Engine
//!
//! This crate turns an employee's schedule sources (resource calendar,
//! planning shifts, attendance punches and approved leaves) into a
//! deterministic, non-overlapping list of payroll work entries over a time
//! window. Every resolution carries an audit trace of the steps it applied.

#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod models;
pub mod resolution;
pub mod sources;
