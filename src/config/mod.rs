//! Configuration loading and management for the work entry engine.
//!
//! This module provides functionality to load the engine configuration from
//! YAML files: the leave precedence order, overtime rules, and the mapping of
//! payloads to payroll work entry types.
//!
//! # Example
//!
//! ```no_run
//! use work_entry_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("{} overtime rule(s)", config.overtime_rules().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    EngineConfig, OvertimeBase, OvertimePeriod, OvertimeRounding, OvertimeRule, PrecedenceRule,
    RoundingMode, WorkEntryTypeMapping,
};
