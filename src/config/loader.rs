//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a directory of YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayloadCategory, PayloadRef, WorkEntryTypeRef};

use super::types::{
    EngineConfig, OvertimeFile, OvertimeRule, PrecedenceFile, PrecedenceRule, WorkEntryTypeMapping,
};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── precedence.yaml        # Category precedence order
/// ├── overtime.yaml          # Overtime rules and week start
/// └── work_entry_types.yaml  # Category and leave type mapping
/// ```
///
/// # Example
///
/// ```no_run
/// use work_entry_engine::config::ConfigLoader;
/// use work_entry_engine::models::PayloadCategory;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let code = loader.work_entry_type(PayloadCategory::PlainAttendance).unwrap();
/// println!("Plain attendance maps to {}", code);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML or unknown categories (`ConfigParseError`)
    /// - A rule is semantically invalid (`InvalidRule`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let precedence = Self::load_yaml::<PrecedenceFile>(&path.join("precedence.yaml"))?;
        let overtime = Self::load_yaml::<OvertimeFile>(&path.join("overtime.yaml"))?;
        let work_entry_types =
            Self::load_yaml::<WorkEntryTypeMapping>(&path.join("work_entry_types.yaml"))?;

        let config = EngineConfig::new(
            precedence.precedence,
            overtime.rules,
            overtime.week_start,
            work_entry_types,
        )?;

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// Returns the precedence order.
    pub fn precedence(&self) -> &PrecedenceRule {
        &self.config.precedence
    }

    /// Returns the overtime rules in evaluation order.
    pub fn overtime_rules(&self) -> &[OvertimeRule] {
        &self.config.overtime_rules
    }

    /// Gets an overtime rule by id.
    pub fn overtime_rule(&self, id: &str) -> Option<&OvertimeRule> {
        self.config.overtime_rules.iter().find(|rule| rule.id == id)
    }

    /// Gets the work entry type mapped to a category.
    pub fn work_entry_type(&self, category: PayloadCategory) -> EngineResult<&WorkEntryTypeRef> {
        self.config
            .work_entry_types
            .categories
            .get(&category)
            .ok_or(EngineError::MissingMapping {
                category,
                leave_type: None,
            })
    }

    /// Gets the work entry type for a payload, honouring leave type overrides.
    pub fn work_entry_type_for(&self, payload: &PayloadRef) -> EngineResult<&WorkEntryTypeRef> {
        self.config.work_entry_types.lookup(payload)
    }
}
