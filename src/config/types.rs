//! Configuration types for work entry resolution.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files: the leave precedence
//! order, overtime rules, and the work entry type mapping.

use chrono::{Duration, Weekday};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayloadCategory, PayloadRef, WorkEntryTypeRef};

/// Total order of payload categories: the first listed category wins.
///
/// Categories missing from the list rank after every listed one.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::PrecedenceRule;
/// use work_entry_engine::models::PayloadCategory;
///
/// let rule = PrecedenceRule::new(vec![
///     PayloadCategory::StatutoryHoliday,
///     PayloadCategory::EmployeeLeave,
///     PayloadCategory::PlainAttendance,
/// ])
/// .unwrap();
/// assert!(rule.rank(PayloadCategory::StatutoryHoliday) < rule.rank(PayloadCategory::EmployeeLeave));
/// assert_eq!(rule.rank(PayloadCategory::GlobalLeave), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PayloadCategory>", into = "Vec<PayloadCategory>")]
pub struct PrecedenceRule {
    order: Vec<PayloadCategory>,
}

impl PrecedenceRule {
    /// Creates a rule, rejecting categories listed twice.
    pub fn new(order: Vec<PayloadCategory>) -> EngineResult<Self> {
        for (index, category) in order.iter().enumerate() {
            if order[..index].contains(category) {
                return Err(EngineError::InvalidRule {
                    rule_id: "precedence".to_string(),
                    message: format!("category '{}' is listed more than once", category),
                });
            }
        }
        Ok(Self { order })
    }

    /// Position of `category` in the order; unlisted categories rank last.
    pub fn rank(&self, category: PayloadCategory) -> usize {
        self.order
            .iter()
            .position(|listed| *listed == category)
            .unwrap_or(self.order.len())
    }

    /// The listed categories, highest precedence first.
    pub fn categories(&self) -> &[PayloadCategory] {
        &self.order
    }
}

impl Default for PrecedenceRule {
    fn default() -> Self {
        Self {
            order: vec![
                PayloadCategory::ExplicitLeaveBypass,
                PayloadCategory::StatutoryHoliday,
                PayloadCategory::WeekendBypassLeave,
                PayloadCategory::GlobalLeave,
                PayloadCategory::EmployeeLeave,
                PayloadCategory::HolidayOverrideOnCalendar,
                PayloadCategory::WeekendAttendance,
                PayloadCategory::PlainAttendance,
                PayloadCategory::PlanningShift,
                PayloadCategory::AttendancePunch,
            ],
        }
    }
}

impl TryFrom<Vec<PayloadCategory>> for PrecedenceRule {
    type Error = EngineError;

    fn try_from(order: Vec<PayloadCategory>) -> EngineResult<Self> {
        Self::new(order)
    }
}

impl From<PrecedenceRule> for Vec<PayloadCategory> {
    fn from(rule: PrecedenceRule) -> Self {
        rule.order
    }
}

/// What presence is compared against inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OvertimeBase {
    /// The expected schedule (calendar plus planning overrides).
    #[default]
    Schedule,
    /// A fixed number of hours per bucket.
    Quantity {
        /// Hours expected per bucket.
        hours: Decimal,
    },
}

/// The aggregation period for overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimePeriod {
    /// One bucket per local calendar day.
    Day,
    /// One bucket per local week, starting on the configured weekday.
    Week,
}

/// How excess time is rounded to the rounding unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round down to a whole unit.
    Down,
    /// Round up to a whole unit.
    Up,
    /// Round to the nearest unit, halves up.
    Nearest,
}

/// Rounding applied to detected excess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRounding {
    /// The rounding unit in minutes.
    pub unit_minutes: u32,
    /// The rounding direction.
    pub mode: RoundingMode,
}

impl OvertimeRounding {
    /// Rounds `excess` to the configured unit.
    pub fn apply(&self, excess: Duration) -> Duration {
        let unit = i64::from(self.unit_minutes) * 60;
        if unit == 0 {
            return excess;
        }
        let seconds = excess.num_seconds();
        let remainder = seconds % unit;
        let rounded = match self.mode {
            RoundingMode::Down => seconds - remainder,
            RoundingMode::Up if remainder > 0 => seconds - remainder + unit,
            RoundingMode::Up => seconds,
            RoundingMode::Nearest if remainder * 2 >= unit => seconds - remainder + unit,
            RoundingMode::Nearest => seconds - remainder,
        };
        Duration::seconds(rounded)
    }
}

fn default_rate() -> Decimal {
    Decimal::ONE
}

fn default_requires_approval() -> bool {
    true
}

/// A rule detecting overtime by comparing presence with a baseline.
///
/// # Example
///
/// ```
/// use work_entry_engine::config::{OvertimePeriod, OvertimeRule};
///
/// let yaml = r#"
/// id: daily
/// period: day
/// threshold_minutes: 15
/// rate: "1.5"
/// requires_approval: false
/// "#;
/// let rule: OvertimeRule = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(rule.period, OvertimePeriod::Day);
/// assert_eq!(rule.threshold().num_minutes(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRule {
    /// Identifier carried on emitted overtime payloads.
    pub id: String,
    /// What presence is compared against.
    #[serde(default)]
    pub base: OvertimeBase,
    /// The aggregation period.
    pub period: OvertimePeriod,
    /// Minimum excess before any overtime is emitted.
    #[serde(default)]
    pub threshold_minutes: u32,
    /// Pay multiplier for payroll (informational to the engine).
    #[serde(default = "default_rate")]
    pub rate: Decimal,
    /// Optional rounding of the excess.
    #[serde(default)]
    pub rounding: Option<OvertimeRounding>,
    /// Whether emitted overtime starts out pending approval.
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
}

impl OvertimeRule {
    /// The threshold as a duration.
    pub fn threshold(&self) -> Duration {
        Duration::minutes(i64::from(self.threshold_minutes))
    }

    /// The fixed per-bucket baseline for quantity-based rules.
    pub fn quantity(&self) -> Option<Duration> {
        match &self.base {
            OvertimeBase::Schedule => None,
            OvertimeBase::Quantity { hours } => (*hours * Decimal::from(3600))
                .round()
                .to_i64()
                .map(Duration::seconds),
        }
    }

    /// Checks the rule for values the engine cannot apply.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::InvalidRule {
            rule_id: self.id.clone(),
            message: message.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("rule id must not be empty"));
        }
        if let Some(rounding) = &self.rounding {
            if rounding.unit_minutes == 0 {
                return Err(invalid("rounding unit must be positive"));
            }
        }
        if let OvertimeBase::Quantity { hours } = &self.base {
            if hours.is_sign_negative() || self.quantity().is_none() {
                return Err(invalid("quantity hours must be a non-negative number"));
            }
        }
        if self.rate.is_sign_negative() {
            return Err(invalid("rate must not be negative"));
        }
        Ok(())
    }
}

/// Maps payloads to payroll work entry types.
///
/// Leave-type overrides are consulted before the category mapping, so a sick
/// leave and an annual leave can map to different types while sharing a
/// priority class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkEntryTypeMapping {
    /// Work entry type per payload category.
    #[serde(default)]
    pub categories: HashMap<PayloadCategory, WorkEntryTypeRef>,
    /// Work entry type per leave type code.
    #[serde(default)]
    pub leave_types: HashMap<String, WorkEntryTypeRef>,
}

impl WorkEntryTypeMapping {
    /// Returns the work entry type for `payload`, or `MissingMapping`.
    pub fn lookup(&self, payload: &PayloadRef) -> EngineResult<&WorkEntryTypeRef> {
        let leave_type = payload.as_leave().map(|leave| leave.leave_type.as_str());
        if let Some(mapped) = leave_type.and_then(|code| self.leave_types.get(code)) {
            return Ok(mapped);
        }

        let category = payload.category();
        self.categories
            .get(&category)
            .ok_or_else(|| EngineError::MissingMapping {
                category,
                leave_type: leave_type.map(str::to_string),
            })
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Leave/attendance precedence order.
    pub precedence: PrecedenceRule,
    /// Overtime rules, evaluated in order.
    pub overtime_rules: Vec<OvertimeRule>,
    /// First day of week-based overtime buckets.
    pub week_start: Weekday,
    /// Payload to work entry type mapping.
    pub work_entry_types: WorkEntryTypeMapping,
}

impl EngineConfig {
    /// Creates a configuration, validating every overtime rule.
    pub fn new(
        precedence: PrecedenceRule,
        overtime_rules: Vec<OvertimeRule>,
        week_start: Weekday,
        work_entry_types: WorkEntryTypeMapping,
    ) -> EngineResult<Self> {
        for (index, rule) in overtime_rules.iter().enumerate() {
            rule.validate()?;
            if overtime_rules[..index].iter().any(|other| other.id == rule.id) {
                return Err(EngineError::InvalidRule {
                    rule_id: rule.id.clone(),
                    message: "overtime rule ids must be unique".to_string(),
                });
            }
        }
        Ok(Self {
            precedence,
            overtime_rules,
            week_start,
            work_entry_types,
        })
    }
}

/// `precedence.yaml` file structure.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PrecedenceFile {
    pub precedence: PrecedenceRule,
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

/// `overtime.yaml` file structure.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OvertimeFile {
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    #[serde(default)]
    pub rules: Vec<OvertimeRule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarLineKind, LeavePriority, LeaveRef};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rule(id: &str) -> OvertimeRule {
        OvertimeRule {
            id: id.to_string(),
            base: OvertimeBase::Schedule,
            period: OvertimePeriod::Day,
            threshold_minutes: 0,
            rate: dec("1.5"),
            rounding: None,
            requires_approval: true,
        }
    }

    fn sick_leave() -> PayloadRef {
        PayloadRef::Leave(LeaveRef {
            leave_id: 9,
            leave_type: "sick".to_string(),
            priority_class: LeavePriority::Employee,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
    }

    #[test]
    fn test_precedence_rejects_duplicates() {
        let result = PrecedenceRule::new(vec![
            PayloadCategory::EmployeeLeave,
            PayloadCategory::PlainAttendance,
            PayloadCategory::EmployeeLeave,
        ]);
        match result {
            Err(EngineError::InvalidRule { rule_id, message }) => {
                assert_eq!(rule_id, "precedence");
                assert!(message.contains("employee_leave"));
            }
            _ => panic!("Expected InvalidRule error"),
        }
    }

    #[test]
    fn test_default_precedence_puts_leaves_before_attendance() {
        let rule = PrecedenceRule::default();
        assert!(
            rule.rank(PayloadCategory::GlobalLeave) < rule.rank(PayloadCategory::PlainAttendance)
        );
        assert!(
            rule.rank(PayloadCategory::ExplicitLeaveBypass)
                < rule.rank(PayloadCategory::StatutoryHoliday)
        );
        assert_eq!(rule.rank(PayloadCategory::Overtime), rule.categories().len());
    }

    #[test]
    fn test_precedence_deserializes_from_list() {
        let rule: PrecedenceRule =
            serde_yaml::from_str("[statutory_holiday, plain_attendance]").unwrap();
        assert_eq!(rule.rank(PayloadCategory::PlainAttendance), 1);
        assert!(serde_yaml::from_str::<PrecedenceRule>("[global_leave, global_leave]").is_err());
    }

    #[test]
    fn test_rounding_modes() {
        let excess = Duration::minutes(22);
        let down = OvertimeRounding {
            unit_minutes: 15,
            mode: RoundingMode::Down,
        };
        let up = OvertimeRounding {
            unit_minutes: 15,
            mode: RoundingMode::Up,
        };
        let nearest = OvertimeRounding {
            unit_minutes: 15,
            mode: RoundingMode::Nearest,
        };
        assert_eq!(down.apply(excess), Duration::minutes(15));
        assert_eq!(up.apply(excess), Duration::minutes(30));
        assert_eq!(nearest.apply(excess), Duration::minutes(15));
        assert_eq!(nearest.apply(Duration::minutes(23)), Duration::minutes(30));
        assert_eq!(up.apply(Duration::minutes(30)), Duration::minutes(30));
    }

    #[test]
    fn test_quantity_base_in_seconds() {
        let mut weekly = rule("weekly");
        weekly.base = OvertimeBase::Quantity { hours: dec("38.5") };
        assert_eq!(weekly.quantity(), Some(Duration::minutes(38 * 60 + 30)));
        assert_eq!(rule("daily").quantity(), None);
    }

    #[test]
    fn test_validate_rejects_zero_rounding_unit() {
        let mut daily = rule("daily");
        daily.rounding = Some(OvertimeRounding {
            unit_minutes: 0,
            mode: RoundingMode::Down,
        });
        assert!(matches!(
            daily.validate(),
            Err(EngineError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_quantity() {
        let mut weekly = rule("weekly");
        weekly.base = OvertimeBase::Quantity { hours: dec("-1") };
        assert!(weekly.validate().is_err());
    }

    #[test]
    fn test_engine_config_rejects_duplicate_rule_ids() {
        let result = EngineConfig::new(
            PrecedenceRule::default(),
            vec![rule("daily"), rule("daily")],
            Weekday::Mon,
            WorkEntryTypeMapping::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidRule { .. })));
    }

    #[test]
    fn test_overtime_rule_yaml_defaults() {
        let yaml = "id: weekly\nperiod: week\nbase:\n  type: quantity\n  hours: 40\n";
        let rule: OvertimeRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.threshold_minutes, 0);
        assert_eq!(rule.rate, Decimal::ONE);
        assert!(rule.requires_approval);
        assert_eq!(rule.rounding, None);
        assert_eq!(rule.quantity(), Some(Duration::hours(40)));
    }

    #[test]
    fn test_mapping_prefers_leave_type() {
        let mut mapping = WorkEntryTypeMapping::default();
        mapping.categories.insert(
            PayloadCategory::EmployeeLeave,
            WorkEntryTypeRef::new("LEAVE100"),
        );
        mapping
            .leave_types
            .insert("sick".to_string(), WorkEntryTypeRef::new("LEAVE110"));

        assert_eq!(mapping.lookup(&sick_leave()).unwrap().code(), "LEAVE110");
    }

    #[test]
    fn test_mapping_falls_back_to_category() {
        let mut mapping = WorkEntryTypeMapping::default();
        mapping.categories.insert(
            PayloadCategory::EmployeeLeave,
            WorkEntryTypeRef::new("LEAVE100"),
        );
        assert_eq!(mapping.lookup(&sick_leave()).unwrap().code(), "LEAVE100");
    }

    #[test]
    fn test_mapping_missing_category_is_an_error() {
        let mapping = WorkEntryTypeMapping::default();
        let payload = PayloadRef::Calendar {
            line_id: 1,
            kind: CalendarLineKind::Regular,
        };
        match mapping.lookup(&payload) {
            Err(EngineError::MissingMapping {
                category,
                leave_type,
            }) => {
                assert_eq!(category, PayloadCategory::PlainAttendance);
                assert_eq!(leave_type, None);
            }
            _ => panic!("Expected MissingMapping error"),
        }
    }

    #[test]
    fn test_mapping_deserializes_from_yaml() {
        let yaml = r#"
categories:
  plain_attendance: WORK100
  overtime: OVERTIME
leave_types:
  sick: LEAVE110
"#;
        let mapping: WorkEntryTypeMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            mapping.categories[&PayloadCategory::PlainAttendance].code(),
            "WORK100"
        );
        assert_eq!(mapping.leave_types["sick"].code(), "LEAVE110");
    }
}
