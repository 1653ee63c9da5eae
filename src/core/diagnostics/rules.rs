//! Threshold rules mapping raw measurements to health states.
//!
//! The rule table is static configuration: it is built once per process from
//! the defaults below plus any user overrides and shared read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{HealthState, Measurement, Subsystem};
use crate::error::{DiagError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparison::Greater),
            ">=" => Some(Comparison::GreaterOrEqual),
            "<" => Some(Comparison::Less),
            "<=" => Some(Comparison::LessOrEqual),
            "==" => Some(Comparison::Equal),
            "!=" => Some(Comparison::NotEqual),
            _ => None,
        }
    }

    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
            Comparison::Equal => value == threshold,
            Comparison::NotEqual => value != threshold,
        }
    }
}

/// Trigger condition of a threshold rule.
///
/// Serialized as its textual form, e.g. `value > 80` or `pending > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Predicate {
    /// `value <op> <number>`: temperature (°C) or usage (%)
    Compare { op: Comparison, threshold: f64 },
    /// `sent == 0 and recv == 0`
    NoActivity,
    /// `pending > 0`
    AnyPending,
    /// `status != OK`
    ControllerFault,
}

static COMPARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^value\s*(>=|<=|==|!=|>|<)\s*(-?\d+(?:\.\d+)?)$").expect("valid predicate regex")
});

impl Predicate {
    pub fn above(threshold: f64) -> Self {
        Predicate::Compare {
            op: Comparison::Greater,
            threshold,
        }
    }

    /// Evaluate the predicate against a measurement.
    ///
    /// A predicate that does not apply to the measurement kind never triggers.
    pub fn matches(&self, measurement: &Measurement) -> bool {
        match (self, measurement) {
            (Predicate::Compare { op, threshold }, Measurement::Temperature { celsius }) => {
                op.holds(f64::from(*celsius), *threshold)
            }
            (Predicate::Compare { op, threshold }, Measurement::MemoryUsage { used_percent })
            | (Predicate::Compare { op, threshold }, Measurement::StorageUsage { used_percent, .. }) => {
                op.holds(f64::from(*used_percent), *threshold)
            }
            (
                Predicate::NoActivity,
                Measurement::NetworkTotals {
                    bytes_sent,
                    bytes_received,
                },
            ) => *bytes_sent == 0 && *bytes_received == 0,
            (Predicate::AnyPending, Measurement::PendingUpdates { entries }) => !entries.is_empty(),
            (Predicate::ControllerFault, Measurement::Gpu { controllers }) => {
                controllers.iter().any(|c| c.is_faulty())
            }
            _ => false,
        }
    }

    /// Whether this predicate can be evaluated for readings of `subsystem`
    pub fn fits(&self, subsystem: Subsystem) -> bool {
        match self {
            Predicate::Compare { .. } => matches!(
                subsystem,
                Subsystem::Cpu | Subsystem::Memory | Subsystem::Storage
            ),
            Predicate::NoActivity => subsystem == Subsystem::Network,
            Predicate::AnyPending => subsystem == Subsystem::Drivers,
            Predicate::ControllerFault => subsystem == Subsystem::Gpu,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { op, threshold } => {
                write!(f, "value {} {}", op.symbol(), threshold)
            }
            Predicate::NoActivity => f.write_str("sent == 0 and recv == 0"),
            Predicate::AnyPending => f.write_str("pending > 0"),
            Predicate::ControllerFault => f.write_str("status != OK"),
        }
    }
}

impl FromStr for Predicate {
    type Err = DiagError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.to_ascii_lowercase().as_str() {
            "sent == 0 and recv == 0" | "recv == 0 and sent == 0" => {
                return Ok(Predicate::NoActivity)
            }
            "pending > 0" => return Ok(Predicate::AnyPending),
            "status != ok" => return Ok(Predicate::ControllerFault),
            _ => {}
        }

        let caps = COMPARE_RE
            .captures(&normalized)
            .ok_or_else(|| DiagError::config(format!("Unrecognized trigger predicate: '{}'", s)))?;

        let op = Comparison::from_symbol(&caps[1])
            .ok_or_else(|| DiagError::config(format!("Unknown comparison in '{}'", s)))?;
        let threshold = caps[2]
            .parse::<f64>()
            .map_err(|e| DiagError::config(format!("Invalid threshold in '{}': {}", s, e)))?;

        Ok(Predicate::Compare { op, threshold })
    }
}

impl TryFrom<String> for Predicate {
    type Error = DiagError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Predicate> for String {
    fn from(predicate: Predicate) -> Self {
        predicate.to_string()
    }
}

/// User-facing form of a rule, as found in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub trigger: Predicate,
    pub state: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub subsystem: Subsystem,
    pub trigger: Predicate,
    pub state: HealthState,
    pub remediation: Option<String>,
}

impl ThresholdRule {
    fn new(subsystem: Subsystem, trigger: Predicate, state: HealthState, remediation: Option<&str>) -> Self {
        Self {
            subsystem,
            trigger,
            state,
            remediation: remediation.map(str::to_string),
        }
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            trigger: self.trigger,
            state: self.state,
            remediation: self.remediation.clone(),
        }
    }
}

static DEFAULT_RULES: Lazy<RuleTable> = Lazy::new(|| {
    let rules = [
        ThresholdRule::new(
            Subsystem::Cpu,
            Predicate::above(80.0),
            HealthState::Warning,
            Some("Check CPU cooling system, clean heatsinks and fans."),
        ),
        ThresholdRule::new(
            Subsystem::Memory,
            Predicate::above(90.0),
            HealthState::Warning,
            Some("Check for resource-intensive applications or processes."),
        ),
        ThresholdRule::new(
            Subsystem::Storage,
            Predicate::above(90.0),
            HealthState::Warning,
            Some("Clear unnecessary files and optimize storage."),
        ),
        ThresholdRule::new(
            Subsystem::Gpu,
            Predicate::ControllerFault,
            HealthState::Warning,
            None,
        ),
        ThresholdRule::new(
            Subsystem::Network,
            Predicate::NoActivity,
            HealthState::NotFound,
            Some("Check network connections and settings."),
        ),
        ThresholdRule::new(
            Subsystem::Drivers,
            Predicate::AnyPending,
            HealthState::Warning,
            Some("Update drivers using the respective update tool."),
        ),
    ];

    RuleTable {
        rules: rules.into_iter().map(|r| (r.subsystem, r)).collect(),
    }
});

/// Threshold rules keyed by subsystem
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: BTreeMap<Subsystem, ThresholdRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl RuleTable {
    /// Default table with `overrides` merged over the rule of each named subsystem
    pub fn with_overrides(overrides: &BTreeMap<Subsystem, RuleSpec>) -> Result<Self> {
        let mut table = Self::default();

        for (&subsystem, spec) in overrides {
            if !Subsystem::PROBED.contains(&subsystem) {
                return Err(DiagError::config(format!(
                    "No thresholds can be configured for '{}'",
                    subsystem
                )));
            }
            if !spec.trigger.fits(subsystem) {
                return Err(DiagError::config(format!(
                    "Trigger '{}' does not apply to {}",
                    spec.trigger, subsystem
                )));
            }

            // Overrides without a remediation keep the default advice
            let remediation = spec.remediation.clone().or_else(|| {
                table
                    .rules
                    .get(&subsystem)
                    .and_then(|rule| rule.remediation.clone())
            });

            table.rules.insert(
                subsystem,
                ThresholdRule {
                    subsystem,
                    trigger: spec.trigger,
                    state: spec.state,
                    remediation,
                },
            );
        }

        Ok(table)
    }

    pub fn rule_for(&self, subsystem: Subsystem) -> Option<&ThresholdRule> {
        self.rules.get(&subsystem)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThresholdRule> {
        self.rules.values()
    }

    pub fn to_specs(&self) -> BTreeMap<Subsystem, RuleSpec> {
        self.rules.iter().map(|(k, r)| (*k, r.to_spec())).collect()
    }
}
