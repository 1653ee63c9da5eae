use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::diagnostics::{RuleSpec, RuleTable, Subsystem};
use crate::error::{DiagError, Result};

const CONFIG_DIR_NAME: &str = "hdiag";
const CONFIG_FILE_NAME: &str = "config.json";

/// Static recipient/subject/body used when handing an exported report to a
/// mail client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            subject: "Computer Diagnostic Report".to_string(),
            body: "Please find the attached computer diagnostic report.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bound on each shelled-out command
    pub command_timeout_secs: u64,
    /// Bound on a whole subsystem probe
    pub probe_timeout_secs: u64,
    /// Period of `watch` refreshes
    pub refresh_interval_ms: u64,
    /// Per-subsystem overrides of the default threshold rules
    pub thresholds: BTreeMap<Subsystem, RuleSpec>,
    pub mail: MailSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout_secs: 5,
            probe_timeout_secs: 10,
            refresh_interval_ms: 1000,
            thresholds: BTreeMap::new(),
            mail: MailSettings::default(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path).map_err(|e| {
            DiagError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        // An empty file is treated like a missing one
        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = serde_json::from_str(&data).map_err(|e| {
            DiagError::config(format!("Invalid config file {:?}: {}", path, e))
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DiagError::config("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Check value ranges and that every threshold override is usable
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(DiagError::config("command_timeout_secs must be greater than 0"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(DiagError::config("probe_timeout_secs must be greater than 0"));
        }
        if self.refresh_interval_ms == 0 {
            return Err(DiagError::config("refresh_interval_ms must be greater than 0"));
        }
        self.rule_table().map(|_| ())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Default rules with this config's overrides applied
    pub fn rule_table(&self) -> Result<RuleTable> {
        RuleTable::with_overrides(&self.thresholds)
    }

    /// Copy of this config with every threshold spelled out, for display or
    /// as a starting point for editing
    pub fn effective(&self) -> Result<Self> {
        Ok(Self {
            thresholds: self.rule_table()?.to_specs(),
            ..self.clone()
        })
    }
}
