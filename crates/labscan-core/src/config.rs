//! Analyzer configuration.
//!
//! Loaded from TOML. Every field is optional; an empty document gives the
//! basic tier with the built-in reference table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{CanonicalTest, RangeEntry, ReferenceRange, ReferenceTable, Sex};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid range for {test}: {reason}")]
    InvalidRange { test: CanonicalTest, reason: String },

    #[error("Invalid severity thresholds: {0}")]
    InvalidThresholds(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Classification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisTier {
    /// normal / low / high
    #[default]
    Basic,
    /// Graduated severity by distance beyond the range
    Advanced,
}

impl AnalysisTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisTier::Basic => "basic",
            AnalysisTier::Advanced => "advanced",
        }
    }
}

impl std::str::FromStr for AnalysisTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(AnalysisTier::Basic),
            "advanced" => Ok(AnalysisTier::Advanced),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Advanced-tier cutoffs, as percent beyond the violated bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityThresholds {
    /// Up to this distance: borderline
    pub borderline_pct: f64,
    /// Up to this distance: elevated
    pub elevated_pct: f64,
    /// Up to this distance: high. Beyond it: critical
    pub critical_pct: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            borderline_pct: 10.0,
            elevated_pct: 25.0,
            critical_pct: 50.0,
        }
    }
}

impl SeverityThresholds {
    fn validate(&self) -> ConfigResult<()> {
        let cutoffs = [self.borderline_pct, self.elevated_pct, self.critical_pct];

        if cutoffs.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return Err(ConfigError::InvalidThresholds(format!(
                "cutoffs must be positive and finite, got {:?}",
                cutoffs
            )));
        }
        if !(self.borderline_pct < self.elevated_pct && self.elevated_pct < self.critical_pct) {
            return Err(ConfigError::InvalidThresholds(format!(
                "cutoffs must be strictly increasing, got {:?}",
                cutoffs
            )));
        }
        Ok(())
    }
}

/// A reference range override or addition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeOverride {
    pub test: CanonicalTest,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    #[serde(default)]
    pub sex: Option<Sex>,
}

impl RangeOverride {
    fn validate(&self) -> ConfigResult<()> {
        let invalid = |reason: &str| ConfigError::InvalidRange {
            test: self.test,
            reason: reason.to_string(),
        };

        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if self.min > self.max {
            return Err(invalid("min is greater than max"));
        }
        if self.unit.trim().is_empty() {
            return Err(invalid("unit is empty"));
        }
        Ok(())
    }

    fn to_entry(&self) -> RangeEntry {
        RangeEntry {
            test: self.test,
            sex: self.sex,
            range: ReferenceRange::new(self.min, self.max, self.unit.trim()),
        }
    }
}

/// Full analyzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub tier: AnalysisTier,
    /// Picks sex-specific ranges when set
    pub sex: Option<Sex>,
    pub thresholds: SeverityThresholds,
    pub ranges: Vec<RangeOverride>,
}

impl AnalyzerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: AnalyzerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check thresholds and every range override.
    pub fn validate(&self) -> ConfigResult<()> {
        self.thresholds.validate()?;
        for range in &self.ranges {
            range.validate()?;
        }
        Ok(())
    }

    /// Built-in reference table with this config's overrides applied.
    pub fn reference_table(&self) -> ReferenceTable {
        self.ranges
            .iter()
            .fold(ReferenceTable::default(), |table, range| {
                if table.has_entry(range.test, range.sex) {
                    warn!(test = %range.test, sex = ?range.sex, "overriding built-in reference range");
                }
                table.with_entry(range.to_entry())
            })
    }
}
