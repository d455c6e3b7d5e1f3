//! Configuration for the compliance service

use crate::error::{ComplianceError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Compliance service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Days a cached sanctions result may be served
    pub sanctions_cache_validity_days: u32,

    /// Default lookback window for audit trail queries
    pub audit_trail_days: u32,

    /// Lifetime of a KYC record from submission
    pub kyc_validity_years: u32,

    /// Minimum applicant age, by calendar year
    pub minimum_age_years: i32,

    /// Similarity (0.0-1.0) at which a name counts as a sanctions hit
    pub sanctions_fuzzy_threshold: f64,

    /// Append-only audit log file
    pub audit_log_path: PathBuf,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            sanctions_cache_validity_days: 30,
            audit_trail_days: 90,
            kyc_validity_years: 1,
            minimum_age_years: 18,
            sanctions_fuzzy_threshold: 0.85,
            audit_log_path: PathBuf::from("./data/compliance-audit.log"),
        }
    }
}

impl ComplianceConfig {
    /// Load from a TOML file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ComplianceConfig = toml::from_str(&content)
            .map_err(|e| ComplianceError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `COMPLIANCE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = ComplianceConfig::default();

        if let Some(days) = env_parse("COMPLIANCE_SANCTIONS_CACHE_VALIDITY_DAYS")? {
            config.sanctions_cache_validity_days = days;
        }

        if let Some(days) = env_parse("COMPLIANCE_AUDIT_TRAIL_DAYS")? {
            config.audit_trail_days = days;
        }

        if let Some(threshold) = env_parse("COMPLIANCE_SANCTIONS_FUZZY_THRESHOLD")? {
            config.sanctions_fuzzy_threshold = threshold;
        }

        if let Ok(path) = std::env::var("COMPLIANCE_AUDIT_LOG_PATH") {
            config.audit_log_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sanctions_fuzzy_threshold) {
            return Err(ComplianceError::Config(format!(
                "sanctions_fuzzy_threshold must be within 0.0..=1.0, got {}",
                self.sanctions_fuzzy_threshold
            )));
        }
        if self.kyc_validity_years == 0 {
            return Err(ComplianceError::Config(
                "kyc_validity_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ComplianceError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
