//! Tunable thresholds for every audit stage.
//!
//! All knobs live here so stages receive them by injection instead of
//! reaching for scattered constants. Defaults match the values the audit
//! scripts were calibrated with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// What to impute when a whole category has no present stock counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingGroupPolicy {
    /// Median of all present counts across the batch (floored at zero),
    /// or zero if the batch has no present counts at all.
    GlobalMedian,
    /// Impute zero.
    Zero,
}

impl Default for MissingGroupPolicy {
    fn default() -> Self {
        MissingGroupPolicy::GlobalMedian
    }
}

/// Inventory audit configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// |z| strictly above this is a statistical anomaly.
    pub anomaly_z_threshold: f64,
    /// Stock counts strictly above this are absolute outliers.
    pub outlier_threshold: f64,
    /// Cumulative value share (percent) up to which items are class A.
    pub abc_a_cutoff: f64,
    /// Cumulative value share (percent) up to which items are class B.
    pub abc_b_cutoff: f64,
    /// Days on hand strictly below this is a stockout risk.
    pub stockout_days: f64,
    /// Days on hand strictly above this is dead stock.
    pub dead_stock_days: f64,
    pub missing_group_policy: MissingGroupPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: 1.5,
            outlier_threshold: 1000.0,
            abc_a_cutoff: 80.0,
            abc_b_cutoff: 95.0,
            stockout_days: 5.0,
            dead_stock_days: 180.0,
            missing_group_policy: MissingGroupPolicy::GlobalMedian,
        }
    }
}

/// The whole config file: one table per analyzer.
///
/// ```toml
/// [audit]
/// anomaly_z_threshold = 2.0
/// missing_group_policy = "zero"
///
/// [fraud]
/// fraud_threshold = 7500
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audit: AuditConfig,
    pub fraud: FraudConfig,
    pub security: SecurityConfig,
}

impl Settings {
    /// Parse a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> AuditResult<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuditError::io(path.display().to_string(), e))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> AuditResult<()> {
        self.audit.validate()?;
        self.fraud.validate()?;
        self.security.validate()
    }
}

impl AuditConfig {
    pub fn validate(&self) -> AuditResult<()> {
        if !(self.anomaly_z_threshold > 0.0) {
            return Err(AuditError::InvalidConfig {
                field: "anomaly_z_threshold",
                reason: format!("must be positive, got {}", self.anomaly_z_threshold),
            });
        }
        if !(self.outlier_threshold > 0.0) {
            return Err(AuditError::InvalidConfig {
                field: "outlier_threshold",
                reason: format!("must be positive, got {}", self.outlier_threshold),
            });
        }
        if !(self.abc_a_cutoff > 0.0 && self.abc_a_cutoff <= 100.0) {
            return Err(AuditError::InvalidConfig {
                field: "abc_a_cutoff",
                reason: format!("must be in (0, 100], got {}", self.abc_a_cutoff),
            });
        }
        if !(self.abc_b_cutoff >= self.abc_a_cutoff && self.abc_b_cutoff <= 100.0) {
            return Err(AuditError::InvalidConfig {
                field: "abc_b_cutoff",
                reason: format!(
                    "must be in [abc_a_cutoff, 100], got {}",
                    self.abc_b_cutoff
                ),
            });
        }
        if !(self.stockout_days >= 0.0 && self.dead_stock_days >= self.stockout_days) {
            return Err(AuditError::InvalidConfig {
                field: "dead_stock_days",
                reason: format!(
                    "need 0 <= stockout_days ({}) <= dead_stock_days ({})",
                    self.stockout_days, self.dead_stock_days
                ),
            });
        }
        Ok(())
    }
}

/// Fraud labeler thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    /// Amounts strictly above this are critical.
    pub fraud_threshold: f64,
    /// Minutes between consecutive transactions of one user below which a
    /// city change is impossible travel.
    pub velocity_limit_min: f64,
    /// Amounts strictly below this are card-testing probes.
    pub small_probe_amount: f64,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            fraud_threshold: 5000.0,
            velocity_limit_min: 60.0,
            small_probe_amount: 5.0,
        }
    }
}

impl FraudConfig {
    pub fn validate(&self) -> AuditResult<()> {
        if !(self.velocity_limit_min > 0.0) {
            return Err(AuditError::InvalidConfig {
                field: "velocity_limit_min",
                reason: format!("must be positive, got {}", self.velocity_limit_min),
            });
        }
        if self.fraud_threshold.is_nan() || self.small_probe_amount.is_nan() {
            return Err(AuditError::InvalidConfig {
                field: "fraud_threshold",
                reason: "amount thresholds must be numbers".into(),
            });
        }
        Ok(())
    }
}

/// Security log triage thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HTTP status counted as a failed login.
    pub failed_login_status: u16,
    /// Threat level is high when the top origin has more failures than this.
    pub high_threat_failures: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            failed_login_status: 401,
            high_threat_failures: 20,
        }
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> AuditResult<()> {
        if !(100..=599).contains(&self.failed_login_status) {
            return Err(AuditError::InvalidConfig {
                field: "failed_login_status",
                reason: format!("not an HTTP status: {}", self.failed_login_status),
            });
        }
        Ok(())
    }
}
