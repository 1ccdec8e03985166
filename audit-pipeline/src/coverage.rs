//! Days-on-hand coverage analysis.

use crate::config::AuditConfig;
use crate::error::{AuditError, AuditResult};
use crate::types::CoverageStatus;

/// Days the cleaned stock lasts at `daily_rate` units per day.
///
/// A zero, negative or non-numeric rate makes coverage undefined and is
/// reported as an error rather than producing an infinite or negative value.
pub fn days_on_hand(item_id: &str, cleaned_value: f64, daily_rate: f64) -> AuditResult<f64> {
    if !(daily_rate > 0.0) {
        return Err(AuditError::InvalidConsumptionRate {
            item_id: item_id.to_string(),
            rate: daily_rate,
        });
    }
    Ok(cleaned_value / daily_rate)
}

pub fn classify_coverage(days_on_hand: f64, config: &AuditConfig) -> CoverageStatus {
    if days_on_hand < config.stockout_days {
        CoverageStatus::StockoutRisk
    } else if days_on_hand > config.dead_stock_days {
        CoverageStatus::DeadStock
    } else {
        CoverageStatus::Optimal
    }
}
