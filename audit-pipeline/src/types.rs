use std::fmt;

use serde::Serialize;

use crate::candidate_pipeline::HasRequestId;
use crate::inventory_loader::InventoryRecord;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// One audit run over a batch of inventory records.
#[derive(Clone, Debug, Default)]
pub struct AuditRequest {
    pub request_id: String,
    /// RFC-3339 timestamp of the run. Filled in by the query hydrator when blank.
    pub run_timestamp: String,
    /// Restrict the report to these categories. `None` keeps everything.
    pub categories: Option<Vec<String>>,
}

impl HasRequestId for AuditRequest {
    fn request_id(&self) -> &str {
        &self.request_id
    }
}

// ---------------------------------------------------------------------------
// Classification labels
// ---------------------------------------------------------------------------

/// Data-quality verdict for one record. Variants are listed in rule priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Missing,
    Negative,
    StatAnomaly,
    Outlier,
    Clean,
}

impl AuditStatus {
    pub const ALL: [AuditStatus; 5] = [
        AuditStatus::Missing,
        AuditStatus::Negative,
        AuditStatus::StatAnomaly,
        AuditStatus::Outlier,
        AuditStatus::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Missing => "MISSING",
            AuditStatus::Negative => "NEGATIVE",
            AuditStatus::StatAnomaly => "STAT_ANOMALY",
            AuditStatus::Outlier => "OUTLIER",
            AuditStatus::Clean => "CLEAN",
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, AuditStatus::Clean)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up required for a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredAction {
    UrgentRecount,
    SupervisorCheck,
    None,
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredAction::UrgentRecount => write!(f, "URGENT_RECOUNT"),
            RequiredAction::SupervisorCheck => write!(f, "SUPERVISOR_CHECK"),
            RequiredAction::None => write!(f, "NONE"),
        }
    }
}

/// Pareto tier by cumulative share of total stock value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbcClass::A => write!(f, "A"),
            AbcClass::B => write!(f, "B"),
            AbcClass::C => write!(f, "C"),
        }
    }
}

/// Stock coverage verdict from days on hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    StockoutRisk,
    Optimal,
    DeadStock,
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageStatus::StockoutRisk => write!(f, "STOCKOUT_RISK"),
            CoverageStatus::Optimal => write!(f, "OPTIMAL"),
            CoverageStatus::DeadStock => write!(f, "DEAD_STOCK"),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate type
// ---------------------------------------------------------------------------

/// An inventory record flowing through the audit pipeline.
///
/// Input fields are set by the source. Every `Option` below them is filled
/// by exactly one stage; the original `stock_count` is never overwritten.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AuditedItem {
    pub item_id: String,
    pub category: String,
    pub stock_count: Option<f64>,
    pub unit_price: Option<f64>,
    pub daily_sales: Option<f64>,
    pub last_audit: Option<String>,

    // Hydrated fields
    pub z_score: Option<f64>,
    pub audit_status: Option<AuditStatus>,
    pub cleaned_value: Option<f64>,
    pub required_action: Option<RequiredAction>,
    pub days_on_hand: Option<f64>,
    pub coverage_status: Option<CoverageStatus>,

    // Scored fields
    /// cleaned_value x unit_price.
    pub total_value: Option<f64>,
    /// total_value for flagged records, zero for clean ones.
    pub value_at_risk: Option<f64>,

    // Post-selection fields
    pub cumulative_pct: Option<f64>,
    pub abc_class: Option<AbcClass>,
}

impl AuditedItem {
    /// `(category, stock_count)` pair consumed by the auditor and remediator.
    /// A non-finite count is observed as missing.
    pub fn observation(&self) -> (&str, Option<f64>) {
        (
            self.category.as_str(),
            self.stock_count.filter(|v| v.is_finite()),
        )
    }

    pub fn is_flagged(&self) -> bool {
        self.audit_status.map_or(false, |s| !s.is_clean())
    }
}

impl From<&InventoryRecord> for AuditedItem {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            category: record.category.clone(),
            stock_count: record.stock_count,
            unit_price: record.unit_price,
            daily_sales: record.daily_sales,
            last_audit: record.last_audit.clone(),
            ..Self::default()
        }
    }
}
