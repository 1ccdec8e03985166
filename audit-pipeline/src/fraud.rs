//! Rule-based fraud labeling and its audit against ground truth.
//!
//! Transactions are ordered per user by time. Each one gets the delay since
//! the same user's previous transaction and whether the merchant city
//! changed, then a label from an ordered rule list:
//!
//! 1. amount above the fraud threshold: `CRITICAL_AMOUNT`
//! 2. a city change less than the velocity limit after the previous
//!    transaction: `IMPOSSIBLE_TRAVEL`
//! 3. amount below the probe limit: `SMALL_PROBE`
//! 4. otherwise `NORMAL`
//!
//! A user's first transaction has no delay, so it can never be impossible
//! travel, but it always counts as a city change.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::FraudConfig;
use crate::error::{AuditError, AuditResult};
use crate::rules::RuleSet;
use crate::util::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub t_id: String,
    pub user_id: String,
    pub amount: f64,
    pub timestamp: String,
    pub merchant_city: String,
    #[serde(default)]
    pub channel: Option<String>,
    /// Ground truth, when the export carries it.
    #[serde(
        default,
        alias = "is_fraud_ground_truth",
        deserialize_with = "deserialize_flag"
    )]
    pub is_fraud: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudLabel {
    CriticalAmount,
    ImpossibleTravel,
    SmallProbe,
    Normal,
}

impl FraudLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudLabel::CriticalAmount => "CRITICAL_AMOUNT",
            FraudLabel::ImpossibleTravel => "IMPOSSIBLE_TRAVEL",
            FraudLabel::SmallProbe => "SMALL_PROBE",
            FraudLabel::Normal => "NORMAL",
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, FraudLabel::Normal)
    }
}

impl fmt::Display for FraudLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-transaction features the rules look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskFeatures {
    pub amount: f64,
    /// Minutes since the same user's previous transaction.
    pub time_delta_min: Option<f64>,
    pub city_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTransaction {
    pub transaction: Transaction,
    pub time_delta_min: Option<f64>,
    pub city_change: bool,
    pub predicted_risk: FraudLabel,
}

pub struct FraudLabeler {
    rules: RuleSet<RiskFeatures, FraudLabel>,
}

impl FraudLabeler {
    pub fn new(config: &FraudConfig) -> Self {
        let threshold = config.fraud_threshold;
        let velocity = config.velocity_limit_min;
        let probe = config.small_probe_amount;

        let rules = RuleSet::new(FraudLabel::Normal)
            .rule(FraudLabel::CriticalAmount, move |f: &RiskFeatures| {
                f.amount > threshold
            })
            .rule(FraudLabel::ImpossibleTravel, move |f: &RiskFeatures| {
                f.city_change && f.time_delta_min.map_or(false, |d| d > 0.0 && d < velocity)
            })
            .rule(FraudLabel::SmallProbe, move |f: &RiskFeatures| {
                f.amount < probe
            });

        Self { rules }
    }

    pub fn priority_order(&self) -> Vec<FraudLabel> {
        self.rules.priority_order()
    }

    pub fn label(&self, features: &RiskFeatures) -> FraudLabel {
        self.rules.evaluate(features)
    }

    /// Label a batch. Output is ordered by `(user_id, timestamp)`; ties keep
    /// input order.
    pub fn analyze(&self, transactions: &[Transaction]) -> AuditResult<Vec<LabeledTransaction>> {
        let mut parsed: Vec<(usize, NaiveDateTime)> = Vec::with_capacity(transactions.len());
        for (idx, tx) in transactions.iter().enumerate() {
            let ts = parse_timestamp(&tx.timestamp).ok_or_else(|| AuditError::InvalidTimestamp {
                line: idx + 2,
                value: tx.timestamp.clone(),
            })?;
            parsed.push((idx, ts));
        }
        parsed.sort_by(|(a, ta), (b, tb)| {
            transactions[*a]
                .user_id
                .cmp(&transactions[*b].user_id)
                .then(ta.cmp(tb))
        });

        let mut labeled = Vec::with_capacity(parsed.len());
        let mut previous: Option<(usize, NaiveDateTime)> = None;
        for (idx, ts) in parsed {
            let tx = &transactions[idx];
            let prev = previous.filter(|(p, _)| transactions[*p].user_id == tx.user_id);

            let time_delta_min =
                prev.map(|(_, prev_ts)| (ts - prev_ts).num_milliseconds() as f64 / 60_000.0);
            let city_change =
                prev.map_or(true, |(p, _)| transactions[p].merchant_city != tx.merchant_city);

            let predicted_risk = self.label(&RiskFeatures {
                amount: tx.amount,
                time_delta_min,
                city_change,
            });
            labeled.push(LabeledTransaction {
                transaction: tx.clone(),
                time_delta_min,
                city_change,
                predicted_risk,
            });
            previous = Some((idx, ts));
        }

        Ok(labeled)
    }
}

impl Default for FraudLabeler {
    fn default() -> Self {
        Self::new(&FraudConfig::default())
    }
}

/// Labeler quality against ground truth, plus the money it saved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FraudAudit {
    pub total_transactions: usize,
    pub actual_frauds: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Share of real frauds that raised an alert, in percent. Zero without frauds.
    pub recall_pct: f64,
    /// Share of alerts that were real frauds, in percent. Zero without alerts.
    pub precision_pct: f64,
    /// Sum of real fraud amounts.
    pub value_at_risk: f64,
    /// Sum of real fraud amounts that raised an alert.
    pub blocked_value: f64,
    pub leak: f64,
    pub label_counts: BTreeMap<String, usize>,
}

pub fn audit_labels(labeled: &[LabeledTransaction]) -> FraudAudit {
    let mut label_counts = BTreeMap::new();
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    let (mut at_risk, mut blocked) = (0.0, 0.0);

    for row in labeled {
        *label_counts
            .entry(row.predicted_risk.to_string())
            .or_insert(0) += 1;

        let alert = row.predicted_risk.is_alert();
        match (row.transaction.is_fraud, alert) {
            (true, true) => {
                tp += 1;
                at_risk += row.transaction.amount;
                blocked += row.transaction.amount;
            }
            (true, false) => {
                fn_ += 1;
                at_risk += row.transaction.amount;
            }
            (false, true) => fp += 1,
            (false, false) => {}
        }
    }

    let actual = tp + fn_;
    let pct = |num: usize, den: usize| {
        if den > 0 {
            num as f64 * 100.0 / den as f64
        } else {
            0.0
        }
    };

    FraudAudit {
        total_transactions: labeled.len(),
        actual_frauds: actual,
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        recall_pct: pct(tp, actual),
        precision_pct: pct(tp, tp + fp),
        value_at_risk: at_risk,
        blocked_value: blocked,
        leak: at_risk - blocked,
        label_counts,
    }
}

pub fn load_transactions<R: Read>(reader: R) -> AuditResult<Vec<Transaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        transactions.push(result.map_err(|source| AuditError::CsvRow {
            line: line_num + 2,
            source,
        })?);
    }
    Ok(transactions)
}

pub fn load_transactions_file(path: impl AsRef<Path>) -> AuditResult<Vec<Transaction>> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    load_transactions(file)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a boolean, got '{}'",
            other
        ))),
    }
}
