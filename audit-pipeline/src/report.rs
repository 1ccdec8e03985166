//! Report builders: the KPI summary, the row-highlighted CSV report, and a
//! JSON writer shared by every analyzer.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{AuditError, AuditResult};
use crate::types::{AbcClass, AuditRequest, AuditStatus, AuditedItem, RequiredAction};

/// Run-level KPIs for an audited batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditSummary {
    pub request_id: String,
    pub generated_at: String,
    pub total_records: usize,
    pub flagged_records: usize,
    pub clean_records: usize,
    /// Every status label, including those with a zero count.
    pub status_counts: BTreeMap<String, usize>,
    pub action_counts: BTreeMap<String, usize>,
    pub abc_counts: BTreeMap<String, usize>,
    pub coverage_counts: BTreeMap<String, usize>,
    pub total_value: f64,
    pub value_at_risk: f64,
    /// value_at_risk as a percentage of total_value; zero for an empty batch.
    pub value_at_risk_pct: f64,
}

impl AuditSummary {
    pub fn from_items(query: &AuditRequest, items: &[AuditedItem]) -> Self {
        let mut status_counts: BTreeMap<String, usize> = AuditStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut action_counts = BTreeMap::new();
        let mut abc_counts = BTreeMap::new();
        let mut coverage_counts = BTreeMap::new();

        for item in items {
            if let Some(status) = item.audit_status {
                *status_counts.entry(status.to_string()).or_insert(0) += 1;
            }
            if let Some(action) = item.required_action {
                *action_counts.entry(action.to_string()).or_insert(0) += 1;
            }
            if let Some(class) = item.abc_class {
                *abc_counts.entry(class.to_string()).or_insert(0) += 1;
            }
            if let Some(coverage) = item.coverage_status {
                *coverage_counts.entry(coverage.to_string()).or_insert(0) += 1;
            }
        }

        let flagged_records = items.iter().filter(|i| i.is_flagged()).count();
        let clean_records = status_counts
            .get(AuditStatus::Clean.as_str())
            .copied()
            .unwrap_or(0);
        let total_value: f64 = items.iter().filter_map(|i| i.total_value).sum();
        let value_at_risk: f64 = items.iter().filter_map(|i| i.value_at_risk).sum();
        let value_at_risk_pct = if total_value > 0.0 {
            value_at_risk * 100.0 / total_value
        } else {
            0.0
        };

        Self {
            request_id: query.request_id.clone(),
            generated_at: query.run_timestamp.clone(),
            total_records: items.len(),
            flagged_records,
            clean_records,
            status_counts,
            action_counts,
            abc_counts,
            coverage_counts,
            total_value,
            value_at_risk,
            value_at_risk_pct,
        }
    }

    pub fn status_count(&self, status: AuditStatus) -> usize {
        self.status_counts.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn urgent_recounts(&self) -> usize {
        self.action_counts
            .get(&RequiredAction::UrgentRecount.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn abc_count(&self, class: AbcClass) -> usize {
        self.abc_counts.get(&class.to_string()).copied().unwrap_or(0)
    }
}

/// Row colour in the spreadsheet report.
pub fn highlight_for(status: Option<AuditStatus>) -> &'static str {
    match status {
        Some(AuditStatus::Missing) | Some(AuditStatus::Negative) => "red",
        Some(AuditStatus::StatAnomaly) => "orange",
        _ => "",
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    item_id: &'a str,
    category: &'a str,
    stock_count: Option<f64>,
    cleaned_value: Option<f64>,
    unit_price: Option<f64>,
    z_score: Option<f64>,
    audit_status: Option<AuditStatus>,
    required_action: Option<RequiredAction>,
    total_value: Option<f64>,
    value_at_risk: Option<f64>,
    cumulative_pct: Option<f64>,
    abc_class: Option<AbcClass>,
    days_on_hand: Option<f64>,
    coverage_status: Option<String>,
    highlight: &'static str,
}

fn round2(v: Option<f64>) -> Option<f64> {
    v.map(|x| (x * 100.0).round() / 100.0)
}

impl<'a> From<&'a AuditedItem> for ReportRow<'a> {
    fn from(item: &'a AuditedItem) -> Self {
        Self {
            item_id: &item.item_id,
            category: &item.category,
            stock_count: item.stock_count,
            cleaned_value: item.cleaned_value,
            unit_price: item.unit_price,
            z_score: round2(item.z_score),
            audit_status: item.audit_status,
            required_action: item.required_action,
            total_value: round2(item.total_value),
            value_at_risk: round2(item.value_at_risk),
            cumulative_pct: round2(item.cumulative_pct),
            abc_class: item.abc_class,
            days_on_hand: round2(item.days_on_hand),
            coverage_status: item.coverage_status.map(|c| c.to_string()),
            highlight: highlight_for(item.audit_status),
        }
    }
}

/// Write the per-record report as CSV, one row per item in the given order.
pub fn write_report<W: Write>(writer: W, items: &[AuditedItem]) -> AuditResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for item in items {
        csv_writer.serialize(ReportRow::from(item))?;
    }
    csv_writer
        .flush()
        .map_err(|e| AuditError::io("<report>", e))?;
    Ok(())
}

pub fn write_report_csv(path: impl AsRef<Path>, items: &[AuditedItem]) -> AuditResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    write_report(BufWriter::new(file), items)
}

/// Pretty-print any serializable summary to `path`.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> AuditResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|e| AuditError::io(path.display().to_string(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CoverageStatus;

    fn item(id: &str, status: AuditStatus, action: RequiredAction, value: f64) -> AuditedItem {
        AuditedItem {
            item_id: id.to_string(),
            category: "Home".to_string(),
            stock_count: Some(1.0),
            cleaned_value: Some(1.0),
            audit_status: Some(status),
            required_action: Some(action),
            total_value: Some(value),
            value_at_risk: Some(if status.is_clean() { 0.0 } else { value }),
            ..AuditedItem::default()
        }
    }

    fn sample() -> Vec<AuditedItem> {
        vec![
            item("1", AuditStatus::Clean, RequiredAction::None, 300.0),
            item("2", AuditStatus::Negative, RequiredAction::UrgentRecount, 0.0),
            item("3", AuditStatus::Missing, RequiredAction::UrgentRecount, 100.0),
        ]
    }

    #[test]
    fn summary_counts() {
        let query = AuditRequest {
            request_id: "r".to_string(),
            run_timestamp: "2025-01-01T00:00:00Z".to_string(),
            categories: None,
        };
        let summary = AuditSummary::from_items(&query, &sample());

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.flagged_records, 2);
        assert_eq!(summary.clean_records, 1);
        assert_eq!(summary.status_count(AuditStatus::Missing), 1);
        assert_eq!(summary.status_count(AuditStatus::Outlier), 0);
        assert_eq!(summary.urgent_recounts(), 2);
        assert_eq!(summary.total_value, 400.0);
        assert_eq!(summary.value_at_risk, 100.0);
        assert_eq!(summary.value_at_risk_pct, 25.0);
        assert_eq!(summary.generated_at, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn empty_batch_summary() {
        let summary = AuditSummary::from_items(&AuditRequest::default(), &[]);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.value_at_risk_pct, 0.0);
        assert_eq!(summary.status_counts.len(), AuditStatus::ALL.len());
    }

    #[test]
    fn highlight_colours() {
        assert_eq!(highlight_for(Some(AuditStatus::Missing)), "red");
        assert_eq!(highlight_for(Some(AuditStatus::Negative)), "red");
        assert_eq!(highlight_for(Some(AuditStatus::StatAnomaly)), "orange");
        assert_eq!(highlight_for(Some(AuditStatus::Outlier)), "");
        assert_eq!(highlight_for(None), "");
    }

    #[test]
    fn csv_report_has_header_and_highlights() {
        let mut items = sample();
        items[0].coverage_status = Some(CoverageStatus::DeadStock);

        let mut buf = Vec::new();
        write_report(&mut buf, &items).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("item_id,category,stock_count"));
        assert!(lines[0].ends_with(",highlight"));
        assert!(lines[1].contains("CLEAN") && lines[1].contains("DEAD_STOCK"));
        assert!(lines[2].contains("NEGATIVE") && lines[2].ends_with(",red"));
        assert!(lines[3].contains("URGENT_RECOUNT"));
    }

    #[test]
    fn json_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = AuditSummary::from_items(&AuditRequest::default(), &sample());
        write_json(&path, &summary).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["total_records"], 3);
        assert_eq!(parsed["status_counts"]["NEGATIVE"], 1);
    }
}
