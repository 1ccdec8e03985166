//! CSV inventory data loader.
//!
//! Parses inventory CSV files into `InventoryRecord` structs.
//! Expected CSV columns:
//!   item_id, stock_count, category, unit_price
//! Optional columns:
//!   last_audit, daily_sales
//!
//! Blank cells, the usual spreadsheet null spellings (`NA`, `NaN`, `None`,
//! `null`) and non-finite numbers (`inf`, `-nan`) load as missing, so a
//! missing stock count reaches the auditor as a data-quality finding instead
//! of a parse failure.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// One inventory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub item_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub stock_count: Option<f64>,
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub last_audit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub daily_sales: Option<f64>,
}

/// Load inventory records from a CSV reader.
pub fn load_inventory<R: Read>(reader: R) -> AuditResult<Vec<InventoryRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: InventoryRecord = result.map_err(|source| AuditError::CsvRow {
            line: line_num + 2,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load inventory records from a CSV file path.
pub fn load_inventory_file(path: impl AsRef<Path>) -> AuditResult<Vec<InventoryRecord>> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    load_inventory(file)
}

/// The five-row starter sheet written when no inventory file exists yet.
///
/// It deliberately contains one negative and one missing count so a first
/// run shows every recount path.
pub fn template_records() -> Vec<InventoryRecord> {
    let row = |id: &str, count: Option<f64>, category: &str, price: f64| InventoryRecord {
        item_id: id.to_string(),
        stock_count: count,
        category: category.to_string(),
        unit_price: Some(price),
        last_audit: None,
        daily_sales: None,
    };
    vec![
        row("101", Some(50.0), "Electronics", 249.99),
        row("102", Some(-5.0), "Home", 34.50),
        row("103", Some(120.0), "Electronics", 89.00),
        row("104", None, "Toys", 19.99),
        row("105", Some(80.0), "Home", 12.75),
    ]
}

/// Write records as CSV with the standard header.
pub fn write_inventory_file(path: impl AsRef<Path>, records: &[InventoryRecord]) -> AuditResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| AuditError::io(path.display().to_string(), e))?;
    Ok(())
}

/// Load `path`, or write the template there first if it does not exist.
///
/// Returns the records and whether the template was created.
pub fn load_or_create_template(path: impl AsRef<Path>) -> AuditResult<(Vec<InventoryRecord>, bool)> {
    let path = path.as_ref();
    if path.exists() {
        return Ok((load_inventory_file(path)?, false));
    }

    log::warn!(
        "inventory file {} not found; writing {}-row template",
        path.display(),
        template_records().len()
    );
    write_inventory_file(path, &template_records())?;
    Ok((load_inventory_file(path)?, true))
}

fn is_null_token(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "" | "na" | "n/a" | "nan" | "none" | "null"
    )
}

/// Lenient numeric deserializer: blank, null and non-finite cells become `None`.
pub(crate) fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => {
            let s = s.trim();
            if is_null_token(s) {
                return Ok(None);
            }
            let value = s.parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("expected a number or blank, got '{}'", s))
            })?;
            if !value.is_finite() {
                log::warn!("non-finite number '{}' loaded as missing", s);
                return Ok(None);
            }
            Ok(Some(value))
        }
    }
}

pub(crate) fn deserialize_optional_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !is_null_token(s)))
}
