//! Shipment delay exposure: which cargo is late, how risky each shipment
//! is, and where the delayed value originates.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};
use crate::inventory_loader::deserialize_optional_f64;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub shipping_mode: String,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub unit_weight: Option<f64>,
    pub cargo_value_usd: f64,
    #[serde(default)]
    pub delay_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredShipment {
    pub shipment_id: String,
    pub origin: String,
    pub is_delayed: bool,
    /// `delay_days x 10 + cargo_value_usd / 10_000`.
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginExposure {
    pub origin: String,
    pub shipments: usize,
    pub total_cargo_value: f64,
    /// Mean delay over every shipment from this origin, on-time ones included.
    pub mean_delay_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentReport {
    pub total_shipments: usize,
    pub delayed_shipments: usize,
    /// Cargo value of delayed shipments.
    pub value_at_risk: f64,
    /// Mean delay over delayed shipments only; zero when nothing is late.
    pub mean_delay_days: f64,
    /// Sorted by total cargo value, highest first.
    pub origins: Vec<OriginExposure>,
    pub scored: Vec<ScoredShipment>,
}

pub fn risk_score(shipment: &Shipment) -> f64 {
    shipment.delay_days * 10.0 + shipment.cargo_value_usd / 10_000.0
}

pub fn analyze_shipments(shipments: &[Shipment]) -> ShipmentReport {
    let scored: Vec<ScoredShipment> = shipments
        .par_iter()
        .map(|s| ScoredShipment {
            shipment_id: s.shipment_id.clone(),
            origin: s.origin.clone(),
            is_delayed: s.delay_days > 0.0,
            risk_score: risk_score(s),
        })
        .collect();

    let delayed: Vec<&Shipment> = shipments.iter().filter(|s| s.delay_days > 0.0).collect();
    let value_at_risk: f64 = delayed.iter().map(|s| s.cargo_value_usd).sum();
    let delays: Vec<f64> = delayed.iter().map(|s| s.delay_days).collect();

    let mut by_origin: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for s in shipments {
        let entry = by_origin.entry(s.origin.as_str()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += s.cargo_value_usd;
        entry.2 += s.delay_days;
    }
    let mut origins: Vec<OriginExposure> = by_origin
        .into_iter()
        .map(|(origin, (count, cargo, delay))| OriginExposure {
            origin: origin.to_string(),
            shipments: count,
            total_cargo_value: cargo,
            mean_delay_days: delay / count as f64,
        })
        .collect();
    origins.sort_by(|a, b| b.total_cargo_value.total_cmp(&a.total_cargo_value));

    ShipmentReport {
        total_shipments: shipments.len(),
        delayed_shipments: delayed.len(),
        value_at_risk,
        mean_delay_days: stats::mean(&delays).unwrap_or(0.0),
        origins,
        scored,
    }
}

pub fn load_shipments<R: Read>(reader: R) -> AuditResult<Vec<Shipment>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut shipments = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        shipments.push(result.map_err(|source| AuditError::CsvRow {
            line: line_num + 2,
            source,
        })?);
    }
    Ok(shipments)
}

pub fn load_shipments_file(path: impl AsRef<Path>) -> AuditResult<Vec<Shipment>> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    load_shipments(file)
}
