//! Web server log triage: failed logins per origin and the top origin's
//! attack timeline.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::error::{AuditError, AuditResult};
use crate::util::parse_timestamp;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub ip_address: String,
    pub status_code: u16,
    #[serde(default)]
    pub request_path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ThreatLevel {
    High,
    Low,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::High => write!(f, "High"),
            ThreatLevel::Low => write!(f, "Low"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub total_logs: usize,
    /// `"<first> to <last>"`, or `"n/a"` for an empty log.
    pub time_range: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SecurityMetrics {
    pub critical_401_errors: usize,
    /// Origin with the most failed logins, or `"None"`.
    pub top_suspicious_origin: String,
    pub threat_level: ThreatLevel,
}

/// Machine-readable summary, written as `security_summary.json`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SecuritySummary {
    pub analysis_timestamp: String,
    pub dataset_info: DatasetInfo,
    pub security_metrics: SecurityMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedLogins {
    pub ip_address: String,
    pub failures: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub minute: String,
    pub requests: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SecurityReport {
    pub summary: SecuritySummary,
    pub failed_logins: Vec<FailedLogins>,
    /// Requests per minute from the top origin; empty without failures.
    pub attack_timeline: Vec<TimelinePoint>,
}

/// Failed-login counts per origin, most failures first, ties by address.
pub fn failed_logins(entries: &[LogEntry], config: &SecurityConfig) -> Vec<FailedLogins> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries
        .iter()
        .filter(|e| e.status_code == config.failed_login_status)
    {
        *counts.entry(entry.ip_address.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<FailedLogins> = counts
        .into_iter()
        .map(|(ip, failures)| FailedLogins {
            ip_address: ip.to_string(),
            failures,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.failures
            .cmp(&a.failures)
            .then_with(|| a.ip_address.cmp(&b.ip_address))
    });
    ranked
}

fn parsed_timestamps(entries: &[LogEntry]) -> AuditResult<Vec<NaiveDateTime>> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            parse_timestamp(&e.timestamp).ok_or_else(|| AuditError::InvalidTimestamp {
                line: idx + 2,
                value: e.timestamp.clone(),
            })
        })
        .collect()
}

fn floor_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Requests per minute from `ip_address`, in time order.
pub fn attack_timeline(entries: &[LogEntry], ip_address: &str) -> AuditResult<Vec<TimelinePoint>> {
    let timestamps = parsed_timestamps(entries)?;
    let mut per_minute: BTreeMap<NaiveDateTime, usize> = BTreeMap::new();
    for (entry, ts) in entries.iter().zip(timestamps) {
        if entry.ip_address == ip_address {
            *per_minute.entry(floor_to_minute(ts)).or_insert(0) += 1;
        }
    }

    Ok(per_minute
        .into_iter()
        .map(|(minute, requests)| TimelinePoint {
            minute: minute.format(TIMESTAMP_FORMAT).to_string(),
            requests,
        })
        .collect())
}

/// Full triage of a log batch. `analyzed_at` is stamped into the summary.
pub fn analyze_logs(
    entries: &[LogEntry],
    config: &SecurityConfig,
    analyzed_at: NaiveDateTime,
) -> AuditResult<SecurityReport> {
    let timestamps = parsed_timestamps(entries)?;
    let time_range = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format(TIMESTAMP_FORMAT),
            last.format(TIMESTAMP_FORMAT)
        ),
        _ => "n/a".to_string(),
    };

    let ranked = failed_logins(entries, config);
    let critical: usize = ranked.iter().map(|f| f.failures).sum();
    let top = ranked.first();

    let threat_level = match top {
        Some(t) if t.failures > config.high_threat_failures => ThreatLevel::High,
        _ => ThreatLevel::Low,
    };
    let attack_timeline = match top {
        Some(t) => attack_timeline(entries, &t.ip_address)?,
        None => Vec::new(),
    };
    if threat_level == ThreatLevel::High {
        log::warn!(
            "origin {} has {} failed logins",
            top.map_or("None", |t| t.ip_address.as_str()),
            top.map_or(0, |t| t.failures)
        );
    }

    let summary = SecuritySummary {
        analysis_timestamp: analyzed_at.format(TIMESTAMP_FORMAT).to_string(),
        dataset_info: DatasetInfo {
            total_logs: entries.len(),
            time_range,
        },
        security_metrics: SecurityMetrics {
            critical_401_errors: critical,
            top_suspicious_origin: top.map_or_else(|| "None".to_string(), |t| t.ip_address.clone()),
            threat_level,
        },
    };

    Ok(SecurityReport {
        summary,
        failed_logins: ranked,
        attack_timeline,
    })
}

pub fn load_logs<R: Read>(reader: R) -> AuditResult<Vec<LogEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        entries.push(result.map_err(|source| AuditError::CsvRow {
            line: line_num + 2,
            source,
        })?);
    }
    Ok(entries)
}

pub fn load_logs_file(path: impl AsRef<Path>) -> AuditResult<Vec<LogEntry>> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
    load_logs(file)
}
