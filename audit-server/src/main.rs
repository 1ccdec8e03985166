use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use audit_pipeline::candidate_pipeline::{CandidatePipeline, PipelineResult};
use audit_pipeline::config::{MissingGroupPolicy, Settings};
use audit_pipeline::fraud::{audit_labels, load_transactions_file, FraudAudit, FraudLabeler};
use audit_pipeline::inventory_loader::load_or_create_template;
use audit_pipeline::pipelines::inventory_audit::InventoryAuditPipeline;
use audit_pipeline::report::{write_json, write_report_csv, AuditSummary};
use audit_pipeline::security::{analyze_logs, load_logs_file, SecurityReport};
use audit_pipeline::shipments::{analyze_shipments, load_shipments_file, ShipmentReport};
use audit_pipeline::types::{AuditRequest, AuditStatus, AuditedItem, RequiredAction};

/// Command-line arguments for audit-server
#[derive(Parser, Debug)]
#[command(name = "audit-server")]
#[command(about = "Rule-based data-quality audits for inventory, transactions, logs and shipments")]
#[command(version)]
struct Cli {
    /// TOML file with [audit], [fraud] and [security] tables
    #[arg(short, long, global = true, env = "AUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of the formatted digest
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit stock counts; writes a starter sheet if the file is missing
    Inventory {
        /// Inventory CSV (item_id, stock_count, category, unit_price[, last_audit, daily_sales])
        #[arg(default_value = "inventory.csv")]
        path: PathBuf,

        /// Only report these categories (comma-separated)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// |z| above this is a statistical anomaly
        #[arg(long)]
        z_threshold: Option<f64>,

        /// Counts above this are absolute outliers
        #[arg(long)]
        outlier_threshold: Option<f64>,

        /// Imputation for categories with no valid counts
        #[arg(long, value_enum)]
        missing_policy: Option<PolicyArg>,

        /// Write the row-highlighted report here
        #[arg(long)]
        report_csv: Option<PathBuf>,

        /// Write the KPI summary here
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Label transactions and audit the labels against ground truth
    Fraud {
        path: PathBuf,

        #[arg(long)]
        fraud_threshold: Option<f64>,

        /// Minutes under which a city change is impossible travel
        #[arg(long)]
        velocity_limit: Option<f64>,

        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Triage a web server log for brute-force origins
    Security {
        path: PathBuf,

        /// Failures from the top origin above which the threat is high
        #[arg(long)]
        high_threat: Option<usize>,

        #[arg(long, default_value = "security_summary.json")]
        summary_json: PathBuf,
    },
    /// Measure cargo value exposed to shipment delays
    Shipments {
        path: PathBuf,

        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    GlobalMedian,
    Zero,
}

impl From<PolicyArg> for MissingGroupPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::GlobalMedian => MissingGroupPolicy::GlobalMedian,
            PolicyArg::Zero => MissingGroupPolicy::Zero,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct InventoryJson<'a> {
    summary: &'a AuditSummary,
    pipeline_ms: u128,
    items: &'a [AuditedItem],
    filtered_out: usize,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format dollar amounts with comma separators.
fn format_dollars(amount: f64) -> String {
    let whole = amount.abs().round() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };

    let s = whole.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    format!("{}{}", sign, result.chars().rev().collect::<String>())
}

fn banner(title: &str) {
    println!();
    println!("  \u{2554}{}\u{2557}", "\u{2550}".repeat(62));
    println!("  \u{2551}{:^62}\u{2551}", title);
    println!("  \u{255a}{}\u{255d}", "\u{2550}".repeat(62));
    println!();
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn print_inventory(
    result: &PipelineResult<AuditRequest, AuditedItem>,
    summary: &AuditSummary,
    created_template: bool,
    load_ms: u128,
    pipeline_ms: u128,
) {
    banner("STOCK AUDIT \u{00b7} Data Quality Report");

    if created_template {
        println!("  No inventory file found; a starter sheet was written and audited.");
        println!();
    }
    println!(
        "  {} records audited  \u{00b7}  {} flagged  \u{00b7}  {} filtered out",
        summary.total_records,
        summary.flagged_records,
        result.filtered_candidates.len()
    );
    println!(
        "  ${} stock value  \u{00b7}  ${} at risk ({:.1}%)",
        format_dollars(summary.total_value),
        format_dollars(summary.value_at_risk),
        summary.value_at_risk_pct
    );
    let status_line: Vec<String> = AuditStatus::ALL
        .iter()
        .map(|s| format!("{} {}", s, summary.status_count(*s)))
        .collect();
    println!("  {}", status_line.join("  \u{00b7}  "));
    println!();

    if result.selected_candidates.is_empty() {
        println!("  No records to report.");
        println!();
        return;
    }

    println!("  {:\u{2500}<64}", "");
    for c in &result.selected_candidates {
        let marker = match c.required_action {
            Some(RequiredAction::UrgentRecount) => "!!",
            Some(RequiredAction::SupervisorCheck) => "! ",
            _ => "  ",
        };
        println!(
            "  {} {:8} {:12} {:>8} \u{2192} {:>8}  {:12} {:>10}  {}",
            marker,
            c.item_id,
            c.category,
            fmt_opt(c.stock_count, 0),
            fmt_opt(c.cleaned_value, 0),
            c.audit_status.map(|s| s.to_string()).unwrap_or_default(),
            format!("${}", format_dollars(c.total_value.unwrap_or(0.0))),
            c.abc_class.map(|a| a.to_string()).unwrap_or_default(),
        );
        if let (Some(days), Some(coverage)) = (c.days_on_hand, c.coverage_status) {
            println!("       {:.1} days on hand  ({})", days, coverage);
        }
    }
    println!("  {:\u{2500}<64}", "");
    println!();
    println!(
        "  \u{23f1}  CSV loaded in {}ms \u{00b7} Pipeline ran in {}ms \u{00b7} Total {}ms",
        load_ms,
        pipeline_ms,
        load_ms + pipeline_ms
    );
    println!();
}

fn print_fraud(audit: &FraudAudit) {
    banner(&format!("FRAUD LABELER AUDIT (N={})", audit.total_transactions));
    println!("  Recall:           {:.1}%  (frauds caught)", audit.recall_pct);
    println!("  Precision:        {:.1}%  (alerts that were fraud)", audit.precision_pct);
    println!("  False alerts:     {}", audit.false_positives);
    println!("  {:\u{2500}<44}", "");
    println!("  Value at risk:    ${}", format_dollars(audit.value_at_risk));
    println!("  Value blocked:    ${}", format_dollars(audit.blocked_value));
    println!("  Leak:             ${}", format_dollars(audit.leak));
    println!("  {:\u{2500}<44}", "");
    for (label, count) in &audit.label_counts {
        println!("  {:20} {}", label, count);
    }
    println!();
}

fn print_security(report: &SecurityReport) {
    let metrics = &report.summary.security_metrics;
    banner("SECURITY LOG TRIAGE");
    println!(
        "  {} log entries  \u{00b7}  {}",
        report.summary.dataset_info.total_logs, report.summary.dataset_info.time_range
    );
    println!(
        "  {} failed logins  \u{00b7}  top origin {}  \u{00b7}  threat {}",
        metrics.critical_401_errors, metrics.top_suspicious_origin, metrics.threat_level
    );
    println!();
    for origin in report.failed_logins.iter().take(10) {
        println!("  {:18} {:>6}", origin.ip_address, origin.failures);
    }
    if !report.attack_timeline.is_empty() {
        println!();
        println!("  Requests per minute from {}:", metrics.top_suspicious_origin);
        for point in &report.attack_timeline {
            println!("  {}  {:>5}", point.minute, point.requests);
        }
    }
    println!();
}

fn print_shipments(report: &ShipmentReport) {
    banner("SHIPMENT DELAY EXPOSURE");
    println!("  Total value at risk:  ${}", format_dollars(report.value_at_risk));
    println!(
        "  Delayed shipments:    {} of {}  (mean delay {:.1} days)",
        report.delayed_shipments, report.total_shipments, report.mean_delay_days
    );
    println!();
    for origin in &report.origins {
        println!(
            "  {:14} ${:>14}  avg delay {:.1} d",
            origin.origin,
            format_dollars(origin.total_cargo_value),
            origin.mean_delay_days
        );
    }
    println!();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing JSON output")?
    );
    Ok(())
}

fn write_summary<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    if let Some(path) = path {
        write_json(path, value).with_context(|| format!("writing {}", path.display()))?;
        log::info!("summary written to {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Settings::default()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Inventory {
            path,
            categories,
            z_threshold,
            outlier_threshold,
            missing_policy,
            report_csv,
            summary_json,
        } => {
            if let Some(z) = z_threshold {
                settings.audit.anomaly_z_threshold = z;
            }
            if let Some(limit) = outlier_threshold {
                settings.audit.outlier_threshold = limit;
            }
            if let Some(policy) = missing_policy {
                settings.audit.missing_group_policy = policy.into();
            }
            settings.audit.validate().context("invalid audit thresholds")?;

            let load_start = Instant::now();
            let (records, created) = load_or_create_template(&path)
                .with_context(|| format!("loading inventory {}", path.display()))?;
            let load_ms = load_start.elapsed().as_millis();

            let pipeline_start = Instant::now();
            let pipeline = InventoryAuditPipeline::new(records, &settings.audit);
            let request = AuditRequest {
                request_id: format!("audit-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")),
                run_timestamp: String::new(),
                categories,
            };
            let result = pipeline.execute(request).await;
            let pipeline_ms = pipeline_start.elapsed().as_millis();

            let summary = AuditSummary::from_items(&result.query, &result.selected_candidates);
            if let Some(report_path) = report_csv.as_deref() {
                write_report_csv(report_path, &result.selected_candidates)
                    .with_context(|| format!("writing {}", report_path.display()))?;
                log::info!("report written to {}", report_path.display());
            }
            write_summary(summary_json.as_deref(), &summary)?;

            if cli.json {
                print_json(&InventoryJson {
                    summary: &summary,
                    pipeline_ms,
                    items: &result.selected_candidates,
                    filtered_out: result.filtered_candidates.len(),
                })?;
            } else {
                print_inventory(&result, &summary, created, load_ms, pipeline_ms);
            }
        }
        Command::Fraud {
            path,
            fraud_threshold,
            velocity_limit,
            summary_json,
        } => {
            if let Some(threshold) = fraud_threshold {
                settings.fraud.fraud_threshold = threshold;
            }
            if let Some(limit) = velocity_limit {
                settings.fraud.velocity_limit_min = limit;
            }
            settings.fraud.validate().context("invalid fraud thresholds")?;

            let transactions = load_transactions_file(&path)
                .with_context(|| format!("loading transactions {}", path.display()))?;
            let labeled = FraudLabeler::new(&settings.fraud)
                .analyze(&transactions)
                .context("labeling transactions")?;
            let audit = audit_labels(&labeled);
            write_summary(summary_json.as_deref(), &audit)?;

            if cli.json {
                print_json(&audit)?;
            } else {
                print_fraud(&audit);
            }
        }
        Command::Security {
            path,
            high_threat,
            summary_json,
        } => {
            if let Some(limit) = high_threat {
                settings.security.high_threat_failures = limit;
            }

            let entries = load_logs_file(&path)
                .with_context(|| format!("loading logs {}", path.display()))?;
            let report = analyze_logs(&entries, &settings.security, chrono::Local::now().naive_local())
                .context("analyzing logs")?;
            write_summary(Some(summary_json.as_path()), &report.summary)?;

            if cli.json {
                print_json(&report)?;
            } else {
                print_security(&report);
            }
        }
        Command::Shipments { path, summary_json } => {
            let shipments = load_shipments_file(&path)
                .with_context(|| format!("loading shipments {}", path.display()))?;
            let report = analyze_shipments(&shipments);
            write_summary(summary_json.as_deref(), &report)?;

            if cli.json {
                print_json(&report)?;
            } else {
                print_shipments(&report);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        eprintln!("Audit failed; see the log above for details.");
        process::exit(1);
    }
}
