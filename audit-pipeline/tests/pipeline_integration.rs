use audit_pipeline::candidate_pipeline::{CandidatePipeline, PipelineResult};
use audit_pipeline::config::{AuditConfig, MissingGroupPolicy};
use audit_pipeline::inventory_loader::{load_inventory, load_or_create_template, InventoryRecord};
use audit_pipeline::pipelines::inventory_audit::InventoryAuditPipeline;
use audit_pipeline::report::{write_report_csv, AuditSummary};
use audit_pipeline::types::*;

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

fn record(
    id: &str,
    count: Option<f64>,
    category: &str,
    price: f64,
    daily_sales: Option<f64>,
) -> InventoryRecord {
    InventoryRecord {
        item_id: id.into(),
        stock_count: count,
        category: category.into(),
        unit_price: Some(price),
        last_audit: None,
        daily_sales,
    }
}

/// A warehouse snapshot with one of every finding.
///
/// - Electronics: six counts, 400 sits about 2.04 sample deviations out.
/// - Home: a negative count and a missing count; the only valid count is 80.
/// - Toys: every count missing, so the batch-wide median (59) is imputed.
/// - Bulk: a single 5000 count; z is 0 so it is an absolute outlier.
fn sample_records() -> Vec<InventoryRecord> {
    vec![
        record("101", Some(50.0), "Electronics", 249.99, Some(4.0)),
        record("102", Some(-5.0), "Home", 34.50, None),
        record("104", None, "Toys", 19.99, None),
        record("105", Some(80.0), "Home", 12.75, Some(0.0)),
        record("106", Some(52.0), "Electronics", 10.0, Some(20.0)),
        record("107", Some(55.0), "Electronics", 10.0, None),
        record("108", Some(58.0), "Electronics", 10.0, None),
        record("109", Some(60.0), "Electronics", 10.0, None),
        record("110", Some(400.0), "Electronics", 5.0, None),
        record("111", None, "Home", 20.0, None),
        record("112", Some(5000.0), "Bulk", 2.0, Some(10.0)),
    ]
}

fn make_request(categories: Option<Vec<&str>>) -> AuditRequest {
    AuditRequest {
        request_id: "audit-test".into(),
        run_timestamp: String::new(),
        categories: categories.map(|c| c.into_iter().map(String::from).collect()),
    }
}

fn find<'a>(result: &'a PipelineResult<AuditRequest, AuditedItem>, id: &str) -> &'a AuditedItem {
    result
        .selected_candidates
        .iter()
        .find(|c| c.item_id == id)
        .unwrap_or_else(|| panic!("item {} not selected", id))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

async fn run(records: Vec<InventoryRecord>, request: AuditRequest) -> PipelineResult<AuditRequest, AuditedItem> {
    InventoryAuditPipeline::with_inventory(records)
        .execute(request)
        .await
}

// ---------------------------------------------------------------------------
// Full pipeline integration tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inventory_audit_pipeline_end_to_end() {
    let result = run(sample_records(), make_request(None)).await;

    assert_eq!(result.retrieved_candidates.len(), 11);
    assert!(result.filtered_candidates.is_empty());
    assert_eq!(result.selected_candidates.len(), 11);
    assert!(!result.query.run_timestamp.is_empty());

    let status = |id: &str| find(&result, id).audit_status;
    assert_eq!(status("101"), Some(AuditStatus::Clean));
    assert_eq!(status("102"), Some(AuditStatus::Negative));
    assert_eq!(status("104"), Some(AuditStatus::Missing));
    assert_eq!(status("105"), Some(AuditStatus::Clean));
    assert_eq!(status("110"), Some(AuditStatus::StatAnomaly));
    assert_eq!(status("111"), Some(AuditStatus::Missing));
    assert_eq!(status("112"), Some(AuditStatus::Outlier));

    let anomaly = find(&result, "110");
    assert!((anomaly.z_score.unwrap() - 2.0405).abs() < 1e-3);
    assert_eq!(anomaly.required_action, Some(RequiredAction::SupervisorCheck));
    assert_eq!(find(&result, "102").required_action, Some(RequiredAction::UrgentRecount));
    assert_eq!(find(&result, "112").required_action, Some(RequiredAction::None));
}

#[tokio::test]
async fn remediation_imputes_and_floors() {
    let result = run(sample_records(), make_request(None)).await;

    assert_eq!(find(&result, "101").cleaned_value, Some(50.0));
    assert_eq!(find(&result, "102").cleaned_value, Some(0.0));
    assert_eq!(find(&result, "111").cleaned_value, Some(80.0));
    assert_eq!(find(&result, "104").cleaned_value, Some(59.0));

    // Originals survive remediation.
    assert_eq!(find(&result, "102").stock_count, Some(-5.0));
    assert_eq!(find(&result, "111").stock_count, None);
    assert!(result
        .selected_candidates
        .iter()
        .all(|c| c.cleaned_value.map_or(false, |v| v >= 0.0)));
}

#[tokio::test]
async fn zero_policy_for_empty_category() {
    let config = AuditConfig {
        missing_group_policy: MissingGroupPolicy::Zero,
        ..AuditConfig::default()
    };
    let result = InventoryAuditPipeline::new(sample_records(), &config)
        .execute(make_request(None))
        .await;

    assert_eq!(find(&result, "104").cleaned_value, Some(0.0));
    assert_eq!(find(&result, "111").cleaned_value, Some(80.0));
}

#[tokio::test]
async fn selection_is_ranked_by_value_and_tiered() {
    let result = run(sample_records(), make_request(None)).await;

    let order: Vec<&str> = result
        .selected_candidates
        .iter()
        .map(|c| c.item_id.as_str())
        .collect();
    assert_eq!(
        order,
        vec!["101", "112", "110", "111", "104", "105", "109", "108", "107", "106", "102"]
    );

    let classes: Vec<AbcClass> = result
        .selected_candidates
        .iter()
        .map(|c| c.abc_class.unwrap())
        .collect();
    assert_eq!(classes.iter().filter(|c| **c == AbcClass::A).count(), 2);
    assert_eq!(classes.iter().filter(|c| **c == AbcClass::B).count(), 5);
    assert_eq!(classes.iter().filter(|c| **c == AbcClass::C).count(), 4);

    let pcts: Vec<f64> = result
        .selected_candidates
        .iter()
        .map(|c| c.cumulative_pct.unwrap())
        .collect();
    assert!(pcts.windows(2).all(|w| w[1] >= w[0]));
    assert!(approx(*pcts.last().unwrap(), 100.0));
}

#[tokio::test]
async fn value_at_risk_covers_flagged_items_only() {
    let result = run(sample_records(), make_request(None)).await;

    assert!(approx(find(&result, "101").total_value.unwrap(), 12_499.5));
    assert_eq!(find(&result, "101").value_at_risk, Some(0.0));
    assert_eq!(find(&result, "112").value_at_risk, Some(10_000.0));

    let summary = AuditSummary::from_items(&result.query, &result.selected_candidates);
    assert_eq!(summary.total_records, 11);
    assert_eq!(summary.flagged_records, 5);
    assert_eq!(summary.clean_records, 6);
    assert_eq!(summary.urgent_recounts(), 3);
    assert_eq!(summary.status_count(AuditStatus::Missing), 2);
    assert_eq!(summary.abc_count(AbcClass::A), 2);
    assert!(approx(summary.total_value, 30_548.91));
    assert!(approx(summary.value_at_risk, 14_779.41));
}

#[tokio::test]
async fn coverage_where_sales_are_known() {
    let result = run(sample_records(), make_request(None)).await;

    let laptop = find(&result, "101");
    assert_eq!(laptop.days_on_hand, Some(12.5));
    assert_eq!(laptop.coverage_status, Some(CoverageStatus::Optimal));
    assert_eq!(find(&result, "106").coverage_status, Some(CoverageStatus::StockoutRisk));
    assert_eq!(find(&result, "112").coverage_status, Some(CoverageStatus::DeadStock));

    // Zero sales rate: logged, coverage left unset, rest of the record intact.
    let stalled = find(&result, "105");
    assert_eq!(stalled.days_on_hand, None);
    assert_eq!(stalled.audit_status, Some(AuditStatus::Clean));

    assert_eq!(find(&result, "107").coverage_status, None);
}

#[tokio::test]
async fn category_filter_keeps_batch_statistics() {
    let result = run(sample_records(), make_request(Some(vec!["Toys", "Home"]))).await;

    assert_eq!(result.retrieved_candidates.len(), 11);
    assert_eq!(result.filtered_candidates.len(), 7);
    assert_eq!(result.selected_candidates.len(), 4);
    assert!(result
        .filtered_candidates
        .iter()
        .all(|c| c.category == "Electronics" || c.category == "Bulk"));

    // The Toys fallback still uses the whole batch.
    assert_eq!(find(&result, "104").cleaned_value, Some(59.0));

    // Tiers are recomputed over the narrowed selection.
    let top = &result.selected_candidates[0];
    assert_eq!(top.item_id, "111");
    assert_eq!(top.abc_class, Some(AbcClass::A));
}

#[tokio::test]
async fn documented_three_record_example() {
    let records = vec![
        record("1", Some(50.0), "A", 10.0, None),
        record("2", Some(-5.0), "A", 10.0, None),
        record("3", None, "A", 10.0, None),
    ];
    let result = run(records, make_request(None)).await;

    let by_id = |id: &str| find(&result, id);
    assert_eq!(by_id("1").audit_status, Some(AuditStatus::Clean));
    assert_eq!(by_id("2").audit_status, Some(AuditStatus::Negative));
    assert_eq!(by_id("3").audit_status, Some(AuditStatus::Missing));
    assert_eq!(by_id("1").cleaned_value, Some(50.0));
    assert_eq!(by_id("2").cleaned_value, Some(0.0));
    assert_eq!(by_id("3").cleaned_value, Some(50.0));
    assert_eq!(by_id("1").required_action, Some(RequiredAction::None));
    assert_eq!(by_id("2").required_action, Some(RequiredAction::UrgentRecount));
    assert_eq!(by_id("3").required_action, Some(RequiredAction::UrgentRecount));
}

#[tokio::test]
async fn caller_timestamp_is_kept() {
    let request = AuditRequest {
        run_timestamp: "2025-01-10T08:00:00Z".into(),
        ..make_request(None)
    };
    let result = run(sample_records(), request).await;
    assert_eq!(result.query.run_timestamp, "2025-01-10T08:00:00Z");
}

#[tokio::test]
async fn empty_inventory_yields_empty_result() {
    let result = run(Vec::new(), make_request(None)).await;
    assert!(result.retrieved_candidates.is_empty());
    assert!(result.selected_candidates.is_empty());
}

// ---------------------------------------------------------------------------
// File round trips
// ---------------------------------------------------------------------------

#[tokio::test]
async fn template_bootstrap_runs_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.csv");

    let (records, created) = load_or_create_template(&path).unwrap();
    assert!(created);

    let result = run(records, make_request(None)).await;
    assert_eq!(result.selected_candidates.len(), 5);
    assert_eq!(find(&result, "102").audit_status, Some(AuditStatus::Negative));
    assert_eq!(find(&result, "104").audit_status, Some(AuditStatus::Missing));
    assert_eq!(find(&result, "102").cleaned_value, Some(0.0));
    assert_eq!(find(&result, "104").cleaned_value, Some(80.0));

    let report_path = dir.path().join("audit_report.csv");
    write_report_csv(&report_path, &result.selected_candidates).unwrap();
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(report.lines().count(), 6);
    assert_eq!(report.lines().filter(|l| l.ends_with(",red")).count(), 2);
}

#[tokio::test]
async fn csv_input_with_blank_cells() {
    let csv_data = "\
item_id,stock_count,category,unit_price,last_audit,daily_sales
A1,10,Tools,3.5,2025-01-02,2
A2,,Tools,4,,
A3,NA,Tools,1,,
";
    let records = load_inventory(csv_data.as_bytes()).unwrap();
    let result = run(records, make_request(None)).await;

    assert_eq!(find(&result, "A2").audit_status, Some(AuditStatus::Missing));
    assert_eq!(find(&result, "A3").audit_status, Some(AuditStatus::Missing));
    assert_eq!(find(&result, "A3").cleaned_value, Some(10.0));
    assert_eq!(find(&result, "A1").days_on_hand, Some(5.0));
}

#[tokio::test]
async fn non_finite_cells_are_audited_as_missing() {
    let csv_data = "\
item_id,stock_count,category,unit_price
A1,10,Tools,1
A2,12,Tools,1
A3,11,Tools,1
A4,9,Tools,1
A5,900,Tools,1
A6,inf,Tools,1
B1,-nan,Home,1
B2,5,Home,1
";
    let records = load_inventory(csv_data.as_bytes()).unwrap();
    let result = run(records, make_request(None)).await;

    let b1 = find(&result, "B1");
    assert_eq!(b1.audit_status, Some(AuditStatus::Missing));
    assert_eq!(b1.cleaned_value, Some(5.0));

    let a6 = find(&result, "A6");
    assert_eq!(a6.audit_status, Some(AuditStatus::Missing));
    assert_eq!(a6.cleaned_value, Some(11.0));

    // 900 against the five finite Tools counts: z is about 1.79.
    let a5 = find(&result, "A5");
    let z = a5.z_score.unwrap();
    assert!(z > 1.78 && z < 1.80, "z = {}", z);
    assert_eq!(a5.audit_status, Some(AuditStatus::StatAnomaly));

    // Grand total is 963, so the top item holds about 93.5% and is not tail stock.
    assert!(approx(a5.cumulative_pct.unwrap(), 900.0 * 100.0 / 963.0));
    assert_eq!(a5.abc_class, Some(AbcClass::B));
    assert!(result
        .selected_candidates
        .iter()
        .all(|c| c.cumulative_pct.map_or(false, f64::is_finite)));
    assert!(result
        .selected_candidates
        .iter()
        .any(|c| c.abc_class != Some(AbcClass::C)));
}
