pub mod abc_class_hydrator;
pub mod action_mapping_hydrator;
pub mod audit_summary_side_effect;
pub mod category_filter;
pub mod coverage_hydrator;
pub mod inventory_source;
pub mod median_remediation_hydrator;
pub mod quality_audit_hydrator;
pub mod run_context_query_hydrator;
pub mod value_at_risk_scorer;
pub mod value_rank_selector;
