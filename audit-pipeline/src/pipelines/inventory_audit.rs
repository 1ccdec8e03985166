use async_trait::async_trait;
use std::sync::Arc;

use crate::candidate_pipeline::CandidatePipeline;
use crate::components::abc_class_hydrator::AbcClassHydrator;
use crate::components::action_mapping_hydrator::ActionMappingHydrator;
use crate::components::audit_summary_side_effect::AuditSummaryLogSideEffect;
use crate::components::category_filter::CategoryFilter;
use crate::components::coverage_hydrator::CoverageHydrator;
use crate::components::inventory_source::InventorySource;
use crate::components::median_remediation_hydrator::MedianRemediationHydrator;
use crate::components::quality_audit_hydrator::QualityAuditHydrator;
use crate::components::run_context_query_hydrator::RunContextQueryHydrator;
use crate::components::value_at_risk_scorer::ValueAtRiskScorer;
use crate::components::value_rank_selector::ValueRankSelector;
use crate::config::AuditConfig;
use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::inventory_loader::InventoryRecord;
use crate::query_hydrator::QueryHydrator;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::SideEffect;
use crate::source::Source;
use crate::types::{AuditRequest, AuditedItem};

/// The inventory data-quality audit.
///
/// Pipeline flow:
/// 1. RunContextQueryHydrator stamps the run time
/// 2. InventorySource emits one candidate per record
/// 3. QualityAuditHydrator computes per-category z-scores and statuses
/// 4. MedianRemediationHydrator fills the cleaned count
/// 5. ActionMappingHydrator maps status to the required action
/// 6. CoverageHydrator computes days on hand where sales are known
/// 7. CategoryFilter narrows to the requested categories
/// 8. ValueAtRiskScorer prices stock and flagged stock
/// 9. ValueRankSelector orders by total value
/// 10. AbcClassHydrator tiers the ranked list
/// 11. AuditSummaryLogSideEffect logs the KPIs
///
/// Hydrators 3-6 are order-dependent and run sequentially.
pub struct InventoryAuditPipeline {
    query_hydrators: Vec<Box<dyn QueryHydrator<AuditRequest>>>,
    sources: Vec<Box<dyn Source<AuditRequest, AuditedItem>>>,
    hydrators: Vec<Box<dyn Hydrator<AuditRequest, AuditedItem>>>,
    filters: Vec<Box<dyn Filter<AuditRequest, AuditedItem>>>,
    scorers: Vec<Box<dyn Scorer<AuditRequest, AuditedItem>>>,
    selector: ValueRankSelector,
    post_selection_hydrators: Vec<Box<dyn Hydrator<AuditRequest, AuditedItem>>>,
    post_selection_filters: Vec<Box<dyn Filter<AuditRequest, AuditedItem>>>,
    side_effects: Arc<Vec<Box<dyn SideEffect<AuditRequest, AuditedItem>>>>,
    result_size: usize,
}

impl InventoryAuditPipeline {
    /// Audit `records` with default thresholds.
    pub fn with_inventory(records: Vec<InventoryRecord>) -> Self {
        Self::new(records, &AuditConfig::default())
    }

    pub fn new(records: Vec<InventoryRecord>, config: &AuditConfig) -> Self {
        let query_hydrators: Vec<Box<dyn QueryHydrator<AuditRequest>>> =
            vec![Box::new(RunContextQueryHydrator)];

        let sources: Vec<Box<dyn Source<AuditRequest, AuditedItem>>> =
            vec![Box::new(InventorySource::new(records))];

        let hydrators: Vec<Box<dyn Hydrator<AuditRequest, AuditedItem>>> = vec![
            Box::new(QualityAuditHydrator::new(config)),
            Box::new(MedianRemediationHydrator::new(config.missing_group_policy)),
            Box::new(ActionMappingHydrator),
            Box::new(CoverageHydrator::new(config.clone())),
        ];

        let filters: Vec<Box<dyn Filter<AuditRequest, AuditedItem>>> =
            vec![Box::new(CategoryFilter)];

        let scorers: Vec<Box<dyn Scorer<AuditRequest, AuditedItem>>> =
            vec![Box::new(ValueAtRiskScorer)];

        let post_selection_hydrators: Vec<Box<dyn Hydrator<AuditRequest, AuditedItem>>> =
            vec![Box::new(AbcClassHydrator::new(config.clone()))];

        let side_effects: Arc<Vec<Box<dyn SideEffect<AuditRequest, AuditedItem>>>> =
            Arc::new(vec![Box::new(AuditSummaryLogSideEffect)]);

        Self {
            query_hydrators,
            sources,
            hydrators,
            filters,
            scorers,
            selector: ValueRankSelector::default(),
            post_selection_hydrators,
            post_selection_filters: Vec::new(),
            side_effects,
            result_size: usize::MAX,
        }
    }
}

#[async_trait]
impl CandidatePipeline<AuditRequest, AuditedItem> for InventoryAuditPipeline {
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<AuditRequest>>] {
        &self.query_hydrators
    }

    fn sources(&self) -> &[Box<dyn Source<AuditRequest, AuditedItem>>] {
        &self.sources
    }

    fn hydrators(&self) -> &[Box<dyn Hydrator<AuditRequest, AuditedItem>>] {
        &self.hydrators
    }

    fn filters(&self) -> &[Box<dyn Filter<AuditRequest, AuditedItem>>] {
        &self.filters
    }

    fn scorers(&self) -> &[Box<dyn Scorer<AuditRequest, AuditedItem>>] {
        &self.scorers
    }

    fn selector(&self) -> &dyn Selector<AuditRequest, AuditedItem> {
        &self.selector
    }

    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<AuditRequest, AuditedItem>>] {
        &self.post_selection_hydrators
    }

    fn post_selection_filters(&self) -> &[Box<dyn Filter<AuditRequest, AuditedItem>>] {
        &self.post_selection_filters
    }

    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<AuditRequest, AuditedItem>>>> {
        Arc::clone(&self.side_effects)
    }

    fn result_size(&self) -> usize {
        self.result_size
    }
}
