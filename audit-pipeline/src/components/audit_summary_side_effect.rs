use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AuditResult;
use crate::report::AuditSummary;
use crate::side_effect::{SideEffect, SideEffectInput};
use crate::types::{AuditRequest, AuditedItem};

/// Logs the run's KPI line once selection is final.
pub struct AuditSummaryLogSideEffect;

#[async_trait]
impl SideEffect<AuditRequest, AuditedItem> for AuditSummaryLogSideEffect {
    async fn run(
        &self,
        input: Arc<SideEffectInput<AuditRequest, AuditedItem>>,
    ) -> AuditResult<()> {
        let summary = AuditSummary::from_items(&input.query, &input.selected_candidates);
        log::info!(
            "request_id={} audited {} records: {} flagged, {} urgent recounts, value at risk {:.2}",
            summary.request_id,
            summary.total_records,
            summary.flagged_records,
            summary.urgent_recounts(),
            summary.value_at_risk
        );
        Ok(())
    }
}
