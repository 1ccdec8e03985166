use async_trait::async_trait;

use crate::abc::classify_abc;
use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::hydrator::Hydrator;
use crate::types::{AuditRequest, AuditedItem};

/// Assigns ABC tiers over the selected batch.
///
/// Runs after selection so the cumulative share is taken over exactly the
/// records that end up in the report. Ranking is stable, so a batch already
/// ordered by `ValueRankSelector` keeps its order.
pub struct AbcClassHydrator {
    config: AuditConfig,
}

impl AbcClassHydrator {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }
}

impl Default for AbcClassHydrator {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

#[async_trait]
impl Hydrator<AuditRequest, AuditedItem> for AbcClassHydrator {
    async fn hydrate(
        &self,
        _query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        let values: Vec<f64> = candidates
            .iter()
            .map(|c| c.total_value.unwrap_or(0.0))
            .collect();

        let mut hydrated = vec![AuditedItem::default(); candidates.len()];
        for assignment in classify_abc(&values, &self.config) {
            let slot = &mut hydrated[assignment.index];
            slot.cumulative_pct = Some(assignment.cumulative_pct);
            slot.abc_class = Some(assignment.class);
        }

        Ok(hydrated)
    }

    fn update(&self, candidate: &mut AuditedItem, hydrated: AuditedItem) {
        candidate.cumulative_pct = hydrated.cumulative_pct;
        candidate.abc_class = hydrated.abc_class;
    }
}
