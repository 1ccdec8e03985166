use async_trait::async_trait;

use crate::config::AuditConfig;
use crate::coverage::{classify_coverage, days_on_hand};
use crate::error::AuditResult;
use crate::hydrator::Hydrator;
use crate::types::{AuditRequest, AuditedItem};

/// Days on hand and coverage band from the cleaned count and daily sales.
///
/// Records without a sales rate get no coverage. A zero or negative rate is
/// logged per record and leaves coverage unset; it does not fail the batch.
pub struct CoverageHydrator {
    config: AuditConfig,
}

impl CoverageHydrator {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }
}

impl Default for CoverageHydrator {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

#[async_trait]
impl Hydrator<AuditRequest, AuditedItem> for CoverageHydrator {
    async fn hydrate(
        &self,
        query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        let hydrated = candidates
            .iter()
            .map(|c| {
                let (Some(cleaned), Some(rate)) = (c.cleaned_value, c.daily_sales) else {
                    return AuditedItem::default();
                };
                match days_on_hand(&c.item_id, cleaned, rate) {
                    Ok(days) => AuditedItem {
                        days_on_hand: Some(days),
                        coverage_status: Some(classify_coverage(days, &self.config)),
                        ..AuditedItem::default()
                    },
                    Err(err) => {
                        log::error!("request_id={} {}", query.request_id, err);
                        AuditedItem::default()
                    }
                }
            })
            .collect();

        Ok(hydrated)
    }

    fn update(&self, candidate: &mut AuditedItem, hydrated: AuditedItem) {
        candidate.days_on_hand = hydrated.days_on_hand;
        candidate.coverage_status = hydrated.coverage_status;
    }
}
