use async_trait::async_trait;

use crate::config::MissingGroupPolicy;
use crate::error::AuditResult;
use crate::hydrator::Hydrator;
use crate::remediator::Remediator;
use crate::types::{AuditRequest, AuditedItem};

/// Fills `cleaned_value`: category-median imputation, floored at zero.
pub struct MedianRemediationHydrator {
    remediator: Remediator,
}

impl MedianRemediationHydrator {
    pub fn new(policy: MissingGroupPolicy) -> Self {
        Self {
            remediator: Remediator::new(policy),
        }
    }
}

impl Default for MedianRemediationHydrator {
    fn default() -> Self {
        Self::new(MissingGroupPolicy::default())
    }
}

#[async_trait]
impl Hydrator<AuditRequest, AuditedItem> for MedianRemediationHydrator {
    async fn hydrate(
        &self,
        _query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        let observations: Vec<(&str, Option<f64>)> =
            candidates.iter().map(AuditedItem::observation).collect();

        Ok(self
            .remediator
            .remediate(&observations)
            .into_iter()
            .map(|cleaned| AuditedItem {
                cleaned_value: Some(cleaned),
                ..AuditedItem::default()
            })
            .collect())
    }

    fn update(&self, candidate: &mut AuditedItem, hydrated: AuditedItem) {
        candidate.cleaned_value = hydrated.cleaned_value;
    }
}
