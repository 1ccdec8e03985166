use async_trait::async_trait;

use crate::actions::required_action;
use crate::error::AuditResult;
use crate::hydrator::Hydrator;
use crate::types::{AuditRequest, AuditedItem};

/// Maps each audit status to its required follow-up.
///
/// Runs after `QualityAuditHydrator`. Candidates without a status (the audit
/// stage failed) get no action.
pub struct ActionMappingHydrator;

#[async_trait]
impl Hydrator<AuditRequest, AuditedItem> for ActionMappingHydrator {
    async fn hydrate(
        &self,
        _query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        Ok(candidates
            .iter()
            .map(|c| AuditedItem {
                required_action: c.audit_status.map(required_action),
                ..AuditedItem::default()
            })
            .collect())
    }

    fn update(&self, candidate: &mut AuditedItem, hydrated: AuditedItem) {
        candidate.required_action = hydrated.required_action;
    }
}
