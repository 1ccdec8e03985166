use async_trait::async_trait;

use crate::auditor::QualityAuditor;
use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::hydrator::Hydrator;
use crate::types::{AuditRequest, AuditedItem};

/// Attaches the per-category z-score and audit status.
pub struct QualityAuditHydrator {
    auditor: QualityAuditor,
}

impl QualityAuditHydrator {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            auditor: QualityAuditor::new(config),
        }
    }
}

impl Default for QualityAuditHydrator {
    fn default() -> Self {
        Self::new(&AuditConfig::default())
    }
}

#[async_trait]
impl Hydrator<AuditRequest, AuditedItem> for QualityAuditHydrator {
    async fn hydrate(
        &self,
        _query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        let observations: Vec<(&str, Option<f64>)> =
            candidates.iter().map(AuditedItem::observation).collect();

        let hydrated = self
            .auditor
            .audit(&observations)
            .into_iter()
            .map(|outcome| AuditedItem {
                z_score: Some(outcome.z_score),
                audit_status: Some(outcome.status),
                ..AuditedItem::default()
            })
            .collect();

        Ok(hydrated)
    }

    fn update(&self, candidate: &mut AuditedItem, hydrated: AuditedItem) {
        candidate.z_score = hydrated.z_score;
        candidate.audit_status = hydrated.audit_status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditStatus;

    fn item(id: &str, count: Option<f64>, category: &str) -> AuditedItem {
        AuditedItem {
            item_id: id.to_string(),
            category: category.to_string(),
            stock_count: count,
            unit_price: Some(10.0),
            ..AuditedItem::default()
        }
    }

    #[tokio::test]
    async fn classifies_each_candidate() {
        let candidates = vec![
            item("1", Some(50.0), "A"),
            item("2", Some(-5.0), "A"),
            item("3", None, "A"),
        ];
        let hydrator = QualityAuditHydrator::default();
        let hydrated = hydrator
            .hydrate(&AuditRequest::default(), &candidates)
            .await
            .unwrap();

        let statuses: Vec<Option<AuditStatus>> = hydrated.iter().map(|h| h.audit_status).collect();
        assert_eq!(
            statuses,
            vec![
                Some(AuditStatus::Clean),
                Some(AuditStatus::Negative),
                Some(AuditStatus::Missing)
            ]
        );
        assert_eq!(hydrated[2].z_score, Some(0.0));
    }

    #[tokio::test]
    async fn update_leaves_inputs_alone() {
        let hydrator = QualityAuditHydrator::default();
        let mut candidate = item("9", Some(5000.0), "Z");
        let hydrated = hydrator
            .hydrate(&AuditRequest::default(), std::slice::from_ref(&candidate))
            .await
            .unwrap();

        hydrator.update(&mut candidate, hydrated.into_iter().next().unwrap());
        assert_eq!(candidate.audit_status, Some(AuditStatus::Outlier));
        assert_eq!(candidate.stock_count, Some(5000.0));
        assert_eq!(candidate.item_id, "9");
    }
}
