use async_trait::async_trait;

use crate::error::AuditResult;
use crate::scorer::Scorer;
use crate::types::{AuditRequest, AuditedItem};

/// Prices the cleaned stock and the share of it that sits on a flagged record.
///
/// `total_value = cleaned_value x unit_price`, where a missing or negative
/// price counts as zero. `value_at_risk` equals `total_value` for any record
/// whose audit status is not `CLEAN`, and zero otherwise.
pub struct ValueAtRiskScorer;

pub fn total_value(cleaned_value: Option<f64>, unit_price: Option<f64>) -> f64 {
    let price = unit_price.filter(|p| p.is_finite()).unwrap_or(0.0).max(0.0);
    cleaned_value.unwrap_or(0.0) * price
}

#[async_trait]
impl Scorer<AuditRequest, AuditedItem> for ValueAtRiskScorer {
    async fn score(
        &self,
        _query: &AuditRequest,
        candidates: &[AuditedItem],
    ) -> AuditResult<Vec<AuditedItem>> {
        let scored = candidates
            .iter()
            .map(|c| {
                let total = total_value(c.cleaned_value, c.unit_price);
                let at_risk = if c.is_flagged() { total } else { 0.0 };
                AuditedItem {
                    total_value: Some(total),
                    value_at_risk: Some(at_risk),
                    ..AuditedItem::default()
                }
            })
            .collect();

        Ok(scored)
    }

    fn update(&self, candidate: &mut AuditedItem, scored: AuditedItem) {
        candidate.total_value = scored.total_value;
        candidate.value_at_risk = scored.value_at_risk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditStatus;

    #[test]
    fn bad_prices_count_as_zero() {
        assert_eq!(total_value(Some(10.0), Some(2.5)), 25.0);
        assert_eq!(total_value(Some(10.0), None), 0.0);
        assert_eq!(total_value(Some(10.0), Some(-3.0)), 0.0);
        assert_eq!(total_value(None, Some(3.0)), 0.0);
    }

    #[tokio::test]
    async fn only_flagged_records_carry_risk() {
        let candidates = vec![
            AuditedItem {
                cleaned_value: Some(50.0),
                unit_price: Some(10.0),
                audit_status: Some(AuditStatus::Clean),
                ..AuditedItem::default()
            },
            AuditedItem {
                cleaned_value: Some(50.0),
                unit_price: Some(10.0),
                audit_status: Some(AuditStatus::Missing),
                ..AuditedItem::default()
            },
        ];

        let scored = ValueAtRiskScorer
            .score(&AuditRequest::default(), &candidates)
            .await
            .unwrap();
        assert_eq!(scored[0].total_value, Some(500.0));
        assert_eq!(scored[0].value_at_risk, Some(0.0));
        assert_eq!(scored[1].value_at_risk, Some(500.0));
    }
}
