use crate::selector::Selector;
use crate::types::{AuditRequest, AuditedItem};

/// Orders the batch by total stock value, highest first.
///
/// Keeps every candidate unless a limit is set; ABC tiering needs the full
/// ranked list.
#[derive(Default)]
pub struct ValueRankSelector {
    pub limit: Option<usize>,
}

impl Selector<AuditRequest, AuditedItem> for ValueRankSelector {
    fn score(&self, candidate: &AuditedItem) -> f64 {
        candidate.total_value.unwrap_or(0.0)
    }

    fn size(&self) -> Option<usize> {
        self.limit
    }
}
