use async_trait::async_trait;

use crate::error::AuditResult;
use crate::inventory_loader::InventoryRecord;
use crate::source::Source;
use crate::types::{AuditRequest, AuditedItem};

/// Turns a loaded inventory batch into pipeline candidates.
///
/// The whole batch is emitted regardless of the requested categories;
/// restriction happens in `CategoryFilter`.
pub struct InventorySource {
    records: Vec<InventoryRecord>,
}

impl InventorySource {
    pub fn new(records: Vec<InventoryRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Source<AuditRequest, AuditedItem> for InventorySource {
    fn enable(&self, _query: &AuditRequest) -> bool {
        !self.records.is_empty()
    }

    async fn get_candidates(&self, _query: &AuditRequest) -> AuditResult<Vec<AuditedItem>> {
        Ok(self.records.iter().map(AuditedItem::from).collect())
    }
}
