use async_trait::async_trait;

use crate::error::AuditResult;
use crate::filter::{Filter, FilterResult};
use crate::types::{AuditRequest, AuditedItem};

/// Keeps only the categories named in the request.
///
/// Runs after the hydrators, so z-scores and medians were already computed
/// over the full batch. Category names match case-insensitively.
pub struct CategoryFilter;

#[async_trait]
impl Filter<AuditRequest, AuditedItem> for CategoryFilter {
    fn enable(&self, query: &AuditRequest) -> bool {
        query.categories.is_some()
    }

    async fn filter(
        &self,
        query: &AuditRequest,
        candidates: Vec<AuditedItem>,
    ) -> AuditResult<FilterResult<AuditedItem>> {
        let Some(categories) = &query.categories else {
            return Ok(FilterResult {
                kept: candidates,
                removed: Vec::new(),
            });
        };

        Ok(FilterResult::partition(candidates, |c| {
            categories
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(&c.category))
        }))
    }
}
