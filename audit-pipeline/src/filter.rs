use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// Kept and removed halves of one filter pass.
pub struct FilterResult<C> {
    pub kept: Vec<C>,
    pub removed: Vec<C>,
}

impl<C> FilterResult<C> {
    /// Split `candidates` on `keep`, preserving order on both sides.
    pub fn partition<F>(candidates: Vec<C>, keep: F) -> Self
    where
        F: FnMut(&C) -> bool,
    {
        let (kept, removed): (Vec<C>, Vec<C>) = candidates.into_iter().partition(keep);
        Self { kept, removed }
    }
}

/// Narrows the candidate set without touching candidate fields.
///
/// Removed records are still returned to the caller in
/// `PipelineResult::filtered_candidates`; they are just not scored or
/// selected. If a filter fails, the pipeline keeps its input unchanged.
#[async_trait]
pub trait Filter<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Every input lands on exactly one side of the result.
    async fn filter(&self, query: &Q, candidates: Vec<C>) -> AuditResult<FilterResult<C>>;

    /// Component name used in log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
