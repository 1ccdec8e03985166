use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// Scorers attach numeric scores to the candidates that survived filtering.
///
/// Same contract as `Hydrator`: index-aligned output, then `update` copies
/// the scorer's own fields.
#[async_trait]
pub trait Scorer<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Decide if this scorer should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Score `candidates`, returning one output per input in the same order.
    async fn score(&self, query: &Q, candidates: &[C]) -> AuditResult<Vec<C>>;

    /// Copy only the score fields from `scored` into `candidate`.
    fn update(&self, candidate: &mut C, scored: C);

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
