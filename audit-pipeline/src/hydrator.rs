use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// Hydrators derive new fields for every candidate.
///
/// Hydrators run one after another in declaration order, so a hydrator may
/// read fields written by the ones before it. `hydrate` must return exactly
/// one output per input, in the same order; the pipeline then calls `update`
/// to copy this hydrator's fields onto the live candidate. Inputs are never
/// mutated by `hydrate` itself.
#[async_trait]
pub trait Hydrator<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Decide if this hydrator should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Compute hydrated copies of `candidates`, index-aligned with the input.
    async fn hydrate(&self, query: &Q, candidates: &[C]) -> AuditResult<Vec<C>>;

    /// Copy only the fields this hydrator owns from `hydrated` into `candidate`.
    fn update(&self, candidate: &mut C, hydrated: C);

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
