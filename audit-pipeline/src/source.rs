use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// Produces the records a run starts from.
///
/// Every enabled source is polled at once; the pipeline concatenates what
/// they return in the order the sources are declared. A source that fails
/// contributes nothing and the run goes on with the others.
#[async_trait]
pub trait Source<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    async fn get_candidates(&self, query: &Q) -> AuditResult<Vec<C>>;

    /// Component name used in log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
