use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// Fills request-level context (run timestamp, defaults) before any record
/// is fetched.
///
/// All enabled query hydrators see the original request and run at once.
/// Their outputs are merged through `update`, so two hydrators must not own
/// the same field.
#[async_trait]
pub trait QueryHydrator<Q>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    async fn hydrate(&self, query: &Q) -> AuditResult<Q>;

    /// Move the fields this hydrator owns from `hydrated` into `query`.
    fn update(&self, query: &mut Q, hydrated: Q);

    /// Component name used in log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
