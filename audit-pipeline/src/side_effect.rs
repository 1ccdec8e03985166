use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditResult;
use crate::util;

/// What a side effect sees once selection is final.
#[derive(Clone)]
pub struct SideEffectInput<Q, C> {
    pub query: Arc<Q>,
    pub selected_candidates: Vec<C>,
}

/// Work done after the result is fixed, such as summary logging.
///
/// Side effects cannot alter the selection. The pipeline awaits all of them
/// before returning and downgrades their errors to warnings.
#[async_trait]
pub trait SideEffect<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: Arc<Q>) -> bool {
        true
    }

    async fn run(&self, input: Arc<SideEffectInput<Q, C>>) -> AuditResult<()>;

    /// Component name used in log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
