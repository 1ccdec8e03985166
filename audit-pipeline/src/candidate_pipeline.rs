//! Generic staged pipeline.
//!
//! A concrete pipeline only declares its components; `execute` drives them:
//!
//! 1. query hydrators (concurrent)
//! 2. sources (concurrent, concatenated)
//! 3. hydrators (sequential)
//! 4. filters (sequential)
//! 5. scorers (sequential)
//! 6. selector
//! 7. post-selection hydrators, then post-selection filters
//! 8. side effects (concurrent, awaited)
//!
//! A failing component is logged and skipped: its fields stay unset and the
//! run continues with the candidates it was given. A hydrator or scorer that
//! returns the wrong number of outputs is treated the same way.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, warn};

use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::query_hydrator::QueryHydrator;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::{SideEffect, SideEffectInput};
use crate::source::Source;

/// Queries carry a request id so every log line of a run can be correlated.
pub trait HasRequestId {
    fn request_id(&self) -> &str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    QueryHydrator,
    Source,
    Hydrator,
    Filter,
    Scorer,
    PostSelectionHydrator,
    PostSelectionFilter,
    SideEffect,
}

/// Everything a run produced.
pub struct PipelineResult<Q, C> {
    /// All candidates after hydration, before filtering.
    pub retrieved_candidates: Vec<C>,
    /// Candidates removed by any filter.
    pub filtered_candidates: Vec<C>,
    /// Final ordered selection.
    pub selected_candidates: Vec<C>,
    pub query: Arc<Q>,
}

#[async_trait]
pub trait CandidatePipeline<Q, C>: Send + Sync
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<Q>>];
    fn sources(&self) -> &[Box<dyn Source<Q, C>>];
    fn hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn scorers(&self) -> &[Box<dyn Scorer<Q, C>>];
    fn selector(&self) -> &dyn Selector<Q, C>;
    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn post_selection_filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<Q, C>>>>;
    fn result_size(&self) -> usize;

    async fn execute(&self, query: Q) -> PipelineResult<Q, C> {
        let query = self.hydrate_query(query).await;

        let candidates = self.fetch_candidates(&query).await;
        let hydrated = run_hydrators(
            &query,
            candidates,
            self.hydrators(),
            PipelineStage::Hydrator,
        )
        .await;

        let (kept, mut filtered) =
            run_filters(&query, hydrated.clone(), self.filters(), PipelineStage::Filter).await;

        let scored = run_scorers(&query, kept, self.scorers()).await;

        let selector = self.selector();
        let selected = if selector.enable(&query) {
            selector.select(&query, scored)
        } else {
            scored
        };

        let post_hydrated = run_hydrators(
            &query,
            selected,
            self.post_selection_hydrators(),
            PipelineStage::PostSelectionHydrator,
        )
        .await;
        let (mut selected, post_filtered) = run_filters(
            &query,
            post_hydrated,
            self.post_selection_filters(),
            PipelineStage::PostSelectionFilter,
        )
        .await;
        filtered.extend(post_filtered);
        selected.truncate(self.result_size());

        let query = Arc::new(query);
        let input = Arc::new(SideEffectInput {
            query: Arc::clone(&query),
            selected_candidates: selected.clone(),
        });
        run_side_effects(self.side_effects(), input).await;

        PipelineResult {
            retrieved_candidates: hydrated,
            filtered_candidates: filtered,
            selected_candidates: selected,
            query,
        }
    }

    async fn hydrate_query(&self, query: Q) -> Q {
        let hydrators: Vec<&dyn QueryHydrator<Q>> = self
            .query_hydrators()
            .iter()
            .map(|h| &**h)
            .filter(|h| h.enable(&query))
            .collect();
        let results = join_all(hydrators.iter().map(|h| h.hydrate(&query))).await;

        let mut hydrated = query.clone();
        for (hydrator, result) in hydrators.iter().zip(results) {
            match result {
                Ok(h) => hydrator.update(&mut hydrated, h),
                Err(err) => error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    PipelineStage::QueryHydrator,
                    hydrator.name(),
                    err
                ),
            }
        }
        hydrated
    }

    async fn fetch_candidates(&self, query: &Q) -> Vec<C> {
        let sources: Vec<&dyn Source<Q, C>> = self
            .sources()
            .iter()
            .map(|s| &**s)
            .filter(|s| s.enable(query))
            .collect();
        let results = join_all(sources.iter().map(|s| s.get_candidates(query))).await;

        let mut candidates = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(mut fetched) => {
                    debug!(
                        "request_id={} stage={:?} component={} fetched {} candidates",
                        query.request_id(),
                        PipelineStage::Source,
                        source.name(),
                        fetched.len()
                    );
                    candidates.append(&mut fetched);
                }
                Err(err) => error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    PipelineStage::Source,
                    source.name(),
                    err
                ),
            }
        }
        candidates
    }
}

async fn run_hydrators<Q, C>(
    query: &Q,
    mut candidates: Vec<C>,
    hydrators: &[Box<dyn Hydrator<Q, C>>],
    stage: PipelineStage,
) -> Vec<C>
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    for hydrator in hydrators.iter().filter(|h| h.enable(query)) {
        match hydrator.hydrate(query, &candidates).await {
            Ok(hydrated) if hydrated.len() == candidates.len() => {
                for (candidate, h) in candidates.iter_mut().zip(hydrated) {
                    hydrator.update(candidate, h);
                }
            }
            Ok(hydrated) => warn!(
                "request_id={} stage={:?} component={} skipped: expected {} outputs, got {}",
                query.request_id(),
                stage,
                hydrator.name(),
                candidates.len(),
                hydrated.len()
            ),
            Err(err) => error!(
                "request_id={} stage={:?} component={} failed: {}",
                query.request_id(),
                stage,
                hydrator.name(),
                err
            ),
        }
    }
    candidates
}

async fn run_filters<Q, C>(
    query: &Q,
    mut candidates: Vec<C>,
    filters: &[Box<dyn Filter<Q, C>>],
    stage: PipelineStage,
) -> (Vec<C>, Vec<C>)
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    let mut removed = Vec::new();
    for filter in filters.iter().filter(|f| f.enable(query)) {
        let backup = candidates.clone();
        match filter.filter(query, candidates).await {
            Ok(result) => {
                candidates = result.kept;
                removed.extend(result.removed);
            }
            Err(err) => {
                error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    stage,
                    filter.name(),
                    err
                );
                candidates = backup;
            }
        }
    }
    (candidates, removed)
}

async fn run_scorers<Q, C>(
    query: &Q,
    mut candidates: Vec<C>,
    scorers: &[Box<dyn Scorer<Q, C>>],
) -> Vec<C>
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    for scorer in scorers.iter().filter(|s| s.enable(query)) {
        match scorer.score(query, &candidates).await {
            Ok(scored) if scored.len() == candidates.len() => {
                for (candidate, s) in candidates.iter_mut().zip(scored) {
                    scorer.update(candidate, s);
                }
            }
            Ok(scored) => warn!(
                "request_id={} stage={:?} component={} skipped: expected {} outputs, got {}",
                query.request_id(),
                PipelineStage::Scorer,
                scorer.name(),
                candidates.len(),
                scored.len()
            ),
            Err(err) => error!(
                "request_id={} stage={:?} component={} failed: {}",
                query.request_id(),
                PipelineStage::Scorer,
                scorer.name(),
                err
            ),
        }
    }
    candidates
}

async fn run_side_effects<Q, C>(
    side_effects: Arc<Vec<Box<dyn SideEffect<Q, C>>>>,
    input: Arc<SideEffectInput<Q, C>>,
) where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    let enabled: Vec<&dyn SideEffect<Q, C>> = side_effects
        .iter()
        .map(|se| &**se)
        .filter(|se| se.enable(Arc::clone(&input.query)))
        .collect();
    let results = join_all(enabled.iter().map(|se| se.run(Arc::clone(&input)))).await;

    for (side_effect, result) in enabled.iter().zip(results) {
        if let Err(err) = result {
            warn!(
                "request_id={} stage={:?} component={} failed: {}",
                input.query.request_id(),
                PipelineStage::SideEffect,
                side_effect.name(),
                err
            );
        }
    }
}
