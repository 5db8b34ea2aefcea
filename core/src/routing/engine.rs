//! Routing engine: one entry point for route requests
//!
//! `AntRouter` owns everything that outlives a single request:
//! - the topology provider and the validated configuration
//! - the shared `PheromoneStore`
//! - the run seed, from which every request derives its own random stream
//! - the diagnostics sink and running statistics
//!
//! A request is built by the selector, scored, and fed back into the
//! pheromone store. `build_routes` constructs many requests in parallel
//! (construction only reads pheromones) and reinforcement then runs in
//! request order, so a batch replays identically for the same seed.

use super::scorer::{QualityOutcome, RouteQualityScorer};
use super::selector::RouteSelector;
use super::{Route, RouteOutcome, Termination};
use crate::config::AcoConfig;
use crate::diagnostics::{DiagnosticsSink, RouteEvent, TracingSink};
use crate::network::{NetworkGraph, SegmentId};
use crate::pheromone::{LinkSample, PheromoneBounds, PheromoneStore, PheromoneUpdater, UpdateReport};
use crate::quality::LinkQualityEstimator;
use crate::rng::{self, RouteRng, PLANNING_STREAM};
use crate::traffic::TrafficSnapshot;
use crate::RoutingError;
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Start and destination of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: SegmentId,
    pub destination: SegmentId,
}

impl RouteRequest {
    pub fn new(start: impl Into<SegmentId>, destination: impl Into<SegmentId>) -> Self {
        Self {
            start: start.into(),
            destination: destination.into(),
        }
    }
}

/// A route together with the reinforcement it produced
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub request: RouteRequest,
    pub outcome: RouteOutcome,
    pub quality: QualityOutcome,
    pub update: UpdateReport,
}

/// Result of a multi-ant search
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyResult {
    /// Best complete route by quality, or the longest partial route if none completed
    pub best: RouteResult,
    pub ants: usize,
    pub complete_routes: usize,
}

/// Running totals for one engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub total_routes: u64,
    pub complete_routes: u64,
    pub incomplete_routes: u64,
    pub dead_ends: u64,
    pub loops: u64,
    pub hop_cap_hits: u64,
    pub degenerate_qualities: u64,
    /// Mean quality over every scored route, degenerate ones counting as 0
    pub mean_quality: f64,
    scored_routes: u64,
}

impl RoutingStats {
    fn record_outcome(&mut self, outcome: &RouteOutcome) {
        self.total_routes += 1;
        match outcome.termination() {
            None => self.complete_routes += 1,
            Some(reason) => {
                self.incomplete_routes += 1;
                match reason {
                    Termination::DeadEnd => self.dead_ends += 1,
                    Termination::Loop => self.loops += 1,
                    Termination::HopCap => self.hop_cap_hits += 1,
                }
            }
        }
    }

    fn record_quality(&mut self, quality: &QualityOutcome) {
        if quality.is_degenerate() {
            self.degenerate_qualities += 1;
        }
        self.scored_routes += 1;
        let n = self.scored_routes as f64;
        self.mean_quality += (quality.quality().value() - self.mean_quality) / n;
    }
}

/// Ant-colony routing engine over a topology provider
pub struct AntRouter<G: NetworkGraph> {
    graph: G,
    config: AcoConfig,
    estimator: LinkQualityEstimator,
    store: PheromoneStore,
    updater: PheromoneUpdater,
    sink: Arc<dyn DiagnosticsSink>,
    run_seed: u64,
    next_request: AtomicU64,
    planning_rng: Mutex<RouteRng>,
    stats: RwLock<RoutingStats>,
}

impl<G: NetworkGraph> AntRouter<G> {
    /// Create an engine; fails if the configuration is invalid
    pub fn new(graph: G, config: AcoConfig) -> Result<Self, RoutingError> {
        config.validate()?;
        let run_seed = rng::resolve_seed(config.seed);
        info!("Routing engine ready (run seed {})", run_seed);

        Ok(Self {
            graph,
            estimator: LinkQualityEstimator::new(config.quality.clone()),
            store: PheromoneStore::new(PheromoneBounds::from_config(&config)),
            updater: PheromoneUpdater::from_config(&config),
            sink: Arc::new(TracingSink),
            run_seed,
            next_request: AtomicU64::new(0),
            planning_rng: Mutex::new(rng::stream_for_request(run_seed, PLANNING_STREAM)),
            stats: RwLock::new(RoutingStats::default()),
            config,
        })
    }

    /// Replace the diagnostics sink
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }

    pub fn estimator(&self) -> &LinkQualityEstimator {
        &self.estimator
    }

    pub fn store(&self) -> &PheromoneStore {
        &self.store
    }

    /// Seed every request stream derives from; log it to replay a run
    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Current pheromone level of a segment (read-only)
    pub fn get_pheromone(&self, segment: &SegmentId) -> f64 {
        self.store.get(segment)
    }

    pub fn stats(&self) -> RoutingStats {
        self.stats.read().clone()
    }

    fn selector(&self) -> RouteSelector<'_, G> {
        RouteSelector::new(
            &self.graph,
            &self.estimator,
            &self.store,
            &self.config,
            self.sink.as_ref(),
        )
    }

    fn scorer(&self) -> RouteQualityScorer<'_, G> {
        RouteQualityScorer::new(&self.graph, &self.estimator, &self.config)
    }

    fn check_known(&self, segment: &SegmentId) -> Result<(), RoutingError> {
        if self.graph.contains(segment) {
            Ok(())
        } else {
            Err(RoutingError::UnknownSegment(segment.clone()))
        }
    }

    /// Build one route using the next request stream of the run
    pub fn select_route(
        &self,
        start: &SegmentId,
        destination: &SegmentId,
        traffic: &dyn TrafficSnapshot,
    ) -> Result<RouteOutcome, RoutingError> {
        let index = self.next_request.fetch_add(1, Ordering::Relaxed);
        let mut rng = rng::stream_for_request(self.run_seed, index);
        self.select_route_with_rng(start, destination, traffic, &mut rng)
    }

    /// Build one route with a caller-supplied random source
    pub fn select_route_with_rng<R: Rng + ?Sized>(
        &self,
        start: &SegmentId,
        destination: &SegmentId,
        traffic: &dyn TrafficSnapshot,
        rng: &mut R,
    ) -> Result<RouteOutcome, RoutingError> {
        self.check_known(start)?;
        self.check_known(destination)?;

        let outcome = self.selector().select(start, destination, traffic, rng);
        self.stats.write().record_outcome(&outcome);
        Ok(outcome)
    }

    /// Score a route under `traffic`
    pub fn score(&self, route: &Route, traffic: &dyn TrafficSnapshot) -> QualityOutcome {
        self.scorer().score(route, traffic)
    }

    /// Reinforce the segments of `route` with `quality`
    pub fn update_pheromones(
        &self,
        route: &Route,
        quality: f64,
        traffic: &dyn TrafficSnapshot,
    ) -> UpdateReport {
        let samples = self.scorer().profile(route, traffic).link_samples();
        self.update_with_samples(&samples, quality)
    }

    /// Reinforce with link conditions the caller already measured
    pub fn update_with_samples(&self, samples: &[LinkSample], quality: f64) -> UpdateReport {
        self.updater
            .update(&self.store, samples, quality, self.sink.as_ref())
    }

    /// Score `route` and reinforce it with the result
    pub fn score_then_update(
        &self,
        route: &Route,
        traffic: &dyn TrafficSnapshot,
    ) -> (QualityOutcome, UpdateReport) {
        let scorer = self.scorer();
        let profile = scorer.profile(route, traffic);
        let quality = scorer.score_profile(&profile);
        if quality.is_degenerate() {
            self.sink
                .record(RouteEvent::DegenerateQuality { hops: route.len() });
        }
        self.stats.write().record_quality(&quality);

        let update = self.update_with_samples(&profile.link_samples(), quality.quality().value());
        (quality, update)
    }

    /// Build, score and reinforce one request
    pub fn route(
        &self,
        request: &RouteRequest,
        traffic: &dyn TrafficSnapshot,
    ) -> Result<RouteResult, RoutingError> {
        let outcome = self.select_route(&request.start, &request.destination, traffic)?;
        Ok(self.reinforce(request.clone(), outcome, traffic))
    }

    fn reinforce(
        &self,
        request: RouteRequest,
        outcome: RouteOutcome,
        traffic: &dyn TrafficSnapshot,
    ) -> RouteResult {
        let (quality, update) = self.score_then_update(outcome.route(), traffic);
        RouteResult {
            request,
            outcome,
            quality,
            update,
        }
    }

    /// Construct routes for many requests in parallel without reinforcing
    ///
    /// Request `i` of the batch uses stream `base + i`, so results do not depend
    /// on thread scheduling.
    pub fn build_routes(
        &self,
        requests: &[RouteRequest],
        traffic: &dyn TrafficSnapshot,
    ) -> Vec<Result<RouteOutcome, RoutingError>> {
        let base = self
            .next_request
            .fetch_add(requests.len() as u64, Ordering::Relaxed);
        requests
            .par_iter()
            .enumerate()
            .map(|(i, request)| {
                let mut rng = rng::stream_for_request(self.run_seed, base + i as u64);
                self.select_route_with_rng(&request.start, &request.destination, traffic, &mut rng)
            })
            .collect()
    }

    /// Build requests in parallel, then score and reinforce them in order
    pub fn run_batch(
        &self,
        requests: &[RouteRequest],
        traffic: &dyn TrafficSnapshot,
    ) -> Vec<Result<RouteResult, RoutingError>> {
        self.build_routes(requests, traffic)
            .into_iter()
            .zip(requests)
            .map(|(outcome, request)| -> Result<RouteResult, RoutingError> {
                Ok(self.reinforce(request.clone(), outcome?, traffic))
            })
            .collect()
    }

    /// Send `ants` independent routes from `start` to `destination`, reinforce
    /// with each, and keep the best
    pub fn colony_search(
        &self,
        start: &SegmentId,
        destination: &SegmentId,
        traffic: &dyn TrafficSnapshot,
        ants: usize,
    ) -> Result<ColonyResult, RoutingError> {
        if ants == 0 {
            return Err(RoutingError::InvalidRequest(
                "colony search needs at least one ant".to_string(),
            ));
        }
        self.check_known(start)?;
        self.check_known(destination)?;

        let requests = vec![RouteRequest::new(start.clone(), destination.clone()); ants];
        let mut best: Option<RouteResult> = None;
        let mut complete_routes = 0;

        for result in self.run_batch(&requests, traffic) {
            let result = result?;
            if result.outcome.is_complete() {
                complete_routes += 1;
            }
            let better = match &best {
                None => true,
                Some(current) => ranks_above(&result, current),
            };
            if better {
                best = Some(result);
            }
        }

        let best = best.ok_or_else(|| {
            RoutingError::InvalidRequest("colony search produced no routes".to_string())
        })?;
        Ok(ColonyResult {
            best,
            ants,
            complete_routes,
        })
    }

    /// Route `count` requests between random endpoints drawn from `endpoints`
    pub fn generate(
        &self,
        count: usize,
        endpoints: &[SegmentId],
        traffic: &dyn TrafficSnapshot,
    ) -> Result<Vec<RouteResult>, RoutingError> {
        if endpoints.is_empty() {
            return Err(RoutingError::InvalidRequest(
                "no endpoints to draw requests from".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(count);
        for i in 0..count {
            let request = {
                let mut planning = self.planning_rng.lock();
                let start = endpoints.choose(&mut *planning).cloned();
                let destination = endpoints.choose(&mut *planning).cloned();
                match (start, destination) {
                    (Some(start), Some(destination)) => RouteRequest { start, destination },
                    _ => break,
                }
            };
            results.push(self.route(&request, traffic)?);

            if i % 10 == 0 {
                info!("Generated {}/{} routes", i + 1, count);
            }
        }
        Ok(results)
    }
}

/// Complete beats incomplete; among complete, higher quality; among incomplete, longer
fn ranks_above(candidate: &RouteResult, current: &RouteResult) -> bool {
    match (candidate.outcome.is_complete(), current.outcome.is_complete()) {
        (true, false) => true,
        (false, true) => false,
        (true, true) => candidate.quality.quality() > current.quality.quality(),
        (false, false) => candidate.outcome.route().len() > current.outcome.route().len(),
    }
}
