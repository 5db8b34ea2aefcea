//! Route construction by pseudo-random-proportional choice
//!
//! Each step scores the outgoing segments of the current segment with
//! `pheromone^alpha * heuristic^beta * reliability^gamma * density^delta`
//! (times a speed term that the default `epsilon = 0` switches off), floors
//! the score, normalizes over the segments not yet on the route and picks
//! one: the best with probability `q0`, otherwise a weighted sample.

use super::{Route, RouteOutcome, Termination};
use crate::config::AcoConfig;
use crate::diagnostics::{DiagnosticsSink, RouteEvent, SelectionMode};
use crate::network::{NetworkGraph, SegmentId};
use crate::pheromone::PheromoneStore;
use crate::quality::LinkQualityEstimator;
use crate::traffic::TrafficSnapshot;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// One scored next-segment option
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub segment: SegmentId,
    /// Floored preference score
    pub score: f64,
    /// Normalized selection probability
    pub probability: f64,
}

/// Normalized options for one step, in outgoing-segment order
#[derive(Debug, Clone, PartialEq)]
pub struct StepCandidates {
    candidates: Vec<Candidate>,
}

impl StepCandidates {
    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn total_probability(&self) -> f64 {
        self.candidates.iter().map(|c| c.probability).sum()
    }

    /// Highest probability; ties go to the earliest candidate
    pub fn best(&self) -> Option<&Candidate> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates {
            if best.map_or(true, |b| candidate.probability > b.probability) {
                best = Some(candidate);
            }
        }
        best
    }
}

/// Builds routes against a shared pheromone store
pub struct RouteSelector<'a, G: NetworkGraph + ?Sized> {
    graph: &'a G,
    estimator: &'a LinkQualityEstimator,
    store: &'a PheromoneStore,
    config: &'a AcoConfig,
    sink: &'a dyn DiagnosticsSink,
}

impl<'a, G: NetworkGraph + ?Sized> RouteSelector<'a, G> {
    pub fn new(
        graph: &'a G,
        estimator: &'a LinkQualityEstimator,
        store: &'a PheromoneStore,
        config: &'a AcoConfig,
        sink: &'a dyn DiagnosticsSink,
    ) -> Self {
        Self {
            graph,
            estimator,
            store,
            config,
            sink,
        }
    }

    /// `1 / (distance + 1)`, distance measured from the start of `candidate`
    /// to the end of `destination`
    ///
    /// Siblings leaving the same junction share one value, and
    /// `heuristic(d, d)` is `1 / (length of d + 1)`.
    pub fn heuristic(&self, candidate: &SegmentId, destination: &SegmentId) -> f64 {
        let start = self.graph.endpoint_coordinates(candidate).map(|(from, _)| from);
        let target = self.graph.endpoint_coordinates(destination).map(|(_, to)| to);
        match (start, target) {
            (Some(start), Some(target)) => {
                let distance = start.distance_to(&target);
                if distance.is_finite() {
                    1.0 / (distance + 1.0)
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Floored preference score of moving onto `candidate`
    pub fn preference(
        &self,
        candidate: &SegmentId,
        destination: &SegmentId,
        traffic: &dyn TrafficSnapshot,
    ) -> f64 {
        let config = self.config;
        let signals = self.estimator.signals(self.graph, candidate, traffic);
        let pheromone = self.store.get(candidate);
        let heuristic = self.heuristic(candidate, destination);

        let mut score = pheromone.powf(config.alpha)
            * heuristic.powf(config.beta)
            * signals.reliability.powf(config.gamma)
            * signals.density.powf(config.delta);
        if config.epsilon > 0.0 {
            let speed = 1.0 + self.estimator.speed_factor(signals.mean_speed);
            score *= speed.powf(config.epsilon);
        }

        if score.is_finite() {
            score.max(config.score_floor)
        } else {
            config.score_floor
        }
    }

    /// Normalized options from `current`, skipping segments already on `route`
    pub fn candidates(
        &self,
        current: &SegmentId,
        destination: &SegmentId,
        route: &Route,
        traffic: &dyn TrafficSnapshot,
    ) -> Result<StepCandidates, Termination> {
        let outgoing = match self.graph.outgoing_segments(current) {
            Some(outgoing) if !outgoing.is_empty() => outgoing,
            _ => return Err(Termination::DeadEnd),
        };

        let mut candidates: Vec<Candidate> = outgoing
            .iter()
            .filter(|next| !route.contains(next))
            .map(|next| Candidate {
                segment: next.clone(),
                score: self.preference(next, destination, traffic),
                probability: 0.0,
            })
            .collect();
        if candidates.is_empty() {
            return Err(Termination::Loop);
        }

        let total: f64 = candidates.iter().map(|c| c.score).sum();
        let uniform = 1.0 / candidates.len() as f64;
        for candidate in &mut candidates {
            candidate.probability = if total > 0.0 && total.is_finite() {
                candidate.score / total
            } else {
                uniform
            };
        }

        Ok(StepCandidates { candidates })
    }

    /// Pick one candidate with the pseudo-random-proportional rule
    pub fn choose<R: Rng + ?Sized>(
        &self,
        step: &StepCandidates,
        rng: &mut R,
    ) -> Option<(Candidate, SelectionMode)> {
        let best = step.best()?;
        let draw: f64 = rng.gen();
        if draw < self.config.q0 {
            return Some((best.clone(), SelectionMode::Exploit));
        }

        let weights = step.candidates.iter().map(|c| c.probability);
        match WeightedIndex::new(weights) {
            Ok(dist) => {
                let picked = &step.candidates[dist.sample(rng)];
                Some((picked.clone(), SelectionMode::Explore))
            }
            Err(_) => Some((best.clone(), SelectionMode::Exploit)),
        }
    }

    /// Build a route from `start` toward `destination`
    ///
    /// Both ids are expected to exist in the graph; the engine checks this.
    pub fn select<R: Rng + ?Sized>(
        &self,
        start: &SegmentId,
        destination: &SegmentId,
        traffic: &dyn TrafficSnapshot,
        rng: &mut R,
    ) -> RouteOutcome {
        self.sink.record(RouteEvent::RouteStarted {
            start: start.clone(),
            destination: destination.clone(),
        });

        let mut route = Route::singleton(start.clone());
        let mut current = start.clone();

        while current != *destination {
            if route.len() >= self.config.hop_cap {
                return self.terminate(route, current, Termination::HopCap);
            }

            let step = match self.candidates(&current, destination, &route, traffic) {
                Ok(step) => step,
                Err(reason) => return self.terminate(route, current, reason),
            };
            let Some((choice, mode)) = self.choose(&step, rng) else {
                return self.terminate(route, current, Termination::DeadEnd);
            };
            // Visited segments never reach the candidate list
            debug_assert!(!route.contains(&choice.segment));

            self.sink.record(RouteEvent::StepChosen {
                from: current.clone(),
                to: choice.segment.clone(),
                mode,
                probability: choice.probability,
                candidates: step.len(),
            });
            route.push(choice.segment.clone());
            current = choice.segment;
        }

        self.sink.record(RouteEvent::RouteCompleted { hops: route.len() });
        RouteOutcome::Complete(route)
    }

    fn terminate(&self, route: Route, at: SegmentId, reason: Termination) -> RouteOutcome {
        self.sink.record(RouteEvent::RouteTerminated {
            at,
            hops: route.len(),
            reason,
        });
        RouteOutcome::Incomplete { route, reason }
    }
}
