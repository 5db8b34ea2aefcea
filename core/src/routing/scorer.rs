//! Route quality
//!
//! `quality = 1 / (total_length * (1 - mean_reliability)^gamma * (1 - mean_density)^delta)`
//!
//! Short, reliable, uncongested routes score high. Inputs that would blow the
//! division up (empty route, zero length, a factor at zero) produce a
//! `Degenerate` outcome whose quality is 0.

use super::Route;
use crate::config::AcoConfig;
use crate::network::{NetworkGraph, SegmentId};
use crate::pheromone::LinkSample;
use crate::quality::{LinkQualityEstimator, QualitySignals};
use crate::traffic::TrafficSnapshot;

/// Denominators below this count as zero
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Scalar route quality, always >= 0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct RouteQuality(f64);

impl RouteQuality {
    pub const ZERO: RouteQuality = RouteQuality(0.0);

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Why quality could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    EmptyRoute,
    ZeroLength,
    /// Reliability or density reached 1, or the product underflowed
    ZeroFactor,
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityOutcome {
    Scored(RouteQuality),
    Degenerate(DegenerateReason),
}

impl QualityOutcome {
    /// Quality to deposit; 0 when degenerate
    pub fn quality(&self) -> RouteQuality {
        match self {
            Self::Scored(quality) => *quality,
            Self::Degenerate(_) => RouteQuality::ZERO,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate(_))
    }
}

/// Per-segment measurements of a route under one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProfile {
    pub total_length: f64,
    pub links: Vec<(SegmentId, QualitySignals)>,
}

impl RouteProfile {
    pub fn mean_reliability(&self) -> f64 {
        mean(self.links.iter().map(|(_, s)| s.reliability))
    }

    pub fn mean_density(&self) -> f64 {
        mean(self.links.iter().map(|(_, s)| s.density))
    }

    /// Samples for the pheromone updater
    pub fn link_samples(&self) -> Vec<LinkSample> {
        self.links
            .iter()
            .map(|(segment, s)| LinkSample::new(segment.clone(), s.reliability, s.density))
            .collect()
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Scores completed routes
pub struct RouteQualityScorer<'a, G: NetworkGraph + ?Sized> {
    graph: &'a G,
    estimator: &'a LinkQualityEstimator,
    gamma: f64,
    delta: f64,
}

impl<'a, G: NetworkGraph + ?Sized> RouteQualityScorer<'a, G> {
    pub fn new(graph: &'a G, estimator: &'a LinkQualityEstimator, config: &AcoConfig) -> Self {
        Self {
            graph,
            estimator,
            gamma: config.gamma,
            delta: config.delta,
        }
    }

    /// Measure every segment of the route
    pub fn profile(&self, route: &Route, traffic: &dyn TrafficSnapshot) -> RouteProfile {
        let links: Vec<(SegmentId, QualitySignals)> = route
            .iter()
            .map(|segment| {
                (
                    segment.clone(),
                    self.estimator.signals(self.graph, segment, traffic),
                )
            })
            .collect();
        let total_length: f64 = route
            .iter()
            .filter_map(|segment| self.graph.length(segment))
            .filter(|length| length.is_finite() && *length > 0.0)
            .sum();

        RouteProfile {
            total_length,
            links,
        }
    }

    pub fn score_profile(&self, profile: &RouteProfile) -> QualityOutcome {
        if profile.links.is_empty() {
            return QualityOutcome::Degenerate(DegenerateReason::EmptyRoute);
        }
        if profile.total_length <= 0.0 {
            return QualityOutcome::Degenerate(DegenerateReason::ZeroLength);
        }

        let reliability_term = (1.0 - profile.mean_reliability()).max(0.0).powf(self.gamma);
        let density_term = (1.0 - profile.mean_density()).max(0.0).powf(self.delta);
        let denominator = profile.total_length * reliability_term * density_term;

        if !denominator.is_finite() {
            return QualityOutcome::Degenerate(DegenerateReason::NonFinite);
        }
        if denominator < DEGENERATE_EPSILON {
            return QualityOutcome::Degenerate(DegenerateReason::ZeroFactor);
        }

        let quality = 1.0 / denominator;
        if quality.is_finite() {
            QualityOutcome::Scored(RouteQuality(quality))
        } else {
            QualityOutcome::Degenerate(DegenerateReason::NonFinite)
        }
    }

    pub fn score(&self, route: &Route, traffic: &dyn TrafficSnapshot) -> QualityOutcome {
        self.score_profile(&self.profile(route, traffic))
    }
}
