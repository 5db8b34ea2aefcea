//! Ant-colony routing
//!
//! Route requests flow through three stages:
//! - Selector: builds a loop-free route by repeated pseudo-random-proportional
//!   choice over outgoing segments
//! - Scorer: reduces the route to one scalar quality
//! - Engine: owns the pheromone store, feeds quality back through the updater
//!   and keeps per-run statistics
//!
//! Dead ends, loops and the hop cap end a route early. Those routes come back
//! as `RouteOutcome::Incomplete` rather than as errors.

pub mod engine;
pub mod scorer;
pub mod selector;

pub use engine::{AntRouter, ColonyResult, RouteRequest, RouteResult, RoutingStats};
pub use scorer::{DegenerateReason, QualityOutcome, RouteProfile, RouteQuality, RouteQualityScorer};
pub use selector::{Candidate, RouteSelector, StepCandidates};

use crate::network::SegmentId;
use serde::{Deserialize, Serialize};

/// Ordered, loop-free sequence of segments
///
/// Only the selector builds routes, so they serialize for output but are
/// never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Route {
    segments: Vec<SegmentId>,
}

impl Route {
    pub fn singleton(start: SegmentId) -> Self {
        Self {
            segments: vec![start],
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, segment: &SegmentId) -> bool {
        self.segments.contains(segment)
    }

    pub fn first(&self) -> Option<&SegmentId> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&SegmentId> {
        self.segments.last()
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentId> {
        self.segments.iter()
    }

    pub fn into_segments(self) -> Vec<SegmentId> {
        self.segments
    }

    /// Append a segment; the caller guarantees it is not already present
    pub(crate) fn push(&mut self, segment: SegmentId) {
        debug_assert!(!self.segments.contains(&segment));
        self.segments.push(segment);
    }
}

impl<'a> IntoIterator for &'a Route {
    type Item = &'a SegmentId;
    type IntoIter = std::slice::Iter<'a, SegmentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Why route construction stopped before the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    /// Current segment has no outgoing segments
    DeadEnd,
    /// Every outgoing segment is already on the route
    Loop,
    /// Route reached the configured hop cap
    HopCap,
}

/// Result of one route construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Route ends at the destination
    Complete(Route),
    /// Route stopped early; still loop-free and within the hop cap
    Incomplete { route: Route, reason: Termination },
}

impl RouteOutcome {
    pub fn route(&self) -> &Route {
        match self {
            Self::Complete(route) => route,
            Self::Incomplete { route, .. } => route,
        }
    }

    pub fn into_route(self) -> Route {
        match self {
            Self::Complete(route) => route,
            Self::Incomplete { route, .. } => route,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn termination(&self) -> Option<Termination> {
        match self {
            Self::Complete(_) => None,
            Self::Incomplete { reason, .. } => Some(*reason),
        }
    }
}
