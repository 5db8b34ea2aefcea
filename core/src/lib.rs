// AntRoute Core: ant-colony route selection over road networks
//
// Routes are built segment by segment from pheromone levels, a distance
// heuristic and link conditions estimated from a traffic snapshot, then
// scored and fed back into the shared pheromone store.

pub mod config;
pub mod diagnostics;
pub mod network;
pub mod pheromone;
pub mod quality;
pub mod rng;
pub mod routing;
pub mod traffic;

use thiserror::Error;

pub use config::{AcoConfig, ConfigError, QualityConfig};
pub use diagnostics::{DiagnosticsSink, NullSink, RecordingSink, RouteEvent, SelectionMode, TracingSink};
pub use network::{NetworkError, NetworkGraph, Point, RoadNetwork, Segment, SegmentId};
pub use pheromone::{LinkSample, PheromoneBounds, PheromoneStore, PheromoneUpdater, UpdateReport};
pub use quality::{LinkQualityEstimator, QualitySignals, SignalCondition, UnavailableReason};
pub use routing::{
    AntRouter, ColonyResult, QualityOutcome, Route, RouteOutcome, RouteQuality, RouteRequest,
    RouteResult, RoutingStats, Termination,
};
pub use traffic::{Occupant, SnapshotFrame, TrafficSnapshot};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors a routing request can fail with
///
/// Dead ends, loops and the hop cap are not errors; see [`RouteOutcome`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Unknown segment: {0}")]
    UnknownSegment(SegmentId),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
