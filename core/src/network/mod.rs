//! Network topology: read-only view of the road/communication graph
//!
//! The engine never mutates topology. It asks three questions of a graph:
//! which segments leave a segment, how long a segment is, and where its
//! endpoints sit. `RoadNetwork` is the in-memory implementation used by the
//! CLI and tests; other providers only need to implement `NetworkGraph`.

pub mod road;

pub use road::{NetworkError, NetworkFile, RoadNetwork};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a directed segment (edge) in the network
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Planar coordinate in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Immutable description of one segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    /// Length in metres
    pub length: f64,
    pub from_node: String,
    pub to_node: String,
    pub from_xy: Point,
    pub to_xy: Point,
    /// Segments reachable directly after this one, in connection order
    pub outgoing: Vec<SegmentId>,
}

/// Topology queries the engine depends on
///
/// Every method returns `None` for an identifier the graph does not know.
pub trait NetworkGraph: Send + Sync {
    fn outgoing_segments(&self, segment: &SegmentId) -> Option<&[SegmentId]>;

    fn length(&self, segment: &SegmentId) -> Option<f64>;

    /// `(from_xy, to_xy)` of the segment
    fn endpoint_coordinates(&self, segment: &SegmentId) -> Option<(Point, Point)>;

    fn contains(&self, segment: &SegmentId) -> bool {
        self.length(segment).is_some()
    }
}
