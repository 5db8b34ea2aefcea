//! In-memory road network
//!
//! Junctions carry coordinates; segments join two junctions and list the
//! segments a vehicle may continue onto. Networks are assembled with the
//! builder methods or loaded from a JSON network file.

use super::{NetworkGraph, Point, Segment, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while assembling a network
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Duplicate junction: {0}")]
    DuplicateJunction(String),

    #[error("Duplicate segment: {0}")]
    DuplicateSegment(SegmentId),

    #[error("Unknown junction {junction} referenced by segment {segment}")]
    UnknownJunction { segment: SegmentId, junction: String },

    #[error("Unknown segment in connection: {0}")]
    UnknownSegment(SegmentId),

    #[error("Connection {from} -> {to} does not share junction {junction}")]
    DisjointConnection {
        from: SegmentId,
        to: SegmentId,
        junction: String,
    },

    #[error("Segment {segment} has invalid length {length}")]
    InvalidLength { segment: SegmentId, length: f64 },

    #[error("Invalid coordinates for junction {0}")]
    InvalidCoordinates(String),

    #[error("Failed to read network file: {0}")]
    Io(String),

    #[error("Failed to parse network file: {0}")]
    Parse(String),
}

/// Junction record of a network file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Segment record of a network file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub from: String,
    pub to: String,
    /// Length in metres; defaults to the straight-line junction distance
    #[serde(default)]
    pub length: Option<f64>,
}

/// Serialized form of a `RoadNetwork`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkFile {
    pub junctions: Vec<JunctionRecord>,
    pub segments: Vec<SegmentRecord>,
    /// `(from_segment, to_segment)` pairs
    #[serde(default)]
    pub connections: Vec<(SegmentId, SegmentId)>,
}

/// Directed road network held in memory
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    junctions: HashMap<String, Point>,
    segments: HashMap<SegmentId, Segment>,
    /// Segment ids in insertion order
    order: Vec<SegmentId>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_junction(&mut self, id: impl Into<String>, at: Point) -> Result<(), NetworkError> {
        let id = id.into();
        if !at.is_finite() {
            return Err(NetworkError::InvalidCoordinates(id));
        }
        if self.junctions.contains_key(&id) {
            return Err(NetworkError::DuplicateJunction(id));
        }
        self.junctions.insert(id, at);
        Ok(())
    }

    /// Add a segment between two known junctions
    ///
    /// With `length == None` the straight-line distance between the junctions is used.
    pub fn add_segment(
        &mut self,
        id: impl Into<SegmentId>,
        from: &str,
        to: &str,
        length: Option<f64>,
    ) -> Result<(), NetworkError> {
        let id = id.into();
        if self.segments.contains_key(&id) {
            return Err(NetworkError::DuplicateSegment(id));
        }
        let from_xy = *self
            .junctions
            .get(from)
            .ok_or_else(|| NetworkError::UnknownJunction {
                segment: id.clone(),
                junction: from.to_string(),
            })?;
        let to_xy = *self
            .junctions
            .get(to)
            .ok_or_else(|| NetworkError::UnknownJunction {
                segment: id.clone(),
                junction: to.to_string(),
            })?;

        let length = length.unwrap_or_else(|| from_xy.distance_to(&to_xy));
        if !length.is_finite() || length <= 0.0 {
            return Err(NetworkError::InvalidLength {
                segment: id,
                length,
            });
        }

        self.order.push(id.clone());
        self.segments.insert(
            id.clone(),
            Segment {
                id,
                length,
                from_node: from.to_string(),
                to_node: to.to_string(),
                from_xy,
                to_xy,
                outgoing: Vec::new(),
            },
        );
        Ok(())
    }

    /// Allow travel from `from` onto `to`; `to` must start where `from` ends
    pub fn connect(&mut self, from: &SegmentId, to: &SegmentId) -> Result<(), NetworkError> {
        let to_start = self
            .segments
            .get(to)
            .map(|s| s.from_node.clone())
            .ok_or_else(|| NetworkError::UnknownSegment(to.clone()))?;
        let segment = self
            .segments
            .get_mut(from)
            .ok_or_else(|| NetworkError::UnknownSegment(from.clone()))?;

        if segment.to_node != to_start {
            return Err(NetworkError::DisjointConnection {
                from: from.clone(),
                to: to.clone(),
                junction: segment.to_node.clone(),
            });
        }
        if !segment.outgoing.contains(to) {
            segment.outgoing.push(to.clone());
        }
        Ok(())
    }

    /// Connect every segment to every segment leaving its end junction,
    /// excluding the immediate reverse segment
    pub fn connect_all_turns(&mut self) {
        let mut by_start: HashMap<&str, Vec<&SegmentId>> = HashMap::new();
        for id in &self.order {
            let segment = &self.segments[id];
            by_start.entry(segment.from_node.as_str()).or_default().push(id);
        }

        let mut links = Vec::new();
        for id in &self.order {
            let segment = &self.segments[id];
            for next in by_start.get(segment.to_node.as_str()).into_iter().flatten() {
                if self.segments[*next].to_node != segment.from_node {
                    links.push((id.clone(), (*next).clone()));
                }
            }
        }

        for (from, to) in links {
            if let Some(segment) = self.segments.get_mut(&from) {
                if !segment.outgoing.contains(&to) {
                    segment.outgoing.push(to);
                }
            }
        }
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    /// Segment ids in insertion order
    pub fn segment_ids(&self) -> &[SegmentId] {
        &self.order
    }

    pub fn segment_count(&self) -> usize {
        self.order.len()
    }

    pub fn from_file(file: NetworkFile) -> Result<Self, NetworkError> {
        let mut network = Self::new();
        for junction in file.junctions {
            network.add_junction(junction.id, Point::new(junction.x, junction.y))?;
        }
        for segment in file.segments {
            network.add_segment(segment.id, &segment.from, &segment.to, segment.length)?;
        }
        for (from, to) in &file.connections {
            network.connect(from, to)?;
        }
        Ok(network)
    }

    pub fn from_json_str(json: &str) -> Result<Self, NetworkError> {
        let file: NetworkFile =
            serde_json::from_str(json).map_err(|e| NetworkError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let contents =
            std::fs::read_to_string(path.as_ref()).map_err(|e| NetworkError::Io(e.to_string()))?;
        Self::from_json_str(&contents)
    }
}

impl NetworkGraph for RoadNetwork {
    fn outgoing_segments(&self, segment: &SegmentId) -> Option<&[SegmentId]> {
        self.segments.get(segment).map(|s| s.outgoing.as_slice())
    }

    fn length(&self, segment: &SegmentId) -> Option<f64> {
        self.segments.get(segment).map(|s| s.length)
    }

    fn endpoint_coordinates(&self, segment: &SegmentId) -> Option<(Point, Point)> {
        self.segments.get(segment).map(|s| (s.from_xy, s.to_xy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SegmentId {
        SegmentId::new(s)
    }

    fn two_segment_network() -> RoadNetwork {
        let mut net = RoadNetwork::new();
        net.add_junction("a", Point::new(0.0, 0.0)).unwrap();
        net.add_junction("b", Point::new(100.0, 0.0)).unwrap();
        net.add_junction("c", Point::new(100.0, 50.0)).unwrap();
        net.add_segment("ab", "a", "b", None).unwrap();
        net.add_segment("bc", "b", "c", Some(60.0)).unwrap();
        net
    }

    #[test]
    fn test_segment_length_defaults_to_geometry() {
        let net = two_segment_network();
        assert_eq!(net.length(&id("ab")), Some(100.0));
        assert_eq!(net.length(&id("bc")), Some(60.0));
        assert_eq!(net.length(&id("zz")), None);
    }

    #[test]
    fn test_connect_requires_shared_junction() {
        let mut net = two_segment_network();
        net.connect(&id("ab"), &id("bc")).unwrap();
        assert_eq!(net.outgoing_segments(&id("ab")).unwrap(), &[id("bc")]);

        let err = net.connect(&id("bc"), &id("ab")).unwrap_err();
        assert!(matches!(err, NetworkError::DisjointConnection { .. }));
    }

    #[test]
    fn test_duplicate_segment_rejected() {
        let mut net = two_segment_network();
        let err = net.add_segment("ab", "a", "b", None).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateSegment(id("ab")));
    }

    #[test]
    fn test_unknown_junction_rejected() {
        let mut net = RoadNetwork::new();
        net.add_junction("a", Point::new(0.0, 0.0)).unwrap();
        let err = net.add_segment("ax", "a", "x", Some(10.0)).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownJunction { .. }));
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut net = RoadNetwork::new();
        net.add_junction("a", Point::new(0.0, 0.0)).unwrap();
        net.add_junction("b", Point::new(0.0, 0.0)).unwrap();
        let err = net.add_segment("ab", "a", "b", None).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidLength { .. }));
    }

    #[test]
    fn test_connect_all_turns_skips_u_turns() {
        let mut net = RoadNetwork::new();
        net.add_junction("a", Point::new(0.0, 0.0)).unwrap();
        net.add_junction("b", Point::new(100.0, 0.0)).unwrap();
        net.add_junction("c", Point::new(200.0, 0.0)).unwrap();
        net.add_segment("ab", "a", "b", None).unwrap();
        net.add_segment("ba", "b", "a", None).unwrap();
        net.add_segment("bc", "b", "c", None).unwrap();
        net.connect_all_turns();

        assert_eq!(net.outgoing_segments(&id("ab")).unwrap(), &[id("bc")]);
        assert!(net.outgoing_segments(&id("bc")).unwrap().is_empty());
    }

    #[test]
    fn test_network_from_json() {
        let json = r#"{
            "junctions": [
                { "id": "a", "x": 0.0, "y": 0.0 },
                { "id": "b", "x": 30.0, "y": 40.0 },
                { "id": "c", "x": 30.0, "y": 100.0 }
            ],
            "segments": [
                { "id": "ab", "from": "a", "to": "b" },
                { "id": "bc", "from": "b", "to": "c", "length": 75.0 }
            ],
            "connections": [["ab", "bc"]]
        }"#;
        let net = RoadNetwork::from_json_str(json).unwrap();
        assert_eq!(net.segment_ids(), &[id("ab"), id("bc")]);
        assert_eq!(net.length(&id("ab")), Some(50.0));
        assert_eq!(net.outgoing_segments(&id("ab")).unwrap(), &[id("bc")]);
        assert_eq!(
            net.endpoint_coordinates(&id("bc")),
            Some((Point::new(30.0, 40.0), Point::new(30.0, 100.0)))
        );
    }

    #[test]
    fn test_network_json_dangling_connection() {
        let json = r#"{
            "junctions": [{ "id": "a", "x": 0.0, "y": 0.0 }, { "id": "b", "x": 1.0, "y": 0.0 }],
            "segments": [{ "id": "ab", "from": "a", "to": "b" }],
            "connections": [["ab", "missing"]]
        }"#;
        assert_eq!(
            RoadNetwork::from_json_str(json).unwrap_err(),
            NetworkError::UnknownSegment(id("missing"))
        );
    }
}
