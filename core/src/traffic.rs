//! Traffic snapshots: occupants per segment at one simulation instant
//!
//! Supplied by the surrounding traffic simulation. The engine only reads them.

use crate::network::{Point, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A vehicle on a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub position: Point,
    /// m/s
    pub speed: f64,
    /// Degrees, any range (interpreted on the circle)
    pub heading_deg: f64,
}

impl Occupant {
    pub fn new(position: Point, speed: f64, heading_deg: f64) -> Self {
        Self {
            position,
            speed,
            heading_deg,
        }
    }

    /// True when every field is a usable number
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.speed.is_finite() && self.heading_deg.is_finite()
    }
}

/// Read access to the current traffic state
pub trait TrafficSnapshot: Send + Sync {
    /// Occupants of `segment`, or `None` when the provider has no data for it
    fn occupants(&self, segment: &SegmentId) -> Option<&[Occupant]>;
}

/// In-memory snapshot; segments without an entry are empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotFrame {
    occupants: HashMap<SegmentId, Vec<Occupant>>,
}

impl SnapshotFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_occupant(&mut self, segment: impl Into<SegmentId>, occupant: Occupant) {
        self.occupants
            .entry(segment.into())
            .or_default()
            .push(occupant);
    }

    pub fn with_occupants(
        mut self,
        segment: impl Into<SegmentId>,
        occupants: impl IntoIterator<Item = Occupant>,
    ) -> Self {
        self.occupants
            .entry(segment.into())
            .or_default()
            .extend(occupants);
        self
    }

    pub fn total_occupants(&self) -> usize {
        self.occupants.values().map(Vec::len).sum()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl TrafficSnapshot for SnapshotFrame {
    fn occupants(&self, segment: &SegmentId) -> Option<&[Occupant]> {
        Some(
            self.occupants
                .get(segment)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        )
    }
}
