//! Pheromone state
//!
//! One bounded reinforcement value per segment. Reads never insert: a segment
//! that has not been reinforced yet reports the initial level. Values are only
//! written by `PheromoneUpdater` through `PheromoneStore::apply_pass`, which
//! holds one exclusive section for a whole route and clamps every write.

pub mod updater;

pub use updater::{LinkSample, PheromoneUpdater, UpdateReport};

use crate::config::AcoConfig;
use crate::network::SegmentId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Range and starting value of pheromone levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PheromoneBounds {
    pub min: f64,
    pub max: f64,
    pub initial: f64,
}

impl PheromoneBounds {
    pub fn from_config(config: &AcoConfig) -> Self {
        Self {
            min: config.min_pheromone,
            max: config.max_pheromone,
            initial: config.initial_pheromone,
        }
    }

    /// Clamp into `[min, max]`; non-finite values collapse to `min`
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

impl Default for PheromoneBounds {
    fn default() -> Self {
        Self::from_config(&AcoConfig::default())
    }
}

/// Shared per-segment pheromone levels
#[derive(Debug)]
pub struct PheromoneStore {
    levels: RwLock<HashMap<SegmentId, f64>>,
    bounds: PheromoneBounds,
}

impl PheromoneStore {
    pub fn new(bounds: PheromoneBounds) -> Self {
        Self {
            levels: RwLock::new(HashMap::new()),
            bounds,
        }
    }

    pub fn bounds(&self) -> PheromoneBounds {
        self.bounds
    }

    /// Current level; the initial level for segments never reinforced
    pub fn get(&self, segment: &SegmentId) -> f64 {
        self.levels
            .read()
            .get(segment)
            .copied()
            .unwrap_or(self.bounds.initial)
    }

    /// Current level, recording the initial level if the segment was unseen
    pub fn get_or_init(&self, segment: &SegmentId) -> f64 {
        if let Some(level) = self.levels.read().get(segment) {
            return *level;
        }
        *self
            .levels
            .write()
            .entry(segment.clone())
            .or_insert(self.bounds.initial)
    }

    /// Levels for several segments under one shared lock
    pub fn levels_for(&self, segments: &[SegmentId]) -> Vec<f64> {
        let levels = self.levels.read();
        segments
            .iter()
            .map(|s| levels.get(s).copied().unwrap_or(self.bounds.initial))
            .collect()
    }

    /// Apply `f(segment, old) -> new` to every segment under one exclusive lock
    ///
    /// Unseen segments start from the initial level; results are clamped.
    pub fn apply_pass<'a, I, F>(&self, segments: I, mut f: F) -> usize
    where
        I: IntoIterator<Item = &'a SegmentId>,
        F: FnMut(&SegmentId, f64) -> f64,
    {
        let mut levels = self.levels.write();
        let mut written = 0;
        for segment in segments {
            let slot = levels
                .entry(segment.clone())
                .or_insert(self.bounds.initial);
            *slot = self.bounds.clamp(f(segment, *slot));
            written += 1;
        }
        written
    }

    /// Number of segments with a recorded level
    pub fn len(&self) -> usize {
        self.levels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.read().is_empty()
    }

    /// Copy of all recorded levels
    pub fn snapshot(&self) -> HashMap<SegmentId, f64> {
        self.levels.read().clone()
    }

    /// Forget every recorded level
    pub fn reset(&self) {
        self.levels.write().clear();
    }
}

impl Default for PheromoneStore {
    fn default() -> Self {
        Self::new(PheromoneBounds::default())
    }
}
