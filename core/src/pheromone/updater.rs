//! Evaporate-then-deposit reinforcement
//!
//! For every segment of a completed route, in one pass:
//! 1. `rate = evaporation_rate * (1 + 0.5 * network_dynamics)`, where the
//!    dynamics are the mean of reliability variance and density variance
//!    across the route
//! 2. `new = (1 - rate) * old + quality * (1 + reliability)`
//! 3. clamp into the store bounds
//!
//! Only segments on the route evaporate; the rest of the network is untouched.

use super::PheromoneStore;
use crate::config::AcoConfig;
use crate::diagnostics::{DiagnosticsSink, RouteEvent};
use crate::network::SegmentId;
use crate::quality::variance;

/// Link conditions of one route segment at update time
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSample {
    pub segment: SegmentId,
    pub reliability: f64,
    pub density: f64,
}

impl LinkSample {
    pub fn new(segment: impl Into<SegmentId>, reliability: f64, density: f64) -> Self {
        Self {
            segment: segment.into(),
            reliability,
            density,
        }
    }
}

/// Summary of one update pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateReport {
    pub segments_updated: usize,
    pub network_dynamics: f64,
    pub dynamic_rate: f64,
    /// Quality actually deposited (negative or non-finite input becomes 0)
    pub quality: f64,
}

/// Applies reinforcement passes to a `PheromoneStore`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PheromoneUpdater {
    evaporation_rate: f64,
}

impl PheromoneUpdater {
    pub fn new(evaporation_rate: f64) -> Self {
        Self {
            evaporation_rate: evaporation_rate.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &AcoConfig) -> Self {
        Self::new(config.evaporation_rate)
    }

    pub fn evaporation_rate(&self) -> f64 {
        self.evaporation_rate
    }

    /// Instability of current conditions along the route
    pub fn network_dynamics(samples: &[LinkSample]) -> f64 {
        let reliabilities: Vec<f64> = samples.iter().map(|s| s.reliability).collect();
        let densities: Vec<f64> = samples.iter().map(|s| s.density).collect();
        let dynamics = (variance(&reliabilities) + variance(&densities)) / 2.0;
        if dynamics.is_finite() {
            dynamics
        } else {
            0.0
        }
    }

    /// Evaporation rate scaled by the dynamics, within `[0, 1]`
    pub fn dynamic_rate(&self, network_dynamics: f64) -> f64 {
        (self.evaporation_rate * (1.0 + 0.5 * network_dynamics)).clamp(0.0, 1.0)
    }

    /// Reinforce the segments in `samples` with `quality`
    pub fn update(
        &self,
        store: &PheromoneStore,
        samples: &[LinkSample],
        quality: f64,
        sink: &dyn DiagnosticsSink,
    ) -> UpdateReport {
        let quality = if quality.is_finite() && quality > 0.0 {
            quality
        } else {
            0.0
        };
        let network_dynamics = Self::network_dynamics(samples);
        let rate = self.dynamic_rate(network_dynamics);

        let mut deposits = samples.iter().map(|s| {
            let reliability = if s.reliability.is_finite() {
                s.reliability.clamp(0.0, 1.0)
            } else {
                0.0
            };
            quality * (1.0 + reliability)
        });
        let segments_updated = store.apply_pass(samples.iter().map(|s| &s.segment), |_, old| {
            (1.0 - rate) * old + deposits.next().unwrap_or(0.0)
        });

        sink.record(RouteEvent::PheromonesUpdated {
            segments: segments_updated,
            quality,
            dynamic_rate: rate,
        });

        UpdateReport {
            segments_updated,
            network_dynamics,
            dynamic_rate: rate,
            quality,
        }
    }
}

impl Default for PheromoneUpdater {
    fn default() -> Self {
        Self::from_config(&AcoConfig::default())
    }
}
