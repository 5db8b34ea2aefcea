//! Link quality estimation
//!
//! Turns the occupants of one segment into four normalized signals that stand
//! in for vehicular wireless conditions:
//! - Signal-strength proxy: log-distance path loss over the mean pairwise
//!   occupant distance, clamped to `[rssi_threshold, rssi_ceiling]`
//! - Noise-margin proxy: shrinks as the segment fills up, never negative
//! - Stability: decays with speed variance and heading circular variance
//! - Density: occupants per km against the optimal density, within `[0, 1]`
//!
//! The composite link reliability is a weighted sum of the normalized signal,
//! noise margin and stability. Estimation never fails: missing data yields
//! `SignalCondition::Unavailable` carrying the documented defaults.

use crate::config::QualityConfig;
use crate::network::{NetworkGraph, Point, SegmentId};
use crate::traffic::{Occupant, TrafficSnapshot};
use tracing::debug;

/// Reference loss at 1 m used by the path-loss proxy (dB)
const REFERENCE_LOSS_DB: f64 = 40.0;

/// Floor for segment length in km when computing density
const MIN_LENGTH_KM: f64 = 0.001;

/// Derived quality of one segment under one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySignals {
    /// Signal-strength proxy (dBm)
    pub signal_dbm: f64,
    /// Noise-margin proxy (dB, >= 0)
    pub noise_margin_db: f64,
    /// 0.0 - 1.0, 1.0 = no relative motion variance
    pub stability: f64,
    /// 0.0 - 1.0 against the optimal density
    pub density: f64,
    /// Composite link reliability, 0.0 - 1.0
    pub reliability: f64,
    /// Mean occupant speed (m/s)
    pub mean_speed: f64,
    pub occupant_count: usize,
}

impl QualitySignals {
    /// Values reported when a segment cannot be measured
    pub fn unavailable(config: &QualityConfig) -> Self {
        Self {
            signal_dbm: config.rssi_threshold,
            noise_margin_db: 0.0,
            stability: 1.0,
            density: 0.0,
            reliability: 0.0,
            mean_speed: 0.0,
            occupant_count: 0,
        }
    }
}

/// Why a segment could not be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Segment is not part of the network
    UnknownSegment,
    /// The traffic provider has no record for the segment
    NoTrafficData,
    /// The network reported a non-positive or non-finite length
    InvalidLength,
}

/// Outcome of a quality query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalCondition {
    Measured(QualitySignals),
    Unavailable {
        signals: QualitySignals,
        reason: UnavailableReason,
    },
}

impl SignalCondition {
    pub fn signals(&self) -> &QualitySignals {
        match self {
            Self::Measured(signals) => signals,
            Self::Unavailable { signals, .. } => signals,
        }
    }

    pub fn into_signals(self) -> QualitySignals {
        *self.signals()
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// Computes `QualitySignals` for segments
#[derive(Debug, Clone, Default)]
pub struct LinkQualityEstimator {
    config: QualityConfig,
}

impl LinkQualityEstimator {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Measure one segment
    pub fn assess<G: NetworkGraph + ?Sized>(
        &self,
        graph: &G,
        segment: &SegmentId,
        traffic: &dyn TrafficSnapshot,
    ) -> SignalCondition {
        let Some(length_m) = graph.length(segment) else {
            return self.unavailable(segment, UnavailableReason::UnknownSegment);
        };
        if !length_m.is_finite() || length_m <= 0.0 {
            return self.unavailable(segment, UnavailableReason::InvalidLength);
        }
        let Some(occupants) = traffic.occupants(segment) else {
            return self.unavailable(segment, UnavailableReason::NoTrafficData);
        };

        let usable: Vec<Occupant> = occupants.iter().filter(|o| o.is_finite()).copied().collect();
        if usable.len() != occupants.len() {
            debug!(
                "Ignoring {} malformed occupants on {}",
                occupants.len() - usable.len(),
                segment
            );
        }

        let count = usable.len();
        let signal_dbm = self.signal_strength(&usable);
        let noise_margin_db = self.noise_margin(count, length_m);
        let stability = self.stability(&usable);
        let density = self.density(count, length_m);
        let reliability = self.reliability(signal_dbm, noise_margin_db, stability);
        let mean_speed = if count == 0 {
            0.0
        } else {
            usable.iter().map(|o| o.speed).sum::<f64>() / count as f64
        };

        SignalCondition::Measured(QualitySignals {
            signal_dbm,
            noise_margin_db,
            stability,
            density,
            reliability,
            mean_speed,
            occupant_count: count,
        })
    }

    /// Measure one segment, falling back to defaults when unavailable
    pub fn signals<G: NetworkGraph + ?Sized>(
        &self,
        graph: &G,
        segment: &SegmentId,
        traffic: &dyn TrafficSnapshot,
    ) -> QualitySignals {
        self.assess(graph, segment, traffic).into_signals()
    }

    /// Path-loss signal proxy in dBm
    ///
    /// No occupants means nobody to talk to: the proxy sits at the threshold.
    pub fn signal_strength(&self, occupants: &[Occupant]) -> f64 {
        if occupants.is_empty() {
            return self.config.rssi_threshold;
        }
        let positions: Vec<Point> = occupants.iter().map(|o| o.position).collect();
        let distance = mean_pairwise_distance(&positions, self.config.communication_range)
            .unwrap_or(self.config.default_distance);

        let rssi = -20.0 * distance.max(1.0).log10() - REFERENCE_LOSS_DB;
        sanitize(rssi, self.config.rssi_threshold).clamp(self.config.rssi_threshold, self.config.rssi_ceiling)
    }

    /// Noise-margin proxy in dB; decreases with occupant load on the segment
    pub fn noise_margin(&self, occupant_count: usize, length_m: f64) -> f64 {
        let load = (occupant_count as f64 * length_m / 1000.0).min(1.0);
        let snr = self.config.snr_threshold * (1.0 - 0.5 * load);
        sanitize(snr, 0.0).max(0.0)
    }

    /// Motion stability in `[0, 1]`
    pub fn stability(&self, occupants: &[Occupant]) -> f64 {
        if occupants.len() < 2 {
            return 1.0;
        }
        let speeds: Vec<f64> = occupants.iter().map(|o| o.speed).collect();
        let headings: Vec<f64> = occupants.iter().map(|o| o.heading_deg).collect();

        let speed_var = variance(&speeds);
        let heading_var = circular_variance(&headings);
        let stability = (-speed_var / self.config.speed_variance_scale).exp()
            * (-heading_var / self.config.heading_variance_scale).exp();
        sanitize(stability, 1.0).clamp(0.0, 1.0)
    }

    /// Normalized density in `[0, 1]`
    pub fn density(&self, occupant_count: usize, length_m: f64) -> f64 {
        let length_km = (length_m / 1000.0).max(MIN_LENGTH_KM);
        let per_km = occupant_count as f64 / length_km;
        sanitize(per_km / self.config.optimal_density, 0.0).clamp(0.0, 1.0)
    }

    /// Composite link reliability in `[0, 1]`
    pub fn reliability(&self, signal_dbm: f64, noise_margin_db: f64, stability: f64) -> f64 {
        let span = self.config.rssi_ceiling - self.config.rssi_threshold;
        let norm_signal = ((signal_dbm - self.config.rssi_threshold) / span).clamp(0.0, 1.0);
        let norm_noise = (noise_margin_db / self.config.snr_threshold).clamp(0.0, 1.0);

        let reliability = self.config.signal_weight * norm_signal
            + self.config.noise_weight * norm_noise
            + self.config.stability_weight * stability.clamp(0.0, 1.0);
        sanitize(reliability, 0.0).clamp(0.0, 1.0)
    }

    /// Mean speed against `max_speed`, in `[0, 1]`
    pub fn speed_factor(&self, mean_speed: f64) -> f64 {
        sanitize(mean_speed / self.config.max_speed, 0.0).clamp(0.0, 1.0)
    }

    fn unavailable(&self, segment: &SegmentId, reason: UnavailableReason) -> SignalCondition {
        debug!("Link quality unavailable for {}: {:?}", segment, reason);
        SignalCondition::Unavailable {
            signals: QualitySignals::unavailable(&self.config),
            reason,
        }
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Mean distance over all occupant pairs, each capped at `cap`
///
/// `None` with fewer than two positions.
fn mean_pairwise_distance(positions: &[Point], cap: f64) -> Option<f64> {
    if positions.len() < 2 {
        return None;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            total += a.distance_to(b).min(cap);
            pairs += 1;
        }
    }
    Some(total / pairs as f64)
}

/// Population variance; 0 for fewer than two values
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// `1 - R`, where R is the mean resultant length of the heading unit vectors
fn circular_variance(headings_deg: &[f64]) -> f64 {
    if headings_deg.len() < 2 {
        return 0.0;
    }
    let (sin_sum, cos_sum) = headings_deg.iter().fold((0.0, 0.0), |(s, c), deg| {
        let rad = deg.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let resultant = sin_sum.hypot(cos_sum) / headings_deg.len() as f64;
    (1.0 - resultant).clamp(0.0, 1.0)
}
