//! Tunable routing parameters
//!
//! Two groups of settings drive the engine:
//! - `AcoConfig`: colony exponents, exploitation threshold, pheromone bounds,
//!   evaporation rate and hop cap
//! - `QualityConfig`: thresholds and scales used to turn raw occupant data into
//!   link-quality signals
//!
//! Both deserialize with `#[serde(default)]`, so a config file only needs to
//! name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised while validating or loading configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid exponent {name}: must be finite and >= 0, got {value}")]
    InvalidExponent { name: &'static str, value: f64 },

    #[error("Invalid probability {name}: must be within 0.0-1.0, got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Invalid pheromone bounds: need 0 < min ({min}) <= initial ({initial}) <= max ({max})")]
    InvalidPheromoneBounds { min: f64, initial: f64, max: f64 },

    #[error("Invalid evaporation rate: must be within 0.0-1.0, got {0}")]
    InvalidEvaporationRate(f64),

    #[error("Invalid hop cap: must be >= 1, got {0}")]
    InvalidHopCap(usize),

    #[error("Invalid threshold {name}: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

// ============================================================================
// LINK QUALITY SETTINGS
// ============================================================================

/// Constants for link-quality estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Weakest usable signal (dBm); also the signal proxy floor
    pub rssi_threshold: f64,
    /// Strongest reportable signal (dBm)
    pub rssi_ceiling: f64,
    /// Noise margin at which a link counts as fully clean (dB)
    pub snr_threshold: f64,
    /// Occupants per km considered saturating
    pub optimal_density: f64,
    /// Speed (m/s) that maps to a full speed factor
    pub max_speed: f64,
    /// Nominal radio range (m); pairwise distances beyond it are capped
    pub communication_range: f64,
    /// Inter-occupant distance (m) assumed when fewer than two occupants exist
    pub default_distance: f64,
    /// Decay scale for occupant speed variance
    pub speed_variance_scale: f64,
    /// Decay scale for occupant heading circular variance
    pub heading_variance_scale: f64,
    /// Reliability weight of the normalized signal proxy
    pub signal_weight: f64,
    /// Reliability weight of the normalized noise margin
    pub noise_weight: f64,
    /// Reliability weight of the stability term
    pub stability_weight: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            rssi_threshold: -85.0,
            rssi_ceiling: -40.0,
            snr_threshold: 10.0,
            optimal_density: 20.0,
            max_speed: 30.0,
            communication_range: 300.0,
            default_distance: 1.0,
            speed_variance_scale: 100.0,
            heading_variance_scale: 90.0,
            signal_weight: 0.4,
            noise_weight: 0.3,
            stability_weight: 0.3,
        }
    }
}

impl QualityConfig {
    /// Validate thresholds and scales
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rssi_threshold.is_finite() && self.rssi_ceiling.is_finite())
            || self.rssi_ceiling <= self.rssi_threshold
        {
            return Err(ConfigError::InvalidThreshold {
                name: "rssi_ceiling",
                reason: format!(
                    "ceiling {} must exceed threshold {}",
                    self.rssi_ceiling, self.rssi_threshold
                ),
            });
        }

        let positive = [
            ("snr_threshold", self.snr_threshold),
            ("optimal_density", self.optimal_density),
            ("max_speed", self.max_speed),
            ("communication_range", self.communication_range),
            ("default_distance", self.default_distance),
            ("speed_variance_scale", self.speed_variance_scale),
            ("heading_variance_scale", self.heading_variance_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    reason: format!("must be finite and > 0, got {}", value),
                });
            }
        }

        let weights = [
            ("signal_weight", self.signal_weight),
            ("noise_weight", self.noise_weight),
            ("stability_weight", self.stability_weight),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        Ok(())
    }
}

// ============================================================================
// COLONY SETTINGS
// ============================================================================

/// Ant-colony routing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcoConfig {
    /// Pheromone influence
    pub alpha: f64,
    /// Distance-to-destination influence
    pub beta: f64,
    /// Link reliability influence
    pub gamma: f64,
    /// Occupant density influence
    pub delta: f64,
    /// Occupant speed influence; the default 0 leaves speed out of the score
    pub epsilon: f64,
    /// Probability of picking the best candidate instead of sampling
    pub q0: f64,
    /// Lower pheromone bound
    pub min_pheromone: f64,
    /// Upper pheromone bound
    pub max_pheromone: f64,
    /// Pheromone of a segment that has never been reinforced
    pub initial_pheromone: f64,
    /// Base evaporation rate before dynamics scaling
    pub evaporation_rate: f64,
    /// Maximum number of segments in one route
    pub hop_cap: usize,
    /// Floor applied to every candidate preference score
    pub score_floor: f64,
    /// Run seed; `None` draws one at engine construction
    pub seed: Option<u64>,
    /// Link-quality constants
    pub quality: QualityConfig,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 2.0,
            gamma: 1.5,
            delta: 1.0,
            epsilon: 0.0,
            q0: 0.9,
            min_pheromone: 0.1,
            max_pheromone: 5.0,
            initial_pheromone: 1.0,
            evaporation_rate: 0.1,
            hop_cap: 100,
            score_floor: 1e-10,
            seed: None,
            quality: QualityConfig::default(),
        }
    }
}

impl AcoConfig {
    /// Validate the whole configuration tree
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exponents = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("delta", self.delta),
            ("epsilon", self.epsilon),
        ];
        for (name, value) in exponents {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidExponent { name, value });
            }
        }

        if !(0.0..=1.0).contains(&self.q0) {
            return Err(ConfigError::InvalidProbability {
                name: "q0",
                value: self.q0,
            });
        }

        let bounds_ok = self.min_pheromone > 0.0
            && self.min_pheromone <= self.initial_pheromone
            && self.initial_pheromone <= self.max_pheromone
            && self.max_pheromone.is_finite();
        if !bounds_ok {
            return Err(ConfigError::InvalidPheromoneBounds {
                min: self.min_pheromone,
                initial: self.initial_pheromone,
                max: self.max_pheromone,
            });
        }

        if !(0.0..=1.0).contains(&self.evaporation_rate) {
            return Err(ConfigError::InvalidEvaporationRate(self.evaporation_rate));
        }

        if self.hop_cap == 0 {
            return Err(ConfigError::InvalidHopCap(self.hop_cap));
        }

        if !self.score_floor.is_finite() || self.score_floor <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "score_floor",
                reason: format!("must be finite and > 0, got {}", self.score_floor),
            });
        }

        self.quality.validate()
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AcoConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&contents)
    }

    /// Write the config as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::Io(e.to_string()))
    }
}
