// Engine configuration for the AntRoute CLI
//
// A config file is optional JSON holding any subset of `AcoConfig` fields;
// missing fields take their defaults. Without `--config` the defaults apply.

use anyhow::{Context, Result};
use antroute_core::AcoConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Where the config was loaded from, if anywhere
    pub path: Option<PathBuf>,
    pub aco: AcoConfig,
}

impl ConfigFile {
    /// Load from `path`, or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let aco = match path {
            Some(path) => AcoConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => AcoConfig::default(),
        };
        Ok(Self {
            path: path.map(Path::to_path_buf),
            aco,
        })
    }

    /// Load, creating the file with defaults when it does not exist yet
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(Some(path));
        }
        let config = Self {
            path: Some(path.to_path_buf()),
            aco: AcoConfig::default(),
        };
        config.save()?;
        Ok(config)
    }

    /// Override the seed from the command line
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.aco.seed = seed;
        }
        self
    }

    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .context("No config file to save to; pass --config")?;
        self.aco
            .to_json_file(path)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Set one value by key, validate, and save
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut aco = self.aco.clone();
        let q = &mut aco.quality;
        match key {
            "alpha" => aco.alpha = parse_f64(value)?,
            "beta" => aco.beta = parse_f64(value)?,
            "gamma" => aco.gamma = parse_f64(value)?,
            "delta" => aco.delta = parse_f64(value)?,
            "epsilon" => aco.epsilon = parse_f64(value)?,
            "q0" => aco.q0 = parse_f64(value)?,
            "min_pheromone" => aco.min_pheromone = parse_f64(value)?,
            "max_pheromone" => aco.max_pheromone = parse_f64(value)?,
            "initial_pheromone" => aco.initial_pheromone = parse_f64(value)?,
            "evaporation_rate" => aco.evaporation_rate = parse_f64(value)?,
            "hop_cap" => aco.hop_cap = value.parse().context("Invalid number")?,
            "score_floor" => aco.score_floor = parse_f64(value)?,
            "seed" => {
                aco.seed = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(value.parse().context("Invalid seed")?)
                };
            }
            "rssi_threshold" => q.rssi_threshold = parse_f64(value)?,
            "rssi_ceiling" => q.rssi_ceiling = parse_f64(value)?,
            "snr_threshold" => q.snr_threshold = parse_f64(value)?,
            "optimal_density" => q.optimal_density = parse_f64(value)?,
            "max_speed" => q.max_speed = parse_f64(value)?,
            "communication_range" => q.communication_range = parse_f64(value)?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        aco.validate()
            .with_context(|| format!("Rejected {} = {}", key, value))?;

        self.aco = aco;
        self.save()
    }

    /// Get one value by key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Every settable key with its current value
    pub fn list(&self) -> Vec<(String, String)> {
        let aco = &self.aco;
        let q = &aco.quality;
        vec![
            ("alpha".into(), aco.alpha.to_string()),
            ("beta".into(), aco.beta.to_string()),
            ("gamma".into(), aco.gamma.to_string()),
            ("delta".into(), aco.delta.to_string()),
            ("epsilon".into(), aco.epsilon.to_string()),
            ("q0".into(), aco.q0.to_string()),
            ("min_pheromone".into(), aco.min_pheromone.to_string()),
            ("max_pheromone".into(), aco.max_pheromone.to_string()),
            ("initial_pheromone".into(), aco.initial_pheromone.to_string()),
            ("evaporation_rate".into(), aco.evaporation_rate.to_string()),
            ("hop_cap".into(), aco.hop_cap.to_string()),
            ("score_floor".into(), aco.score_floor.to_string()),
            (
                "seed".into(),
                aco.seed.map_or_else(|| "none".to_string(), |s| s.to_string()),
            ),
            ("rssi_threshold".into(), q.rssi_threshold.to_string()),
            ("rssi_ceiling".into(), q.rssi_ceiling.to_string()),
            ("snr_threshold".into(), q.snr_threshold.to_string()),
            ("optimal_density".into(), q.optimal_density.to_string()),
            ("max_speed".into(), q.max_speed.to_string()),
            ("communication_range".into(), q.communication_range.to_string()),
        ]
    }
}

fn parse_f64(value: &str) -> Result<f64> {
    value.parse().context("Invalid number")
}
