use crate::error::ConfigError;
use crate::layout::{create_circle_of_sources, create_grid_of_sources, OdorSource};
use crate::swarm_params::{OdorProbabilities, OdorThresholds};
use crate::vecmath::Vec2;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Wind model, loaded from the [wind] section. Only a constant wind exists;
// any other `model` string fails to parse.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum WindConfig {
    Constant { angle_deg: f64, speed: f64 },
}

// Where the odor sources (and their traps) are placed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum SourceLayoutConfig {
    Circle {
        number: usize,
        radius: f64,
        strength: f64,
    },
    Grid {
        x_num: usize,
        y_num: usize,
        x_range: [f64; 2],
        y_range: [f64; 2],
        strength: f64,
    },
    Explicit {
        locations: Vec<[f64; 2]>,
        strengths: Vec<f64>,
    },
}

impl SourceLayoutConfig {
    /// Expands the layout into the ordered source list. Order fixes trap indices.
    pub fn sources(&self) -> Result<Vec<OdorSource>, ConfigError> {
        match self {
            SourceLayoutConfig::Circle { number, radius, strength } => {
                Ok(create_circle_of_sources(*number, *radius, *strength))
            }
            SourceLayoutConfig::Grid { x_num, y_num, x_range, y_range, strength } => Ok(create_grid_of_sources(
                *x_num,
                *y_num,
                (x_range[0], x_range[1]),
                (y_range[0], y_range[1]),
                *strength,
            )),
            SourceLayoutConfig::Explicit { locations, strengths } => {
                if strengths.len() != locations.len() {
                    return Err(ConfigError::ShapeMismatch {
                        field: "odor.sources.strengths",
                        expected: locations.len(),
                        actual: strengths.len(),
                    });
                }
                Ok(locations
                    .iter()
                    .zip(strengths)
                    .map(|(loc, &strength)| OdorSource::new(Vec2::new(loc[0], loc[1]), strength))
                    .collect())
            }
        }
    }
}

// Configuration for the odor field
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OdorConfig {
    pub diffusion_coeff: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    pub trap_radius: f64,
    pub sources: SourceLayoutConfig,
}

/// How a per-agent value is drawn for each fly.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScalarDistribution {
    Fixed { value: f64 },
    Uniform { min: f64, max: f64 },
    Exponential { mean: f64 },
}

impl ScalarDistribution {
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        match *self {
            ScalarDistribution::Fixed { value } if !value.is_finite() => {
                Err(ConfigError::invalid(field, "fixed value must be finite"))
            }
            ScalarDistribution::Uniform { min, max } if !(min.is_finite() && max.is_finite() && min <= max) => {
                Err(ConfigError::invalid(field, format!("uniform bounds [{min}, {max}] are not ordered")))
            }
            ScalarDistribution::Exponential { mean } if !(mean.is_finite() && mean > 0.0) => {
                Err(ConfigError::invalid(field, format!("exponential mean must be positive, got {mean}")))
            }
            _ => Ok(()),
        }
    }
}

// Swarm settings, loaded from the [swarm] section
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SwarmConfig {
    pub size: usize,
    #[serde(default)]
    pub start_position: [f64; 2],
    pub initial_heading_deg: ScalarDistribution,
    pub heading_error_std_deg: f64,
    pub flight_speed: ScalarDistribution,
    #[serde(default = "default_release_time")]
    pub release_time: ScalarDistribution,
    pub cast_interval: [f64; 2],
    #[serde(default)]
    pub wind_slippage: f64,
    pub odor_thresholds: OdorThresholds,
    pub odor_probabilities: OdorProbabilities,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub t_stop: f64,
    pub record_interval: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    MessagePack,
}

// Region and resolution of an exported odor concentration grid
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OdorGridConfig {
    pub xlim: [f64; 2],
    pub ylim: [f64; 2],
    pub xnum: usize,
    pub ynum: usize,
    #[serde(default)]
    pub time: f64,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    #[serde(default = "default_true")]
    pub save_final_positions: bool,
    #[serde(default = "default_true")]
    pub save_trap_records: bool,
    #[serde(default)]
    pub odor_grid: Option<OdorGridConfig>,
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub wind: WindConfig,
    pub odor: OdorConfig,
    pub swarm: SwarmConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid configuration in '{}'", path_ref.display()))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects malformed values. Checks that need the sampled per-agent arrays
    /// happen later, in `SwarmParams::validate`.
    pub fn validate(&self) -> Result<()> {
        let WindConfig::Constant { angle_deg, speed } = self.wind;
        if !angle_deg.is_finite() {
            anyhow::bail!("wind.angle_deg must be finite.");
        }
        if !(speed.is_finite() && speed > 0.0) {
            anyhow::bail!("wind.speed must be positive, got {}.", speed);
        }

        let sources = self.odor.sources.sources()?;
        if sources.is_empty() {
            anyhow::bail!("odor.sources must produce at least one source.");
        }

        if self.swarm.size == 0 {
            return Err(ConfigError::EmptySwarm.into());
        }
        self.swarm.initial_heading_deg.validate("swarm.initial_heading_deg")?;
        self.swarm.flight_speed.validate("swarm.flight_speed")?;
        self.swarm.release_time.validate("swarm.release_time")?;

        let t = &self.timing;
        if !(t.dt.is_finite() && t.dt > 0.0) {
            anyhow::bail!("timing.dt must be positive, got {}.", t.dt);
        }
        if !(t.t_stop.is_finite() && t.t_stop >= 0.0) {
            anyhow::bail!("timing.t_stop must be >= 0, got {}.", t.t_stop);
        }
        if !(t.record_interval.is_finite() && t.record_interval >= 0.0) {
            anyhow::bail!("timing.record_interval must be >= 0, got {}.", t.record_interval);
        }

        if let Some(grid) = &self.output.odor_grid {
            if grid.xnum == 0 || grid.ynum == 0 {
                anyhow::bail!("output.odor_grid needs at least one sample per axis.");
            }
        }

        Ok(())
    }

    /// Number of `dt` steps needed to reach `t_stop`.
    pub fn total_steps(&self) -> u64 {
        (self.timing.t_stop / self.timing.dt).ceil() as u64
    }
}

fn default_epsilon() -> f64 {
    0.01
}

fn default_release_time() -> ScalarDistribution {
    ScalarDistribution::Fixed { value: 0.0 }
}

fn default_true() -> bool {
    true
}
