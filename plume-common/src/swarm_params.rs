use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Odor concentration levels gating mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdorThresholds {
    /// At or below this a fly tracking the plume may lose it.
    pub lower: f64,
    /// At or above this a searching fly may detect the plume.
    pub upper: f64,
}

/// Per-second probabilities of acting on the odor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdorProbabilities {
    /// Probability/sec of losing the plume while under the lower threshold.
    pub lower: f64,
    /// Probability/sec of detecting the plume while over the upper threshold.
    pub upper: f64,
}

/// Bounds of the uniform distribution a cast duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastInterval {
    pub min: f64,
    pub max: f64,
}

/// Parameters consumed by the swarm engine at construction.
///
/// The per-agent vectors all have one entry per fly; [`SwarmParams::validate`]
/// rejects any set where they disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmParams {
    // Per agent
    pub initial_heading: Vec<f64>, // radians
    pub x_start_position: Vec<f64>,
    pub y_start_position: Vec<f64>,
    pub flight_speed: Vec<f64>,
    pub release_time: Vec<f64>,

    // Shared
    pub heading_error_std: f64, // radians
    pub cast_interval: CastInterval,
    pub wind_slippage: f64,
    pub odor_thresholds: OdorThresholds,
    pub odor_probabilities: OdorProbabilities,
}

impl SwarmParams {
    /// Number of flies, taken from the heading array.
    pub fn size(&self) -> usize {
        self.initial_heading.len()
    }

    /// Checks array shapes and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.size();
        if size == 0 {
            return Err(ConfigError::EmptySwarm);
        }

        let per_agent: [(&'static str, &[f64]); 4] = [
            ("x_start_position", &self.x_start_position),
            ("y_start_position", &self.y_start_position),
            ("flight_speed", &self.flight_speed),
            ("release_time", &self.release_time),
        ];
        for (field, values) in per_agent {
            if values.len() != size {
                return Err(ConfigError::ShapeMismatch {
                    field,
                    expected: size,
                    actual: values.len(),
                });
            }
        }

        let finite: [(&'static str, &[f64]); 5] = [
            ("initial_heading", &self.initial_heading),
            ("x_start_position", &self.x_start_position),
            ("y_start_position", &self.y_start_position),
            ("flight_speed", &self.flight_speed),
            ("release_time", &self.release_time),
        ];
        for (field, values) in finite {
            if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
                return Err(ConfigError::invalid(field, format!("entry {idx} is not finite")));
            }
        }
        if let Some(idx) = self.flight_speed.iter().position(|&v| v < 0.0) {
            return Err(ConfigError::invalid("flight_speed", format!("entry {idx} is negative")));
        }

        if !(self.heading_error_std.is_finite() && self.heading_error_std >= 0.0) {
            return Err(ConfigError::invalid(
                "heading_error_std",
                format!("must be finite and >= 0, got {}", self.heading_error_std),
            ));
        }

        let CastInterval { min, max } = self.cast_interval;
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min <= max) {
            return Err(ConfigError::invalid(
                "cast_interval",
                format!("expected 0 <= min <= max, got [{min}, {max}]"),
            ));
        }

        if !self.wind_slippage.is_finite() {
            return Err(ConfigError::invalid("wind_slippage", "must be finite"));
        }

        let OdorThresholds { lower, upper } = self.odor_thresholds;
        if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
            return Err(ConfigError::invalid(
                "odor_thresholds",
                format!("expected finite lower <= upper, got lower={lower}, upper={upper}"),
            ));
        }

        for (field, p) in [
            ("odor_probabilities.lower", self.odor_probabilities.lower),
            ("odor_probabilities.upper", self.odor_probabilities.upper),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::invalid(field, format!("{p} is outside [0, 1]")));
            }
        }

        Ok(())
    }
}
