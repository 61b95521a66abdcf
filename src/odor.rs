use crate::wind::ConstantWindField;
use plume_common::{linspace, shift_and_rotate, ConfigError, FieldError, OdorConfig, OdorSource, Vec2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Result of a successful trap test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapHit {
    /// Index of the trap (and its source) in construction order.
    pub index: usize,
    pub location: Vec2,
}

/// A scalar odor concentration field with traps at its sources.
pub trait OdorField {
    /// Concentration at each point at time `t`. A single point is a batch of one.
    fn value(&self, t: f64, points: &[Vec2]) -> Vec<f64>;

    /// The lowest-indexed trap containing `position`, if any.
    fn check_if_in_trap(&self, position: Vec2) -> Option<TrapHit>;

    /// Number of traps; trap indices run over `0..trap_count()`.
    fn trap_count(&self) -> usize;

    fn is_in_trap(&self, position: Vec2) -> bool {
        self.check_if_in_trap(position).is_some()
    }

    /// Same query with the positions split into x and y slices.
    fn value_xy(&self, t: f64, x: &[f64], y: &[f64]) -> Result<Vec<f64>, FieldError> {
        if x.len() != y.len() {
            return Err(FieldError::ShapeMismatch { x_len: x.len(), y_len: y.len() });
        }
        let points: Vec<Vec2> = x.iter().zip(y).map(|(&x, &y)| Vec2::new(x, y)).collect();
        Ok(self.value(t, &points))
    }
}

/// Construction parameters of a [`DiffusionOdorField`].
#[derive(Debug, Clone)]
pub struct DiffusionOdorParams {
    pub diffusion_coeff: f64,
    pub sources: Vec<OdorSource>,
    /// Offsets travel time so the profile stays finite at the source.
    pub epsilon: f64,
    pub trap_radius: f64,
}

impl DiffusionOdorParams {
    pub fn from_config(config: &OdorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            diffusion_coeff: config.diffusion_coeff,
            sources: config.sources.sources()?,
            epsilon: config.epsilon,
            trap_radius: config.trap_radius,
        })
    }
}

/// Concentration sampled on a regular grid, row-major with `y` as the row index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdorGrid {
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub values: Vec<f64>,
}

impl OdorGrid {
    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.x_values.len() {
            return None;
        }
        self.values.get(iy * self.x_values.len() + ix).copied()
    }
}

/// Point sources advected by a constant wind with cross-wind diffusion.
///
/// Each source contributes a Gaussian cross-wind profile whose width grows
/// with the travel time `tt = x' / wind_speed` from the source, `x'` being
/// the downwind coordinate in the source's wind-aligned frame. Points that
/// the wind has not carried odor to yet (`tt < 0`) get nothing from that
/// source. The field does not depend on time.
#[derive(Debug, Clone)]
pub struct DiffusionOdorField {
    wind: ConstantWindField,
    params: DiffusionOdorParams,
}

impl DiffusionOdorField {
    pub fn new(wind: ConstantWindField, params: DiffusionOdorParams) -> Result<Self, ConfigError> {
        if !(wind.speed().is_finite() && wind.speed() > 0.0) {
            return Err(ConfigError::invalid(
                "wind.speed",
                format!("odor advection needs a positive wind speed, got {}", wind.speed()),
            ));
        }
        if !(params.diffusion_coeff.is_finite() && params.diffusion_coeff > 0.0) {
            return Err(ConfigError::invalid(
                "diffusion_coeff",
                format!("must be positive, got {}", params.diffusion_coeff),
            ));
        }
        if !(params.epsilon.is_finite() && params.epsilon > 0.0) {
            return Err(ConfigError::invalid("epsilon", format!("must be positive, got {}", params.epsilon)));
        }
        if !(params.trap_radius.is_finite() && params.trap_radius >= 0.0) {
            return Err(ConfigError::invalid(
                "trap_radius",
                format!("must be >= 0, got {}", params.trap_radius),
            ));
        }
        if let Some(idx) = params
            .sources
            .iter()
            .position(|s| !(s.strength.is_finite() && s.location.x.is_finite() && s.location.y.is_finite()))
        {
            return Err(ConfigError::invalid("sources", format!("source {idx} is not finite")));
        }
        Ok(Self { wind, params })
    }

    pub fn sources(&self) -> &[OdorSource] {
        &self.params.sources
    }

    pub fn trap_radius(&self) -> f64 {
        self.params.trap_radius
    }

    /// Samples the field over `linspace(xlim, xnum) x linspace(ylim, ynum)`.
    pub fn sample_grid(&self, t: f64, xlim: (f64, f64), ylim: (f64, f64), xnum: usize, ynum: usize) -> OdorGrid {
        let x_values = linspace(xlim.0, xlim.1, xnum);
        let y_values = linspace(ylim.0, ylim.1, ynum);
        let points: Vec<Vec2> = y_values
            .iter()
            .flat_map(|&y| x_values.iter().map(move |&x| Vec2::new(x, y)))
            .collect();
        let values = self.value(t, &points);
        OdorGrid { x_values, y_values, values }
    }
}

impl OdorField for DiffusionOdorField {
    fn value(&self, _t: f64, points: &[Vec2]) -> Vec<f64> {
        let wind_angle = self.wind.angle();
        let wind_speed = self.wind.speed();
        let d = self.params.diffusion_coeff;
        let eps = self.params.epsilon;

        let mut odor = vec![0.0; points.len()];
        for source in &self.params.sources {
            let term_0 = source.strength * (4.0 * PI * d * eps).sqrt();
            odor.par_iter_mut().zip(points.par_iter()).for_each(|(acc, &p)| {
                let local = shift_and_rotate(p, source.location, -wind_angle);
                let tt = local.x / wind_speed;
                // Upwind of the source: not reached yet.
                if tt >= 0.0 {
                    let spread = 4.0 * d * (tt + eps);
                    *acc += term_0 / (PI * spread).sqrt() * (-local.y * local.y / spread).exp();
                }
            });
        }
        odor
    }

    fn check_if_in_trap(&self, position: Vec2) -> Option<TrapHit> {
        self.params
            .sources
            .iter()
            .enumerate()
            .find(|(_, source)| position.distance(source.location) <= self.params.trap_radius)
            .map(|(index, source)| TrapHit { index, location: source.location })
    }

    fn trap_count(&self) -> usize {
        self.params.sources.len()
    }
}
