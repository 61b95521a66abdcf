use crate::odor::{DiffusionOdorField, DiffusionOdorParams, OdorField};
use crate::swarm::Swarm;
use crate::wind::ConstantWindField;
use anyhow::Result;
use log::{debug, info};
use plume_common::{
    CastInterval, ConfigError, ScalarDistribution, SimulationConfig, Snapshot, SwarmParams,
};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Exp;

/// Owns the wind field, the odor field and the swarm, and drives the swarm
/// through time with a fixed step.
pub struct Simulation {
    config: SimulationConfig,
    wind: ConstantWindField,
    odor: DiffusionOdorField,
    swarm: Swarm,
    /// Number of completed steps.
    current_time_step: u64,
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Builds fields and swarm from a validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        // One generator for everything random: first the per-fly parameters,
        // then the swarm's own draws.
        let mut rng = StdRng::seed_from_u64(config.seed);

        let wind = ConstantWindField::from_config(&config.wind);
        let odor = DiffusionOdorField::new(wind, DiffusionOdorParams::from_config(&config.odor)?)?;
        info!(
            "Odor field: {} sources (one trap each), trap radius {}, diffusion {}",
            odor.trap_count(),
            odor.trap_radius(),
            config.odor.diffusion_coeff
        );

        let params = build_swarm_params(&config, &mut rng)?;
        let swarm = Swarm::new(params, rng)?;
        debug!("Swarm parameters validated for {} flies.", swarm.size());

        Ok(Self {
            config,
            wind,
            odor,
            swarm,
            current_time_step: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Simulation time at the start of the next step.
    pub fn time(&self) -> f64 {
        self.current_time_step as f64 * self.config.timing.dt
    }

    /// Advances the swarm by one `dt`.
    pub fn step(&mut self) {
        let t = self.time();
        self.swarm.update(t, self.config.timing.dt, &self.wind, &self.odor);
        self.current_time_step += 1;
    }

    pub fn current_time_step(&self) -> u64 {
        self.current_time_step
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn odor_field(&self) -> &DiffusionOdorField {
        &self.odor
    }

    pub fn wind_field(&self) -> &ConstantWindField {
        &self.wind
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Flies caught by each trap.
    pub fn trap_counts(&self) -> Vec<u32> {
        self.swarm.trap_counts(self.odor.trap_count())
    }

    /// Current positions of all flies as (x, y) tuples.
    pub fn get_results(&self) -> Vec<(f64, f64)> {
        self.swarm.positions().iter().map(|p| (p.x, p.y)).collect()
    }

    /// Collects the swarm statistics and stores them as a Snapshot.
    pub fn record_snapshot(&mut self) {
        let time = self.time();
        let positions = if self.config.output.save_positions_in_snapshot {
            Some(self.get_results())
        } else {
            None
        };

        let snapshot = Snapshot {
            time,
            total_agent_count: self.swarm.size() as u32,
            released_count: self.swarm.released_count(time) as u32,
            mode_counts: self.swarm.mode_counts(),
            trap_counts: self.trap_counts(),
            positions,
        };
        debug!(
            "Recording snapshot at t={:.2}: {} trapped, {:?}",
            time,
            snapshot.total_trapped(),
            snapshot.mode_counts
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }
}

/// Draws the per-fly parameter arrays described by the [swarm] section.
pub fn build_swarm_params(config: &SimulationConfig, rng: &mut StdRng) -> Result<SwarmParams> {
    let swarm = &config.swarm;
    let size = swarm.size;

    let initial_heading = sample_values(&swarm.initial_heading_deg, size, rng)?
        .into_iter()
        .map(f64::to_radians)
        .collect();
    let flight_speed = sample_values(&swarm.flight_speed, size, rng)?;
    let release_time = sample_values(&swarm.release_time, size, rng)?;

    Ok(SwarmParams {
        initial_heading,
        x_start_position: vec![swarm.start_position[0]; size],
        y_start_position: vec![swarm.start_position[1]; size],
        flight_speed,
        release_time,
        heading_error_std: swarm.heading_error_std_deg.to_radians(),
        cast_interval: CastInterval {
            min: swarm.cast_interval[0],
            max: swarm.cast_interval[1],
        },
        wind_slippage: swarm.wind_slippage,
        odor_thresholds: swarm.odor_thresholds,
        odor_probabilities: swarm.odor_probabilities,
    })
}

/// `count` independent draws from `dist`.
pub fn sample_values(dist: &ScalarDistribution, count: usize, rng: &mut StdRng) -> Result<Vec<f64>> {
    let values = match *dist {
        ScalarDistribution::Fixed { value } => vec![value; count],
        ScalarDistribution::Uniform { min, max } => {
            let uniform = Uniform::new_inclusive(min, max)
                .map_err(|e| ConfigError::invalid("uniform distribution", e.to_string()))?;
            (0..count).map(|_| rng.sample(&uniform)).collect()
        }
        ScalarDistribution::Exponential { mean } => {
            let exp = Exp::new(1.0 / mean)
                .map_err(|e| ConfigError::invalid("exponential distribution", e.to_string()))?;
            (0..count).map(|_| rng.sample(exp)).collect()
        }
    };
    Ok(values)
}
