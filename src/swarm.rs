use crate::odor::OdorField;
use crate::swarm_state::{SwarmState, TrapRecord};
use crate::wind::WindField;
use log::{debug, trace};
use plume_common::{unit_vectors, ConfigError, FlyMode, ModeCounts, SwarmParams, Vec2};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;

/// Converts a per-second event probability into the probability of the event
/// happening at least once during a step of `dt` seconds.
pub fn per_step_probability(p_per_sec: f64, dt: f64) -> f64 {
    1.0 - (1.0 - p_per_sec).powf(dt)
}

/// Mode selections taken from the state before any update in the step.
struct StepMasks {
    released: Vec<bool>,
    fix_heading: Vec<bool>,
    fly_upwind: Vec<bool>,
    cast_for_odor: Vec<bool>,
}

/// Transition counts for one step, for logging.
#[derive(Debug, Default, Clone, Copy)]
struct StepCounts {
    detected: usize,
    lost: usize,
    recast: usize,
    trapped: usize,
}

/// A swarm of flies searching for odor sources.
///
/// All flies are advanced together by [`Swarm::update`]. Random numbers are
/// drawn only for flies eligible for a transition, in increasing index order,
/// so a seeded run is reproducible regardless of how the rest of the swarm is
/// distributed over modes.
pub struct Swarm {
    params: SwarmParams,
    state: SwarmState,
    rng: StdRng,
    heading_noise: Normal<f64>,
    cast_duration: Uniform<f64>,
}

impl Swarm {
    /// Validates `params` and lays out the initial population.
    pub fn new(params: SwarmParams, mut rng: StdRng) -> Result<Self, ConfigError> {
        params.validate()?;

        let heading_noise = Normal::new(0.0, params.heading_error_std)
            .map_err(|e| ConfigError::invalid("heading_error_std", e.to_string()))?;
        let cast_duration = Uniform::new_inclusive(params.cast_interval.min, params.cast_interval.max)
            .map_err(|e| ConfigError::invalid("cast_interval", e.to_string()))?;

        let size = params.size();
        let dt_next_cast = (0..size).map(|_| rng.sample(cast_duration)).collect();
        let cast_sign = (0..size).map(|_| random_sign(&mut rng)).collect();
        let state = SwarmState::new(&params, dt_next_cast, cast_sign);

        debug!(
            "Swarm created: {} flies, heading error std {:.4} rad, cast interval [{}, {}]",
            size, params.heading_error_std, params.cast_interval.min, params.cast_interval.max
        );

        Ok(Self {
            params,
            state,
            rng,
            heading_noise,
            cast_duration,
        })
    }

    /// Advances every fly from time `t` by `dt`.
    pub fn update<W, O>(&mut self, t: f64, dt: f64, wind_field: &W, odor_field: &O)
    where
        W: WindField + ?Sized,
        O: OdorField + ?Sized,
    {
        let masks = self.select_modes(t);

        // Odor and wind at the current positions
        let odor = odor_field.value(t, &self.state.positions);
        let wind = wind_field.value(t, &self.state.positions);
        let wind_unit = unit_vectors(&wind);

        let mut counts = StepCounts::default();
        let detected = self.update_for_odor_detection(dt, &odor, &wind_unit, &masks);
        counts.detected = detected.iter().filter(|&&d| d).count();
        (counts.lost, counts.recast) = self.update_for_odor_loss(t, dt, &odor, &wind_unit, &masks, &detected);
        counts.trapped = self.update_for_in_trap(t, odor_field, &masks.released);
        self.integrate(dt, &wind, &masks.released);

        trace!(
            "t={:.2}: {} detected, {} lost, {} recast, {} trapped",
            t, counts.detected, counts.lost, counts.recast, counts.trapped
        );
    }

    fn select_modes(&self, t: f64) -> StepMasks {
        let released: Vec<bool> = self.params.release_time.iter().map(|&r| t > r).collect();
        let in_mode = |mode: FlyMode| -> Vec<bool> {
            self.state
                .modes
                .iter()
                .zip(&released)
                .map(|(&m, &rel)| rel && m == mode)
                .collect()
        };
        StepMasks {
            fix_heading: in_mode(FlyMode::FixHeading),
            fly_upwind: in_mode(FlyMode::FlyUpwind),
            cast_for_odor: in_mode(FlyMode::CastForOdor),
            released,
        }
    }

    /// Rolls one uniform number per candidate and keeps those under `p_step`.
    fn roll_for(&mut self, candidates: &[usize], p_step: f64) -> Vec<usize> {
        let dice: Vec<f64> = candidates.iter().map(|_| self.rng.random::<f64>()).collect();
        candidates
            .iter()
            .zip(&dice)
            .filter(|&(_, &roll)| roll < p_step)
            .map(|(&idx, _)| idx)
            .collect()
    }

    /// FixHeading and CastForOdor flies at or above the upper threshold may
    /// detect the plume and switch to FlyUpwind, flying into the wind.
    fn update_for_odor_detection(
        &mut self,
        dt: f64,
        odor: &[f64],
        wind_unit: &[Vec2],
        masks: &StepMasks,
    ) -> Vec<bool> {
        let upper = self.params.odor_thresholds.upper;
        let candidates: Vec<usize> = (0..self.state.size)
            .filter(|&i| (masks.fix_heading[i] || masks.cast_for_odor[i]) && odor[i] >= upper)
            .collect();
        let p_step = per_step_probability(self.params.odor_probabilities.upper, dt);
        let changed = self.roll_for(&candidates, p_step);

        let mut detected = vec![false; self.state.size];
        for &i in &changed {
            let heading_error = self.rng.sample(self.heading_noise);
            let speed = self.params.flight_speed[i];
            self.state.modes[i] = FlyMode::FlyUpwind;
            self.state.heading_error[i] = heading_error;
            self.state.velocities[i] = -(wind_unit[i].rotate(heading_error) * speed);
            detected[i] = true;
        }
        detected
    }

    /// FlyUpwind flies at or below the lower threshold may lose the plume and
    /// start casting. Flies that were already casting and whose cast has run
    /// out start a new cast in the same pass. Returns (lost, recast).
    fn update_for_odor_loss(
        &mut self,
        t: f64,
        dt: f64,
        odor: &[f64],
        wind_unit: &[Vec2],
        masks: &StepMasks,
        detected: &[bool],
    ) -> (usize, usize) {
        let size = self.state.size;
        let lower = self.params.odor_thresholds.lower;
        let candidates: Vec<usize> = (0..size)
            .filter(|&i| masks.fly_upwind[i] && odor[i] <= lower)
            .collect();
        let p_step = per_step_probability(self.params.odor_probabilities.lower, dt);
        let lost = self.roll_for(&candidates, p_step);

        let mut change = vec![false; size];
        for &i in &lost {
            self.state.modes[i] = FlyMode::CastForOdor;
            change[i] = true;
        }

        // A fly that just detected odor is no longer casting.
        let mut recast = 0;
        for i in 0..size {
            if masks.cast_for_odor[i]
                && !detected[i]
                && t > self.state.t_last_cast[i] + self.state.dt_next_cast[i]
            {
                change[i] = true;
                recast += 1;
            }
        }

        let changed: Vec<usize> = (0..size).filter(|&i| change[i]).collect();
        for &i in &changed {
            self.state.heading_error[i] = self.rng.sample(self.heading_noise);
        }
        for &i in &changed {
            self.state.dt_next_cast[i] = self.rng.sample(self.cast_duration);
            self.state.t_last_cast[i] = t;
        }
        for &i in &changed {
            self.state.cast_sign[i] = random_sign(&mut self.rng);
        }

        for &i in &changed {
            let w = wind_unit[i];
            let sweep = Vec2::new(w.x, -w.y).rotate(self.state.heading_error[i]);
            self.state.velocities[i] = sweep * (self.state.cast_sign[i] * self.params.flight_speed[i]);
        }

        (lost.len(), recast)
    }

    /// Released flies inside a trap become Trapped. Returns how many were caught.
    fn update_for_in_trap<O>(&mut self, t: f64, odor_field: &O, released: &[bool]) -> usize
    where
        O: OdorField + ?Sized,
    {
        let mut caught = 0;
        for i in 0..self.state.size {
            if !released[i] || self.state.is_trapped(i) {
                continue;
            }
            if let Some(hit) = odor_field.check_if_in_trap(self.state.positions[i]) {
                self.state.trap(i, hit, t);
                caught += 1;
            }
        }
        caught
    }

    /// Moves released, untrapped flies by their velocity plus wind slippage.
    fn integrate(&mut self, dt: f64, wind: &[Vec2], released: &[bool]) {
        let slip = dt * self.params.wind_slippage;
        for i in 0..self.state.size {
            if !released[i] || self.state.is_trapped(i) {
                continue;
            }
            let step = self.state.velocities[i] * dt;
            self.state.positions[i] += step;
            self.state.positions[i] += wind[i] * slip;
        }
    }

    // --- Read access for analysis and output ---

    pub fn size(&self) -> usize {
        self.state.size
    }

    pub fn params(&self) -> &SwarmParams {
        &self.params
    }

    pub fn state(&self) -> &SwarmState {
        &self.state
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.state.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.state.velocities
    }

    pub fn modes(&self) -> &[FlyMode] {
        &self.state.modes
    }

    pub fn trap_records(&self) -> &[Option<TrapRecord>] {
        &self.state.traps
    }

    pub fn mode_counts(&self) -> ModeCounts {
        ModeCounts::from_modes(&self.state.modes)
    }

    /// Flies whose release time is before `t`.
    pub fn released_count(&self, t: f64) -> usize {
        self.params.release_time.iter().filter(|&&r| t > r).count()
    }

    pub fn total_trapped(&self) -> usize {
        self.state.traps.iter().flatten().count()
    }

    /// Number of flies caught by each of `num_traps` traps.
    pub fn trap_counts(&self, num_traps: usize) -> Vec<u32> {
        let mut counts = vec![0u32; num_traps];
        for record in self.state.traps.iter().flatten() {
            if let Some(count) = counts.get_mut(record.trap_num) {
                *count += 1;
            }
        }
        counts
    }

    /// Sorted indices of the traps that caught at least one fly.
    pub fn trap_nums(&self) -> Vec<usize> {
        let mut nums: Vec<usize> = self.state.traps.iter().flatten().map(|r| r.trap_num).collect();
        nums.sort_unstable();
        nums.dedup();
        nums
    }

    /// Capture times, for one trap or for all traps when `trap_num` is `None`.
    pub fn times_trapped(&self, trap_num: Option<usize>) -> Vec<f64> {
        self.state
            .traps
            .iter()
            .flatten()
            .filter(|r| trap_num.map_or(true, |n| r.trap_num == n))
            .map(|r| r.time)
            .collect()
    }
}

fn random_sign(rng: &mut StdRng) -> f64 {
    if rng.random_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_second_step_keeps_rate() {
        assert!((per_step_probability(0.9, 1.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn small_steps_linearize() {
        let p = 0.002;
        for dt in [1e-3, 1e-5] {
            let step = per_step_probability(p, dt);
            assert!(((step / (p * dt)) - 1.0).abs() < 2e-3, "dt={dt}: {step}");
        }
    }

    #[test]
    fn certain_and_impossible_events() {
        assert_eq!(per_step_probability(1.0, 0.25), 1.0);
        assert_eq!(per_step_probability(0.0, 0.25), 0.0);
        assert_eq!(per_step_probability(0.5, 0.0), 0.0);
    }

    #[test]
    fn two_half_steps_match_one_full_step() {
        let p = 0.3;
        let half = per_step_probability(p, 0.5);
        let full = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((full - p).abs() < 1e-12);
    }
}
