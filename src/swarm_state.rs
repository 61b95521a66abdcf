use crate::odor::TrapHit;
use plume_common::{angle_to_vec, FlyMode, SwarmParams, Vec2};
use serde::{Deserialize, Serialize};

/// Where and when a fly was caught. Written once, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapRecord {
    pub trap_num: usize,
    pub location: Vec2,
    pub time: f64,
}

/// Per-fly state vectors. Every vector has exactly `size` entries for the
/// lifetime of the swarm.
#[derive(Debug, Clone)]
pub struct SwarmState {
    pub size: usize,

    pub positions: Vec<Vec2>,
    /// Heading times speed; the behavioural part of the motion.
    pub velocities: Vec<Vec2>,
    pub modes: Vec<FlyMode>,

    /// Angular noise drawn on each mode entry.
    pub heading_error: Vec<f64>,
    /// Sweep direction while casting, +1 or -1.
    pub cast_sign: Vec<f64>,
    pub t_last_cast: Vec<f64>,
    pub dt_next_cast: Vec<f64>,

    pub traps: Vec<Option<TrapRecord>>,
}

impl SwarmState {
    /// Lays out the initial state. `dt_next_cast` and `cast_sign` are drawn by
    /// the caller so that all randomness stays with the engine's generator.
    pub fn new(params: &SwarmParams, dt_next_cast: Vec<f64>, cast_sign: Vec<f64>) -> Self {
        let size = params.size();
        let positions = params
            .x_start_position
            .iter()
            .zip(&params.y_start_position)
            .map(|(&x, &y)| Vec2::new(x, y))
            .collect();
        let velocities = params
            .initial_heading
            .iter()
            .zip(&params.flight_speed)
            .map(|(&heading, &speed)| angle_to_vec(heading).scale(speed))
            .collect();

        Self {
            size,
            positions,
            velocities,
            modes: vec![FlyMode::FixHeading; size],
            heading_error: vec![0.0; size],
            cast_sign,
            t_last_cast: vec![0.0; size],
            dt_next_cast,
            traps: vec![None; size],
        }
    }

    /// Moves a fly into the trap it hit. No-op for a fly already trapped.
    pub fn trap(&mut self, idx: usize, hit: TrapHit, t: f64) {
        if self.modes[idx] == FlyMode::Trapped {
            return;
        }
        self.modes[idx] = FlyMode::Trapped;
        self.velocities[idx] = Vec2::zero();
        self.traps[idx] = Some(TrapRecord {
            trap_num: hit.index,
            location: hit.location,
            time: t,
        });
    }

    pub fn is_trapped(&self, idx: usize) -> bool {
        self.modes[idx] == FlyMode::Trapped
    }
}
