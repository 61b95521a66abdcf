//! Swarm of flies tracking odor plumes under a constant wind.
//!
//! The [`swarm::Swarm`] engine advances every fly through a behavioural state
//! machine (fixed heading, upwind flight, casting, trapped) driven by
//! stochastic odor detection. It queries a [`wind::WindField`] and an
//! [`odor::OdorField`] at all positions once per step.

pub mod odor;
pub mod output;
pub mod simulation;
pub mod swarm;
pub mod swarm_state;
pub mod wind;

pub use odor::{DiffusionOdorField, DiffusionOdorParams, OdorField, OdorGrid, TrapHit};
pub use simulation::Simulation;
pub use swarm::{per_step_probability, Swarm};
pub use swarm_state::{SwarmState, TrapRecord};
pub use wind::{ConstantWindField, WindField};
