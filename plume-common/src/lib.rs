pub mod config;
pub mod error;
pub mod layout;
pub mod mode;
pub mod snapshot;
pub mod swarm_params;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    OdorConfig, OdorGridConfig, OutputConfig, OutputFormat, ScalarDistribution, SimulationConfig,
    SourceLayoutConfig, SwarmConfig, TimingConfig, WindConfig,
};
pub use error::{ConfigError, FieldError};
pub use layout::{create_circle_of_sources, create_grid_of_sources, OdorSource};
pub use mode::{FlyMode, ModeCounts};
pub use snapshot::Snapshot;
pub use swarm_params::{CastInterval, OdorProbabilities, OdorThresholds, SwarmParams};
pub use vecmath::{angle_to_vec, distances, linspace, shift_and_rotate, unit_vectors, vec_to_angle, Vec2};
