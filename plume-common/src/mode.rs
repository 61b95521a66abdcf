use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Behavioural mode of a single fly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlyMode {
    /// Flying straight at the initial heading.
    #[default]
    FixHeading,
    /// Tracking a plume, flying upwind.
    FlyUpwind,
    /// Plume lost, sweeping back and forth to reacquire it.
    CastForOdor,
    /// Caught by a trap. Absorbing.
    Trapped,
}

impl FlyMode {
    pub const ALL: [FlyMode; 4] = [
        FlyMode::FixHeading,
        FlyMode::FlyUpwind,
        FlyMode::CastForOdor,
        FlyMode::Trapped,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            FlyMode::FixHeading => 0,
            FlyMode::FlyUpwind => 1,
            FlyMode::CastForOdor => 2,
            FlyMode::Trapped => 3,
        }
    }
}

impl TryFrom<u8> for FlyMode {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlyMode::FixHeading),
            1 => Ok(FlyMode::FlyUpwind),
            2 => Ok(FlyMode::CastForOdor),
            3 => Ok(FlyMode::Trapped),
            other => Err(ConfigError::UnknownMode(other)),
        }
    }
}

/// Number of agents in each mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCounts {
    pub fix_heading: u32,
    pub fly_upwind: u32,
    pub cast_for_odor: u32,
    pub trapped: u32,
}

impl ModeCounts {
    pub fn from_modes(modes: &[FlyMode]) -> Self {
        let mut counts = ModeCounts::default();
        for mode in modes {
            match mode {
                FlyMode::FixHeading => counts.fix_heading += 1,
                FlyMode::FlyUpwind => counts.fly_upwind += 1,
                FlyMode::CastForOdor => counts.cast_for_odor += 1,
                FlyMode::Trapped => counts.trapped += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.fix_heading + self.fly_upwind + self.cast_for_odor + self.trapped
    }
}
