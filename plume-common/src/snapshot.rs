use crate::mode::ModeCounts;
use serde::{Deserialize, Serialize};

/// A snapshot of the swarm statistics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The simulation time (seconds) at which the snapshot was taken.
    pub time: f64,
    /// The total number of flies in the swarm.
    pub total_agent_count: u32,
    /// Flies whose release time has passed.
    pub released_count: u32,
    /// How many flies are in each behavioural mode.
    pub mode_counts: ModeCounts,
    /// `trap_counts[i]` is the number of flies caught by trap `i`.
    pub trap_counts: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<(f64, f64)>>,
}

impl Snapshot {
    pub fn total_trapped(&self) -> u32 {
        self.trap_counts.iter().sum()
    }
}
