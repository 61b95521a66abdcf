use anyhow::Result;
use clap::Parser;
use log::{debug, info, trace, warn};
use plume_common::SimulationConfig;
use plume_swarm::output;
use plume_swarm::Simulation;
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the swarm simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the random seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Override the stop time (seconds) from the config
    #[arg(long)]
    t_stop: Option<f64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting odor plume swarm simulation...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(t_stop) = args.t_stop {
        config.timing.t_stop = t_stop;
        config.validate()?;
    }
    debug!("Configuration: {:#?}", config);

    // --- Initialize Simulation ---
    let mut sim = Simulation::new(config)?;
    let size = sim.swarm().size();
    info!("Swarm initialized with {} flies (seed {}).", size, sim.config().seed);

    // --- Simulation Loop ---
    let timing = sim.config().timing.clone();
    let total_steps = sim.config().total_steps();
    let mut record_interval_steps = (timing.record_interval / timing.dt).round() as u64;
    if record_interval_steps == 0 {
        warn!(
            "Record interval ({:.2} s) is smaller than the time step ({:.2} s). Recording every step.",
            timing.record_interval, timing.dt
        );
        record_interval_steps = 1;
    }
    info!(
        "Running {} steps of {} s, recording every {} steps.",
        total_steps, timing.dt, record_interval_steps
    );

    let start_time = Instant::now();
    sim.record_snapshot();

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if is_record_step || is_last_step {
            let trap_counts = sim.trap_counts();
            let total: u32 = trap_counts.iter().sum();
            info!(
                "t: {:.2} | {}/{}: {:?} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                sim.time(),
                total,
                size,
                trap_counts,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            sim.record_snapshot();
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    info!(
        "Simulation finished in {:.3} seconds. {} of {} flies trapped.",
        start_time.elapsed().as_secs_f64(),
        sim.swarm().total_trapped(),
        size
    );

    // --- Save Recorded Data ---
    let out = sim.config().output.clone();
    if out.save_stats {
        output::save_snapshots(&out.base_filename, out.format, sim.get_recorded_snapshots())?;
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }
    if out.save_final_positions {
        output::save_final_positions(&out.base_filename, sim.swarm())?;
    }
    if out.save_trap_records {
        output::save_trap_records(&out.base_filename, sim.swarm())?;
    }
    if let Some(grid_config) = &out.odor_grid {
        let grid = sim.odor_field().sample_grid(
            grid_config.time,
            (grid_config.xlim[0], grid_config.xlim[1]),
            (grid_config.ylim[0], grid_config.ylim[1]),
            grid_config.xnum,
            grid_config.ynum,
        );
        output::save_odor_grid(&out.base_filename, &grid)?;
    }

    info!("Simulation Complete.");
    Ok(())
}
