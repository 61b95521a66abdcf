use crate::odor::OdorGrid;
use crate::swarm::Swarm;
use anyhow::{Context, Result};
use log::info;
use plume_common::{OutputFormat, Snapshot};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes all snapshots to `<base>_snapshots.<ext>` in the requested format.
pub fn save_snapshots(base_filename: &str, format: OutputFormat, snapshots: &[Snapshot]) -> Result<PathBuf> {
    let path = PathBuf::from(match format {
        OutputFormat::Json => format!("{}_snapshots.json", base_filename),
        OutputFormat::Bincode => format!("{}_snapshots.bin", base_filename),
        OutputFormat::MessagePack => format!("{}_snapshots.msgpack", base_filename),
    });
    let file = File::create(&path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, snapshots).context("Error serializing snapshots to JSON")?;
        }
        OutputFormat::Bincode => {
            bincode::serialize_into(&mut writer, snapshots).context("Error serializing snapshots to bincode")?;
        }
        OutputFormat::MessagePack => {
            rmp_serde::encode::write(&mut writer, snapshots)
                .context("Error serializing snapshots to MessagePack")?;
        }
    }
    writer.flush()?;

    info!("{} snapshots saved to {}", snapshots.len(), path.display());
    Ok(path)
}

/// Final position, mode and release time of every fly.
pub fn save_final_positions(base_filename: &str, swarm: &Swarm) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_final_positions.csv", base_filename));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;

    writer.write_record(["x", "y", "mode", "release_time"])?;
    for ((pos, mode), release) in swarm
        .positions()
        .iter()
        .zip(swarm.modes())
        .zip(&swarm.params().release_time)
    {
        writer.write_record(&[
            format!("{:.4}", pos.x),
            format!("{:.4}", pos.y),
            mode.as_u8().to_string(),
            format!("{:.4}", release),
        ])?;
    }
    writer.flush()?;

    info!("Final positions saved to {}", path.display());
    Ok(path)
}

/// One row per trapped fly: which trap, where, and when.
pub fn save_trap_records(base_filename: &str, swarm: &Swarm) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_trap_records.csv", base_filename));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;

    writer.write_record(["fly", "trap_num", "trap_x", "trap_y", "time_trapped"])?;
    for (fly, record) in swarm.trap_records().iter().enumerate() {
        if let Some(record) = record {
            writer.write_record(&[
                fly.to_string(),
                record.trap_num.to_string(),
                format!("{:.4}", record.location.x),
                format!("{:.4}", record.location.y),
                format!("{:.4}", record.time),
            ])?;
        }
    }
    writer.flush()?;

    info!("{} trap records saved to {}", swarm.total_trapped(), path.display());
    Ok(path)
}

/// Concentration grid as `x,y,value` rows.
pub fn save_odor_grid(base_filename: &str, grid: &OdorGrid) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_odor_grid.csv", base_filename));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;

    writer.write_record(["x", "y", "value"])?;
    for (iy, y) in grid.y_values.iter().enumerate() {
        for (ix, x) in grid.x_values.iter().enumerate() {
            let value = grid.get(ix, iy).unwrap_or(0.0);
            writer.write_record(&[x.to_string(), y.to_string(), format!("{:e}", value)])?;
        }
    }
    writer.flush()?;

    info!("Odor grid ({}x{}) saved to {}", grid.x_values.len(), grid.y_values.len(), path.display());
    Ok(path)
}
