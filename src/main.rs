//! Tidewave - headless cascaded FFT ocean
//!
//! Runs the simulation for a number of frames, logs the water height under a
//! probe point and optionally dumps the cascades as PNGs.

mod cli;

use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use tidewave::export::{export_height_png, export_turbulence_png};
use tidewave::Ocean;

use cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut ocean = Ocean::new(args.to_config())?;
    let probe = Vec3::new(args.probe_x, 0.0, args.probe_z);

    let start = Instant::now();
    for frame in 0..args.frames {
        let time = frame as f32 * args.dt;
        ocean.update(time)?;
        if args.sync {
            ocean.sync_readback(Duration::from_secs(1));
        }
        log::info!(
            "frame {frame:>4}  t={time:7.3}s  height={:+.3}m",
            ocean.water_height(probe)
        );
    }
    let elapsed = start.elapsed();
    log::info!(
        "Simulated {} frames in {:.1}ms ({:.2}ms/frame)",
        args.frames,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / args.frames.max(1) as f64
    );

    if let Some(dir) = &args.export {
        std::fs::create_dir_all(dir)?;
        for (i, cascade) in ocean.cascades().iter().enumerate() {
            export_height_png(cascade, dir.join(format!("cascade{i}_height.png")))?;
            export_turbulence_png(cascade, dir.join(format!("cascade{i}_turbulence.png")))?;
        }
        log::info!("Exported {} cascades to {}", ocean.cascades().len(), dir.display());
    }

    ocean.dispose();
    Ok(())
}
