//! Headless driver: run the simulation for a while on a chosen backend and
//! report throughput.
//!
//! Usage: kinetica [sequential|parallel|gpu] [body_count] [seconds]

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use kinetica_core::SimConfig;
use kinetica_sim::{BackendKind, SimulationEngine};

const FRAME_DT: f32 = 0.016;

fn parse_backend(name: &str) -> Result<BackendKind> {
    match name {
        "sequential" => Ok(BackendKind::Sequential),
        "parallel" => Ok(BackendKind::WorkerParallel),
        "gpu" => Ok(BackendKind::GpuCompute),
        other => bail!("unknown backend {other:?} (expected sequential, parallel or gpu)"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let backend = match args.next() {
        Some(name) => parse_backend(&name)?,
        None => BackendKind::Sequential,
    };
    let body_count: u32 = args.next().map_or(Ok(5_000), |s| s.parse())?;
    let seconds: f32 = args.next().map_or(Ok(3.0), |s| s.parse())?;

    let config = SimConfig {
        body_count,
        ..SimConfig::default()
    };
    let mut engine = SimulationEngine::with_backend(config, backend)?;

    eprintln!(
        "simulating {} bodies in {}x{} on the {} backend...",
        engine.body_count(),
        engine.width(),
        engine.height(),
        engine.backend_name()
    );

    let start = Instant::now();
    let mut frames = 0u64;
    while start.elapsed() < Duration::from_secs_f32(seconds) {
        engine.step(FRAME_DT);
        frames += 1;
    }
    let elapsed = start.elapsed().as_secs_f64();

    // Pull the final state back (a readback on the GPU path) so the run
    // cost includes one full snapshot, like a frame served to viewers.
    let frame = engine.frame_snapshot();
    let mean_x = frame.bodies.iter().map(|b| b.x as f64).sum::<f64>() / frame.bodies.len().max(1) as f64;

    println!(
        "{} frames in {:.2}s ({:.1} fps), {} bodies (mean x {:.1}), {} failed passes",
        frames,
        elapsed,
        frames as f64 / elapsed,
        frame.bodies.len(),
        mean_x,
        engine.failed_passes()
    );

    Ok(())
}
