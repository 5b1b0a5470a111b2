//! Contagion - headless entry point
//!
//! Usage: `contagion [config.json] [seed]`
//!
//! Runs one simulation to completion and prints the status-count history as
//! JSON on stdout.

use std::path::Path;
use std::process::ExitCode;

use contagion::{ChartSeries, SimError, Simulation, SimulationConfig};

/// Seed used when none is given on the command line
const DEFAULT_SEED: u64 = 0x5eed;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Contagion (native) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SimulationConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::error!("Invalid seed: {}", e);
            return ExitCode::FAILURE;
        }
        None => DEFAULT_SEED,
    };

    match run(config, seed) {
        Ok(series) => match serde_json::to_string_pretty(&series) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize chart: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            log::error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: SimulationConfig, seed: u64) -> Result<ChartSeries, SimError> {
    let mut sim = Simulation::new(config, seed)?;
    let mut series = ChartSeries::new(&sim);
    series.observe(&mut sim);

    sim.start();
    while sim.is_running() {
        sim.update()?;
        series.observe(&mut sim);
    }

    let counts = sim.status_counts();
    log::info!(
        "Finished after {} ticks ({:.1}s): {} good, {} recovered, {} dead",
        sim.tick(),
        sim.config().secs_from_ticks(sim.tick()),
        counts.good,
        counts.recovered,
        counts.dead
    );
    Ok(series)
}
