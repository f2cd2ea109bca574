use std::env;
use std::path::PathBuf;

use chemflow_rs::config::Parameters;
use chemflow_rs::io::create_sink;
use chemflow_rs::solver::Simulation;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env("CHEMFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("conf/wire.json"));

    let params = Parameters::from_file(&config_path)?;
    let mut sink = create_sink(
        &params.output,
        params.dimensions(),
        params.cell_size(),
        &params.species_names(),
    )?;

    let mut simulation = Simulation::new(params)?;
    let summary = simulation.run(sink.as_mut())?;

    info!(
        "Done: {} steps up to t={:.4}, {} snapshots",
        summary.steps, summary.time, summary.snapshots
    );
    if summary.unconverged_steps > 0 {
        warn!(
            "Pressure iteration hit itermax in {} of {} steps",
            summary.unconverged_steps, summary.steps
        );
    }
    Ok(())
}
