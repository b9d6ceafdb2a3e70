use anyhow::{Context, Result};
use kestrel_particle_worker::cli::CliOverrides;
use kestrel_particle_worker::config::WorkerConfig;
use kestrel_particle_worker::engine::SimulationEngine;
use kestrel_particle_worker::transport;
use std::io::{self, BufReader, BufWriter};

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        eprintln!("[particle-worker] error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = match cli.config_path() {
        Some(path) => WorkerConfig::load(path)?,
        None => WorkerConfig::default(),
    };
    kestrel_particle_worker::init_logging(&config.log_filter);
    let overrides = cli.into_config_overrides();
    if !overrides.is_empty() {
        tracing::info!(fields = ?overrides.applied_fields(), "applying command line overrides");
    }
    config.apply_overrides(&overrides);

    let mut engine = SimulationEngine::new(&config);
    tracing::info!(seed = ?config.seed, "particle worker serving on stdio");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = BufWriter::new(stdout.lock());
    let stats = transport::serve(&mut engine, &mut reader, &mut writer).context("serving stdio session")?;
    tracing::info!(
        handled = stats.handled,
        ignored = stats.ignored,
        malformed = stats.malformed,
        tick = engine.tick(),
        "particle worker shutting down"
    );
    Ok(())
}
