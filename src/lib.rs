pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod motion;
pub mod population;
pub mod protocol;
pub mod scheduler;
pub mod time;
pub mod transport;
pub mod trig;
pub mod worker;

pub use client::{ClientError, Population, RenderState, SimulationClient, WorkerLink};
pub use config::WorkerConfig;
pub use engine::SimulationEngine;
pub use population::Bounds;
pub use protocol::{WorkerCommand, WorkerReply};
pub use worker::WorkerHandle;

/// Installs the stderr `tracing` subscriber; `RUST_LOG` takes precedence over `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
