use anyhow::{anyhow, bail, Context, Result};
use kestrel_particle_worker::config::WorkerConfig;
use kestrel_particle_worker::protocol::{WorkerCommand, WorkerReply};
use kestrel_particle_worker::{Bounds, WorkerHandle};
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    if let Err(err) = run() {
        eprintln!("[worker-soak] error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opts = SoakOptions::parse()?;
    let mut config = match &opts.config {
        Some(path) => WorkerConfig::load(path)?,
        None => WorkerConfig::default(),
    };
    kestrel_particle_worker::init_logging(&config.log_filter);
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }

    let worker = WorkerHandle::spawn(&config)?;
    let bounds = Bounds::cube(opts.extent);
    request(&worker, WorkerCommand::init_particles(opts.particles, bounds))?;
    request(&worker, WorkerCommand::init_stars(opts.stars, bounds))?;

    let mut particle_timings = Timings::default();
    let mut star_timings = Timings::default();
    let mut touched = 0usize;
    for step in 0..opts.steps {
        // Sweep the pointer across the default viewport so pointer culling gets exercised.
        let pointer_x = (step % 1920) as f32;
        let pointer_y = 540.0;

        let start = Instant::now();
        match request(&worker, WorkerCommand::update_particles(pointer_x, pointer_y, opts.dt))? {
            WorkerReply::ParticlesUpdated(updates) => touched += updates.len(),
            other => bail!("unexpected reply to update-particles: {other:?}"),
        }
        particle_timings.record(start.elapsed());

        let start = Instant::now();
        match request(&worker, WorkerCommand::update_stars(pointer_x, pointer_y, opts.dt))? {
            WorkerReply::StarsUpdated(updates) => touched += updates.len(),
            other => bail!("unexpected reply to update-stars: {other:?}"),
        }
        star_timings.record(start.elapsed());
    }
    worker.shutdown();

    println!(
        "[worker-soak] {} steps, {} particles, {} stars, {} entity updates",
        opts.steps, opts.particles, opts.stars, touched
    );
    println!("[worker-soak] update-particles {}", particle_timings.summary());
    println!("[worker-soak] update-stars     {}", star_timings.summary());

    if let Some(budget) = opts.budget_ms {
        let worst = particle_timings.max_ms().max(star_timings.max_ms());
        if worst > budget {
            bail!("round trip {worst:.3} ms exceeded budget {budget:.3} ms");
        }
    }
    Ok(())
}

fn request(worker: &WorkerHandle, command: WorkerCommand) -> Result<WorkerReply> {
    let kind = command.kind();
    if !worker.send(command) {
        bail!("worker stopped before '{kind}' could be sent");
    }
    worker
        .recv_timeout(REPLY_TIMEOUT)?
        .ok_or_else(|| anyhow!("no reply to '{kind}' within {} ms", REPLY_TIMEOUT.as_millis()))
}

#[derive(Default)]
struct Timings {
    samples: Vec<Duration>,
}

impl Timings {
    fn record(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
    }

    fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        total.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }

    fn max_ms(&self) -> f64 {
        self.samples.iter().max().map(|max| max.as_secs_f64() * 1000.0).unwrap_or(0.0)
    }

    fn summary(&self) -> String {
        format!("mean {:.3} ms, max {:.3} ms", self.mean_ms(), self.max_ms())
    }
}

struct SoakOptions {
    config: Option<PathBuf>,
    seed: Option<u64>,
    particles: usize,
    stars: usize,
    extent: f32,
    steps: usize,
    dt: f32,
    budget_ms: Option<f64>,
}

impl SoakOptions {
    fn parse() -> Result<Self> {
        let mut opts = SoakOptions {
            config: None,
            seed: None,
            particles: 5_000,
            stars: 1_500,
            extent: 100.0,
            steps: 600,
            dt: 16.0,
            budget_ms: None,
        };
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args.next().ok_or_else(|| anyhow!("--config requires a path"))?;
                    opts.config = Some(PathBuf::from(value));
                }
                "--seed" => {
                    let value = args.next().ok_or_else(|| anyhow!("--seed requires a value"))?;
                    opts.seed = Some(value.parse().context("--seed must be u64")?);
                }
                "--particles" => {
                    let value = args.next().ok_or_else(|| anyhow!("--particles requires a value"))?;
                    opts.particles = value.parse().context("--particles must be an integer")?;
                }
                "--stars" => {
                    let value = args.next().ok_or_else(|| anyhow!("--stars requires a value"))?;
                    opts.stars = value.parse().context("--stars must be an integer")?;
                }
                "--extent" => {
                    let value = args.next().ok_or_else(|| anyhow!("--extent requires a value"))?;
                    opts.extent = value.parse().context("--extent must be a number")?;
                }
                "--steps" => {
                    let value = args.next().ok_or_else(|| anyhow!("--steps requires a value"))?;
                    opts.steps = value.parse().context("--steps must be an integer")?;
                }
                "--dt" => {
                    let value = args.next().ok_or_else(|| anyhow!("--dt requires a value"))?;
                    opts.dt = value.parse().context("--dt must be a number")?;
                }
                "--budget-ms" => {
                    let value = args.next().ok_or_else(|| anyhow!("--budget-ms requires a value"))?;
                    opts.budget_ms = Some(value.parse().context("--budget-ms must be a number")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(anyhow!("unknown argument '{other}'")),
            }
        }
        Ok(opts)
    }
}

fn print_usage() {
    eprintln!(
        "Usage: worker_soak [--config PATH] [--seed N] [--particles N] [--stars N] [--extent E] [--steps N] [--dt DT] [--budget-ms MS]"
    );
}
