//! The simulation state owned by the isolated context.

use crate::config::{MotionConfig, WorkerConfig};
use crate::motion::{self, StarFrame, Viewport};
use crate::population::{Bounds, PopulationStore};
use crate::protocol::{
    InitRequest, ParticleUpdate, RotationRecord, StarUpdate, UpdateRequest, ViewportRequest, WorkerCommand,
    WorkerReply,
};
use crate::scheduler::BatchScheduler;
use crate::time::TickClock;
use crate::trig::TrigCache;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct SimulationEngine {
    trig: TrigCache,
    store: PopulationStore,
    scheduler: BatchScheduler,
    clock: TickClock,
    motion: MotionConfig,
    viewport: Viewport,
    max_population: usize,
    rng: StdRng,
}

impl SimulationEngine {
    pub fn new(config: &WorkerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            trig: TrigCache::new(),
            store: PopulationStore::new(),
            scheduler: BatchScheduler::new(&config.batching),
            clock: TickClock::new(),
            motion: config.motion.clone(),
            viewport: Viewport::from(config.viewport),
            max_population: config.max_population,
            rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(&WorkerConfig { seed: Some(seed), ..WorkerConfig::default() })
    }

    /// Runs one command to completion and builds its reply.
    pub fn handle(&mut self, command: WorkerCommand) -> WorkerReply {
        match command {
            WorkerCommand::InitParticles(InitRequest { count, bounds }) => {
                self.init_particles(count, &bounds);
                WorkerReply::ParticlesInitialized
            }
            WorkerCommand::InitStars(InitRequest { count, bounds }) => {
                self.init_stars(count, &bounds);
                WorkerReply::StarsInitialized
            }
            WorkerCommand::UpdateParticles(request) => WorkerReply::ParticlesUpdated(self.update_particles(&request)),
            WorkerCommand::UpdateStars(request) => WorkerReply::StarsUpdated(self.update_stars(&request)),
            WorkerCommand::SetViewport(ViewportRequest { width, height }) => {
                self.set_viewport(width, height);
                WorkerReply::ViewportUpdated
            }
        }
    }

    /// Requests above the configured population cap are clamped to it.
    pub fn init_particles(&mut self, count: usize, bounds: &Bounds) {
        let count = self.capped(count, "particles");
        self.store.reset_particles(&mut self.rng, count, bounds);
        tracing::debug!(count, ?bounds, "particles initialized");
    }

    pub fn init_stars(&mut self, count: usize, bounds: &Bounds) {
        let count = self.capped(count, "stars");
        self.store.reset_stars(&mut self.rng, count, bounds);
        tracing::debug!(count, ?bounds, "stars initialized");
    }

    fn capped(&self, requested: usize, population: &str) -> usize {
        if requested > self.max_population {
            tracing::warn!(requested, cap = self.max_population, "{population} count exceeds the population cap, clamping");
            return self.max_population;
        }
        requested
    }

    /// Reports the caller viewport; unusable sizes fall back to the default viewport.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height).unwrap_or_else(|| {
            tracing::warn!(width, height, "unusable viewport reported, using fallback");
            Viewport::FALLBACK
        });
    }

    pub fn update_particles(&mut self, request: &UpdateRequest) -> Vec<ParticleUpdate> {
        let tick = self.clock.advance(request.delta_time);
        let extent = self.motion.wrap_extent;
        let particles = self.store.particles_mut();
        let batch = self.scheduler.plan_particles(tick, particles.len());
        let mut results = Vec::with_capacity(batch.touched());
        for index in batch.indices() {
            let particle = &mut particles[index];
            motion::step_particle(particle, extent);
            let position = particle.position;
            results.push(ParticleUpdate { index, x: position.x, y: position.y, z: position.z });
        }
        tracing::trace!(tick, touched = results.len(), full_sweep = batch.full_sweep, "particles updated");
        results
    }

    pub fn update_stars(&mut self, request: &UpdateRequest) -> Vec<StarUpdate> {
        let tick = self.clock.advance(request.delta_time);
        let batch = self.scheduler.plan_stars(tick, self.store.stars().len());
        let frame = StarFrame::new(
            &self.trig,
            &self.motion,
            &self.viewport,
            self.clock.elapsed(),
            Vec2::new(request.pointer_x, request.pointer_y),
            batch.advance_rotation,
        );
        let stars = self.store.stars_mut();
        let mut results = Vec::with_capacity(batch.active.len());
        for index in batch.active.clone() {
            let star = &mut stars[index];
            let influence = motion::update_star(star, &self.trig, &self.motion, &frame);
            results.push(StarUpdate {
                index,
                x: star.position.x,
                y: star.position.y,
                z: star.position.z,
                rotation: RotationRecord { x: star.rotation.x, y: star.rotation.y, z: star.rotation.z },
                scale: star.scale,
                opacity: motion::star_opacity(influence),
            });
        }
        tracing::trace!(tick, touched = results.len(), rotated = batch.advance_rotation, "stars updated");
        results
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn store(&self) -> &PopulationStore {
        &self.store
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("tick", &self.clock.tick())
            .field("particles", &self.store.particles().len())
            .field("stars", &self.store.stars().len())
            .field("viewport", &self.viewport)
            .finish()
    }
}
