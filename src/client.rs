//! Caller-side view of a worker.
//!
//! The protocol carries no request ids, so the client allows one outstanding update
//! per population and reads each update reply as the answer to that request. Sparse
//! replies are merged into a [`RenderState`] by index.

use crate::population::Bounds;
use crate::protocol::{ParticleUpdate, StarUpdate, WorkerCommand, WorkerReply};
use crate::worker::{WorkerGone, WorkerHandle};
use std::collections::VecDeque;
use thiserror::Error;

/// Ordered, non-blocking connection to a worker.
pub trait WorkerLink {
    /// Queues a command. Returns `false` once the worker is gone.
    fn send(&mut self, command: WorkerCommand) -> bool;

    /// Next queued reply, if any.
    fn try_recv(&mut self) -> Result<Option<WorkerReply>, WorkerGone>;
}

impl WorkerLink for WorkerHandle {
    fn send(&mut self, command: WorkerCommand) -> bool {
        WorkerHandle::send(self, command)
    }

    fn try_recv(&mut self) -> Result<Option<WorkerReply>, WorkerGone> {
        WorkerHandle::try_recv(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Particles,
    Stars,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("simulation unavailable: the worker channel closed")]
    Unavailable,
    #[error("an update for {0:?} is already in flight")]
    UpdateInFlight(Population),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarSprite {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: f32,
    pub opacity: f32,
}

impl Default for StarSprite {
    fn default() -> Self {
        Self { position: [0.0; 3], rotation: [0.0; 3], scale: 1.0, opacity: 0.6 }
    }
}

/// Last known state of every entity, as the renderer sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub particles: Vec<[f32; 3]>,
    pub stars: Vec<StarSprite>,
}

impl RenderState {
    pub fn resize_particles(&mut self, count: usize) {
        self.particles = vec![[0.0; 3]; count];
    }

    pub fn resize_stars(&mut self, count: usize) {
        self.stars = vec![StarSprite::default(); count];
    }

    /// Merges a sparse particle reply; indices outside the population are dropped.
    pub fn apply_particles(&mut self, updates: &[ParticleUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            if let Some(slot) = self.particles.get_mut(update.index) {
                *slot = [update.x, update.y, update.z];
                applied += 1;
            }
        }
        applied
    }

    pub fn apply_stars(&mut self, updates: &[StarUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            if let Some(slot) = self.stars.get_mut(update.index) {
                *slot = StarSprite {
                    position: [update.x, update.y, update.z],
                    rotation: [update.rotation.x, update.rotation.y, update.rotation.z],
                    scale: update.scale,
                    opacity: update.opacity,
                };
                applied += 1;
            }
        }
        applied
    }
}

#[derive(Debug, Default)]
struct PendingSlot {
    /// Requested counts of unacknowledged inits, oldest first.
    init_counts: VecDeque<usize>,
    update_in_flight: bool,
}

pub struct SimulationClient<L: WorkerLink = WorkerHandle> {
    link: L,
    state: RenderState,
    particles: PendingSlot,
    stars: PendingSlot,
    available: bool,
}

impl<L: WorkerLink> SimulationClient<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: RenderState::default(),
            particles: PendingSlot::default(),
            stars: PendingSlot::default(),
            available: true,
        }
    }

    /// `false` once the worker is gone; the caller should fall back to static rendering.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn update_in_flight(&self, population: Population) -> bool {
        self.slot(population).update_in_flight
    }

    pub fn init_particles(&mut self, count: usize, bounds: Bounds) -> Result<(), ClientError> {
        self.dispatch(WorkerCommand::init_particles(count, bounds))?;
        self.particles.init_counts.push_back(count);
        Ok(())
    }

    pub fn init_stars(&mut self, count: usize, bounds: Bounds) -> Result<(), ClientError> {
        self.dispatch(WorkerCommand::init_stars(count, bounds))?;
        self.stars.init_counts.push_back(count);
        Ok(())
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<(), ClientError> {
        self.dispatch(WorkerCommand::set_viewport(width, height))
    }

    pub fn request_update(
        &mut self,
        population: Population,
        pointer_x: f32,
        pointer_y: f32,
        delta_time: f32,
    ) -> Result<(), ClientError> {
        if self.slot(population).update_in_flight {
            return Err(ClientError::UpdateInFlight(population));
        }
        let command = match population {
            Population::Particles => WorkerCommand::update_particles(pointer_x, pointer_y, delta_time),
            Population::Stars => WorkerCommand::update_stars(pointer_x, pointer_y, delta_time),
        };
        self.dispatch(command)?;
        self.slot_mut(population).update_in_flight = true;
        Ok(())
    }

    /// Drains every queued reply into the render state and returns how many were handled.
    pub fn poll(&mut self) -> Result<usize, ClientError> {
        let mut handled = 0;
        loop {
            match self.link.try_recv() {
                Ok(Some(reply)) => {
                    self.apply(reply);
                    handled += 1;
                }
                Ok(None) => return Ok(handled),
                Err(WorkerGone) => return Err(self.mark_unavailable()),
            }
        }
    }

    fn apply(&mut self, reply: WorkerReply) {
        match reply {
            WorkerReply::ParticlesInitialized => {
                match self.particles.init_counts.pop_front() {
                    Some(count) => self.state.resize_particles(count),
                    None => tracing::warn!("unexpected particles-initialized reply"),
                }
            }
            WorkerReply::StarsInitialized => {
                match self.stars.init_counts.pop_front() {
                    Some(count) => self.state.resize_stars(count),
                    None => tracing::warn!("unexpected stars-initialized reply"),
                }
            }
            WorkerReply::ParticlesUpdated(updates) => {
                self.particles.update_in_flight = false;
                self.state.apply_particles(&updates);
            }
            WorkerReply::StarsUpdated(updates) => {
                self.stars.update_in_flight = false;
                self.state.apply_stars(&updates);
            }
            WorkerReply::ViewportUpdated => {}
        }
    }

    fn dispatch(&mut self, command: WorkerCommand) -> Result<(), ClientError> {
        if !self.available || !self.link.send(command) {
            return Err(self.mark_unavailable());
        }
        Ok(())
    }

    fn mark_unavailable(&mut self) -> ClientError {
        if self.available {
            tracing::warn!("particle worker unavailable, falling back to static rendering");
        }
        self.available = false;
        ClientError::Unavailable
    }

    fn slot(&self, population: Population) -> &PendingSlot {
        match population {
            Population::Particles => &self.particles,
            Population::Stars => &self.stars,
        }
    }

    fn slot_mut(&mut self, population: Population) -> &mut PendingSlot {
        match population {
            Population::Particles => &mut self.particles,
            Population::Stars => &mut self.stars,
        }
    }
}

impl SimulationClient<WorkerHandle> {
    pub fn spawn(config: &crate::config::WorkerConfig) -> anyhow::Result<Self> {
        Ok(Self::new(WorkerHandle::spawn(config)?))
    }
}
