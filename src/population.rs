use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Extents of the box entities are scattered in; each axis spans `[-dim/2, dim/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth }
    }

    pub const fn cube(size: f32) -> Self {
        Self::new(size, size, size)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            rng.gen::<f32>() * self.width - self.width / 2.0,
            rng.gen::<f32>() * self.height - self.height / 2.0,
            rng.gen::<f32>() * self.depth - self.depth / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Spawn position. Kept alongside `Star::origin`; particle motion never reads it.
    pub origin: Vec3,
}

impl Particle {
    const VELOCITY_SPREAD: f32 = 0.02;

    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds) -> Self {
        let position = bounds.sample(rng);
        let velocity = Vec3::new(
            (rng.gen::<f32>() - 0.5) * Self::VELOCITY_SPREAD,
            (rng.gen::<f32>() - 0.5) * Self::VELOCITY_SPREAD,
            (rng.gen::<f32>() - 0.5) * Self::VELOCITY_SPREAD,
        );
        Self { position, velocity, origin: position }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub origin: Vec3,
    pub vibration_speed: f32,
    pub vibration_amplitude: f32,
    pub rotation_speed: f32,
    pub pulse_speed: f32,
    pub pointer_weight: f32,
    /// Accumulated rotation per axis. Only ever grows.
    pub rotation: Vec3,
    pub scale: f32,
}

impl Star {
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds) -> Self {
        let position = bounds.sample(rng);
        Self {
            position,
            origin: position,
            vibration_speed: rng.gen::<f32>() * 0.02 + 0.01,
            vibration_amplitude: rng.gen::<f32>() * 0.3 + 0.1,
            rotation_speed: rng.gen::<f32>() * 0.01 + 0.005,
            pulse_speed: rng.gen::<f32>() * 0.02 + 0.01,
            pointer_weight: rng.gen::<f32>() * 0.5 + 0.2,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

/// Owns both populations. Indices are the wire identity of an entity, so the only
/// structural change allowed is replacing a whole population.
#[derive(Debug, Default)]
pub struct PopulationStore {
    particles: Vec<Particle>,
    stars: Vec<Star>,
}

impl PopulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_particles<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, bounds: &Bounds) {
        self.particles = (0..count).map(|_| Particle::spawn(rng, bounds)).collect();
    }

    pub fn reset_stars<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, bounds: &Bounds) {
        self.stars = (0..count).map(|_| Star::spawn(rng, bounds)).collect();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub(crate) fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }
}
