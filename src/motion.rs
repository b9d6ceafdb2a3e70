//! Per-entity update rules.

use crate::config::{MotionConfig, ViewportConfig};
use crate::population::{Particle, Star};
use crate::trig::{TrigCache, DEGREES_PER_RADIAN};
use glam::{Vec2, Vec3};

/// Time factor of the shared angle that steers pointer displacement.
const POINTER_SWAY_RATE: f64 = 0.01;
const VIBRATION_Y_RATE: f64 = 1.1;
const VIBRATION_Z_RATE: f64 = 0.9;
const ROTATION_AXIS_RATES: Vec3 = Vec3::new(1.0, 0.7, 0.3);
const PULSE_AMPLITUDE: f32 = 0.2;
const BASE_OPACITY: f32 = 0.6;
const INFLUENCE_OPACITY: f32 = 0.4;

/// Caller viewport in pixels, used to normalize pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const FALLBACK: Viewport = Viewport { width: 1920.0, height: 1080.0 };

    /// Returns `None` for sizes that cannot normalize a pointer.
    pub fn new(width: f32, height: f32) -> Option<Self> {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        (usable(width) && usable(height)).then_some(Self { width, height })
    }

    /// Maps pixel coordinates to `[-1, 1]` with +y up.
    pub fn normalize(&self, pointer_x: f32, pointer_y: f32) -> Vec2 {
        Vec2::new((pointer_x / self.width) * 2.0 - 1.0, -(pointer_y / self.height) * 2.0 + 1.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(config: ViewportConfig) -> Self {
        Viewport::new(config.width, config.height).unwrap_or(Viewport::FALLBACK)
    }
}

/// Integrates one particle and wraps each axis to the opposite bound once it escapes.
pub fn step_particle(particle: &mut Particle, extent: f32) {
    particle.position += particle.velocity;
    particle.position = Vec3::new(
        wrap_axis(particle.position.x, extent),
        wrap_axis(particle.position.y, extent),
        wrap_axis(particle.position.z, extent),
    );
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if value > extent {
        -extent
    } else if value < -extent {
        extent
    } else {
        value
    }
}

/// Linear falloff around the pointer, zero at and beyond `radius`.
///
/// The square root only runs once the squared distance passes the radius gate.
pub fn pointer_influence(position: Vec2, pointer: Vec2, radius: f32) -> f32 {
    let distance_sq = position.distance_squared(pointer);
    if distance_sq < radius * radius {
        (1.0 - distance_sq.sqrt() / radius).max(0.0)
    } else {
        0.0
    }
}

/// Values shared by every star recomputed on one tick.
#[derive(Debug, Clone, Copy)]
pub struct StarFrame {
    pub elapsed: f64,
    /// Pointer position in world units.
    pub pointer: Vec2,
    pub advance_rotation: bool,
    sway: Vec2,
}

impl StarFrame {
    pub fn new(
        trig: &TrigCache,
        motion: &MotionConfig,
        viewport: &Viewport,
        elapsed: f64,
        pointer_px: Vec2,
        advance_rotation: bool,
    ) -> Self {
        let pointer = viewport.normalize(pointer_px.x, pointer_px.y) * motion.pointer_world_scale;
        let sway_angle = elapsed * POINTER_SWAY_RATE * DEGREES_PER_RADIAN;
        let sway = Vec2::new(trig.sin(sway_angle), trig.cos(sway_angle)) * motion.pointer_strength;
        Self { elapsed, pointer, advance_rotation, sway }
    }
}

/// Recomputes one star from its origin and returns the pointer influence it saw.
pub fn update_star(star: &mut Star, trig: &TrigCache, motion: &MotionConfig, frame: &StarFrame) -> f32 {
    let influence = pointer_influence(star.position.truncate(), frame.pointer, motion.influence_radius);

    let base = frame.elapsed * f64::from(star.vibration_speed) * DEGREES_PER_RADIAN;
    let vibration = Vec3::new(
        trig.sin(base % 360.0) * star.vibration_amplitude,
        trig.cos((base * VIBRATION_Y_RATE) % 360.0) * star.vibration_amplitude,
        trig.sin((base * VIBRATION_Z_RATE) % 360.0) * star.vibration_amplitude * 0.5,
    );
    let offset = (frame.sway * influence * star.pointer_weight).extend(0.0);
    star.position = star.origin + vibration + offset;

    if frame.advance_rotation {
        star.rotation += ROTATION_AXIS_RATES * star.rotation_speed;
    }

    let pulse = (frame.elapsed * f64::from(star.pulse_speed) * DEGREES_PER_RADIAN) % 360.0;
    star.scale = 1.0 + trig.sin(pulse) * PULSE_AMPLITUDE;

    influence
}

pub fn star_opacity(influence: f32) -> f32 {
    BASE_OPACITY + influence * INFLUENCE_OPACITY
}
