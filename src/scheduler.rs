//! Rotating-window batch selection.
//!
//! Each population is cut into a fixed number of contiguous slices and one slice is
//! recomputed per tick, picked round-robin by the shared tick counter. Particles add a
//! catch-up sweep over every other slice whenever slice 0 is active; stars only
//! accumulate rotation on ticks that are a multiple of the rotation stride.

use crate::config::BatchConfig;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSchedule {
    slices: usize,
}

impl SliceSchedule {
    pub fn new(slices: usize) -> Self {
        Self { slices: slices.max(1) }
    }

    pub fn slices(&self) -> usize {
        self.slices
    }

    pub fn slice_len(&self, len: usize) -> usize {
        len.div_ceil(self.slices)
    }

    pub fn active_slice(&self, tick: u64) -> usize {
        (tick % self.slices as u64) as usize
    }

    /// Index range of `slice`; empty once the slice starts past the end of the population.
    pub fn slice_range(&self, len: usize, slice: usize) -> Range<usize> {
        let size = self.slice_len(len);
        let start = (slice * size).min(len);
        let end = (start + size).min(len);
        start..end
    }
}

/// Particles touched on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleBatch {
    pub active: Range<usize>,
    /// Whether the catch-up sweep runs over everything outside `active`.
    pub full_sweep: bool,
    len: usize,
}

impl ParticleBatch {
    /// Touched indices in ascending order, each exactly once.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let full_sweep = self.full_sweep;
        (0..self.len).filter(move |index| full_sweep || self.active.contains(index))
    }

    pub fn touched(&self) -> usize {
        if self.full_sweep {
            self.len
        } else {
            self.active.len()
        }
    }
}

/// Stars touched on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarBatch {
    pub active: Range<usize>,
    pub advance_rotation: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    particles: SliceSchedule,
    stars: SliceSchedule,
    rotation_stride: u64,
}

impl BatchScheduler {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            particles: SliceSchedule::new(config.particle_slices),
            stars: SliceSchedule::new(config.star_slices),
            rotation_stride: config.rotation_stride.max(1),
        }
    }

    pub fn particle_schedule(&self) -> SliceSchedule {
        self.particles
    }

    pub fn star_schedule(&self) -> SliceSchedule {
        self.stars
    }

    pub fn plan_particles(&self, tick: u64, len: usize) -> ParticleBatch {
        let slice = self.particles.active_slice(tick);
        ParticleBatch { active: self.particles.slice_range(len, slice), full_sweep: slice == 0, len }
    }

    pub fn plan_stars(&self, tick: u64, len: usize) -> StarBatch {
        let slice = self.stars.active_slice(tick);
        StarBatch {
            active: self.stars.slice_range(len, slice),
            advance_rotation: tick % self.rotation_stride == 0,
        }
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(&BatchConfig::default())
    }
}
