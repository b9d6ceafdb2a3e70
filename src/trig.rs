/// Degrees per radian as used by every angle computation in the motion model.
pub const DEGREES_PER_RADIAN: f64 = 57.2958;

const TABLE_LEN: usize = 360;

/// Whole-degree sine/cosine tables.
///
/// Lookups quantize to `floor(|degrees|) mod 360`, so results are off by at most one
/// table step (one degree) from the true value.
#[derive(Clone)]
pub struct TrigCache {
    sin: [f32; TABLE_LEN],
    cos: [f32; TABLE_LEN],
}

impl TrigCache {
    pub fn new() -> Self {
        let mut sin = [0.0f32; TABLE_LEN];
        let mut cos = [0.0f32; TABLE_LEN];
        for degree in 0..TABLE_LEN {
            let radians = (degree as f64).to_radians();
            sin[degree] = radians.sin() as f32;
            cos[degree] = radians.cos() as f32;
        }
        Self { sin, cos }
    }

    pub fn sin(&self, degrees: f64) -> f32 {
        let value = self.sin[Self::index(degrees)];
        if degrees >= 0.0 {
            value
        } else {
            -value
        }
    }

    pub fn cos(&self, degrees: f64) -> f32 {
        self.cos[Self::index(degrees)]
    }

    fn index(degrees: f64) -> usize {
        // `as` saturates, so NaN lands on 0 and infinities on u64::MAX.
        (degrees.abs().floor() as u64 % TABLE_LEN as u64) as usize
    }
}

impl Default for TrigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrigCache").field("entries", &TABLE_LEN).finish()
    }
}
