use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: f32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "BatchConfig::default_particle_slices")]
    pub particle_slices: usize,
    #[serde(default = "BatchConfig::default_star_slices")]
    pub star_slices: usize,
    #[serde(default = "BatchConfig::default_rotation_stride")]
    pub rotation_stride: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "MotionConfig::default_wrap_extent")]
    pub wrap_extent: f32,
    #[serde(default = "MotionConfig::default_pointer_world_scale")]
    pub pointer_world_scale: f32,
    #[serde(default = "MotionConfig::default_influence_radius")]
    pub influence_radius: f32,
    #[serde(default = "MotionConfig::default_pointer_strength")]
    pub pointer_strength: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub batching: BatchConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    /// Largest particle or star count an init command may request.
    #[serde(default = "WorkerConfig::default_max_population")]
    pub max_population: usize,
    #[serde(default = "WorkerConfig::default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerConfigOverrides {
    pub seed: Option<u64>,
    pub viewport_width: Option<f32>,
    pub viewport_height: Option<f32>,
}

impl ViewportConfig {
    const fn default_width() -> f32 {
        1920.0
    }

    const fn default_height() -> f32 {
        1080.0
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: Self::default_width(), height: Self::default_height() }
    }
}

impl BatchConfig {
    const fn default_particle_slices() -> usize {
        4
    }

    const fn default_star_slices() -> usize {
        3
    }

    const fn default_rotation_stride() -> u64 {
        2
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            particle_slices: Self::default_particle_slices(),
            star_slices: Self::default_star_slices(),
            rotation_stride: Self::default_rotation_stride(),
        }
    }
}

impl MotionConfig {
    const fn default_wrap_extent() -> f32 {
        50.0
    }

    const fn default_pointer_world_scale() -> f32 {
        15.0
    }

    const fn default_influence_radius() -> f32 {
        12.0
    }

    const fn default_pointer_strength() -> f32 {
        1.5
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            wrap_extent: Self::default_wrap_extent(),
            pointer_world_scale: Self::default_pointer_world_scale(),
            influence_radius: Self::default_influence_radius(),
            pointer_strength: Self::default_pointer_strength(),
        }
    }
}

impl WorkerConfig {
    const fn default_max_population() -> usize {
        1_000_000
    }

    fn default_log_filter() -> String {
        "info".to_string()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &WorkerConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(width) = overrides.viewport_width {
            self.viewport.width = width;
        }
        if let Some(height) = overrides.viewport_height {
            self.viewport.height = height;
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            viewport: ViewportConfig::default(),
            batching: BatchConfig::default(),
            motion: MotionConfig::default(),
            max_population: Self::default_max_population(),
            log_filter: Self::default_log_filter(),
        }
    }
}

impl WorkerConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.viewport_width.is_none() && self.viewport_height.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.seed.is_some() {
            fields.push("seed");
        }
        if self.viewport_width.is_some() {
            fields.push("viewport_width");
        }
        if self.viewport_height.is_some() {
            fields.push("viewport_height");
        }
        fields
    }
}
