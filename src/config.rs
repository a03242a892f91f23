//! Grid and noise parameters, validated before any build work starts.

use std::num::NonZeroUsize;

use bevy::prelude::*;

use crate::error::ConfigError;

/// Grid layout, height filtering, and batching parameters.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct GridConfig {
    /// Circumradius of every hexagon in world units.
    pub hexagon_size: f32,
    /// Side length of the square region tiled by hexagons.
    pub grid_scale: u32,
    /// Drop hexagons whose sampled height is not above `height_threshold`.
    pub exclude_below_threshold: bool,
    /// Cut-off in sampler units (`[0, 1]`) used when excluding.
    pub height_threshold: f32,
    /// Scale applied to sampled heights of kept hexagons.
    pub height_multiplier: f32,
    /// Hexagons per combined mesh. `None` merges the whole grid into one mesh.
    pub chunk_size: Option<u32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hexagon_size: 2.0,
            grid_scale: 100,
            exclude_below_threshold: false,
            height_threshold: 0.5,
            height_multiplier: 10.0,
            chunk_size: Some(64),
        }
    }
}

impl GridConfig {
    /// Rejects values that cannot produce a well-formed grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hexagon_size.is_finite() && self.hexagon_size > 0.0) {
            return Err(ConfigError::HexagonSize(self.hexagon_size));
        }
        if self.grid_scale == 0 {
            return Err(ConfigError::GridScale);
        }
        if self.chunk_size == Some(0) {
            return Err(ConfigError::ChunkSize);
        }
        if !(0.0..=1.0).contains(&self.height_threshold) {
            return Err(ConfigError::HeightThreshold(self.height_threshold));
        }
        if !self.height_multiplier.is_finite() {
            return Err(ConfigError::HeightMultiplier(self.height_multiplier));
        }
        Ok(())
    }

    /// Chunk size as the batcher expects it; `None` means a single mesh.
    pub fn chunk_len(&self) -> Option<NonZeroUsize> {
        self.chunk_size.and_then(|k| NonZeroUsize::new(k as usize))
    }

    /// Half the region side; the region spans `[-half_extent, half_extent)`.
    pub fn half_extent(&self) -> f32 {
        self.grid_scale as f32 / 2.0
    }
}

/// Fractal noise parameters for the heightmap texture.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct NoiseSettings {
    /// Seed for the Perlin sources.
    pub seed: u32,
    /// Number of fBm octaves.
    pub octaves: usize,
    /// Spatial scale divisor applied to texel coordinates.
    pub scale: f64,
    /// Pan of the noise field, in texels.
    pub offset: Vec2,
    /// Heightmap texels per world unit along each axis.
    pub samples_per_unit: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            octaves: 3,
            scale: 250.0,
            offset: Vec2::ZERO,
            samples_per_unit: 10,
        }
    }
}

impl NoiseSettings {
    /// Rejects settings the noise generator cannot rasterize.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octaves == 0 {
            return Err(ConfigError::NoiseOctaves);
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::NoiseScale(self.scale));
        }
        if self.samples_per_unit == 0 {
            return Err(ConfigError::SampleResolution);
        }
        Ok(())
    }
}
