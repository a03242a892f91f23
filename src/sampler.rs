//! Height sampling: the collaborator contract and its noise texture implementation.

use bevy::prelude::*;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

use crate::config::{GridConfig, NoiseSettings};
use crate::error::ConfigError;
use crate::math;

/// Source of terrain heights in `[0, 1]`.
///
/// Coordinates live in the sampler's own space, `[0, domain.x] × [0, domain.y]`.
/// Callers map world positions into that space and keep queries inside it.
pub trait HeightSampler {
    /// Extent of the valid sample space along each axis.
    fn domain(&self) -> Vec2;

    /// Height at `(x, y)` in sample space.
    fn sample(&self, x: f32, y: f32) -> f32;
}

/// Flat terrain: every query returns the same height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantSampler {
    /// Height returned for every query.
    pub height: f32,
    /// Reported sample domain.
    pub domain: Vec2,
}

impl ConstantSampler {
    /// Flat sampler over a unit domain.
    pub fn new(height: f32) -> Self {
        Self {
            height,
            domain: Vec2::ONE,
        }
    }
}

impl HeightSampler for ConstantSampler {
    fn domain(&self) -> Vec2 {
        self.domain
    }

    fn sample(&self, _x: f32, _y: f32) -> f32 {
        self.height
    }
}

/// Rasterized fractal noise texture, one height per texel.
///
/// Sampling truncates to the containing texel and clamps to the texture edge,
/// like a pixel lookup on a clamped grayscale image.
#[derive(Clone, Debug)]
pub struct NoiseHeightmap {
    width: u32,
    height: u32,
    texels: Vec<f32>,
}

impl NoiseHeightmap {
    /// Rasterizes `Fbm<Perlin>` noise into a `width × height` texture.
    ///
    /// Texel `(col, row)` samples the noise at `(col + offset.x, row + offset.y) / scale`.
    /// Rows are generated in parallel.
    pub fn generate(width: u32, height: u32, noise: &NoiseSettings) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let fbm: Fbm<Perlin> = Fbm::new(noise.seed).set_octaves(noise.octaves);
        let offset = noise.offset.as_dvec2();

        let mut texels = vec![0.0; width as usize * height as usize];
        texels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(row, out)| {
                let y = (row as f64 + offset.y) / noise.scale;
                for (col, texel) in out.iter_mut().enumerate() {
                    let x = (col as f64 + offset.x) / noise.scale;
                    *texel = math::map_noise_to_range(fbm.get([x, y]), 0.0, 1.0).clamp(0.0, 1.0);
                }
            });

        Self {
            width,
            height,
            texels,
        }
    }

    /// Heightmap covering the whole grid region at `samples_per_unit` texels per unit.
    pub fn for_grid(config: &GridConfig, noise: &NoiseSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        noise.validate()?;
        let side = config.grid_scale.saturating_mul(noise.samples_per_unit);
        Ok(Self::generate(side, side, noise))
    }

    /// Texture width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height stored at texel `(col, row)`, clamped to the texture edge.
    pub fn texel(&self, col: u32, row: u32) -> f32 {
        let col = col.min(self.width - 1) as usize;
        let row = row.min(self.height - 1) as usize;
        self.texels[row * self.width as usize + col]
    }

    /// Texels as 8-bit luminance, row-major, for previews.
    pub fn to_luma8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .map(|t| (t * 255.0).round() as u8)
            .collect()
    }
}

impl HeightSampler for NoiseHeightmap {
    fn domain(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    fn sample(&self, x: f32, y: f32) -> f32 {
        // Float-to-int casts saturate, so negatives and NaN land on texel 0.
        self.texel(x as u32, y as u32)
    }
}
