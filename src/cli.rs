//! Command-line overrides for the startup [`TerrainConfig`].

use clap::Parser;

use crate::terrain::TerrainConfig;

/// Hexagonal prism terrain viewer.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Hexagon circumradius in world units.
    #[arg(long)]
    hexagon_size: Option<f32>,

    /// Side length of the square grid region.
    #[arg(long)]
    grid_scale: Option<u32>,

    /// Drop hexagons whose height is not above this value in [0, 1].
    #[arg(long)]
    threshold: Option<f32>,

    /// Scale applied to sampled heights.
    #[arg(long)]
    height_multiplier: Option<f32>,

    /// Hexagons per mesh; 0 merges the whole grid into one mesh.
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Noise seed.
    #[arg(long)]
    seed: Option<u32>,

    /// Noise octaves.
    #[arg(long)]
    octaves: Option<usize>,

    /// Noise scale divisor.
    #[arg(long)]
    noise_scale: Option<f64>,

    /// Chunks spawned per frame while building.
    #[arg(long)]
    chunks_per_frame: Option<usize>,

    /// Show chunks as they are built.
    #[arg(long)]
    progressive: bool,

    /// Hide the heightmap preview plane.
    #[arg(long)]
    no_preview: bool,
}

impl Cli {
    /// Writes every given flag into `cfg`.
    pub fn apply(&self, cfg: &mut TerrainConfig) {
        let grid = &mut cfg.grid;
        if let Some(size) = self.hexagon_size {
            grid.hexagon_size = size;
        }
        if let Some(scale) = self.grid_scale {
            grid.grid_scale = scale;
        }
        if let Some(threshold) = self.threshold {
            grid.exclude_below_threshold = true;
            grid.height_threshold = threshold;
        }
        if let Some(multiplier) = self.height_multiplier {
            grid.height_multiplier = multiplier;
        }
        if let Some(chunk) = self.chunk_size {
            grid.chunk_size = (chunk > 0).then_some(chunk);
        }

        let noise = &mut cfg.noise;
        if let Some(seed) = self.seed {
            noise.seed = seed;
        }
        if let Some(octaves) = self.octaves {
            noise.octaves = octaves;
        }
        if let Some(scale) = self.noise_scale {
            noise.scale = scale;
        }

        if let Some(n) = self.chunks_per_frame {
            cfg.build.chunks_per_frame = n;
        }
        cfg.build.progressive |= self.progressive;
        cfg.build.show_preview &= !self.no_preview;
    }
}
