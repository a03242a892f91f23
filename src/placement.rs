//! Hexagon center placement over the square grid region.
//!
//! Rows run along Z and are `hexagon_size * 4.33 / 5` apart; centers within a
//! row are `hexagon_size * 3` apart along X, and every odd row is shifted by
//! `hexagon_size * 1.5`. The result is the flat-top hex lattice anchored at the
//! region's minimum corner.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use hexx::{Hex, HexLayout, HexOrientation};

use crate::config::GridConfig;
use crate::error::ConfigError;
use crate::sampler::HeightSampler;

/// Row pitch per unit of hexagon size.
pub const ROW_PITCH: f32 = 4.33 / 5.0;
/// Column pitch per unit of hexagon size.
pub const COLUMN_PITCH: f32 = 3.0;
/// Shift of odd rows along X, per unit of hexagon size.
pub const ROW_STAGGER: f32 = 2.0 * 0.75;

/// Origin of one hexagon tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexCenter {
    /// World X.
    pub x: f32,
    /// World Z (row coordinate).
    pub z: f32,
    /// Sampled height, already scaled by the height multiplier.
    pub height: f32,
    /// Axial coordinate of the tile in the grid's hex lattice.
    pub hex: Hex,
}

impl HexCenter {
    /// Center of the tile's top cap.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.height, self.z)
    }

    /// Position projected onto the ground plane.
    pub fn xz(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Row and column geometry of the tiling for one [`GridConfig`].
#[derive(Clone, Debug)]
pub struct GridLayout {
    min: f32,
    max: f32,
    row_step: f32,
    column_step: f32,
    stagger: f32,
    hex_layout: HexLayout,
}

impl GridLayout {
    /// Layout for `config`. Assumes the config has been validated.
    pub fn new(config: &GridConfig) -> Self {
        let half = config.half_extent();
        let size = config.hexagon_size;
        Self {
            min: -half,
            max: half,
            row_step: size * ROW_PITCH,
            column_step: size * COLUMN_PITCH,
            stagger: size * ROW_STAGGER,
            hex_layout: HexLayout {
                orientation: HexOrientation::Flat,
                origin: Vec2::splat(-half),
                scale: Vec2::splat(size),
                ..default()
            },
        }
    }

    /// Inclusive lower bound of the region on both axes.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound of the region on both axes.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Row indices with their Z coordinate, ascending. Every row lies below `max`.
    pub fn rows(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        (0usize..)
            .map(move |r| (r, self.min + r as f32 * self.row_step))
            .take_while(move |&(_, z)| z < self.max)
    }

    /// X coordinates of the centers in `row`, ascending.
    ///
    /// Odd rows are shifted by the stagger; a shifted column past `max` is
    /// dropped rather than wrapped.
    pub fn row_columns(&self, row: usize) -> impl Iterator<Item = f32> + '_ {
        let shift = if row % 2 == 1 { self.stagger } else { 0.0 };
        (0usize..)
            .map(move |c| self.min + c as f32 * self.column_step)
            .take_while(move |&x| x < self.max)
            .map(move |x| x + shift)
            .filter(move |&x| x <= self.max)
    }

    /// Maps a ground-plane position linearly into a sampler domain, clamped to it.
    pub fn sample_point(&self, pos: Vec2, domain: Vec2) -> Vec2 {
        let extent = self.max - self.min;
        ((pos - Vec2::splat(self.min)) / extent * domain).clamp(Vec2::ZERO, domain)
    }

    /// Hex coordinate of the tile containing a ground-plane position.
    pub fn hex_at(&self, pos: Vec2) -> Hex {
        self.hex_layout.world_pos_to_hex(pos)
    }

    /// Ground-plane center of a hex coordinate.
    pub fn hex_to_world_pos(&self, hex: Hex) -> Vec2 {
        self.hex_layout.hex_to_world_pos(hex)
    }
}

/// Places hexagon centers over the configured region.
///
/// Centers come out row-major (ascending Z, then ascending X); a center's
/// position in the output is its instance index downstream. Sample coordinates
/// are clamped into the sampler's domain. With `exclude_below_threshold`, a
/// center is kept only when its sampled height is strictly above the threshold.
pub fn place_grid<S>(config: &GridConfig, sampler: &S) -> Result<Vec<HexCenter>, ConfigError>
where
    S: HeightSampler + ?Sized,
{
    config.validate()?;

    let layout = GridLayout::new(config);
    let domain = sampler.domain();
    let mut centers = Vec::new();

    for (row, z) in layout.rows() {
        for x in layout.row_columns(row) {
            let pos = Vec2::new(x, z);
            let sample = layout.sample_point(pos, domain);
            let height = sampler.sample(sample.x, sample.y);

            if config.exclude_below_threshold && height <= config.height_threshold {
                continue;
            }

            centers.push(HexCenter {
                x,
                z,
                height: height * config.height_multiplier,
                hex: layout.hex_at(pos),
            });
        }
    }

    if centers.is_empty() {
        warn!("grid configuration produced no hexagon centers");
    } else {
        debug!("placed {} hexagon centers", centers.len());
    }
    Ok(centers)
}

/// Lookup from hex coordinate or ground position to a placed center's index.
#[derive(Clone, Debug)]
pub struct TileIndex {
    layout: GridLayout,
    tiles: HashMap<Hex, usize>,
}

impl TileIndex {
    /// Indexes `centers` as produced by [`place_grid`] for `config`.
    pub fn new(config: &GridConfig, centers: &[HexCenter]) -> Self {
        let tiles = centers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.hex, i))
            .collect();
        Self {
            layout: GridLayout::new(config),
            tiles,
        }
    }

    /// Number of indexed tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True when no tile was placed.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Center index of the tile at `hex`, if it was placed.
    pub fn get(&self, hex: Hex) -> Option<usize> {
        self.tiles.get(&hex).copied()
    }

    /// Center index of the tile covering ground position `pos`, if it was placed.
    pub fn tile_at(&self, pos: Vec2) -> Option<usize> {
        self.get(self.layout.hex_at(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ConstantSampler;

    /// Height equals the normalized X sample coordinate.
    struct RampSampler;

    impl HeightSampler for RampSampler {
        fn domain(&self) -> Vec2 {
            Vec2::ONE
        }

        fn sample(&self, x: f32, _y: f32) -> f32 {
            x
        }
    }

    /// Records every query so domain handling can be checked.
    #[derive(Default)]
    struct RecordingSampler {
        queries: std::cell::RefCell<Vec<Vec2>>,
    }

    impl HeightSampler for RecordingSampler {
        fn domain(&self) -> Vec2 {
            Vec2::new(200.0, 200.0)
        }

        fn sample(&self, x: f32, y: f32) -> f32 {
            self.queries.borrow_mut().push(Vec2::new(x, y));
            0.5
        }
    }

    fn small_grid() -> GridConfig {
        GridConfig {
            hexagon_size: 2.0,
            grid_scale: 20,
            exclude_below_threshold: false,
            height_threshold: 0.5,
            height_multiplier: 1.0,
            chunk_size: Some(8),
        }
    }

    #[test]
    fn small_grid_has_fixed_center_count() {
        let centers = place_grid(&small_grid(), &ConstantSampler::new(0.5)).unwrap();
        // 12 rows: 6 even rows of 4 centers, 6 odd rows of 3.
        assert_eq!(centers.len(), 42);
        for c in &centers {
            assert!((c.height - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn pitches_match_hexagon_size() {
        let cfg = small_grid();
        let layout = GridLayout::new(&cfg);
        let rows: Vec<f32> = layout.rows().map(|(_, z)| z).collect();
        assert_eq!(rows.len(), 12);
        for w in rows.windows(2) {
            assert!((w[1] - w[0] - 1.732).abs() < 1e-4);
        }
        let even: Vec<f32> = layout.row_columns(0).collect();
        assert_eq!(even, vec![-10.0, -4.0, 2.0, 8.0]);
        let odd: Vec<f32> = layout.row_columns(1).collect();
        assert_eq!(odd, vec![-7.0, -1.0, 5.0]);
    }

    #[test]
    fn centers_stay_inside_region() {
        for (size, scale) in [(1.0, 10), (2.0, 20), (1.5, 33), (3.0, 64), (0.7, 9)] {
            let cfg = GridConfig {
                hexagon_size: size,
                grid_scale: scale,
                ..small_grid()
            };
            let half = cfg.half_extent();
            let centers = place_grid(&cfg, &ConstantSampler::new(0.3)).unwrap();
            assert!(!centers.is_empty());
            for c in &centers {
                assert!(c.z >= -half && c.z < half, "z {} outside region", c.z);
                assert!(c.x >= -half && c.x <= half, "x {} outside region", c.x);
            }
        }
    }

    #[test]
    fn odd_rows_are_shifted_by_one_and_a_half_sizes() {
        let cfg = small_grid();
        let layout = GridLayout::new(&cfg);
        let step = cfg.hexagon_size * COLUMN_PITCH;
        for (row, _) in layout.rows() {
            for x in layout.row_columns(row) {
                let base = if row % 2 == 1 {
                    x - cfg.hexagon_size * 1.5
                } else {
                    x
                };
                let k = (base - layout.min()) / step;
                assert!((k - k.round()).abs() < 1e-4, "row {row} column {x} off lattice");
            }
        }
    }

    #[test]
    fn shifted_column_past_bound_is_omitted() {
        let layout = GridLayout::new(&small_grid());
        assert!(layout.row_columns(1).all(|x| x <= layout.max()));
        assert_eq!(layout.row_columns(1).count(), layout.row_columns(0).count() - 1);
    }

    #[test]
    fn output_is_row_major() {
        let centers = place_grid(&small_grid(), &ConstantSampler::new(0.5)).unwrap();
        for w in centers.windows(2) {
            let (a, b) = (w[0], w[1]);
            assert!(a.z < b.z || (a.z == b.z && a.x < b.x), "{a:?} before {b:?}");
        }
    }

    #[test]
    fn threshold_keeps_only_higher_samples() {
        let cfg = GridConfig {
            exclude_below_threshold: true,
            height_threshold: 0.5,
            height_multiplier: 3.0,
            ..small_grid()
        };
        let all = place_grid(&small_grid(), &RampSampler).unwrap();
        let kept = place_grid(&cfg, &RampSampler).unwrap();
        assert!(!kept.is_empty());
        assert!(kept.len() < all.len());
        for c in &kept {
            assert!(c.height / 3.0 > 0.5, "kept center with height {}", c.height);
        }
    }

    #[test]
    fn without_exclusion_every_center_is_kept() {
        let cfg = GridConfig {
            height_threshold: 0.9,
            ..small_grid()
        };
        let centers = place_grid(&cfg, &RampSampler).unwrap();
        assert_eq!(centers.len(), 42);
    }

    #[test]
    fn high_threshold_on_flat_terrain_places_nothing() {
        let cfg = GridConfig {
            exclude_below_threshold: true,
            height_threshold: 0.9,
            ..small_grid()
        };
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        assert!(centers.is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let cfg = GridConfig {
            exclude_below_threshold: true,
            height_threshold: 0.5,
            ..small_grid()
        };
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        assert!(centers.is_empty());
    }

    #[test]
    fn region_narrower_than_a_pitch_keeps_corner_center() {
        let cfg = GridConfig {
            hexagon_size: 6.0,
            grid_scale: 4,
            ..small_grid()
        };
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].xz(), Vec2::splat(-2.0));
    }

    #[test]
    fn invalid_config_is_rejected_before_sampling() {
        let sampler = RecordingSampler::default();
        let cfg = GridConfig {
            hexagon_size: 0.0,
            ..small_grid()
        };
        assert_eq!(
            place_grid(&cfg, &sampler),
            Err(ConfigError::HexagonSize(0.0))
        );
        assert!(sampler.queries.borrow().is_empty());
    }

    #[test]
    fn sample_queries_stay_inside_domain() {
        let sampler = RecordingSampler::default();
        let centers = place_grid(&small_grid(), &sampler).unwrap();
        let queries = sampler.queries.borrow();
        assert_eq!(queries.len(), centers.len());
        for q in queries.iter() {
            assert!((0.0..=200.0).contains(&q.x) && (0.0..=200.0).contains(&q.y));
        }
        // The region's minimum corner maps onto the domain origin.
        assert_eq!(queries[0], Vec2::ZERO);
    }

    #[test]
    fn sample_point_is_linear_and_clamped() {
        let layout = GridLayout::new(&small_grid());
        let domain = Vec2::new(200.0, 100.0);
        let mid = layout.sample_point(Vec2::ZERO, domain);
        assert!((mid - Vec2::new(100.0, 50.0)).length() < 1e-4);
        let outside = layout.sample_point(Vec2::new(40.0, -40.0), domain);
        assert_eq!(outside, Vec2::new(200.0, 0.0));
    }

    #[test]
    fn every_center_has_a_distinct_hex() {
        let cfg = GridConfig {
            hexagon_size: 1.0,
            grid_scale: 40,
            ..small_grid()
        };
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        let index = TileIndex::new(&cfg, &centers);
        assert_eq!(index.len(), centers.len());
    }

    #[test]
    fn tile_lookup_roundtrips_centers() {
        let cfg = small_grid();
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        let index = TileIndex::new(&cfg, &centers);
        let layout = GridLayout::new(&cfg);
        for (i, c) in centers.iter().enumerate() {
            assert_eq!(index.tile_at(c.xz()), Some(i));
            assert_eq!(index.get(c.hex), Some(i));
            let back = layout.hex_to_world_pos(c.hex);
            assert!((back - c.xz()).length() < 1e-2, "{back:?} vs {:?}", c.xz());
        }
    }

    #[test]
    fn tile_lookup_misses_outside_grid() {
        let cfg = small_grid();
        let centers = place_grid(&cfg, &ConstantSampler::new(0.5)).unwrap();
        let index = TileIndex::new(&cfg, &centers);
        assert_eq!(index.tile_at(Vec2::new(500.0, 500.0)), None);
    }
}
