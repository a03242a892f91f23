//! Full terrain builds: placement → topology → batching, with cancellation.
//!
//! Every build is started with a [`BuildTicket`] from a shared
//! [`BuildGeneration`]. Starting a newer build makes all older tickets stale,
//! and a stale build stops with [`BuildError::Superseded`] at its next check.
//! Partial output of a superseded build is never handed out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy::prelude::*;
use rayon::prelude::*;

use crate::batch::{self, BatchedMesh};
use crate::config::GridConfig;
use crate::error::BuildError;
use crate::placement::{self, HexCenter};
use crate::sampler::HeightSampler;
use crate::topology::{HexGeometry, HexagonBuilder, MAX_HEXAGONS};

/// Monotonic counter identifying the most recently requested build.
#[derive(Clone, Debug, Default)]
pub struct BuildGeneration(Arc<AtomicU64>);

impl BuildGeneration {
    /// Counter starting at generation 0 (no build requested yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the latest requested build.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Requests a new build, superseding every ticket handed out before.
    pub fn begin(&self) -> BuildTicket {
        let generation = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        BuildTicket {
            generation,
            latest: Arc::clone(&self.0),
        }
    }
}

/// Handle a running build uses to detect that it was superseded.
#[derive(Clone, Debug)]
pub struct BuildTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl BuildTicket {
    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a newer build has been requested.
    pub fn is_stale(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }

    /// `Err(Superseded)` when stale.
    pub fn check(&self) -> Result<(), BuildError> {
        if self.is_stale() {
            Err(BuildError::Superseded {
                generation: self.generation,
            })
        } else {
            Ok(())
        }
    }
}

/// Lifecycle of the terrain build driven by a host.
///
/// `Idle → Building` when a build starts, `Building → Idle` when its last chunk
/// is emitted, `Building → Cancelled` when it is superseded, and
/// `Cancelled → Idle` once the host has discarded the partial output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildState {
    /// No build in progress.
    #[default]
    Idle,
    /// Chunks of `generation` are being emitted.
    Building {
        /// Generation being built.
        generation: u64,
        /// Chunks emitted so far.
        emitted: usize,
        /// Chunks the build will emit in total.
        total: usize,
    },
    /// `generation` was abandoned; its partial output must be dropped.
    Cancelled {
        /// Generation that was abandoned.
        generation: u64,
    },
}

impl BuildState {
    /// True while chunks are still being emitted.
    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building { .. })
    }
}

/// A build whose batching step runs one chunk at a time.
///
/// Placement and per-hexagon topology run up front in [`IncrementalBuild::start`];
/// each call to [`IncrementalBuild::next_chunk`] merges one chunk. Hosts that
/// spread construction over several frames call it a few times per frame.
#[derive(Debug)]
pub struct IncrementalBuild {
    ticket: BuildTicket,
    centers: Vec<HexCenter>,
    geometries: Vec<HexGeometry>,
    chunk_len: usize,
    cursor: usize,
}

impl IncrementalBuild {
    /// Validates `config`, places the grid and builds every hexagon.
    pub fn start<S>(
        config: &GridConfig,
        sampler: &S,
        ticket: BuildTicket,
    ) -> Result<Self, BuildError>
    where
        S: HeightSampler + ?Sized,
    {
        ticket.check()?;
        let centers = placement::place_grid(config, sampler)?;
        ticket.check()?;

        let geometries = build_geometries(config, &centers)?;
        let chunk_len = config
            .chunk_len()
            .map_or(geometries.len().max(1), |k| k.get());

        info!(
            "build {}: {} hexagons in {} chunk(s)",
            ticket.generation(),
            geometries.len(),
            geometries.len().div_ceil(chunk_len)
        );

        Ok(Self {
            ticket,
            centers,
            geometries,
            chunk_len,
            cursor: 0,
        })
    }

    /// Ticket this build checks before emitting each chunk.
    pub fn ticket(&self) -> &BuildTicket {
        &self.ticket
    }

    /// Placed hexagon centers, in instance order.
    pub fn centers(&self) -> &[HexCenter] {
        &self.centers
    }

    /// Total number of chunks this build emits.
    pub fn chunk_count(&self) -> usize {
        self.geometries.len().div_ceil(self.chunk_len)
    }

    /// Chunks emitted so far.
    pub fn emitted(&self) -> usize {
        self.cursor.div_ceil(self.chunk_len)
    }

    /// True once every chunk has been emitted (or the build was superseded).
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.geometries.len()
    }

    /// Progress as a [`BuildState::Building`] value.
    pub fn state(&self) -> BuildState {
        BuildState::Building {
            generation: self.ticket.generation(),
            emitted: self.emitted(),
            total: self.chunk_count(),
        }
    }

    /// Merges and returns the next chunk.
    ///
    /// Returns `None` when finished. A superseded build yields one
    /// `Err(Superseded)` and then finishes.
    pub fn next_chunk(&mut self) -> Option<Result<BatchedMesh, BuildError>> {
        if self.is_finished() {
            return None;
        }
        if let Err(err) = self.ticket.check() {
            self.cursor = self.geometries.len();
            return Some(Err(err));
        }
        let end = (self.cursor + self.chunk_len).min(self.geometries.len());
        let mesh = self.geometries[self.cursor..end].iter().collect();
        self.cursor = end;
        Some(Ok(mesh))
    }
}

impl Iterator for IncrementalBuild {
    type Item = Result<BatchedMesh, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk()
    }
}

/// Rejects grids whose indices would not fit in `u32`.
fn ensure_addressable(count: usize) -> Result<(), BuildError> {
    if count > MAX_HEXAGONS {
        return Err(BuildError::TooManyHexagons {
            count,
            max: MAX_HEXAGONS,
        });
    }
    Ok(())
}

/// Per-hexagon geometry for every center, in parallel, preserving order.
fn build_geometries(
    config: &GridConfig,
    centers: &[HexCenter],
) -> Result<Vec<HexGeometry>, BuildError> {
    ensure_addressable(centers.len())?;
    let builder = HexagonBuilder::new(config.hexagon_size);
    centers
        .par_iter()
        .enumerate()
        .map(|(i, center)| {
            let instance = u32::try_from(i).map_err(|_| BuildError::TooManyHexagons {
                count: centers.len(),
                max: MAX_HEXAGONS,
            })?;
            Ok(builder.build(center, instance))
        })
        .collect()
}

/// Builds the whole terrain in one call under `ticket`.
///
/// The ticket is checked between stages; a superseded build returns
/// `Err(Superseded)` and none of its meshes.
pub fn rebuild_with_ticket<S>(
    config: &GridConfig,
    sampler: &S,
    ticket: &BuildTicket,
) -> Result<Vec<BatchedMesh>, BuildError>
where
    S: HeightSampler + ?Sized,
{
    ticket.check()?;
    let centers = placement::place_grid(config, sampler)?;
    ticket.check()?;
    let geometries = build_geometries(config, &centers)?;
    ticket.check()?;
    let meshes = batch::combine(&geometries, config.chunk_len());
    ticket.check()?;
    Ok(meshes)
}

/// Builds the whole terrain for `config` from `sampler`.
///
/// Invalid configurations are rejected before any work starts. A grid with no
/// hexagons produces no meshes.
pub fn rebuild<S>(config: &GridConfig, sampler: &S) -> Result<Vec<BatchedMesh>, BuildError>
where
    S: HeightSampler + ?Sized,
{
    let generation = BuildGeneration::new();
    rebuild_with_ticket(config, sampler, &generation.begin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseSettings;
    use crate::error::ConfigError;
    use crate::sampler::{ConstantSampler, NoiseHeightmap};

    fn small_grid() -> GridConfig {
        GridConfig {
            hexagon_size: 2.0,
            grid_scale: 20,
            exclude_below_threshold: false,
            height_threshold: 0.5,
            height_multiplier: 1.0,
            chunk_size: Some(10),
        }
    }

    // ── generation / tickets ───────────────────────────────────────

    #[test]
    fn newer_build_makes_older_ticket_stale() {
        let generation = BuildGeneration::new();
        let first = generation.begin();
        assert!(!first.is_stale());
        let second = generation.begin();
        assert!(first.is_stale());
        assert!(!second.is_stale());
        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(generation.current(), second.generation());
        assert_eq!(
            first.check(),
            Err(BuildError::Superseded {
                generation: first.generation()
            })
        );
    }

    #[test]
    fn cloned_counter_shares_generations() {
        let generation = BuildGeneration::new();
        let ticket = generation.begin();
        generation.clone().begin();
        assert!(ticket.is_stale());
    }

    // ── rebuild ────────────────────────────────────────────────────

    #[test]
    fn flat_grid_end_to_end() {
        let meshes = rebuild(&small_grid(), &ConstantSampler::new(0.5)).unwrap();
        // 42 hexagons in chunks of 10.
        assert_eq!(meshes.len(), 5);
        let instances: usize = meshes.iter().map(BatchedMesh::instance_count).sum();
        assert_eq!(instances, 42);
        assert_eq!(meshes[4].instance_count(), 2);
        for m in &meshes {
            // Top caps sit at the sampled height.
            for top in m.vertices.chunks_exact(35) {
                assert!((top[0].y - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn fully_excluded_grid_yields_no_meshes() {
        let cfg = GridConfig {
            exclude_below_threshold: true,
            height_threshold: 0.9,
            ..small_grid()
        };
        let meshes = rebuild(&cfg, &ConstantSampler::new(0.5)).unwrap();
        assert!(meshes.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = GridConfig {
            chunk_size: Some(0),
            ..small_grid()
        };
        assert_eq!(
            rebuild(&cfg, &ConstantSampler::new(0.5)),
            Err(BuildError::Config(ConfigError::ChunkSize))
        );
    }

    #[test]
    fn stale_ticket_aborts_rebuild() {
        let generation = BuildGeneration::new();
        let ticket = generation.begin();
        generation.begin();
        let result = rebuild_with_ticket(&small_grid(), &ConstantSampler::new(0.5), &ticket);
        assert!(matches!(result, Err(BuildError::Superseded { .. })));
    }

    #[test]
    fn rebuild_is_deterministic_for_noise() {
        let cfg = small_grid();
        let noise = NoiseSettings {
            scale: 20.0,
            ..default()
        };
        let map = NoiseHeightmap::for_grid(&cfg, &noise).unwrap();
        assert_eq!(rebuild(&cfg, &map), rebuild(&cfg, &map));
    }

    #[test]
    fn index_space_bounds_hexagon_count() {
        assert_eq!(ensure_addressable(MAX_HEXAGONS), Ok(()));
        assert_eq!(
            ensure_addressable(MAX_HEXAGONS + 1),
            Err(BuildError::TooManyHexagons {
                count: MAX_HEXAGONS + 1,
                max: MAX_HEXAGONS
            })
        );
    }

    // ── incremental ────────────────────────────────────────────────

    #[test]
    fn incremental_build_matches_one_shot() {
        let cfg = small_grid();
        let sampler = ConstantSampler::new(0.7);
        let generation = BuildGeneration::new();
        let build = IncrementalBuild::start(&cfg, &sampler, generation.begin()).unwrap();
        assert_eq!(build.chunk_count(), 5);
        assert_eq!(build.centers().len(), 42);

        let chunks: Result<Vec<_>, _> = build.collect();
        assert_eq!(chunks.unwrap(), rebuild(&cfg, &sampler).unwrap());
    }

    #[test]
    fn incremental_build_tracks_progress() {
        let generation = BuildGeneration::new();
        let mut build =
            IncrementalBuild::start(&small_grid(), &ConstantSampler::new(0.5), generation.begin())
                .unwrap();
        let gen_id = build.ticket().generation();
        assert_eq!(
            build.state(),
            BuildState::Building {
                generation: gen_id,
                emitted: 0,
                total: 5
            }
        );
        build.next_chunk().unwrap().unwrap();
        build.next_chunk().unwrap().unwrap();
        assert_eq!(build.emitted(), 2);
        assert!(build.state().is_building());
        assert!(!build.is_finished());
    }

    #[test]
    fn superseded_incremental_build_stops() {
        let generation = BuildGeneration::new();
        let mut build =
            IncrementalBuild::start(&small_grid(), &ConstantSampler::new(0.5), generation.begin())
                .unwrap();
        assert!(build.next_chunk().unwrap().is_ok());

        generation.begin();
        assert!(matches!(
            build.next_chunk(),
            Some(Err(BuildError::Superseded { .. }))
        ));
        assert!(build.is_finished());
        assert!(build.next_chunk().is_none());
    }

    #[test]
    fn unchunked_incremental_build_emits_one_mesh() {
        let cfg = GridConfig {
            chunk_size: None,
            ..small_grid()
        };
        let generation = BuildGeneration::new();
        let build =
            IncrementalBuild::start(&cfg, &ConstantSampler::new(0.5), generation.begin()).unwrap();
        let chunks: Vec<_> = build.collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].instance_count(), 42);
    }

    #[test]
    fn empty_incremental_build_finishes_immediately() {
        let cfg = GridConfig {
            exclude_below_threshold: true,
            height_threshold: 0.9,
            ..small_grid()
        };
        let generation = BuildGeneration::new();
        let mut build =
            IncrementalBuild::start(&cfg, &ConstantSampler::new(0.5), generation.begin()).unwrap();
        assert_eq!(build.chunk_count(), 0);
        assert!(build.is_finished());
        assert!(build.next_chunk().is_none());
    }

    #[test]
    fn start_with_stale_ticket_fails() {
        let generation = BuildGeneration::new();
        let ticket = generation.begin();
        generation.begin();
        let result = IncrementalBuild::start(&small_grid(), &ConstantSampler::new(0.5), ticket);
        assert!(matches!(result, Err(BuildError::Superseded { .. })));
    }
}
