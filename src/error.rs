//! Error types for configuration validation and cancellable builds.

/// A [`GridConfig`](crate::config::GridConfig) or
/// [`NoiseSettings`](crate::config::NoiseSettings) value that cannot produce a grid.
///
/// Raised before any placement work starts; never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Circumradius is not a positive finite number.
    #[error("hexagon size must be positive and finite, got {0}")]
    HexagonSize(f32),

    /// Region side length is zero.
    #[error("grid scale must be at least 1")]
    GridScale,

    /// Chunking enabled with a chunk size of zero.
    #[error("chunk size must be at least 1 (use no chunk size to disable chunking)")]
    ChunkSize,

    /// Exclusion threshold outside the sampler range.
    #[error("height threshold must lie in [0, 1], got {0}")]
    HeightThreshold(f32),

    /// Height multiplier is NaN or infinite.
    #[error("height multiplier must be finite, got {0}")]
    HeightMultiplier(f32),

    /// Fractal noise configured with zero octaves.
    #[error("noise needs at least one octave")]
    NoiseOctaves,

    /// Noise scale divisor is not a positive finite number.
    #[error("noise scale must be positive and finite, got {0}")]
    NoiseScale(f64),

    /// Heightmap resolution of zero texels per unit.
    #[error("heightmap needs at least one sample per world unit")]
    SampleResolution,
}

/// Failure of a terrain build.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The configuration was rejected before the build started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The grid has more hexagons than `u32` indices can address.
    #[error("{count} hexagons exceed the {max} addressable with u32 indices")]
    TooManyHexagons {
        /// Hexagons placed.
        count: usize,
        /// Largest supported count.
        max: usize,
    },

    /// A newer build was requested while this one was running.
    #[error("build generation {generation} was superseded")]
    Superseded {
        /// Generation of the abandoned build.
        generation: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_build_error() {
        let err: BuildError = ConfigError::GridScale.into();
        assert_eq!(err, BuildError::Config(ConfigError::GridScale));
    }

    #[test]
    fn messages_name_the_offending_value() {
        let msg = ConfigError::HexagonSize(-2.0).to_string();
        assert!(msg.contains("-2"), "unexpected message: {msg}");

        let msg = BuildError::Superseded { generation: 7 }.to_string();
        assert!(msg.contains('7'), "unexpected message: {msg}");
    }
}
