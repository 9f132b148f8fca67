use thiserror::Error;

/// Reasons a [`crate::config::Config`] is rejected at the boundary.
///
/// The engine itself has no runtime failure modes beyond "not ready", so
/// this is the only error type the core exposes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("palette needs at least 2 key-frames, got {0}")]
    PaletteTooShort(usize),

    #[error("`{field}` must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("`{field}` must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("trunk height range is empty: min {min} > max {max}")]
    EmptyHeightRange { min: f32, max: f32 },

    #[error("celestial cycle needs at least one phase with a non-zero duration")]
    EmptyCelestialCycle,

    #[error("blade offset option set is empty")]
    NoBladeOffsets,
}
