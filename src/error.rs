//! Error types for the simulation core
//!
//! Geometry errors are programmer/input errors and fail fast. Config errors come
//! from setters and config loading. `SimError` is what `step()` and the mutators
//! hand back to the caller.

use thiserror::Error;

use crate::sim::{Status, StatusCounts, WallId};

/// Degenerate geometry
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// `unit()` / `scale_to()` on a vector with zero magnitude
    #[error("cannot rescale a zero-length vector")]
    ZeroLength,
    /// Both wall endpoints at the same point
    #[error("wall endpoints coincide at ({x}, {y})")]
    DegenerateWall { x: f64, y: f64 },
    /// Ball radius must be finite and positive
    #[error("ball radius must be positive, got {0}")]
    NonPositiveRadius(f64),
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f64 },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the simulation API
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no wall with id {0:?}")]
    UnknownWall(WallId),
    /// A transition tried to take a ball from an empty ledger slot
    #[error("status ledger has no {0:?} ball to move")]
    LedgerUnderflow(Status),
    /// The status ledger no longer matches the balls it counts
    #[error("status ledger {ledger:?} does not match recount {observed:?}")]
    LedgerMismatch {
        ledger: StatusCounts,
        observed: StatusCounts,
    },
}
