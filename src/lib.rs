//! Contagion - balls bouncing around an arena, spreading a disease on contact
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, epidemic state)
//! - `config`: Tunable simulation parameters
//! - `chart`: Status-count time series for a chart view
//! - `error`: Error types

pub mod chart;
pub mod config;
pub mod error;
pub mod sim;

pub use chart::{ChartSample, ChartSeries};
pub use config::SimulationConfig;
pub use error::{ConfigError, GeometryError, SimError};
pub use sim::{Simulation, Status, StatusCounts};

/// Simulation configuration constants
pub mod consts {
    /// Default arena dimensions
    pub const ARENA_WIDTH: f64 = 600.0;
    pub const ARENA_HEIGHT: f64 = 400.0;

    /// Default population
    pub const POPULATION_SIZE: usize = 100;
    pub const INITIAL_INFECTED: usize = 1;

    /// Logical ticks per second (used for seconds <-> ticks conversion only)
    pub const TICKS_PER_SECOND: u32 = 30;
    /// Default infection duration (15 seconds)
    pub const INFECTION_DURATION_TICKS: u64 = 15 * TICKS_PER_SECOND as u64;

    /// Default epidemic rates
    pub const TRANSMISSION_RATE: f64 = 0.75;
    pub const DEATH_RATE: f64 = 0.15;

    /// Ball defaults (speed in arena units per tick)
    pub const BALL_SPEED: f64 = 1.0;
    pub const BALL_RADIUS: f64 = 5.0;

    /// Gap between the two default walls
    pub const STARTING_WALL_GAP: f64 = 30.0;

    /// Hover thresholds for wall editing
    pub const WALL_HOVER_DISTANCE: f64 = 10.0;
    pub const ENDPOINT_HOVER_DISTANCE: f64 = 10.0;

    /// How close a projected point must be to an endpoint to count as that endpoint
    pub const ENDPOINT_TOLERANCE: f64 = 1e-4;
}
