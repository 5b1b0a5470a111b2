//! Deterministic simulation module
//!
//! All physics and epidemic logic lives here. This module must be pure and
//! deterministic:
//! - Fixed tick only
//! - Seeded RNG only
//! - Stable iteration order (by ball id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod epidemic;
pub mod resolve;
pub mod state;
pub mod tick;
pub mod vector;
pub mod wall;

pub use collision::{BallContact, Contacts, WallContact, detect};
pub use epidemic::EpidemicParams;
pub use resolve::{reflect_velocity, resolve};
pub use state::{Ball, RunPhase, Simulation, Status, StatusCounts, WallHover, starting_walls};
pub use tick::tick;
pub use vector::{Vector2, Vector2Ext};
pub use wall::{SegmentFeature, Wall, WallEnd, WallId};
