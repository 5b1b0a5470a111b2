//! Simulation state and core types
//!
//! Balls, walls, the status ledger and the RNG all live in `Simulation`. Ball
//! status is only changed through the epidemic module so the ledger and the
//! balls never disagree.

use std::f64::consts::{PI, TAU};
use std::ops::Index;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::vector::Vector2;
use super::wall::{Wall, WallEnd, WallId};
use crate::config::{self, SimulationConfig};
use crate::consts::*;
use crate::error::{ConfigError, GeometryError, SimError};

/// Epidemic status of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Good,
    Infected,
    Recovered,
    Dead,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Good,
        Status::Infected,
        Status::Recovered,
        Status::Dead,
    ];

    /// Allowed transitions: Good -> Infected -> {Recovered, Dead}
    pub fn can_become(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Good, Status::Infected)
                | (Status::Infected, Status::Recovered)
                | (Status::Infected, Status::Dead)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "good",
            Status::Infected => "infected",
            Status::Recovered => "recovered",
            Status::Dead => "dead",
        }
    }
}

/// Per-status population counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub good: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StatusCounts {
    /// Count the statuses of a set of balls
    pub fn tally<'a>(balls: impl IntoIterator<Item = &'a Ball>) -> Self {
        let mut counts = Self::default();
        for ball in balls {
            *counts.slot(ball.status()) += 1;
        }
        counts
    }

    pub fn get(&self, status: Status) -> usize {
        self[status]
    }

    pub fn total(&self) -> usize {
        self.good + self.infected + self.recovered + self.dead
    }

    /// Move one ball's worth of count from `from` to `to`. An empty `from`
    /// slot leaves the ledger untouched.
    pub(crate) fn shift(&mut self, from: Status, to: Status) -> Result<(), SimError> {
        let source = self.slot(from);
        *source = source
            .checked_sub(1)
            .ok_or(SimError::LedgerUnderflow(from))?;
        *self.slot(to) += 1;
        Ok(())
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Good => &mut self.good,
            Status::Infected => &mut self.infected,
            Status::Recovered => &mut self.recovered,
            Status::Dead => &mut self.dead,
        }
    }
}

impl Index<Status> for StatusCounts {
    type Output = usize;

    fn index(&self, status: Status) -> &usize {
        match status {
            Status::Good => &self.good,
            Status::Infected => &self.infected,
            Status::Recovered => &self.recovered,
            Status::Dead => &self.dead,
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vector2,
    /// Position at the end of the previous tick (for swept wall checks)
    pub prev_pos: Vector2,
    pub vel: Vector2,
    radius: f64,
    /// Area proxy, pi * r^2
    mass: f64,
    status: Status,
    /// Tick at which the ball became infected
    infection_start_tick: u64,
}

impl Ball {
    pub fn new(id: u32, pos: Vector2, vel: Vector2, radius: f64) -> Result<Self, GeometryError> {
        check_radius(radius)?;
        Ok(Self {
            id,
            pos,
            prev_pos: pos,
            vel,
            radius,
            mass: mass_for(radius),
            status: Status::Good,
            infection_start_tick: 0,
        })
    }

    /// Builder for initial placement: sets the status without touching any ledger
    pub fn with_status(mut self, status: Status, tick: u64) -> Self {
        self.status = status;
        self.infection_start_tick = tick;
        self
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn infection_start_tick(&self) -> u64 {
        self.infection_start_tick
    }

    pub fn momentum(&self) -> Vector2 {
        self.vel * self.mass
    }

    /// Resize the ball. Mass follows the radius.
    pub fn set_radius(&mut self, radius: f64) -> Result<(), GeometryError> {
        check_radius(radius)?;
        self.radius = radius;
        self.mass = mass_for(radius);
        Ok(())
    }

    /// Only the epidemic module calls this, right after updating the ledger
    pub(crate) fn set_status(&mut self, status: Status, tick: u64) {
        debug_assert!(self.status.can_become(status));
        if status == Status::Infected {
            self.infection_start_tick = tick;
        }
        self.status = status;
    }

    /// Advance one tick (explicit Euler) and bounce off the arena edges
    pub fn integrate(&mut self, width: f64, height: f64) {
        self.prev_pos = self.pos;
        self.pos += self.vel;
        self.contain(width, height);
    }

    /// Clamp the disk inside [0, width] x [0, height], flipping the velocity
    /// component of any axis that was hit
    pub fn contain(&mut self, width: f64, height: f64) {
        let r = self.radius;
        if self.pos.x + r > width {
            self.pos.x = width - r;
            self.vel.x = -self.vel.x;
        } else if self.pos.x - r < 0.0 {
            self.pos.x = r;
            self.vel.x = -self.vel.x;
        }
        if self.pos.y + r > height {
            self.pos.y = height - r;
            self.vel.y = -self.vel.y;
        } else if self.pos.y - r < 0.0 {
            self.pos.y = r;
            self.vel.y = -self.vel.y;
        }
    }
}

fn check_radius(radius: f64) -> Result<(), GeometryError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::NonPositiveRadius(radius))
    }
}

#[inline]
fn mass_for(radius: f64) -> f64 {
    PI * radius * radius
}

/// Run-loop phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Not advancing (initial state, or paused by the user)
    Paused,
    /// `update()` advances one tick per call
    Running,
    /// No infected balls left
    Complete,
}

/// Which wall (and optionally which endpoint) is under a query point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallHover {
    pub wall: WallId,
    pub end: Option<WallEnd>,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) config: SimulationConfig,
    /// Active balls (sorted by id)
    pub(crate) balls: Vec<Ball>,
    /// Dead balls: drawn, never moved or collided
    pub(crate) archived: Vec<Ball>,
    pub(crate) walls: Vec<Wall>,
    /// Status ledger
    pub(crate) counts: StatusCounts,
    pub(crate) counts_changed: bool,
    /// Simulation tick counter
    pub(crate) tick: u64,
    pub(crate) phase: RunPhase,
    /// Population the ledger was built for
    pub(crate) population: usize,
    pub(crate) rng: Pcg32,
    seed: u64,
    next_wall_id: u32,
}

impl Simulation {
    /// New simulation with the default two-wall layout
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let walls = starting_walls(&config)?;
        Self::with_walls(config, seed, walls)
    }

    /// New simulation with the given walls
    pub fn with_walls(
        config: SimulationConfig,
        seed: u64,
        walls: Vec<Wall>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let config = config.sanitized();
        let mut sim = Self::empty(config, seed, walls);
        sim.repopulate()?;
        log::info!("Simulation created with seed {}", seed);
        Ok(sim)
    }

    /// Simulation over explicitly placed balls. The ledger is tallied from the
    /// balls' statuses; dead balls go straight to the archive.
    pub fn from_parts(
        config: SimulationConfig,
        balls: Vec<Ball>,
        walls: Vec<Wall>,
        seed: u64,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let mut config = config.sanitized();
        config.population_size = balls.len();
        config.initial_infected = balls
            .iter()
            .filter(|b| b.status() == Status::Infected)
            .count();

        let mut sim = Self::empty(config, seed, walls);
        sim.counts = StatusCounts::tally(&balls);
        sim.population = balls.len();
        let (archived, mut active): (Vec<Ball>, Vec<Ball>) =
            balls.into_iter().partition(|b| b.status() == Status::Dead);
        active.sort_by_key(|b| b.id);
        sim.balls = active;
        sim.archived = archived;
        sim.counts_changed = true;
        sim.update_phase();
        Ok(sim)
    }

    fn empty(config: SimulationConfig, seed: u64, walls: Vec<Wall>) -> Self {
        let next_wall_id = walls.iter().map(|w| w.id().0 + 1).max().unwrap_or(0);
        Self {
            config,
            balls: Vec::new(),
            archived: Vec::new(),
            walls,
            counts: StatusCounts::default(),
            counts_changed: false,
            tick: 0,
            phase: RunPhase::Paused,
            population: 0,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            next_wall_id,
        }
    }

    /// Replace the whole population and ledger with a fresh one built from the
    /// config. Walls are kept; the tick counter restarts.
    fn repopulate(&mut self) -> Result<(), SimError> {
        let (width, height) = (self.config.width, self.config.height);
        let radius = self.config.radius;
        let speed = self.config.speed;
        let infected = self.config.initial_infected;

        let mut balls = Vec::with_capacity(self.config.population_size);
        for i in 0..self.config.population_size {
            let pos = Vector2::new(
                spawn_coord(&mut self.rng, radius, width),
                spawn_coord(&mut self.rng, radius, height),
            );
            let theta = self.rng.random_range(0.0..TAU);
            let vel = Vector2::new(theta.cos(), theta.sin()) * speed;
            let status = if i < infected {
                Status::Infected
            } else {
                Status::Good
            };
            balls.push(Ball::new(i as u32, pos, vel, radius)?.with_status(status, 0));
        }
        let counts = StatusCounts::tally(&balls);

        // Swap everything in together so the ledger always matches the balls
        self.population = balls.len();
        self.balls = balls;
        self.archived = Vec::new();
        self.counts = counts;
        self.counts_changed = true;
        self.tick = 0;
        self.phase = RunPhase::Paused;
        self.update_phase();

        log::info!(
            "Populated {} balls ({} infected)",
            self.population,
            self.counts.infected
        );
        Ok(())
    }

    /// Fresh population with the current config, keeping the walls
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.repopulate()
    }

    // === Run phase ===

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Start (or resume) the run loop. A completed simulation stays complete.
    pub fn start(&mut self) {
        if !self.is_complete() {
            self.phase = RunPhase::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Paused;
        }
    }

    pub(crate) fn update_phase(&mut self) {
        if self.is_complete() {
            if self.phase != RunPhase::Complete {
                log::info!("Simulation complete at tick {}", self.tick);
            }
            self.phase = RunPhase::Complete;
        }
    }

    // === Read access ===

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn archived(&self) -> &[Ball] {
        &self.archived
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id() == id)
    }

    /// Population the current ledger counts
    pub fn population(&self) -> usize {
        self.population
    }

    /// Snapshot of the status ledger
    pub fn status_counts(&self) -> StatusCounts {
        self.counts
    }

    /// True once nobody is infected
    pub fn is_complete(&self) -> bool {
        self.counts.infected == 0
    }

    /// Consume the "counts changed" signal
    pub fn take_counts_changed(&mut self) -> bool {
        std::mem::take(&mut self.counts_changed)
    }

    // === Config mutators ===

    /// Changes the population size and repopulates
    pub fn set_population_size(&mut self, size: usize) -> Result<(), SimError> {
        self.config.population_size = size;
        if self.config.initial_infected > size {
            log::warn!(
                "Initial infected {} exceeds population {}, clamping",
                self.config.initial_infected,
                size
            );
            self.config.initial_infected = size;
        }
        self.repopulate()
    }

    /// Changes the initial infected count (clamped to the population) and repopulates
    pub fn set_initial_infected(&mut self, infected: usize) -> Result<(), SimError> {
        let clamped = config::clamp_infected(infected, self.config.population_size);
        if clamped != infected {
            log::warn!("Initial infected {} clamped to {}", infected, clamped);
        }
        self.config.initial_infected = clamped;
        self.repopulate()
    }

    pub fn set_transmission_rate(&mut self, rate: f64) {
        self.config.transmission_rate = config::clamp_probability(rate);
        if self.config.transmission_rate != rate {
            log::warn!(
                "Transmission rate {} clamped to {}",
                rate,
                self.config.transmission_rate
            );
        }
    }

    pub fn set_death_rate(&mut self, rate: f64) {
        self.config.death_rate = config::clamp_probability(rate);
        if self.config.death_rate != rate {
            log::warn!("Death rate {} clamped to {}", rate, self.config.death_rate);
        }
    }

    /// Infection duration in ticks; applies to balls already infected too
    pub fn set_infection_duration(&mut self, ticks: u64) {
        self.config.infection_duration = ticks;
    }

    /// Resize every ball, dead ones included. The new size must still fit the
    /// arena.
    pub fn set_radius(&mut self, radius: f64) -> Result<(), SimError> {
        config::positive("radius", radius)?;
        if config::fits_arena(radius, self.config.width, self.config.height).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "radius",
                value: radius,
            }
            .into());
        }
        for ball in self.balls.iter_mut().chain(self.archived.iter_mut()) {
            ball.set_radius(radius)?;
        }
        self.config.radius = radius;
        Ok(())
    }

    /// Rescale every active ball's velocity by `speed / old speed`
    pub fn set_speed(&mut self, speed: f64) -> Result<(), SimError> {
        config::positive("speed", speed)?;
        let factor = speed / self.config.speed;
        for ball in &mut self.balls {
            ball.vel *= factor;
        }
        self.config.speed = speed;
        Ok(())
    }

    // === Wall editing ===

    pub fn add_wall(&mut self, p1: Vector2, p2: Vector2) -> Result<WallId, SimError> {
        let id = WallId(self.next_wall_id);
        let wall = Wall::new(id, p1, p2)?;
        self.next_wall_id += 1;
        self.walls.push(wall);
        log::info!("Added wall {:?} from {} to {}", id, p1, p2);
        Ok(id)
    }

    /// Returns whether a wall was removed
    pub fn remove_wall(&mut self, id: WallId) -> bool {
        let before = self.walls.len();
        self.walls.retain(|w| w.id() != id);
        let removed = self.walls.len() != before;
        if removed {
            log::info!("Removed wall {:?}", id);
        }
        removed
    }

    pub fn remove_all_walls(&mut self) {
        log::info!("Removed all {} walls", self.walls.len());
        self.walls.clear();
    }

    /// Drag one endpoint of a wall
    pub fn move_wall_endpoint(
        &mut self,
        id: WallId,
        end: WallEnd,
        to: Vector2,
    ) -> Result<(), SimError> {
        let wall = self.wall_mut(id)?;
        wall.set_endpoint(end, to)?;
        Ok(())
    }

    /// Drag a whole wall by `delta`
    pub fn translate_wall(&mut self, id: WallId, delta: Vector2) -> Result<(), SimError> {
        self.wall_mut(id)?.translate(delta);
        Ok(())
    }

    /// First wall within hover distance of `point`, plus the hovered endpoint
    pub fn hovered_wall(&self, point: Vector2) -> Option<WallHover> {
        self.walls.iter().find_map(|wall| {
            wall.hover(point, WALL_HOVER_DISTANCE, ENDPOINT_HOVER_DISTANCE)
                .map(|end| WallHover { wall: wall.id(), end })
        })
    }

    fn wall_mut(&mut self, id: WallId) -> Result<&mut Wall, SimError> {
        self.walls
            .iter_mut()
            .find(|w| w.id() == id)
            .ok_or(SimError::UnknownWall(id))
    }
}

/// Random coordinate keeping a disk of `radius` inside `[0, extent]`
fn spawn_coord(rng: &mut Pcg32, radius: f64, extent: f64) -> f64 {
    if extent > 2.0 * radius {
        rng.random_range(radius..extent - radius)
    } else {
        extent / 2.0
    }
}

/// Default layout: a vertical divider at one third of the width with a gap at
/// mid-height. The arena must be taller than the gap.
pub fn starting_walls(config: &SimulationConfig) -> Result<Vec<Wall>, SimError> {
    if config.height.is_nan() || config.height <= STARTING_WALL_GAP {
        return Err(ConfigError::InvalidValue {
            field: "height",
            value: config.height,
        }
        .into());
    }
    let x = config.width / 3.0;
    let wall_length = config.height / 2.0 - STARTING_WALL_GAP / 2.0;
    Ok(vec![
        Wall::new(
            WallId(0),
            Vector2::new(x, 0.0),
            Vector2::new(x, wall_length),
        )?,
        Wall::new(
            WallId(1),
            Vector2::new(x, wall_length + STARTING_WALL_GAP),
            Vector2::new(x, config.height),
        )?,
    ])
}
