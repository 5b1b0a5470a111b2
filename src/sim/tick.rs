//! Fixed timestep simulation tick
//!
//! One tick: integrate -> detect -> resolve -> transmit -> age out -> reap ->
//! verify ledger -> bump tick counter.

use super::collision;
use super::epidemic::{self, EpidemicParams};
use super::resolve;
use super::state::{RunPhase, Simulation, StatusCounts};
use crate::error::SimError;

impl Simulation {
    /// Advance the simulation by one tick
    pub fn step(&mut self) -> Result<(), SimError> {
        tick(self)
    }

    /// Run-loop entry point: steps only while running, and stops by itself
    /// once nobody is infected
    pub fn update(&mut self) -> Result<(), SimError> {
        if self.phase != RunPhase::Running {
            return Ok(());
        }
        self.step()?;
        self.update_phase();
        Ok(())
    }

    /// Recount every ball and compare with the ledger
    pub fn check_ledger(&self) -> Result<(), SimError> {
        let observed = StatusCounts::tally(self.balls.iter().chain(self.archived.iter()));
        if observed != self.counts || self.counts.total() != self.population {
            log::error!(
                "Ledger mismatch at tick {}: ledger {:?}, recount {:?}",
                self.tick,
                self.counts,
                observed
            );
            return Err(SimError::LedgerMismatch {
                ledger: self.counts,
                observed,
            });
        }
        Ok(())
    }
}

/// Advance the simulation state by one tick
pub fn tick(sim: &mut Simulation) -> Result<(), SimError> {
    let (width, height) = (sim.config.width, sim.config.height);
    let params = EpidemicParams::from(&sim.config);
    let now = sim.tick;

    // Every ball moves before any pair is looked at
    for ball in &mut sim.balls {
        ball.integrate(width, height);
    }

    let contacts = collision::detect(&sim.balls, &sim.walls);
    resolve::resolve(&mut sim.balls, &sim.walls, &contacts);

    let infected = epidemic::transmit(
        &mut sim.balls,
        &contacts.balls,
        &mut sim.counts,
        &params,
        now,
        &mut sim.rng,
    )?;
    let (recovered, died) =
        epidemic::age_and_transition(&mut sim.balls, &mut sim.counts, &params, now, &mut sim.rng)?;
    epidemic::reap_dead(&mut sim.balls, &mut sim.archived);

    if infected + recovered + died > 0 {
        sim.counts_changed = true;
        log::debug!(
            "Tick {}: +{} infected, +{} recovered, +{} dead -> {:?}",
            now,
            infected,
            recovered,
            died,
            sim.counts
        );
    }

    sim.check_ledger()?;
    sim.tick += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::sim::state::{Ball, Status};
    use crate::sim::vector::Vector2;
    use crate::sim::wall::{Wall, WallId};
    use proptest::prelude::*;

    fn ball(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> Ball {
        Ball::new(id, Vector2::new(x, y), Vector2::new(vx, vy), 5.0).unwrap()
    }

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            transmission_rate: 1.0,
            death_rate: 0.0,
            infection_duration: 1_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlapping_pair_separates_and_transmits() {
        let balls = vec![
            ball(0, 100.0, 100.0, 0.0, 0.0).with_status(Status::Infected, 0),
            ball(1, 106.0, 100.0, 0.0, 0.0),
            ball(2, 400.0, 300.0, 0.0, 0.0),
            ball(3, 500.0, 50.0, 0.0, 0.0),
        ];
        let mut sim = Simulation::from_parts(quiet_config(), balls, Vec::new(), 1).unwrap();
        sim.take_counts_changed();

        sim.step().unwrap();

        let b = sim.balls();
        assert!((b[0].pos.distance(b[1].pos) - 10.0).abs() < 1e-9);
        assert_eq!(b[1].status(), Status::Infected);
        assert_eq!(b[1].infection_start_tick(), 0);
        assert_eq!(sim.status_counts().infected, 2);
        assert_eq!(sim.status_counts().good, 2);
        assert_eq!(sim.tick(), 1);
        assert!(sim.take_counts_changed());
        assert!(!sim.take_counts_changed());
    }

    #[test]
    fn test_overlapping_pair_moving_apart_keeps_velocities() {
        let balls = vec![
            ball(0, 100.0, 100.0, -1.0, 0.0),
            ball(1, 106.0, 100.0, 1.0, 0.0),
        ];
        let mut sim = Simulation::from_parts(quiet_config(), balls, Vec::new(), 1).unwrap();

        sim.step().unwrap();

        let b = sim.balls();
        assert!((b[0].pos.distance(b[1].pos) - 10.0).abs() < 1e-9);
        assert_eq!(b[0].vel, Vector2::new(-1.0, 0.0));
        assert_eq!(b[1].vel, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_perpendicular_wall_hit_flips_normal_velocity() {
        let wall =
            Wall::new(WallId(0), Vector2::new(100.0, 100.0), Vector2::new(200.0, 100.0)).unwrap();
        let normal = wall.normal();
        let balls = vec![ball(0, 150.0, 90.0, 0.0, 3.0).with_status(Status::Infected, 0)];
        let mut sim = Simulation::from_parts(quiet_config(), balls, vec![wall], 1).unwrap();

        let speed = sim.balls()[0].vel.length();
        let normal_before = sim.balls()[0].vel.dot(normal);

        // 90 -> 93 is clear of the wall, 93 -> 96 overlaps it
        sim.step().unwrap();
        assert_eq!(sim.balls()[0].vel.dot(normal), normal_before);
        sim.step().unwrap();

        let b = &sim.balls()[0];
        assert!((b.vel.dot(normal) + normal_before).abs() < 1e-9);
        assert!((b.vel.length() - speed).abs() < 1e-9);
        assert!((b.pos.y - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_endpoint_hit_pushes_from_tip() {
        let wall =
            Wall::new(WallId(0), Vector2::new(100.0, 100.0), Vector2::new(200.0, 100.0)).unwrap();
        let tip = wall.p1();
        let balls = vec![ball(0, 94.0, 97.0, 3.0, 0.0).with_status(Status::Infected, 0)];
        let mut sim = Simulation::from_parts(quiet_config(), balls, vec![wall], 1).unwrap();

        sim.step().unwrap();

        let b = &sim.balls()[0];
        // Exactly one radius from the tip; the infinite line would have put it at y = 95
        assert!((b.pos.distance(tip) - 5.0).abs() < 1e-9);
        assert!((b.pos.y - 95.0).abs() > 0.1);
        assert!((b.vel.length() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_status_counts_sum_to_population() {
        let config = SimulationConfig {
            population_size: 60,
            initial_infected: 3,
            infection_duration: 40,
            death_rate: 0.3,
            radius: 8.0,
            speed: 3.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(config, 2024).unwrap();
        let mut previous: Vec<(u32, Status)> = Vec::new();
        for _ in 0..400 {
            sim.step().unwrap();
            assert_eq!(sim.status_counts().total(), 60);
            assert_eq!(sim.balls().len() + sim.archived().len(), 60);

            // No ball ever walks back along the status path
            let now: Vec<(u32, Status)> = sim
                .balls()
                .iter()
                .chain(sim.archived())
                .map(|b| (b.id, b.status()))
                .collect();
            for (id, before) in &previous {
                let after = now.iter().find(|(i, _)| i == id).map(|(_, s)| *s).unwrap();
                assert!(after == *before || before.can_become(after));
            }
            previous = now;
        }
        assert!(sim.archived().iter().all(|b| b.status() == Status::Dead));
        assert!(sim.balls().iter().all(|b| b.status() != Status::Dead));
    }

    #[test]
    fn test_runs_to_completion() {
        let config = SimulationConfig {
            population_size: 20,
            initial_infected: 1,
            infection_duration: 30,
            transmission_rate: 1.0,
            radius: 10.0,
            speed: 4.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(config, 77).unwrap();
        sim.start();
        let bound = 20 * (30 + 1) + 1;
        for _ in 0..bound {
            sim.update().unwrap();
            if !sim.is_running() {
                break;
            }
        }
        assert!(sim.is_complete());
        assert_eq!(sim.phase(), RunPhase::Complete);
        assert_eq!(sim.status_counts().infected, 0);

        // Completed runs cannot be restarted, and update() no longer steps
        let tick = sim.tick();
        sim.start();
        sim.update().unwrap();
        assert_eq!(sim.tick(), tick);
    }

    #[test]
    fn test_pause_stops_update() {
        let mut sim = Simulation::new(SimulationConfig::default(), 5).unwrap();
        sim.start();
        sim.update().unwrap();
        sim.pause();
        sim.update().unwrap();
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.phase(), RunPhase::Paused);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut sim1 = Simulation::new(SimulationConfig::default(), 99999).unwrap();
        let mut sim2 = Simulation::new(SimulationConfig::default(), 99999).unwrap();
        for _ in 0..200 {
            sim1.step().unwrap();
            sim2.step().unwrap();
        }
        assert_eq!(sim1.status_counts(), sim2.status_counts());
        for (a, b) in sim1.balls().iter().zip(sim2.balls()) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.vel, b.vel);
        }
    }

    #[test]
    fn test_ledger_mismatch_is_reported() {
        let mut sim = Simulation::new(SimulationConfig::default(), 1).unwrap();
        sim.counts.good += 1;
        assert!(matches!(
            sim.step(),
            Err(SimError::LedgerMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_integrate_stays_in_arena(
            x in 0.0..600.0f64,
            y in 0.0..400.0f64,
            vx in -20.0..20.0f64,
            vy in -20.0..20.0f64,
            r in 1.0..50.0f64
        ) {
            let mut b = Ball::new(0, Vector2::new(x, y), Vector2::new(vx, vy), r).unwrap();
            b.integrate(600.0, 400.0);
            prop_assert!(b.pos.x - r >= 0.0 && b.pos.x + r <= 600.0);
            prop_assert!(b.pos.y - r >= 0.0 && b.pos.y + r <= 400.0);
        }
    }
}
