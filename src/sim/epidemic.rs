//! Epidemic state machine
//!
//! Good -> Infected on contact, Infected -> Recovered | Dead after the infection
//! duration. Every transition goes through `transition`, which moves the ball
//! and its ledger count together.

use rand::Rng;

use super::collision::BallContact;
use super::state::{Ball, Status, StatusCounts};
use crate::config::SimulationConfig;
use crate::error::SimError;

/// Parameters read from the config at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpidemicParams {
    pub transmission_rate: f64,
    pub death_rate: f64,
    pub infection_duration: u64,
}

impl From<&SimulationConfig> for EpidemicParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            transmission_rate: config.transmission_rate.clamp(0.0, 1.0),
            death_rate: config.death_rate.clamp(0.0, 1.0),
            infection_duration: config.infection_duration,
        }
    }
}

/// Bernoulli trial on a uniform [0, 1) draw; `p` is already clamped
#[inline]
fn roll<R: Rng>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}

fn transition(
    ball: &mut Ball,
    to: Status,
    tick: u64,
    ledger: &mut StatusCounts,
) -> Result<(), SimError> {
    ledger.shift(ball.status(), to)?;
    ball.set_status(to, tick);
    Ok(())
}

/// Spread the infection across this tick's contacts.
///
/// Pairs are processed in order, so a ball infected by an earlier pair can pass
/// it on through a later one in the same tick. Returns the number of new
/// infections.
pub fn transmit<R: Rng>(
    balls: &mut [Ball],
    contacts: &[BallContact],
    ledger: &mut StatusCounts,
    params: &EpidemicParams,
    tick: u64,
    rng: &mut R,
) -> Result<usize, SimError> {
    let mut infected = 0;
    for &BallContact { a, b } in contacts {
        let target = match (balls[a].status(), balls[b].status()) {
            (Status::Infected, Status::Good) => b,
            (Status::Good, Status::Infected) => a,
            _ => continue,
        };
        if roll(rng, params.transmission_rate) {
            transition(&mut balls[target], Status::Infected, tick, ledger)?;
            infected += 1;
        }
    }
    Ok(infected)
}

/// End infections that have run their course: die with `death_rate`, recover
/// otherwise. Returns (recovered, died).
pub fn age_and_transition<R: Rng>(
    balls: &mut [Ball],
    ledger: &mut StatusCounts,
    params: &EpidemicParams,
    tick: u64,
    rng: &mut R,
) -> Result<(usize, usize), SimError> {
    let (mut recovered, mut died) = (0, 0);
    for ball in balls.iter_mut() {
        if ball.status() != Status::Infected {
            continue;
        }
        let elapsed = tick.saturating_sub(ball.infection_start_tick());
        if elapsed < params.infection_duration {
            continue;
        }
        if roll(rng, params.death_rate) {
            transition(ball, Status::Dead, tick, ledger)?;
            died += 1;
        } else {
            transition(ball, Status::Recovered, tick, ledger)?;
            recovered += 1;
        }
    }
    Ok((recovered, died))
}

/// Move dead balls from the active list to the archive, keeping order
pub fn reap_dead(balls: &mut Vec<Ball>, archive: &mut Vec<Ball>) -> usize {
    let before = archive.len();
    let (dead, alive): (Vec<Ball>, Vec<Ball>) = balls
        .drain(..)
        .partition(|b| b.status() == Status::Dead);
    *balls = alive;
    archive.extend(dead);
    archive.len() - before
}
