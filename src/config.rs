//! Simulation configuration
//!
//! Everything the UI can tweak lives here. Loaded from JSON on native builds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === Arena ===
    /// Arena width (x extent)
    pub width: f64,
    /// Arena height (y extent)
    pub height: f64,

    // === Population ===
    /// Number of balls created on (re)population
    pub population_size: usize,
    /// How many of those start infected
    pub initial_infected: usize,

    // === Epidemic ===
    /// Ticks an infected ball stays infected before recovering or dying
    pub infection_duration: u64,
    /// Chance (0.0 - 1.0) that a contact passes the infection on
    pub transmission_rate: f64,
    /// Chance (0.0 - 1.0) that an infection ends in death
    pub death_rate: f64,

    // === Balls ===
    /// Ball speed in arena units per tick
    pub speed: f64,
    /// Ball radius
    pub radius: f64,

    /// Logical tick rate, for converting durations from seconds
    pub ticks_per_second: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,

            population_size: POPULATION_SIZE,
            initial_infected: INITIAL_INFECTED,

            infection_duration: INFECTION_DURATION_TICKS,
            transmission_rate: TRANSMISSION_RATE,
            death_rate: DEATH_RATE,

            speed: BALL_SPEED,
            radius: BALL_RADIUS,

            ticks_per_second: TICKS_PER_SECOND,
        }
    }
}

impl SimulationConfig {
    /// Check the values that cannot be clamped into something sensible
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("speed", self.speed)?;
        positive("radius", self.radius)?;
        fits_arena(self.radius, self.width, self.height)?;
        if self.ticks_per_second == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ticks_per_second",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Copy with every clampable field pulled into range
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.initial_infected = clamp_infected(self.initial_infected, self.population_size);
        config.transmission_rate = clamp_probability(self.transmission_rate);
        config.death_rate = clamp_probability(self.death_rate);
        config
    }

    /// Convert a duration in seconds to whole ticks
    pub fn ticks_from_secs(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.ticks_per_second as f64).round() as u64
    }

    /// Elapsed simulated time for a tick index
    pub fn secs_from_ticks(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_second.max(1) as f64
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Reject NaN, infinities and non-positive values
pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

/// A ball must fit across the arena both ways, or `contain` cannot keep it in
pub(crate) fn fits_arena(radius: f64, width: f64, height: f64) -> Result<(), ConfigError> {
    let diameter = 2.0 * radius;
    if width < diameter {
        return Err(ConfigError::InvalidValue {
            field: "width",
            value: width,
        });
    }
    if height < diameter {
        return Err(ConfigError::InvalidValue {
            field: "height",
            value: height,
        });
    }
    Ok(())
}

/// Probabilities outside [0, 1] (or NaN) are pulled back into range
pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

pub(crate) fn clamp_infected(infected: usize, population: usize) -> usize {
    infected.min(population)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.infection_duration, 450);
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = SimulationConfig {
            population_size: 10,
            initial_infected: 50,
            transmission_rate: 1.5,
            death_rate: f64::NAN,
            ..Default::default()
        };
        let clean = config.sanitized();
        assert_eq!(clean.initial_infected, 10);
        assert_eq!(clean.transmission_rate, 1.0);
        assert_eq!(clean.death_rate, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        let config = SimulationConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "radius", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_arena_narrower_than_a_ball() {
        let config = SimulationConfig {
            width: 8.0,
            radius: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "width", .. })
        ));

        let config = SimulationConfig {
            height: 9.0,
            radius: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "height", .. })
        ));

        // Exactly one diameter still fits
        let config = SimulationConfig {
            width: 10.0,
            radius: 5.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = SimulationConfig::from_json(r#"{ "population_size": 4, "initial_infected": 9 }"#)
            .unwrap();
        assert_eq!(config.population_size, 4);
        assert_eq!(config.initial_infected, 4);
        assert_eq!(config.radius, BALL_RADIUS);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SimulationConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(SimulationConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_tick_conversion() {
        let config = SimulationConfig::default();
        assert_eq!(config.ticks_from_secs(15.0), 450);
        assert!((config.secs_from_ticks(45) - 1.5).abs() < 1e-12);
    }
}
