//! Status-count history for the chart view
//!
//! One sample at creation, then one per tick in which the counts changed. The
//! renderer draws stacked bands from these; nothing here touches pixels.
//! Repopulating the simulation starts a fresh series.

use serde::{Deserialize, Serialize};

use crate::sim::{Simulation, Status, StatusCounts};

/// Order the bands are stacked in, top to bottom
pub const STACK_ORDER: [Status; 4] = [
    Status::Good,
    Status::Recovered,
    Status::Infected,
    Status::Dead,
];

/// Counts at a given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSample {
    pub counts: StatusCounts,
    pub tick: u64,
}

/// Append-only time series of status counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    population: usize,
    samples: Vec<ChartSample>,
}

impl ChartSeries {
    /// Start a series with the simulation's current counts
    pub fn new(sim: &Simulation) -> Self {
        Self {
            population: sim.population(),
            samples: vec![ChartSample {
                counts: sim.status_counts(),
                tick: sim.tick(),
            }],
        }
    }

    /// Drop every sample and start over from the simulation's current counts
    pub fn reset(&mut self, sim: &Simulation) {
        *self = Self::new(sim);
    }

    /// Consume the simulation's "counts changed" signal and record a sample if
    /// it was set. Returns whether a sample was added.
    ///
    /// A rewound tick counter or a different population means the simulation
    /// was repopulated; the series restarts from the new counts.
    pub fn observe(&mut self, sim: &mut Simulation) -> bool {
        let changed = sim.take_counts_changed();
        let rewound = self.latest().is_some_and(|last| sim.tick() < last.tick);
        if rewound || self.population != sim.population() {
            log::debug!(
                "Chart restarted at tick {} for population {}",
                sim.tick(),
                sim.population()
            );
            self.reset(sim);
            return true;
        }
        if !changed {
            return false;
        }
        let sample = ChartSample {
            counts: sim.status_counts(),
            tick: sim.tick(),
        };
        // Same tick twice (e.g. observed before any step): keep the newest
        match self.samples.last_mut() {
            Some(last) if last.tick == sample.tick => *last = sample,
            _ => self.samples.push(sample),
        }
        true
    }

    pub fn samples(&self) -> &[ChartSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&ChartSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn population(&self) -> usize {
        self.population
    }

    /// Band boundaries for one sample, scaled to `height`, in `STACK_ORDER`.
    /// Each entry is the bottom edge of that band.
    pub fn stacked_heights(&self, sample: &ChartSample, height: f64) -> [f64; 4] {
        let per_member = if self.population == 0 {
            0.0
        } else {
            height / self.population as f64
        };
        let mut edges = [0.0; 4];
        let mut acc = 0.0;
        for (edge, status) in edges.iter_mut().zip(STACK_ORDER) {
            acc += sample.counts.get(status) as f64 * per_member;
            *edge = acc;
        }
        edges
    }
}
