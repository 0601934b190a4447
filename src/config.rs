// config.rs - Run parameters for a batch of trajectories

use crate::error::{KmcError, Result};
use crate::landscape::Coordinate;
use crate::lattice::Lattice;

/// Run-time configuration of a batch (single source of truth for drivers).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig<const D: usize> {
    pub num_trajectories: usize,
    pub horizon: f64,
    pub start: Coordinate<D>,
    pub seed: u64,
    /// Draw a fresh disorder realization before every trajectory.
    pub reshuffle: bool,
}

impl<const D: usize> Default for BatchConfig<D> {
    fn default() -> Self {
        Self {
            num_trajectories: 1000,
            horizon: 30.0,
            start: [0; D],
            seed: 0,
            reshuffle: true,
        }
    }
}

impl<const D: usize> BatchConfig<D> {
    pub fn new(start: Coordinate<D>) -> Self {
        Self { start, ..Self::default() }
    }

    pub fn validate(&self, lattice: &Lattice<D>) -> Result<()> {
        if self.num_trajectories == 0 {
            return Err(KmcError::Configuration("batch needs at least one trajectory".into()));
        }
        if !self.horizon.is_finite() {
            return Err(KmcError::Domain(format!("horizon must be finite, got {}", self.horizon)));
        }
        if !lattice.contains(&self.start) {
            return Err(KmcError::OutOfRange(format!(
                "start site {:?} outside extents {:?}",
                self.start,
                lattice.extents()
            )));
        }
        Ok(())
    }
}

/// `n` evenly spaced times from 0 to `horizon` inclusive.
pub fn target_times(horizon: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let dt = horizon / (n - 1) as f64;
            let mut times: Vec<f64> = (0..n).map(|i| dt * i as f64).collect();
            times[n - 1] = horizon;
            times
        }
    }
}
