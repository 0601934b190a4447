//! Rejection-free kinetic Monte Carlo for a single walker on a disordered
//! hypercubic lattice, plus resampling of the irregular trajectories onto a
//! fixed time grid.

pub mod error;
pub mod landscape;
pub mod lattice;
pub mod kmc;
pub mod batch;
pub mod sample;
pub mod observables;
pub mod config;
pub mod utils;

pub use batch::{run_batch, Batch};
pub use config::{target_times, BatchConfig};
pub use error::{KmcError, Result};
pub use kmc::{KmcEngine, Jump, Trajectory};
pub use landscape::{Coordinate, EnergyHistogram, EnergyLandscape, K_B};
pub use lattice::Lattice;
