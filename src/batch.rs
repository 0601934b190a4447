// batch.rs - Many independent trajectories, one disorder realization each

use crate::config::BatchConfig;
use crate::error::Result;
use crate::kmc::{KmcEngine, Trajectory};
use crate::landscape::Coordinate;
use crate::lattice::Lattice;
use crate::utils::rng::stream_rng;
use rayon::prelude::*;
use std::borrow::Cow;
use tracing::{debug, info};

/// Trajectories produced by [`run_batch`], in trajectory-index order.
#[derive(Debug, Clone)]
pub struct Batch<const D: usize> {
    pub start: Coordinate<D>,
    pub horizon: f64,
    pub trajectories: Vec<Trajectory<D>>,
}

impl<const D: usize> Batch<D> {
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Mean number of jumps per trajectory.
    pub fn mean_jumps(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        let total: usize = self.trajectories.iter().map(Trajectory::num_jumps).sum();
        total as f64 / self.trajectories.len() as f64
    }
}

/// Run `config.num_trajectories` trajectories in parallel.
///
/// Trajectory `i` draws from its own ChaCha stream derived from
/// `(config.seed, i)`, so the result does not depend on the thread count.
/// With `reshuffle` every trajectory works on a private clone of `lattice`
/// with a freshly drawn landscape; `lattice` itself is never mutated.
pub fn run_batch<const D: usize>(lattice: &Lattice<D>, config: &BatchConfig<D>) -> Result<Batch<D>> {
    run_batch_with_progress(lattice, config, || {})
}

/// As [`run_batch`], calling `on_done` after each finished trajectory.
pub fn run_batch_with_progress<const D: usize, F>(
    lattice: &Lattice<D>,
    config: &BatchConfig<D>,
    on_done: F,
) -> Result<Batch<D>>
where
    F: Fn() + Sync,
{
    config.validate(lattice)?;
    info!(
        trajectories = config.num_trajectories,
        horizon = config.horizon,
        start = ?config.start,
        extents = ?lattice.extents(),
        reshuffle = config.reshuffle,
        "starting batch"
    );

    let trajectories = (0..config.num_trajectories)
        .into_par_iter()
        .map_init(KmcEngine::<D>::new, |engine, i| {
            let mut rng = stream_rng(config.seed, i);
            let realization = if config.reshuffle {
                let mut own = lattice.clone();
                own.shuffle(&mut rng);
                Cow::Owned(own)
            } else {
                Cow::Borrowed(lattice)
            };
            let traj = engine.run(config.start, &realization, config.horizon, &mut rng);
            on_done();
            traj
        })
        .collect::<Result<Vec<_>>>()?;

    let batch = Batch { start: config.start, horizon: config.horizon, trajectories };
    debug!(mean_jumps = batch.mean_jumps(), "batch finished");
    Ok(batch)
}
