// sample.rs - Resample irregular KMC trajectories onto a fixed time grid

use crate::error::{KmcError, Result};
use crate::kmc::Trajectory;
use crate::landscape::{row_major, Coordinate};
use crate::observables::{mean_squared_displacement, root_mean_squared_displacement};
use rayon::prelude::*;

/// Index of the first sample stamped at or after `t`.
///
/// A trajectory holds each state until its next jump, so this is the sample
/// occupied at time `t`. Asking past the final timestamp is an error rather
/// than a silent fallback to the last sample.
pub fn sample_index(times: &[f64], t: f64) -> Result<usize> {
    if t.is_nan() {
        return Err(KmcError::OutOfRange("target time is NaN".into()));
    }
    let idx = times.partition_point(|&x| x < t);
    if idx == times.len() {
        return Err(KmcError::OutOfRange(format!(
            "target time {t} is after the last recorded time {:?}",
            times.last()
        )));
    }
    Ok(idx)
}

/// State of `trajectory` at time `t`.
pub fn state_at<const D: usize>(trajectory: &Trajectory<D>, t: f64) -> Result<Coordinate<D>> {
    sample_index(trajectory.times(), t).map(|i| trajectory.states()[i])
}

/// Per-site occupation counts of a batch at one target time.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancySnapshot<const D: usize> {
    pub time: f64,
    extents: [usize; D],
    counts: Vec<usize>,
}

impl<const D: usize> OccupancySnapshot<D> {
    pub fn extents(&self) -> [usize; D] {
        self.extents
    }

    /// Flat row-major counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn count(&self, site: &Coordinate<D>) -> usize {
        row_major(site, &self.extents).map_or(0, |i| self.counts[i])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts divided by the number of trajectories.
    pub fn populations(&self) -> Vec<f64> {
        let n = self.total().max(1) as f64;
        self.counts.iter().map(|&c| c as f64 / n).collect()
    }
}

/// Count how many trajectories occupy each site at every target time.
pub fn sample_occupancy<const D: usize>(
    trajectories: &[Trajectory<D>],
    target_times: &[f64],
    extents: [usize; D],
) -> Result<Vec<OccupancySnapshot<D>>> {
    let n_sites: usize = extents.iter().product();
    target_times
        .par_iter()
        .map(|&t| -> Result<OccupancySnapshot<D>> {
            let mut counts = vec![0usize; n_sites];
            for traj in trajectories {
                let site = state_at(traj, t)?;
                let i = row_major(&site, &extents).ok_or_else(|| {
                    KmcError::OutOfRange(format!("state {site:?} outside extents {extents:?}"))
                })?;
                counts[i] += 1;
            }
            Ok(OccupancySnapshot { time: t, extents, counts })
        })
        .collect()
}

/// Evaluate `observable` along every trajectory, then pick each trajectory's
/// value at every target time. Returns one vector of N scalars per target time.
pub fn sample_observable<const D: usize, F>(
    trajectories: &[Trajectory<D>],
    target_times: &[f64],
    observable: F,
) -> Result<Vec<Vec<f64>>>
where
    F: Fn(&Trajectory<D>) -> Vec<f64> + Sync,
{
    let series: Vec<Vec<f64>> = trajectories.par_iter().map(&observable).collect();
    for (k, (values, traj)) in series.iter().zip(trajectories).enumerate() {
        if values.len() != traj.len() {
            return Err(KmcError::Dimension(format!(
                "observable gave {} values for trajectory {k} of length {}",
                values.len(),
                traj.len()
            )));
        }
    }

    target_times
        .iter()
        .map(|&t| {
            series
                .iter()
                .zip(trajectories)
                .map(|(values, traj)| sample_index(traj.times(), t).map(|i| values[i]))
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

/// MSD from `origin` sampled at `target_times`.
pub fn sample_msd<const D: usize>(
    origin: &Coordinate<D>,
    trajectories: &[Trajectory<D>],
    target_times: &[f64],
) -> Result<Vec<Vec<f64>>> {
    sample_observable(trajectories, target_times, |traj| {
        mean_squared_displacement(origin, traj.states())
    })
}

/// RMSD from `origin` sampled at `target_times`.
pub fn sample_rmsd<const D: usize>(
    origin: &Coordinate<D>,
    trajectories: &[Trajectory<D>],
    target_times: &[f64],
) -> Result<Vec<Vec<f64>>> {
    sample_observable(trajectories, target_times, |traj| {
        root_mean_squared_displacement(origin, traj.states())
    })
}
