// observables.rs - Displacement observables and time-windowed diffusion estimates

use crate::error::{KmcError, Result};
use crate::landscape::Coordinate;

/// Squared Euclidean distance of every state from `origin`.
pub fn mean_squared_displacement<const D: usize>(
    origin: &Coordinate<D>,
    states: &[Coordinate<D>],
) -> Vec<f64> {
    states
        .iter()
        .map(|s| {
            s.iter()
                .zip(origin.iter())
                .map(|(&a, &b)| {
                    let d = a as f64 - b as f64;
                    d * d
                })
                .sum()
        })
        .collect()
}

/// Elementwise square root of [`mean_squared_displacement`].
pub fn root_mean_squared_displacement<const D: usize>(
    origin: &Coordinate<D>,
    states: &[Coordinate<D>],
) -> Vec<f64> {
    mean_squared_displacement(origin, states)
        .into_iter()
        .map(f64::sqrt)
        .collect()
}

/// Least-squares slope of `y` against `x`.
fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }
    (sxx > 0.0).then(|| sxy / sxx)
}

/// Slope of `y(x)` over each window `[i, i + window)` for `i in 0..len - window`.
///
/// Applied to a mean-MSD curve this gives a local diffusion estimate
/// (slope = 2·D·d for a d-dimensional walk).
pub fn windowed_slope(x: &[f64], y: &[f64], window: usize) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(KmcError::Dimension(format!(
            "x has {} points but y has {}",
            x.len(),
            y.len()
        )));
    }
    if window < 2 {
        return Err(KmcError::Domain(format!(
            "regression window needs at least 2 points, got {window}"
        )));
    }
    let n_windows = x.len().saturating_sub(window);
    (0..n_windows)
        .map(|i| {
            ols_slope(&x[i..i + window], &y[i..i + window]).ok_or_else(|| {
                KmcError::Domain(format!("x is constant over window starting at {i}"))
            })
        })
        .collect()
}

/// Welford running mean and variance.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance; zero with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.n > 1 { self.m2 / (self.n - 1) as f64 } else { 0.0 }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.n > 0 { (self.variance() / self.n as f64).sqrt() } else { 0.0 }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

/// Statistics of each target time's samples, e.g. the output of
/// [`sample_msd`](crate::sample::sample_msd).
pub fn stats_per_time(samples: &[Vec<f64>]) -> Vec<RunningStats> {
    samples.iter().map(|s| s.iter().copied().collect()).collect()
}

/// Mean of each target time's samples (the mean-MSD curve).
pub fn mean_per_time(samples: &[Vec<f64>]) -> Vec<f64> {
    stats_per_time(samples).iter().map(RunningStats::mean).collect()
}
