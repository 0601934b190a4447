// landscape.rs - Quenched Gaussian site energies on a hypercubic grid

use crate::error::{KmcError, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Boltzmann constant in eV/K.
pub const K_B: f64 = 8.617333e-5;

/// A lattice site: one index per axis.
pub type Coordinate<const D: usize> = [usize; D];

/// Site energies of a `D`-dimensional grid, stored row-major (last axis fastest).
#[derive(Debug, Clone)]
pub struct EnergyLandscape<const D: usize> {
    extents: [usize; D],
    energy_std_dev: f64,
    disorder: Normal<f64>,
    energies: Vec<f64>,
}

/// Frequency histogram of site energies.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyHistogram {
    /// One count per bin.
    pub counts: Vec<usize>,
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Vec<f64>,
}

fn validate_extents<const D: usize>(extents: &[usize; D]) -> Result<()> {
    if D == 0 {
        return Err(KmcError::Dimension("a lattice needs at least one axis".into()));
    }
    if let Some(axis) = extents.iter().position(|&e| e == 0) {
        return Err(KmcError::Domain(format!(
            "extent along axis {axis} must be positive, got 0"
        )));
    }
    Ok(())
}

fn normal(energy_std_dev: f64) -> Result<Normal<f64>> {
    if !energy_std_dev.is_finite() {
        return Err(KmcError::Domain(format!("energy std dev must be finite, got {energy_std_dev}")));
    }
    Normal::new(0.0, energy_std_dev).map_err(|e| {
        KmcError::Domain(format!("energy std dev {energy_std_dev} rejected: {e}"))
    })
}

/// Row-major flat index of `site` within `extents`.
pub(crate) fn row_major<const D: usize>(site: &Coordinate<D>, extents: &[usize; D]) -> Option<usize> {
    let mut idx = 0;
    for (&s, &e) in site.iter().zip(extents.iter()) {
        if s >= e {
            return None;
        }
        idx = idx * e + s;
    }
    Some(idx)
}

/// Row-major flat index of a site known to lie inside `extents`.
#[inline]
pub(crate) fn row_major_in<const D: usize>(site: &Coordinate<D>, extents: &[usize; D]) -> usize {
    debug_assert!(site.iter().zip(extents.iter()).all(|(&s, &e)| s < e));
    site.iter().zip(extents.iter()).fold(0, |idx, (&s, &e)| idx * e + s)
}

/// Population mean and standard deviation.
pub(crate) fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

pub(crate) fn validate_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(KmcError::Domain(format!(
            "temperature must be finite and positive, got {temperature}"
        )))
    }
}

impl<const D: usize> EnergyLandscape<D> {
    /// Draw a fresh landscape with i.i.d. N(0, σ²) energies from a
    /// caller-supplied RNG (preferred for reproducibility).
    pub fn new_with(rng: &mut impl Rng, extents: [usize; D], energy_std_dev: f64) -> Result<Self> {
        validate_extents(&extents)?;
        let disorder = normal(energy_std_dev)?;
        let n: usize = extents.iter().product();
        let energies = (0..n).map(|_| disorder.sample(rng)).collect();
        Ok(Self { extents, energy_std_dev, disorder, energies })
    }

    /// Convenience wrapper that uses `thread_rng`.
    pub fn new(extents: [usize; D], energy_std_dev: f64) -> Result<Self> {
        let mut rng = rand::thread_rng();
        Self::new_with(&mut rng, extents, energy_std_dev)
    }

    /// Wrap explicit energies (row-major). The disorder scale is taken as the
    /// population std dev of the supplied values and is what `shuffle` redraws with.
    pub fn from_energies(extents: [usize; D], energies: Vec<f64>) -> Result<Self> {
        validate_extents(&extents)?;
        let n: usize = extents.iter().product();
        if energies.len() != n {
            return Err(KmcError::Dimension(format!(
                "expected {n} energies for extents {extents:?}, got {}",
                energies.len()
            )));
        }
        if let Some(bad) = energies.iter().find(|e| !e.is_finite()) {
            return Err(KmcError::Domain(format!("site energy {bad} is not finite")));
        }
        let (_, energy_std_dev) = mean_and_std(&energies);
        let disorder = normal(energy_std_dev)?;
        Ok(Self { extents, energy_std_dev, disorder, energies })
    }

    #[inline(always)]
    pub fn extents(&self) -> [usize; D] {
        self.extents
    }

    #[inline(always)]
    pub fn num_sites(&self) -> usize {
        self.energies.len()
    }

    /// Disorder scale σ of the current field.
    pub fn energy_std_dev(&self) -> f64 {
        self.energy_std_dev
    }

    /// Flat row-major view of all site energies.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn contains(&self, site: &Coordinate<D>) -> bool {
        site.iter().zip(self.extents.iter()).all(|(&s, &e)| s < e)
    }

    /// Row-major flat index of `site`, or `None` if it lies outside the grid.
    #[inline]
    pub fn index_of(&self, site: &Coordinate<D>) -> Option<usize> {
        row_major(site, &self.extents)
    }

    /// Inverse of [`index_of`](Self::index_of).
    pub fn coordinate_of(&self, mut idx: usize) -> Coordinate<D> {
        let mut site = [0; D];
        for k in (0..D).rev() {
            site[k] = idx % self.extents[k];
            idx /= self.extents[k];
        }
        site
    }

    pub fn energy(&self, site: &Coordinate<D>) -> Result<f64> {
        self.index_of(site)
            .map(|i| self.energies[i])
            .ok_or_else(|| {
                KmcError::OutOfRange(format!("site {site:?} outside extents {:?}", self.extents))
            })
    }

    /// Redraw every energy in place with the same shape and σ.
    /// Rates computed before the call are stale afterwards.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        for e in &mut self.energies {
            *e = self.disorder.sample(rng);
        }
        debug!(sites = self.energies.len(), std_dev = self.energy_std_dev, "landscape reshuffled");
    }

    /// Block-renormalize a 2D landscape onto `new_extents`.
    ///
    /// Each coarse cell gets the free energy `F = -k_B T ln Σ exp(-E / k_B T)`
    /// of the fine sites it covers. The new field is shifted to zero mean and
    /// σ becomes its population std dev. The sum is evaluated relative to the
    /// cell minimum so strongly disordered fields do not overflow.
    pub fn coarse_grain(&mut self, new_extents: [usize; D], temperature: f64) -> Result<()> {
        if D != 2 {
            return Err(KmcError::Dimension(format!(
                "coarse graining is defined for 2D landscapes, this one has {D} axes"
            )));
        }
        validate_temperature(temperature)?;
        validate_extents(&new_extents)?;
        let mut window = [0usize; D];
        for k in 0..D {
            if self.extents[k] % new_extents[k] != 0 {
                return Err(KmcError::Configuration(format!(
                    "new extent {} does not divide extent {} along axis {k}",
                    new_extents[k], self.extents[k]
                )));
            }
            window[k] = self.extents[k] / new_extents[k];
        }

        let kt = K_B * temperature;
        let n_coarse: usize = new_extents.iter().product();
        let cell_of = |idx: usize| {
            let mut site = self.coordinate_of(idx);
            for k in 0..D {
                site[k] /= window[k];
            }
            row_major_in(&site, &new_extents)
        };

        let mut cell_min = vec![f64::INFINITY; n_coarse];
        for (idx, &e) in self.energies.iter().enumerate() {
            let c = cell_of(idx);
            cell_min[c] = cell_min[c].min(e);
        }
        let mut z = vec![0.0; n_coarse];
        for (idx, &e) in self.energies.iter().enumerate() {
            let c = cell_of(idx);
            z[c] += (-(e - cell_min[c]) / kt).exp();
        }
        let free: Vec<f64> = z
            .iter()
            .zip(cell_min.iter())
            .map(|(&zc, &emin)| emin - kt * zc.ln())
            .collect();

        let (mean, std) = mean_and_std(&free);
        let disorder = normal(std)?;
        debug!(
            from = ?self.extents,
            to = ?new_extents,
            mean_free_energy = mean,
            std_dev = std,
            "landscape coarse grained"
        );
        self.energies = free.into_iter().map(|f| f - mean).collect();
        self.extents = new_extents;
        self.energy_std_dev = std;
        self.disorder = disorder;
        Ok(())
    }

    /// Histogram of site energies, divided by `k_B T` when `thermal` carries a
    /// temperature. `range` defaults to the data's `[min, max]`; the last bin is
    /// closed and values outside the range are dropped.
    pub fn histogram_energy(
        &self,
        thermal: Option<f64>,
        bins: usize,
        range: Option<(f64, f64)>,
    ) -> Result<EnergyHistogram> {
        if bins == 0 {
            return Err(KmcError::Domain("histogram needs at least one bin".into()));
        }
        let scale = match thermal {
            Some(t) => {
                validate_temperature(t)?;
                1.0 / (K_B * t)
            }
            None => 1.0,
        };
        let values: Vec<f64> = self.energies.iter().map(|&e| e * scale).collect();

        let (mut lo, mut hi) = match range {
            Some((lo, hi)) => {
                if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                    return Err(KmcError::Domain(format!("invalid histogram range ({lo}, {hi})")));
                }
                (lo, hi)
            }
            None => values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        };
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in &values {
            if v < lo || v > hi {
                continue;
            }
            let bin = (((v - lo) / (hi - lo)) * bins as f64) as usize;
            counts[bin.min(bins - 1)] += 1;
        }
        Ok(EnergyHistogram { counts, edges })
    }
}
