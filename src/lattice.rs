// lattice.rs - Nearest-neighbour hopping with Arrhenius rates

use crate::error::{KmcError, Result};
use crate::landscape::{row_major_in, validate_temperature, Coordinate, EnergyHistogram, EnergyLandscape, K_B};
use rand::Rng;

/// Simple hypercubic lattice with nearest-neighbour hops over a disordered landscape.
#[derive(Debug, Clone)]
pub struct Lattice<const D: usize> {
    landscape: EnergyLandscape<D>,
    hop_rate: f64,
    temperature: f64,
}

impl<const D: usize> Lattice<D> {
    pub fn new(landscape: EnergyLandscape<D>, hop_rate: f64, temperature: f64) -> Result<Self> {
        if !(hop_rate.is_finite() && hop_rate > 0.0) {
            return Err(KmcError::Domain(format!(
                "hop rate must be finite and positive, got {hop_rate}"
            )));
        }
        validate_temperature(temperature)?;
        Ok(Self { landscape, hop_rate, temperature })
    }

    /// Build a lattice over a freshly drawn Gaussian landscape.
    pub fn random_with(
        rng: &mut impl Rng,
        extents: [usize; D],
        energy_std_dev: f64,
        hop_rate: f64,
        temperature: f64,
    ) -> Result<Self> {
        let landscape = EnergyLandscape::new_with(rng, extents, energy_std_dev)?;
        Self::new(landscape, hop_rate, temperature)
    }

    pub fn landscape(&self) -> &EnergyLandscape<D> {
        &self.landscape
    }

    pub fn landscape_mut(&mut self) -> &mut EnergyLandscape<D> {
        &mut self.landscape
    }

    #[inline(always)]
    pub fn extents(&self) -> [usize; D] {
        self.landscape.extents()
    }

    pub fn hop_rate(&self) -> f64 {
        self.hop_rate
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// k_B T in eV.
    #[inline(always)]
    pub fn thermal_energy(&self) -> f64 {
        K_B * self.temperature
    }

    pub fn contains(&self, site: &Coordinate<D>) -> bool {
        self.landscape.contains(site)
    }

    fn check_site(&self, site: &Coordinate<D>) -> Result<f64> {
        self.landscape.energy(site)
    }

    /// Sites one step away along a single axis, clipped to the grid.
    /// Ordered axis-major, decrement before increment.
    pub fn neighbors(&self, site: &Coordinate<D>) -> Result<Vec<Coordinate<D>>> {
        self.check_site(site)?;
        let mut out = Vec::with_capacity(2 * D);
        self.push_neighbors(site, &mut out);
        Ok(out)
    }

    fn push_neighbors(&self, site: &Coordinate<D>, out: &mut Vec<Coordinate<D>>) {
        let extents = self.extents();
        for axis in 0..D {
            if site[axis] > 0 {
                let mut down = *site;
                down[axis] -= 1;
                out.push(down);
            }
            if site[axis] + 1 < extents[axis] {
                let mut up = *site;
                up[axis] += 1;
                out.push(up);
            }
        }
    }

    #[inline(always)]
    fn arrhenius(&self, e_from: f64, e_to: f64) -> f64 {
        self.hop_rate * ((e_from - e_to) / self.thermal_energy()).exp()
    }

    /// `k(from → to) = hop_rate · exp((E_from − E_to) / k_B T)`.
    /// Adjacency is not checked.
    pub fn rate(&self, from: &Coordinate<D>, to: &Coordinate<D>) -> Result<f64> {
        Ok(self.arrhenius(self.check_site(from)?, self.check_site(to)?))
    }

    /// Hop rates aligned index-for-index with [`neighbors`](Self::neighbors).
    pub fn rates(&self, site: &Coordinate<D>) -> Result<Vec<f64>> {
        let mut neighbors = Vec::with_capacity(2 * D);
        let mut rates = Vec::with_capacity(2 * D);
        self.transitions_into(site, &mut neighbors, &mut rates)?;
        Ok(rates)
    }

    /// Fill both buffers (cleared first) with the neighbours of `site` and
    /// their hop rates. Reusing the buffers keeps the step loop allocation free.
    pub fn transitions_into(
        &self,
        site: &Coordinate<D>,
        neighbors: &mut Vec<Coordinate<D>>,
        rates: &mut Vec<f64>,
    ) -> Result<()> {
        let e_site = self.check_site(site)?;
        neighbors.clear();
        rates.clear();
        self.push_neighbors(site, neighbors);
        let extents = self.extents();
        let energies = self.landscape.energies();
        for n in neighbors.iter() {
            // push_neighbors only yields in-grid sites
            let e_n = energies[row_major_in(n, &extents)];
            rates.push(self.arrhenius(e_site, e_n));
        }
        Ok(())
    }

    /// Redraw the disorder realization.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.landscape.shuffle(rng);
    }

    /// Coarse grain the landscape at this lattice's temperature.
    pub fn coarse_grain(&mut self, new_extents: [usize; D]) -> Result<()> {
        self.landscape.coarse_grain(new_extents, self.temperature)
    }

    /// Energy histogram, in units of k_B T when `thermal` is set.
    pub fn histogram_energy(
        &self,
        thermal: bool,
        bins: usize,
        range: Option<(f64, f64)>,
    ) -> Result<EnergyHistogram> {
        let temperature = thermal.then_some(self.temperature);
        self.landscape.histogram_energy(temperature, bins, range)
    }
}
