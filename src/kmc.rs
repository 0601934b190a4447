// kmc.rs - Rejection-free (Gillespie direct method) stepping on a Lattice

use crate::error::{KmcError, Result};
use crate::landscape::Coordinate;
use crate::lattice::Lattice;
use rand::distributions::Open01;
use rand::Rng;
use tracing::trace;

/// Result of one rejection-free step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jump<const D: usize> {
    pub site: Coordinate<D>,
    pub waiting_time: f64,
}

/// Visited sites and the elapsed time at which each was entered.
///
/// Always starts with `(start, 0.0)`; for a positive horizon the last entry is
/// stamped exactly at the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<const D: usize> {
    states: Vec<Coordinate<D>>,
    times: Vec<f64>,
}

impl<const D: usize> Trajectory<D> {
    /// Build from parallel state/time sequences. Times must start at zero and
    /// strictly increase.
    pub fn new(states: Vec<Coordinate<D>>, times: Vec<f64>) -> Result<Self> {
        if states.len() != times.len() {
            return Err(KmcError::Dimension(format!(
                "{} states but {} times",
                states.len(),
                times.len()
            )));
        }
        if states.is_empty() {
            return Err(KmcError::Configuration("a trajectory needs at least one sample".into()));
        }
        if times[0] != 0.0 {
            return Err(KmcError::Domain(format!("trajectory starts at t = {}", times[0])));
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(KmcError::Domain("trajectory times must strictly increase".into()));
        }
        Ok(Self { states, times })
    }

    fn starting_at(start: Coordinate<D>) -> Self {
        Self { states: vec![start], times: vec![0.0] }
    }

    pub fn states(&self) -> &[Coordinate<D>] {
        &self.states
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of recorded samples, including the initial one.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of jumps performed.
    pub fn num_jumps(&self) -> usize {
        self.states.len() - 1
    }

    pub fn start(&self) -> Coordinate<D> {
        self.states[0]
    }

    /// Last recorded state and its timestamp.
    pub fn last(&self) -> (Coordinate<D>, f64) {
        let i = self.states.len() - 1;
        (self.states[i], self.times[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate<D>, f64)> + '_ {
        self.states.iter().zip(self.times.iter().copied())
    }
}

/// Kinetic Monte Carlo driver. Holds only scratch buffers, so a step is a pure
/// function of the site, the lattice and the random stream.
#[derive(Debug, Clone, Default)]
pub struct KmcEngine<const D: usize> {
    neighbors: Vec<Coordinate<D>>,
    cumulative: Vec<f64>,
}

/// Index of the first cumulative rate that reaches `threshold`.
#[inline]
fn select(cumulative: &[f64], threshold: f64) -> usize {
    cumulative
        .iter()
        .position(|&c| threshold <= c)
        .unwrap_or(cumulative.len() - 1)
}

impl<const D: usize> KmcEngine<D> {
    pub fn new() -> Self {
        Self {
            neighbors: Vec::with_capacity(2 * D),
            cumulative: Vec::with_capacity(2 * D),
        }
    }

    /// Pick the next site with probability proportional to its rate and draw
    /// an Exp(total rate) waiting time.
    pub fn step(
        &mut self,
        site: &Coordinate<D>,
        lattice: &Lattice<D>,
        rng: &mut impl Rng,
    ) -> Result<Jump<D>> {
        lattice.transitions_into(site, &mut self.neighbors, &mut self.cumulative)?;
        if self.neighbors.is_empty() {
            return Err(KmcError::Configuration(format!(
                "site {site:?} has no neighbours on extents {:?}",
                lattice.extents()
            )));
        }

        // running sum in place: rates -> cumulative rates
        let mut acc = 0.0;
        for c in &mut self.cumulative {
            acc += *c;
            *c = acc;
        }
        let total_rate = acc;

        let u: f64 = rng.gen();
        let next = self.neighbors[select(&self.cumulative, total_rate * u)];

        let u_time: f64 = rng.sample(Open01);
        let waiting_time = -u_time.ln() / total_rate;

        Ok(Jump { site: next, waiting_time })
    }

    /// Hop from `start` until the elapsed time reaches `horizon`. The jump
    /// that overshoots is kept but stamped at exactly `horizon`. Hops whose
    /// waiting time vanishes in `t + dt` replace the last recorded state, so
    /// timestamps strictly increase.
    pub fn run(
        &mut self,
        start: Coordinate<D>,
        lattice: &Lattice<D>,
        horizon: f64,
        rng: &mut impl Rng,
    ) -> Result<Trajectory<D>> {
        if !lattice.contains(&start) {
            return Err(KmcError::OutOfRange(format!(
                "start site {start:?} outside extents {:?}",
                lattice.extents()
            )));
        }
        if !horizon.is_finite() {
            return Err(KmcError::Domain(format!("horizon must be finite, got {horizon}")));
        }

        let mut traj = Trajectory::starting_at(start);
        let mut current = start;
        let mut t = 0.0;
        while t < horizon {
            let jump = self.step(&current, lattice, rng)?;
            current = jump.site;
            let next_t = (t + jump.waiting_time).min(horizon);
            if next_t == t {
                // wait below float resolution at t: the hop lands at the same instant
                let last = traj.states.len() - 1;
                traj.states[last] = current;
                continue;
            }
            t = next_t;
            traj.states.push(current);
            traj.times.push(t);
        }
        trace!(jumps = traj.num_jumps(), horizon, "trajectory finished");
        Ok(traj)
    }
}

/// One-shot [`KmcEngine::step`] with fresh scratch buffers.
pub fn step<const D: usize>(
    site: &Coordinate<D>,
    lattice: &Lattice<D>,
    rng: &mut impl Rng,
) -> Result<Jump<D>> {
    KmcEngine::new().step(site, lattice, rng)
}

/// One-shot [`KmcEngine::run`] with fresh scratch buffers.
pub fn run<const D: usize>(
    start: Coordinate<D>,
    lattice: &Lattice<D>,
    horizon: f64,
    rng: &mut impl Rng,
) -> Result<Trajectory<D>> {
    KmcEngine::new().run(start, lattice, horizon, rng)
}
