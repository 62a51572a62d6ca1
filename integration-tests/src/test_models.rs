use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use sbc_core::{PosteriorSampler, Simulations};
use thiserror::Error;

/// Standard deviation of the measurement noise.
pub const NOISE_SD: f64 = 0.5;

/// A noisy measurement of θ, with the seed used to sample its posterior.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub values: Vec<f64>,
    pub seed: u64,
}

/// Simulates `trials` draws of θ ~ N(0, I) and x ~ N(θ, σ²I).
///
/// # Panics
///
/// Panics if `trials` or `dim` is zero.
#[must_use]
pub fn simulate(trials: usize, dim: usize, seed: u64) -> Simulations<Measurement> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_SD).expect("valid noise");

    let thetas: Vec<Vec<f64>> = (0..trials)
        .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
        .collect();
    let observations = thetas
        .iter()
        .map(|theta| Measurement {
            values: theta.iter().map(|t| t + noise.sample(&mut rng)).collect(),
            seed: rng.r#gen(),
        })
        .collect();

    Simulations::new(thetas, observations).expect("valid simulations")
}

/// Posterior sampler for the conjugate Gaussian model.
///
/// The exact posterior of each θ component is
/// N(x / (1 + σ²), σ² / (1 + σ²)). `shift` moves it and `spread` scales it,
/// both in units of the exact posterior standard deviation.
#[derive(Debug, Clone)]
pub struct Posterior {
    pub shift: f64,
    pub spread: f64,

    /// Fail on every trial whose measurement seed is divisible by this.
    pub fail_every: Option<u64>,

    /// Fail on every trial whose first measured value exceeds this.
    pub fail_above: Option<f64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("posterior sampling diverged for seed {0}")]
pub struct Diverged(pub u64);

impl Posterior {
    #[must_use]
    pub fn exact() -> Self {
        Self {
            shift: 0.0,
            spread: 1.0,
            fail_every: None,
            fail_above: None,
        }
    }

    #[must_use]
    pub fn shifted(shift: f64) -> Self {
        Self {
            shift,
            ..Self::exact()
        }
    }

    #[must_use]
    pub fn scaled(spread: f64) -> Self {
        Self {
            spread,
            ..Self::exact()
        }
    }

    #[must_use]
    pub fn failing_every(self, every: u64) -> Self {
        Self {
            fail_every: Some(every),
            ..self
        }
    }

    #[must_use]
    pub fn failing_above(self, threshold: f64) -> Self {
        Self {
            fail_above: Some(threshold),
            ..self
        }
    }

    /// Returns `true` if sampling fails for this measurement.
    #[must_use]
    pub fn fails_on(&self, x: &Measurement) -> bool {
        self.fail_every.is_some_and(|every| x.seed % every == 0)
            || self.fail_above.is_some_and(|threshold| x.values[0] > threshold)
    }
}

impl PosteriorSampler for Posterior {
    type Observation = Measurement;
    type Error = Diverged;

    fn sample(&self, x: &Measurement, count: usize) -> Result<Vec<Vec<f64>>, Diverged> {
        if self.fails_on(x) {
            return Err(Diverged(x.seed));
        }

        let var = NOISE_SD * NOISE_SD;
        let sd = (var / (1.0 + var)).sqrt();
        let mut rng = StdRng::seed_from_u64(x.seed);

        Ok((0..count)
            .map(|_| {
                x.values
                    .iter()
                    .map(|v| {
                        let z: f64 = rng.sample(StandardNormal);
                        v / (1.0 + var) + sd * (self.shift + self.spread * z)
                    })
                    .collect()
            })
            .collect())
    }
}
