use thiserror::Error;

/// Validated pairs of prior samples and the observations simulated from them.
///
/// Each trial pairs a prior sample `theta[i]` (the ground truth) with the
/// observation `x[i]` the simulator produced from it. Construction checks the
/// pairing up front so that a run never starts on malformed input.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulations<X> {
    thetas: Vec<Vec<f64>>,
    observations: Vec<X>,
    dim: usize,
}

/// Errors that can occur when validating simulations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationsError {
    #[error("number of prior samples ({thetas}) must match number of observations ({observations})")]
    LengthMismatch { thetas: usize, observations: usize },

    #[error("at least one trial is required")]
    Empty,

    #[error("prior samples must have at least one dimension")]
    ZeroDimension,

    #[error("prior sample {trial} has {found} dimensions, expected {expected}")]
    Ragged {
        trial: usize,
        expected: usize,
        found: usize,
    },

    #[error("prior sample {trial} contains a non-finite value")]
    NonFinite { trial: usize },
}

impl<X> Simulations<X> {
    /// Pairs prior samples with their observations.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequences differ in length, are empty, if the
    /// prior samples are zero-dimensional or differ in dimension, or if any
    /// prior sample contains NaN or an infinity.
    pub fn new(thetas: Vec<Vec<f64>>, observations: Vec<X>) -> Result<Self, SimulationsError> {
        if thetas.len() != observations.len() {
            return Err(SimulationsError::LengthMismatch {
                thetas: thetas.len(),
                observations: observations.len(),
            });
        }

        let dim = thetas.first().ok_or(SimulationsError::Empty)?.len();
        if dim == 0 {
            return Err(SimulationsError::ZeroDimension);
        }

        for (trial, theta) in thetas.iter().enumerate() {
            if theta.len() != dim {
                return Err(SimulationsError::Ragged {
                    trial,
                    expected: dim,
                    found: theta.len(),
                });
            }
            if !theta.iter().all(|v| v.is_finite()) {
                return Err(SimulationsError::NonFinite { trial });
            }
        }

        Ok(Self {
            thetas,
            observations,
            dim,
        })
    }

    /// Returns the number of trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thetas.len()
    }

    /// Always `false`; construction rejects empty simulations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thetas.is_empty()
    }

    /// Returns the parameter dimension shared by every prior sample.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the prior sample of a trial.
    ///
    /// # Panics
    ///
    /// Panics if `trial` is out of bounds.
    #[must_use]
    pub fn theta(&self, trial: usize) -> &[f64] {
        &self.thetas[trial]
    }

    /// Returns the observation of a trial.
    ///
    /// # Panics
    ///
    /// Panics if `trial` is out of bounds.
    #[must_use]
    pub fn observation(&self, trial: usize) -> &X {
        &self.observations[trial]
    }

    /// Returns all prior samples, in trial order.
    #[must_use]
    pub fn thetas(&self) -> &[Vec<f64>] {
        &self.thetas
    }

    /// Returns all observations, in trial order.
    #[must_use]
    pub fn observations(&self) -> &[X] {
        &self.observations
    }

    /// Consumes the simulations and returns the underlying vectors.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<X>) {
        (self.thetas, self.observations)
    }
}
