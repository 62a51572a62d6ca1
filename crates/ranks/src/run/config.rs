use thiserror::Error;

/// Rank histograms built from fewer posterior samples than this are coarse
/// enough that a run logs a warning.
pub const RECOMMENDED_MIN_SAMPLES: usize = 100;

/// How trials are handed to the posterior sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Sample one observation at a time.
    #[default]
    Sequential,

    /// Sample `batch_size` observations per call to
    /// [`PosteriorSampler::sample_batched`].
    ///
    /// [`PosteriorSampler::sample_batched`]: sbc_core::PosteriorSampler::sample_batched
    Batched { batch_size: usize },
}

/// Configuration for a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    num_posterior_samples: usize,
    strategy: Strategy,
}

/// Errors that can occur when validating a run config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("num_posterior_samples must be at least 1")]
    ZeroSamples,

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1000, Strategy::Sequential).unwrap()
    }
}

impl Config {
    /// Creates a new config.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_posterior_samples` is zero or a batched
    /// strategy has a zero batch size.
    pub fn new(num_posterior_samples: usize, strategy: Strategy) -> Result<Self, ConfigError> {
        if num_posterior_samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if let Strategy::Batched { batch_size: 0 } = strategy {
            return Err(ConfigError::ZeroBatchSize);
        }

        Ok(Self {
            num_posterior_samples,
            strategy,
        })
    }

    /// Creates a sequential config drawing `num_posterior_samples` per trial.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_posterior_samples` is zero.
    pub fn with_samples(num_posterior_samples: usize) -> Result<Self, ConfigError> {
        Self::new(num_posterior_samples, Strategy::Sequential)
    }

    /// Returns the number of posterior samples drawn per trial.
    #[must_use]
    pub fn num_posterior_samples(&self) -> usize {
        self.num_posterior_samples
    }

    /// Returns the sampling strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns `true` if the sample count is below [`RECOMMENDED_MIN_SAMPLES`].
    #[must_use]
    pub fn is_undersampled(&self) -> bool {
        self.num_posterior_samples < RECOMMENDED_MIN_SAMPLES
    }
}
