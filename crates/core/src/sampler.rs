/// A posterior approximation that can be sampled conditioned on an observation.
///
/// Any inference backend (a fitted neural posterior, an MCMC chain, an
/// analytical conjugate posterior) can implement this trait. Each returned
/// sample is a parameter vector with the same dimension as the prior samples.
pub trait PosteriorSampler {
    /// The observation type the posterior is conditioned on.
    type Observation;

    /// The error returned when sampling fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Draws `count` parameter vectors conditioned on `observation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot produce samples for this
    /// observation.
    fn sample(
        &self,
        observation: &Self::Observation,
        count: usize,
    ) -> Result<Vec<Vec<f64>>, Self::Error>;

    /// Draws `count` parameter vectors for each observation in a batch.
    ///
    /// The default implementation calls [`sample`][Self::sample] once per
    /// observation. Backends that can condition on many observations at once
    /// should override it; the result must hold one entry per observation, in
    /// order, so failures stay attributable to their trial.
    fn sample_batched(
        &self,
        observations: &[Self::Observation],
        count: usize,
    ) -> Vec<Result<Vec<Vec<f64>>, Self::Error>> {
        observations
            .iter()
            .map(|observation| self.sample(observation, count))
            .collect()
    }
}

impl<S: PosteriorSampler + ?Sized> PosteriorSampler for &S {
    type Observation = S::Observation;
    type Error = S::Error;

    fn sample(
        &self,
        observation: &Self::Observation,
        count: usize,
    ) -> Result<Vec<Vec<f64>>, Self::Error> {
        (**self).sample(observation, count)
    }

    fn sample_batched(
        &self,
        observations: &[Self::Observation],
        count: usize,
    ) -> Vec<Result<Vec<Vec<f64>>, Self::Error>> {
        (**self).sample_batched(observations, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("negative observation")]
    struct Negative;

    /// Returns `count` copies of the observation, failing for negative values.
    struct Echo;

    impl PosteriorSampler for Echo {
        type Observation = f64;
        type Error = Negative;

        fn sample(&self, observation: &f64, count: usize) -> Result<Vec<Vec<f64>>, Negative> {
            if *observation < 0.0 {
                return Err(Negative);
            }
            Ok(vec![vec![*observation]; count])
        }
    }

    #[test]
    fn default_batched_sampling_keeps_order_and_failures() {
        let results = Echo.sample_batched(&[1.0, -1.0, 2.0], 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &vec![vec![1.0]; 3]);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap(), &vec![vec![2.0]; 3]);
    }

    #[test]
    fn references_are_samplers() {
        let sampler = &Echo;
        assert_eq!(sampler.sample(&4.0, 2).unwrap(), vec![vec![4.0]; 2]);
    }
}
