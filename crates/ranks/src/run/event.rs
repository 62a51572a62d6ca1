use sbc_core::PosteriorSampler;

/// Events emitted by a calibration run, one per trial, in trial order.
pub enum Event<'a, S>
where
    S: PosteriorSampler,
{
    /// The trial's posterior samples were drawn and ranked.
    Ranked {
        /// Index of the simulation trial.
        trial: usize,

        /// The trial's ranks, one per reduced dimension.
        ranks: &'a [usize],
    },

    /// The sampler failed for this trial's observation.
    ///
    /// Returning [`Action::SkipTrial`] skips the trial; returning nothing
    /// fails the run with [`Error::Sampling`].
    ///
    /// [`Action::SkipTrial`]: super::Action::SkipTrial
    /// [`Error::Sampling`]: super::Error::Sampling
    SamplingFailed {
        /// Index of the simulation trial.
        trial: usize,

        /// The sampler error.
        error: &'a S::Error,
    },
}

impl<S: PosteriorSampler> Event<'_, S> {
    /// Returns the index of the trial this event reports on.
    #[must_use]
    pub fn trial(&self) -> usize {
        match self {
            Self::Ranked { trial, .. } | Self::SamplingFailed { trial, .. } => *trial,
        }
    }

    /// Returns the ranks if the trial was ranked.
    #[must_use]
    pub fn ranks(&self) -> Option<&[usize]> {
        match self {
            Self::Ranked { ranks, .. } => Some(*ranks),
            Self::SamplingFailed { .. } => None,
        }
    }
}
