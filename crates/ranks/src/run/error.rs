use std::error::Error as StdError;

/// Errors that can occur during a calibration run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sampling failed for trial {trial}: {source}")]
    Sampling {
        trial: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("trial {trial}: sampler returned {found} samples, expected {expected}")]
    SampleCount {
        trial: usize,
        expected: usize,
        found: usize,
    },

    #[error("trial {trial}: posterior sample has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        trial: usize,
        expected: usize,
        found: usize,
    },

    #[error("batch starting at trial {start}: sampler returned {found} results, expected {expected}")]
    BatchLength {
        start: usize,
        expected: usize,
        found: usize,
    },

    #[error("reduction produces no statistics to rank")]
    EmptyReduction,
}

impl Error {
    pub(crate) fn sampling<E: StdError + Send + Sync + 'static>(trial: usize, err: E) -> Self {
        Self::Sampling {
            trial,
            source: Box::new(err),
        }
    }

    /// Returns the trial the error is attributed to, if any.
    #[must_use]
    pub fn trial(&self) -> Option<usize> {
        match self {
            Self::Sampling { trial, .. }
            | Self::SampleCount { trial, .. }
            | Self::DimensionMismatch { trial, .. } => Some(*trial),
            Self::BatchLength { start, .. } => Some(*start),
            Self::EmptyReduction => None,
        }
    }
}
