use thiserror::Error;

/// Errors that can occur when building a rank plot.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlotError {
    #[error("no ranked trials to plot")]
    Empty,

    #[error("num_bins ({num_bins}) exceeds the number of distinct ranks ({max})")]
    TooManyBins { num_bins: usize, max: usize },

    #[error("got {found} labels for {expected} ranked dimensions")]
    LabelCount { expected: usize, found: usize },
}
