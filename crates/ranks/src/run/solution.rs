use sbc_core::RankCollection;

/// Indicates how the run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every trial was either ranked or skipped.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of a calibration run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// How the run terminated.
    pub status: Status,

    /// Ranks of every trial that was ranked, in trial order.
    pub ranks: RankCollection,

    /// One unreduced posterior sample per ranked trial, aligned with the rows
    /// of `ranks`.
    ///
    /// Pooled across trials these are draws from the data-averaged posterior,
    /// which matches the prior when the posterior is calibrated.
    pub dap_samples: Vec<Vec<f64>>,

    /// Indices of trials the observer chose to skip.
    pub skipped: Vec<usize>,
}
