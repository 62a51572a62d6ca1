//! Reusable observers for simulation-based calibration runs.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with the rank computation in `sbc-ranks`.
//!
//! # Modules
//!
//! - [`traits`] — Capability traits for reusable observers
//!   ([`HasTrial`], [`CanStopEarly`], [`CanSkipTrial`])
//!
//! # Observers
//!
//! - [`ProgressLog`] — logs progress every k trials
//! - [`SkipFailures`] — skips failed trials with a warning, optionally
//!   stopping once a failure budget is spent
//!
//! [`Observer`]: sbc_core::Observer
//! [`HasTrial`]: traits::HasTrial
//! [`CanStopEarly`]: traits::CanStopEarly
//! [`CanSkipTrial`]: traits::CanSkipTrial

pub mod traits;

mod progress;
mod skip;

pub use progress::ProgressLog;
pub use skip::SkipFailures;

#[cfg(test)]
mod tests {
    use sbc_core::PosteriorSampler;
    use thiserror::Error;

    use crate::traits::HasTrial;

    /// A ranked trial.
    pub(crate) struct Ranked(pub(crate) usize);

    /// A failed trial.
    pub(crate) struct Failed(pub(crate) usize);

    impl HasTrial for Ranked {
        fn trial(&self) -> usize {
            self.0
        }

        fn ranks(&self) -> Option<&[usize]> {
            Some(&[])
        }
    }

    impl HasTrial for Failed {
        fn trial(&self) -> usize {
            self.0
        }

        fn ranks(&self) -> Option<&[usize]> {
            None
        }
    }

    #[derive(Debug, Error)]
    #[error("sampler unavailable")]
    pub(crate) struct Unavailable;

    /// Draws `0, 1, …, count - 1`, failing on the listed observations.
    pub(crate) struct FailsOn(pub(crate) Vec<usize>);

    impl PosteriorSampler for FailsOn {
        type Observation = usize;
        type Error = Unavailable;

        fn sample(&self, x: &usize, count: usize) -> Result<Vec<Vec<f64>>, Unavailable> {
            if self.0.contains(x) {
                return Err(Unavailable);
            }
            Ok((0..count).map(|i| vec![i as f64]).collect())
        }
    }
}
