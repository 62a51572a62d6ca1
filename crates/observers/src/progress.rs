//! Progress logging for long calibration runs.

use sbc_core::Observer;
use tracing::info;

use crate::traits::HasTrial;

/// Logs run progress with `tracing::info!` every `every` trials.
///
/// Never returns an action, so it can be combined with other policies by
/// calling it from a closure.
///
/// # Example
///
/// ```ignore
/// let mut progress = ProgressLog::new(100);
/// run::run(&sampler, &sims, &Marginals, &config, &mut progress)?;
/// ```
#[derive(Debug, Clone)]
pub struct ProgressLog {
    every: usize,
    seen: usize,
    failed: usize,
}

impl ProgressLog {
    /// Creates an observer that logs after every `every` trials.
    ///
    /// An interval of zero is treated as one.
    #[must_use]
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
            failed: 0,
        }
    }

    /// Returns the number of trials observed so far.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Returns the number of failed trials observed so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl<E: HasTrial, A> Observer<E, A> for ProgressLog {
    fn observe(&mut self, event: &E) -> Option<A> {
        self.seen += 1;
        if event.is_failure() {
            self.failed += 1;
        }
        if self.seen % self.every == 0 {
            info!(
                trial = event.trial(),
                seen = self.seen,
                failed = self.failed,
                "calibration progress"
            );
        }
        None
    }
}

/// Allows `&mut ProgressLog` to be passed to runs that take an observer by
/// value, so the counts can be read after the run completes.
impl<E: HasTrial, A> Observer<E, A> for &mut ProgressLog {
    fn observe(&mut self, event: &E) -> Option<A> {
        (*self).observe(event)
    }
}
