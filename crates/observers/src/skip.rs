//! Skip-and-warn failure policy.

use sbc_core::Observer;
use tracing::warn;

use crate::traits::{CanSkipTrial, CanStopEarly, HasTrial};

/// Skips trials whose posterior sampling failed instead of failing the run.
///
/// Each failure is logged with `tracing::warn!`. With a failure budget, the
/// run is stopped early once more than `max_failures` trials have failed.
/// Ranked trials are left alone.
#[derive(Debug, Clone, Default)]
pub struct SkipFailures {
    max_failures: Option<usize>,
    failures: Vec<usize>,
}

impl SkipFailures {
    /// Creates a policy that skips every failed trial.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that skips up to `max_failures` failed trials, then
    /// stops the run on the next failure.
    #[must_use]
    pub fn with_budget(max_failures: usize) -> Self {
        Self {
            max_failures: Some(max_failures),
            failures: Vec::new(),
        }
    }

    /// Returns the indices of the failed trials seen so far, including the
    /// one that exhausted the budget.
    #[must_use]
    pub fn failures(&self) -> &[usize] {
        &self.failures
    }

    fn over_budget(&self) -> bool {
        self.max_failures
            .is_some_and(|max| self.failures.len() > max)
    }
}

impl<E, A> Observer<E, A> for SkipFailures
where
    E: HasTrial,
    A: CanSkipTrial + CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        if !event.is_failure() {
            return None;
        }

        let trial = event.trial();
        self.failures.push(trial);

        if self.over_budget() {
            warn!(
                trial,
                failures = self.failures.len(),
                "failure budget exhausted; stopping run"
            );
            return Some(A::stop_early());
        }

        warn!(trial, failures = self.failures.len(), "skipping failed trial");
        Some(A::skip_trial())
    }
}

/// Allows `&mut SkipFailures` to be passed to runs that take an observer by
/// value, so the failures can be inspected after the run completes.
impl<E, A> Observer<E, A> for &mut SkipFailures
where
    E: HasTrial,
    A: CanSkipTrial + CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (*self).observe(event)
    }
}
