//! Capability traits for reusable run observers.
//!
//! These traits abstract over run-specific event and action types, so an
//! observer can be written once and used with any run that supports the
//! capabilities it needs.
//!
//! # Event traits
//!
//! - [`HasTrial`] — events that belong to a simulation trial
//!
//! # Action traits
//!
//! - [`CanStopEarly`] — actions that can halt the run
//! - [`CanSkipTrial`] — actions that can leave a trial out of the results
//!
//! # Example
//!
//! ```rust
//! use sbc_core::Observer;
//! use sbc_observers::traits::{CanStopEarly, HasTrial};
//!
//! struct FirstN(usize);
//!
//! impl<E: HasTrial, A: CanStopEarly> Observer<E, A> for FirstN {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.trial() + 1 >= self.0).then(A::stop_early)
//!     }
//! }
//! ```

use sbc_core::PosteriorSampler;
use sbc_ranks::run;

/// An event that belongs to a single simulation trial.
pub trait HasTrial {
    /// Returns the index of the trial in the simulations.
    fn trial(&self) -> usize;

    /// Returns the trial's ranks, or `None` if the trial failed.
    fn ranks(&self) -> Option<&[usize]>;

    /// Returns `true` if the event reports a failed trial.
    fn is_failure(&self) -> bool {
        self.ranks().is_none()
    }
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the run early.
    fn stop_early() -> Self;
}

/// An action type that can leave a trial out of the results.
pub trait CanSkipTrial {
    /// Returns the action that skips the current trial.
    fn skip_trial() -> Self;
}

// --- HasTrial for run::Event ---

impl<S: PosteriorSampler> HasTrial for run::Event<'_, S> {
    fn trial(&self) -> usize {
        run::Event::trial(self)
    }

    fn ranks(&self) -> Option<&[usize]> {
        run::Event::ranks(self)
    }
}

// --- Action impls ---

impl CanStopEarly for run::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

impl CanSkipTrial for run::Action {
    fn skip_trial() -> Self {
        Self::SkipTrial
    }
}
