//! Rank computation for simulation-based calibration.
//!
//! # Algorithm
//!
//! For each trial `i` with prior sample `θᵢ` and observation `xᵢ`:
//!
//! 1. Draw `M` samples from the posterior conditioned on `xᵢ`.
//! 2. Apply the reduction to `θᵢ` and to every posterior sample.
//! 3. For each reduced dimension, count the samples strictly below the truth.
//!
//! Under a calibrated posterior the counts are uniform on `0..=M`. Ties and
//! NaN samples never count as below (see [`rank_of`]).
//!
//! # Observer Events
//!
//! The run emits one [`Event`] per trial, always in trial order:
//!
//! - [`Event::Ranked`] — the trial was ranked
//! - [`Event::SamplingFailed`] — the sampler returned an error
//!
//! Observers can return [`Action::StopEarly`] to halt immediately, or
//! [`Action::SkipTrial`] to leave the trial out. A sampling failure with no
//! action fails the run with the trial index attached.
//!
//! Sample count and dimension mismatches are always fatal; the observer is
//! not consulted.

mod action;
mod config;
mod error;
mod event;
mod rank;
mod solution;


pub use action::Action;
pub use config::{Config, ConfigError, RECOMMENDED_MIN_SAMPLES, Strategy};
pub use error::Error;
pub use event::Event;
pub use rank::rank_of;
pub use solution::{Solution, Status};

use sbc_core::{Observer, PosteriorSampler, RankCollection, Reduction, Simulations};
use tracing::{debug, info, warn};

use rank::{TrialRanks, rank_trial};

/// Computes the rank of every trial's true parameter within its posterior.
///
/// The observer receives an [`Event`] for each trial.
/// See the [module docs](self) for details on event timing and observer actions.
///
/// # Errors
///
/// Returns an error if the sampler fails and the observer does not skip the
/// trial or stop, if the sampler returns the wrong number of samples or
/// samples of the wrong dimension, or if the reduction produces nothing.
pub fn run<S, R, Obs>(
    sampler: &S,
    simulations: &Simulations<S::Observation>,
    reduction: &R,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    S: PosteriorSampler,
    R: Reduction<S::Observation>,
    Obs: for<'a> Observer<Event<'a, S>, Action>,
{
    let mut state = RunState::<S, Obs>::start(simulations, reduction, config, observer)?;
    let m = config.num_posterior_samples();

    match config.strategy() {
        Strategy::Sequential => {
            for trial in 0..simulations.len() {
                let sampled = sampler.sample(simulations.observation(trial), m);
                let outcome = evaluate(simulations, reduction, m, trial, sampled)?;
                if state.record(trial, outcome)? {
                    return Ok(state.finish(Status::StoppedByObserver));
                }
            }
        }
        Strategy::Batched { batch_size } => {
            for start in (0..simulations.len()).step_by(batch_size) {
                let end = (start + batch_size).min(simulations.len());
                let batch = sampler.sample_batched(&simulations.observations()[start..end], m);
                if batch.len() != end - start {
                    return Err(Error::BatchLength {
                        start,
                        expected: end - start,
                        found: batch.len(),
                    });
                }
                for (trial, sampled) in (start..end).zip(batch) {
                    let outcome = evaluate(simulations, reduction, m, trial, sampled)?;
                    if state.record(trial, outcome)? {
                        return Ok(state.finish(Status::StoppedByObserver));
                    }
                }
            }
        }
    }

    Ok(state.finish(Status::Complete))
}

/// Computes ranks without observer support.
///
/// This is a convenience wrapper around [`run`] that uses a no-op observer,
/// so any sampling failure fails the run.
///
/// # Errors
///
/// Returns an error if sampling fails or the sampler output is malformed.
pub fn run_unobserved<S, R>(
    sampler: &S,
    simulations: &Simulations<S::Observation>,
    reduction: &R,
    config: &Config,
) -> Result<Solution, Error>
where
    S: PosteriorSampler,
    R: Reduction<S::Observation>,
{
    run(sampler, simulations, reduction, config, ())
}

/// Computes ranks with trials sampled concurrently on the rayon thread pool.
///
/// Trials are processed in chunks of `chunk_size`; within a chunk every trial
/// is sampled and ranked in parallel, then events are delivered to the
/// observer on the calling thread in trial order. The configured strategy is
/// ignored. Results match [`run`] for a deterministic sampler.
///
/// # Errors
///
/// Same as [`run`].
///
/// # Panics
///
/// Panics if `chunk_size` is zero.
#[cfg(feature = "parallel")]
pub fn run_parallel<S, R, Obs>(
    sampler: &S,
    simulations: &Simulations<S::Observation>,
    reduction: &R,
    config: &Config,
    chunk_size: usize,
    observer: Obs,
) -> Result<Solution, Error>
where
    S: PosteriorSampler + Sync,
    S::Observation: Sync,
    R: Reduction<S::Observation> + Sync,
    Obs: for<'a> Observer<Event<'a, S>, Action>,
{
    use rayon::prelude::*;

    assert!(chunk_size > 0, "chunk_size must be at least 1");

    let mut state = RunState::<S, Obs>::start(simulations, reduction, config, observer)?;
    let m = config.num_posterior_samples();

    for start in (0..simulations.len()).step_by(chunk_size) {
        let end = (start + chunk_size).min(simulations.len());
        let outcomes: Vec<_> = (start..end)
            .into_par_iter()
            .map(|trial| {
                let sampled = sampler.sample(simulations.observation(trial), m);
                evaluate(simulations, reduction, m, trial, sampled)
            })
            .collect();

        for (trial, outcome) in (start..end).zip(outcomes) {
            if state.record(trial, outcome?)? {
                return Ok(state.finish(Status::StoppedByObserver));
            }
        }
    }

    Ok(state.finish(Status::Complete))
}

/// What happened when a single trial was sampled and ranked.
enum Outcome<E> {
    Ranked(TrialRanks),
    Failed(E),
}

fn evaluate<X, R, E>(
    simulations: &Simulations<X>,
    reduction: &R,
    m: usize,
    trial: usize,
    sampled: Result<Vec<Vec<f64>>, E>,
) -> Result<Outcome<E>, Error>
where
    R: Reduction<X>,
{
    match sampled {
        Ok(samples) => rank_trial(
            trial,
            simulations.theta(trial),
            simulations.observation(trial),
            samples,
            m,
            reduction,
        )
        .map(Outcome::Ranked),
        Err(error) => Ok(Outcome::Failed(error)),
    }
}

/// Accumulates results and drives the observer.
struct RunState<S: PosteriorSampler, Obs> {
    ranks: RankCollection,
    dap_samples: Vec<Vec<f64>>,
    skipped: Vec<usize>,
    observer: Obs,
    _sampler: std::marker::PhantomData<fn(&S)>,
}

impl<S, Obs> RunState<S, Obs>
where
    S: PosteriorSampler,
    Obs: for<'a> Observer<Event<'a, S>, Action>,
{
    fn start<R: Reduction<S::Observation>>(
        simulations: &Simulations<S::Observation>,
        reduction: &R,
        config: &Config,
        observer: Obs,
    ) -> Result<Self, Error> {
        let dim = reduction.output_dim(simulations.dim());
        if dim == 0 {
            return Err(Error::EmptyReduction);
        }

        let m = config.num_posterior_samples();
        info!(
            trials = simulations.len(),
            param_dim = simulations.dim(),
            ranked_dim = dim,
            posterior_samples = m,
            strategy = ?config.strategy(),
            "starting calibration run"
        );
        if config.is_undersampled() {
            warn!(
                posterior_samples = m,
                recommended = RECOMMENDED_MIN_SAMPLES,
                "few posterior samples per trial; rank histograms will be coarse"
            );
        }

        Ok(Self {
            ranks: RankCollection::new(dim, m),
            dap_samples: Vec::with_capacity(simulations.len()),
            skipped: Vec::new(),
            observer,
            _sampler: std::marker::PhantomData,
        })
    }

    /// Reports a trial to the observer and records it.
    ///
    /// Returns `true` if the observer asked to stop.
    ///
    /// A sampling failure the observer neither skips nor stops on is returned
    /// as an error.
    fn record(&mut self, trial: usize, outcome: Outcome<S::Error>) -> Result<bool, Error> {
        match outcome {
            Outcome::Ranked(result) => {
                let event: Event<'_, S> = Event::Ranked {
                    trial,
                    ranks: &result.ranks,
                };
                let action = self.observer.observe(&event);
                match action {
                    Some(Action::StopEarly) => Ok(true),
                    Some(Action::SkipTrial) => {
                        debug!(trial, "observer discarded ranked trial");
                        self.skipped.push(trial);
                        Ok(false)
                    }
                    None => {
                        debug!(trial, ranks = ?result.ranks, "ranked trial");
                        self.ranks.push(trial, &result.ranks);
                        self.dap_samples.push(result.dap_sample);
                        Ok(false)
                    }
                }
            }
            Outcome::Failed(error) => {
                let event: Event<'_, S> = Event::SamplingFailed {
                    trial,
                    error: &error,
                };
                let action = self.observer.observe(&event);
                match action {
                    Some(Action::StopEarly) => Ok(true),
                    Some(Action::SkipTrial) => {
                        warn!(trial, %error, "posterior sampling failed; skipping trial");
                        self.skipped.push(trial);
                        Ok(false)
                    }
                    None => Err(Error::sampling(trial, error)),
                }
            }
        }
    }

    fn finish(self, status: Status) -> Solution {
        info!(
            ranked = self.ranks.len(),
            skipped = self.skipped.len(),
            ?status,
            "calibration run finished"
        );
        Solution {
            status,
            ranks: self.ranks,
            dap_samples: self.dap_samples,
            skipped: self.skipped,
        }
    }
}
