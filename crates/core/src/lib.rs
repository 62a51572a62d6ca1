//! Core traits and types for simulation-based calibration (SBC).
//!
//! This crate defines the shared abstractions that the rank computator,
//! observers, and visualizer build on:
//!
//! - [`PosteriorSampler`] — draws parameter samples conditioned on an observation
//! - [`Reduction`] — maps a parameter vector to the statistics that get ranked
//! - [`Observer`] — receives run events and optionally returns control actions
//! - [`Simulations`] — validated pairs of prior samples and observations
//! - [`RankCollection`] — the N × D rank matrix produced by a run

mod observer;
mod ranks;
mod reduction;
mod sampler;
mod simulations;

pub use observer::Observer;
pub use ranks::RankCollection;
pub use reduction::{Marginals, Reduction, ScalarFn, reduce_fn};
pub use sampler::PosteriorSampler;
pub use simulations::{Simulations, SimulationsError};
