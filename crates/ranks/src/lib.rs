//! Rank computation and calibration checks for simulation-based calibration.
//!
//! # Modules
//!
//! - [`run`] — ranks ground-truth parameters within posterior samples, one
//!   trial per simulated (parameter, observation) pair
//! - [`check`] — uniformity tests on the resulting ranks and a comparison of
//!   data-averaged posterior samples against the prior
//!
//! # Features
//!
//! - `parallel` — Enables [`run::run_parallel`], which samples trials on the
//!   rayon thread pool.

pub mod check;
pub mod run;
