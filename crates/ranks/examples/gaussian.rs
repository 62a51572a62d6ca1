//! Simulation-based calibration of a conjugate Gaussian posterior.
//!
//! The prior is θ ~ N(0, 1) per dimension and each observation is
//! x ~ N(θ, σ²), so the exact posterior is known. Each mode distorts that
//! posterior in a different way and prints the resulting calibration checks.
//!
//! # Usage
//!
//! ```text
//! cargo run --example gaussian -- calibrated
//! cargo run --example gaussian -- biased
//! RUST_LOG=debug cargo run --example gaussian -- overdispersed
//! ```
//!
//! # Modes
//!
//! - **calibrated** — Samples the exact posterior. Every check should pass.
//! - **biased** — Shifts the posterior up by one standard deviation. Ranks pile
//!   up near zero.
//! - **overdispersed** — Doubles the posterior spread. Ranks bunch up in the
//!   middle.

use std::error::Error;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, NormalError};
use sbc_core::{Marginals, PosteriorSampler, Simulations};
use sbc_ranks::{
    check::check_sbc,
    run::{Config, run_unobserved},
};
use tracing_subscriber::EnvFilter;

const TRIALS: usize = 1000;
const DIM: usize = 2;
const NOISE_SD: f64 = 0.5;
const ALPHA: f64 = 0.01;

struct Observation {
    values: Vec<f64>,
    seed: u64,
}

struct Posterior {
    shift: f64,
    spread: f64,
}

impl PosteriorSampler for Posterior {
    type Observation = Observation;
    type Error = NormalError;

    fn sample(&self, x: &Observation, count: usize) -> Result<Vec<Vec<f64>>, NormalError> {
        let var = NOISE_SD * NOISE_SD;
        let sd = (var / (1.0 + var)).sqrt();
        let mut rng = StdRng::seed_from_u64(x.seed);

        let dists = x
            .values
            .iter()
            .map(|v| Normal::new(v / (1.0 + var) + self.shift * sd, sd * self.spread))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..count)
            .map(|_| dists.iter().map(|d| d.sample(&mut rng)).collect())
            .collect())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "calibrated".into());
    let posterior = match mode.as_str() {
        "calibrated" => Posterior {
            shift: 0.0,
            spread: 1.0,
        },
        "biased" => Posterior {
            shift: 1.0,
            spread: 1.0,
        },
        "overdispersed" => Posterior {
            shift: 0.0,
            spread: 2.0,
        },
        other => {
            eprintln!("Unknown mode: {other}");
            eprintln!("Usage: gaussian [calibrated|biased|overdispersed]");
            std::process::exit(1);
        }
    };

    let simulations = simulate(42)?;
    let config = Config::with_samples(199)?;
    let solution = run_unobserved(&posterior, &simulations, &Marginals, &config)?;
    let report = check_sbc(&simulations, &solution, 20)?;

    println!("mode: {mode}");
    println!("mean ranks: {:?}", solution.ranks.mean_ranks());
    for (d, (ks, chi)) in report.ks.iter().zip(&report.chi_square).enumerate() {
        println!(
            "θ[{d}]  KS p = {:.4}  χ² p = {:.4}  DAP p = {:.4}",
            ks.p_value, chi.p_value, report.dap[d].p_value
        );
    }
    if report.passes(ALPHA) {
        println!("no evidence of miscalibration at α = {ALPHA}");
    } else {
        println!("miscalibrated dimensions: {:?}", report.rejected_dims(ALPHA));
    }

    Ok(())
}

fn simulate(seed: u64) -> Result<Simulations<Observation>, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let prior = Normal::new(0.0, 1.0)?;
    let noise = Normal::new(0.0, NOISE_SD)?;

    let thetas: Vec<Vec<f64>> = (0..TRIALS)
        .map(|_| (0..DIM).map(|_| prior.sample(&mut rng)).collect())
        .collect();
    let observations = thetas
        .iter()
        .map(|theta| Observation {
            values: theta.iter().map(|t| t + noise.sample(&mut rng)).collect(),
            seed: rng.r#gen(),
        })
        .collect();

    Ok(Simulations::new(thetas, observations)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_spread_is_an_error() {
        let posterior = Posterior {
            shift: 0.0,
            spread: -1.0,
        };
        let x = Observation {
            values: vec![0.3, -0.2],
            seed: 1,
        };
        assert_eq!(posterior.sample(&x, 10), Err(NormalError::BadVariance));
    }
}
