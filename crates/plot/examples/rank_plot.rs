//! Interactive rank plots for a Gaussian posterior.
//!
//! Runs a calibration on the conjugate model θ ~ N(0, 1), x ~ N(θ, 0.5²) and
//! opens a window with the rank plot of each parameter.
//!
//! # Usage
//!
//! ```text
//! cargo run --example rank_plot --features show -- hist
//! cargo run --example rank_plot --features show -- ecdf
//! cargo run --example rank_plot --features show -- ecdf 0.5
//! ```
//!
//! The optional second argument shifts the sampled posterior by that many
//! posterior standard deviations. Try `0.5` or `-1` to see ranks pile up at
//! one end and leave the band.

use std::{convert::Infallible, error::Error};

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use sbc_core::{Marginals, PosteriorSampler, Simulations};
use sbc_plot::{PlotConfig, ShowConfig, sbc_rank_plot};
use sbc_ranks::run::{Config, run_unobserved};
use tracing_subscriber::EnvFilter;

const NOISE_SD: f64 = 0.5;

struct Observation {
    values: Vec<f64>,
    seed: u64,
}

struct Shifted(f64);

impl PosteriorSampler for Shifted {
    type Observation = Observation;
    type Error = Infallible;

    fn sample(&self, x: &Observation, count: usize) -> Result<Vec<Vec<f64>>, Infallible> {
        let var = NOISE_SD * NOISE_SD;
        let sd = (var / (1.0 + var)).sqrt();
        let mut rng = StdRng::seed_from_u64(x.seed);

        Ok((0..count)
            .map(|_| {
                x.values
                    .iter()
                    .map(|v| v / (1.0 + var) + sd * (self.0 + rng.sample::<f64, _>(StandardNormal)))
                    .collect()
            })
            .collect())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "hist".into());
    let shift = args
        .next()
        .as_deref()
        .map(str::parse::<f64>)
        .transpose()
        .unwrap_or_else(|_| {
            eprintln!("Invalid shift, expected a number, e.g. 0.5");
            std::process::exit(1);
        })
        .unwrap_or(0.0);

    let config = match mode.as_str() {
        "hist" => PlotConfig::default(),
        "ecdf" => PlotConfig::ecdf(),
        other => {
            eprintln!("Unknown mode: {other}");
            eprintln!("Usage: rank_plot [hist|ecdf] [shift]");
            std::process::exit(1);
        }
    }
    .with_labels(["θ₀", "θ₁"]);

    let simulations = simulate(500, 7)?;
    let solution = run_unobserved(
        &Shifted(shift),
        &simulations,
        &Marginals,
        &Config::with_samples(99)?,
    )?;
    let plot = sbc_rank_plot(&solution.ranks, &config)?;

    for panel in &plot.panels {
        println!(
            "{}: {} of {} outside the band",
            panel.label,
            panel.outside_band().len(),
            match &panel.data {
                sbc_plot::PanelData::Histogram(bins) => bins.len(),
                sbc_plot::PanelData::Ecdf(points) => points.len(),
            }
        );
    }

    plot.show(
        ShowConfig::new()
            .title(format!("SBC ranks (shift = {shift})"))
            .legend(),
    )?;

    Ok(())
}

fn simulate(trials: usize, seed: u64) -> Result<Simulations<Observation>, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let prior = Normal::new(0.0, 1.0)?;
    let noise = Normal::new(0.0, NOISE_SD)?;

    let thetas: Vec<Vec<f64>> = (0..trials)
        .map(|_| vec![prior.sample(&mut rng), prior.sample(&mut rng)])
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
