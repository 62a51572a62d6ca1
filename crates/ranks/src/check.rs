//! Calibration checks on the output of a run.
//!
//! - [`ks_uniformity`] — one-sample Kolmogorov–Smirnov test of each
//!   dimension's ranks against the discrete uniform distribution on `0..=M`
//! - [`chi_square_uniformity`] — Pearson chi-square test of binned ranks
//! - [`dap_ks`] — two-sample KS test between prior samples and data-averaged
//!   posterior samples, per parameter dimension
//! - [`check_sbc`] — all of the above bundled into a [`Report`]
//!
//! Small p-values are evidence of miscalibration. KS p-values use the
//! asymptotic Kolmogorov distribution, which is conservative for the discrete
//! rank distribution.

use sbc_core::{RankCollection, Simulations};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use thiserror::Error;

use crate::run::Solution;

/// Errors that can occur when checking calibration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("no ranked trials to check")]
    Empty,

    #[error("num_bins must be at least 2, got {0}")]
    TooFewBins(usize),

    #[error("num_bins ({num_bins}) exceeds the number of distinct ranks ({max})")]
    TooManyBins { num_bins: usize, max: usize },

    #[error("prior samples have {prior} dimensions but DAP samples have {dap}")]
    DimensionMismatch { prior: usize, dap: usize },

    #[error("{set} sample {row} has a non-finite value")]
    NonFinite { set: SampleSet, row: usize },
}

/// Which side of a two-sample comparison an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSet {
    Prior,
    Dap,
}

impl std::fmt::Display for SampleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Prior => "prior",
            Self::Dap => "DAP",
        })
    }
}

/// Result of a Kolmogorov–Smirnov test for one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsTest {
    /// Largest absolute difference between the two CDFs.
    pub statistic: f64,

    /// Asymptotic p-value.
    pub p_value: f64,
}

/// Result of a chi-square uniformity test for one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareTest {
    /// Pearson's chi-square statistic.
    pub statistic: f64,

    /// Degrees of freedom (number of bins minus one).
    pub dof: usize,

    /// Upper-tail p-value.
    pub p_value: f64,
}

/// All calibration checks for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// KS uniformity test per ranked dimension.
    pub ks: Vec<KsTest>,

    /// Chi-square uniformity test per ranked dimension.
    pub chi_square: Vec<ChiSquareTest>,

    /// Prior vs. DAP two-sample KS test per parameter dimension.
    pub dap: Vec<KsTest>,
}

impl Report {
    /// Returns `true` if no p-value falls below `alpha`.
    #[must_use]
    pub fn passes(&self, alpha: f64) -> bool {
        self.p_values().all(|p| p >= alpha)
    }

    /// Returns the ranked dimensions whose KS or chi-square test rejects
    /// uniformity at level `alpha`.
    #[must_use]
    pub fn rejected_dims(&self, alpha: f64) -> Vec<usize> {
        self.ks
            .iter()
            .zip(&self.chi_square)
            .enumerate()
            .filter(|(_, (ks, chi))| ks.p_value < alpha || chi.p_value < alpha)
            .map(|(d, _)| d)
            .collect()
    }

    fn p_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.ks
            .iter()
            .chain(&self.dap)
            .map(|t| t.p_value)
            .chain(self.chi_square.iter().map(|t| t.p_value))
    }
}

/// Runs every check on a finished run.
///
/// The DAP comparison uses the prior samples of the ranked trials only, so
/// skipped trials drop out of both sides.
///
/// # Errors
///
/// Returns an error if nothing was ranked, `num_bins` is invalid, or a DAP
/// sample is not finite.
pub fn check_sbc<X>(
    simulations: &Simulations<X>,
    solution: &Solution,
    num_bins: usize,
) -> Result<Report, Error> {
    let prior: Vec<Vec<f64>> = solution
        .ranks
        .trials()
        .iter()
        .map(|&trial| simulations.theta(trial).to_vec())
        .collect();

    Ok(Report {
        ks: ks_uniformity(&solution.ranks)?,
        chi_square: chi_square_uniformity(&solution.ranks, num_bins)?,
        dap: dap_ks(&prior, &solution.dap_samples)?,
    })
}

/// Tests each dimension's ranks against the discrete uniform on `0..=M`.
///
/// # Errors
///
/// Returns an error if the collection is empty.
pub fn ks_uniformity(ranks: &RankCollection) -> Result<Vec<KsTest>, Error> {
    if ranks.is_empty() {
        return Err(Error::Empty);
    }

    let values = ranks.num_posterior_samples() + 1;
    let n = ranks.len();

    Ok((0..ranks.dim())
        .map(|d| {
            let counts = ranks.histogram(d, values);
            let mut cumulative = 0;
            let mut statistic: f64 = 0.0;
            for (k, count) in counts.into_iter().enumerate() {
                cumulative += count;
                let empirical = cumulative as f64 / n as f64;
                let uniform = (k + 1) as f64 / values as f64;
                statistic = statistic.max((empirical - uniform).abs());
            }
            KsTest {
                statistic,
                p_value: kolmogorov_p_value(statistic, n as f64),
            }
        })
        .collect())
}

/// Tests each dimension's binned ranks against the expected uniform counts.
///
/// Bins follow [`RankCollection::bin_widths`], so the expected count of a
/// bin is proportional to the number of rank values it covers.
///
/// # Errors
///
/// Returns an error if the collection is empty, or `num_bins` is below 2 or
/// above `M + 1`.
pub fn chi_square_uniformity(
    ranks: &RankCollection,
    num_bins: usize,
) -> Result<Vec<ChiSquareTest>, Error> {
    if ranks.is_empty() {
        return Err(Error::Empty);
    }
    if num_bins < 2 {
        return Err(Error::TooFewBins(num_bins));
    }
    let values = ranks.num_posterior_samples() + 1;
    if num_bins > values {
        return Err(Error::TooManyBins {
            num_bins,
            max: values,
        });
    }

    let n = ranks.len() as f64;
    let expected: Vec<f64> = ranks
        .bin_widths(num_bins)
        .into_iter()
        .map(|w| n * w as f64 / values as f64)
        .collect();
    let dof = num_bins - 1;
    let Ok(dist) = ChiSquared::new(dof as f64) else {
        return Err(Error::TooFewBins(num_bins));
    };

    Ok((0..ranks.dim())
        .map(|d| {
            let statistic = ranks
                .histogram(d, num_bins)
                .into_iter()
                .zip(&expected)
                .map(|(observed, &e)| (observed as f64 - e).powi(2) / e)
                .sum::<f64>();
            ChiSquareTest {
                statistic,
                dof,
                p_value: dist.sf(statistic),
            }
        })
        .collect())
}

/// Compares prior samples with DAP samples, one two-sample KS test per
/// parameter dimension.
///
/// Every row of both sets must have the same length and only finite values.
///
/// # Errors
///
/// Returns an error if either set is empty, any row's dimension differs from
/// the first prior row, or any value is NaN or infinite.
pub fn dap_ks(prior: &[Vec<f64>], dap: &[Vec<f64>]) -> Result<Vec<KsTest>, Error> {
    let (Some(first_prior), Some(_)) = (prior.first(), dap.first()) else {
        return Err(Error::Empty);
    };
    let dim = first_prior.len();
    validate_rows(prior, dim, SampleSet::Prior)?;
    validate_rows(dap, dim, SampleSet::Dap)?;

    let n1 = prior.len() as f64;
    let n2 = dap.len() as f64;
    let effective_n = n1 * n2 / (n1 + n2);

    Ok((0..dim)
        .map(|d| {
            let a = sorted_column(prior, d);
            let b = sorted_column(dap, d);
            let statistic = two_sample_statistic(&a, &b);
            KsTest {
                statistic,
                p_value: kolmogorov_p_value(statistic, effective_n),
            }
        })
        .collect())
}

fn validate_rows(rows: &[Vec<f64>], dim: usize, set: SampleSet) -> Result<(), Error> {
    for (row, values) in rows.iter().enumerate() {
        if values.len() != dim {
            return Err(match set {
                SampleSet::Prior => Error::DimensionMismatch {
                    prior: values.len(),
                    dap: dim,
                },
                SampleSet::Dap => Error::DimensionMismatch {
                    prior: dim,
                    dap: values.len(),
                },
            });
        }
        if !values.iter().all(|v| v.is_finite()) {
            return Err(Error::NonFinite { set, row });
        }
    }
    Ok(())
}

/// Columns must be finite; see [`validate_rows`].
fn sorted_column(rows: &[Vec<f64>], d: usize) -> Vec<f64> {
    let mut column: Vec<f64> = rows.iter().map(|row| row[d]).collect();
    column.sort_by(f64::total_cmp);
    column
}

/// Largest gap between the empirical CDFs of two sorted samples.
fn two_sample_statistic(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut statistic: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    statistic
}

/// P-value of a KS statistic from the asymptotic Kolmogorov distribution,
/// with Stephens' small-sample correction.
fn kolmogorov_p_value(statistic: f64, n: f64) -> f64 {
    let sqrt_n = n.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic;
    kolmogorov_sf(lambda)
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_sf(lambda: f64) -> f64 {
    use std::f64::consts::PI;

    if lambda < 0.042 {
        return 1.0;
    }
    if lambda < 1.18 {
        let y = (-PI * PI / (8.0 * lambda * lambda)).exp();
        let cdf = (2.0 * PI).sqrt() / lambda * (y + y.powi(9) + y.powi(25) + y.powi(49));
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        (2.0 * (x - x.powi(4) + x.powi(9))).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn uniform_ranks(m: usize, repeats: usize) -> RankCollection {
        let rows: Vec<Vec<usize>> = (0..repeats).flat_map(|_| (0..=m).map(|r| vec![r])).collect();
        RankCollection::from_rows(&rows, m).unwrap()
    }

    fn piled_ranks(m: usize, n: usize) -> RankCollection {
        RankCollection::from_rows(&vec![vec![m]; n], m).unwrap()
    }

    #[test]
    fn kolmogorov_sf_matches_reference_values() {
        // Reference values of the Kolmogorov survival function.
        assert_relative_eq!(kolmogorov_sf(0.5), 0.963_945, epsilon = 1e-5);
        assert_relative_eq!(kolmogorov_sf(1.0), 0.269_999, epsilon = 1e-5);
        assert_relative_eq!(kolmogorov_sf(1.36), 0.049_486, epsilon = 1e-5);
        assert_relative_eq!(kolmogorov_sf(2.0), 0.000_671, epsilon = 1e-5);
        assert_relative_eq!(kolmogorov_sf(0.01), 1.0);
    }

    #[test]
    fn perfectly_uniform_ranks_pass() {
        let ranks = uniform_ranks(19, 10);

        let ks = ks_uniformity(&ranks).unwrap();
        assert_relative_eq!(ks[0].statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ks[0].p_value, 1.0);

        let chi = chi_square_uniformity(&ranks, 5).unwrap();
        assert_eq!(chi[0].dof, 4);
        assert_relative_eq!(chi[0].statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(chi[0].p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn piled_up_ranks_are_rejected() {
        let ranks = piled_ranks(50, 100);

        assert!(ks_uniformity(&ranks).unwrap()[0].p_value < 1e-6);

        let chi = chi_square_uniformity(&ranks, 10).unwrap();
        assert!(chi[0].p_value < 1e-6);
    }

    #[test]
    fn chi_square_accounts_for_uneven_bins() {
        // 11 rank values in 3 bins of widths 4, 4, 3.
        let ranks = uniform_ranks(10, 1);
        let chi = chi_square_uniformity(&ranks, 3).unwrap();
        assert_relative_eq!(chi[0].statistic, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_invalid_bins() {
        let ranks = uniform_ranks(4, 2);
        assert_eq!(chi_square_uniformity(&ranks, 1), Err(Error::TooFewBins(1)));
        assert_eq!(
            chi_square_uniformity(&ranks, 6),
            Err(Error::TooManyBins {
                num_bins: 6,
                max: 5
            })
        );
    }

    #[test]
    fn rejects_empty_ranks() {
        let ranks = RankCollection::new(1, 10);
        assert_eq!(ks_uniformity(&ranks), Err(Error::Empty));
        assert_eq!(chi_square_uniformity(&ranks, 2), Err(Error::Empty));
    }

    #[test]
    fn two_sample_statistic_handles_ties_and_shifts() {
        assert_relative_eq!(two_sample_statistic(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert_relative_eq!(two_sample_statistic(&[1.0, 2.0], &[3.0, 4.0]), 1.0);
        assert_relative_eq!(
            two_sample_statistic(&[1.0, 2.0, 3.0, 4.0], &[3.0, 4.0]),
            0.5
        );
    }

    #[test]
    fn dap_matching_prior_passes() {
        let prior: Vec<Vec<f64>> = (0..200).map(|i| vec![f64::from(i) / 200.0]).collect();
        let dap: Vec<Vec<f64>> = (0..200).map(|i| vec![(f64::from(i) + 0.5) / 200.0]).collect();

        let tests = dap_ks(&prior, &dap).unwrap();
        assert!(tests[0].p_value > 0.99);
    }

    #[test]
    fn shifted_dap_fails() {
        let prior: Vec<Vec<f64>> = (0..200).map(|i| vec![f64::from(i) / 200.0]).collect();
        let dap: Vec<Vec<f64>> = (0..200).map(|i| vec![0.5 + f64::from(i) / 200.0]).collect();

        let tests = dap_ks(&prior, &dap).unwrap();
        assert_relative_eq!(tests[0].statistic, 0.5, epsilon = 1e-12);
        assert!(tests[0].p_value < 1e-6);
    }

    #[test]
    fn dap_dimension_mismatch_is_an_error() {
        let err = dap_ks(&[vec![0.0, 1.0]], &[vec![0.0]]).unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { prior: 2, dap: 1 });
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let err = dap_ks(&[vec![0.0, 1.0], vec![0.5]], &[vec![0.0, 1.0], vec![0.2, 0.3]])
            .unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { prior: 1, dap: 2 });

        let err = dap_ks(&[vec![0.0, 1.0], vec![0.5, 0.5]], &[vec![0.0, 1.0], vec![0.2]])
            .unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { prior: 2, dap: 1 });
    }

    #[test]
    fn non_finite_samples_are_an_error() {
        assert_eq!(
            dap_ks(&[vec![f64::NAN]], &[vec![f64::NAN]]),
            Err(Error::NonFinite {
                set: SampleSet::Prior,
                row: 0
            })
        );

        let prior = vec![vec![0.0], vec![1.0], vec![2.0]];
        let dap = vec![vec![0.5], vec![-f64::NAN], vec![1.5]];
        assert_eq!(
            dap_ks(&prior, &dap),
            Err(Error::NonFinite {
                set: SampleSet::Dap,
                row: 1
            })
        );

        let dap = vec![vec![0.5], vec![f64::INFINITY], vec![1.5]];
        assert!(matches!(dap_ks(&prior, &dap), Err(Error::NonFinite { .. })));
    }

    #[test]
    fn check_sbc_compares_dap_with_ranked_priors_only() {
        // Trials with θ ≥ 0.5 were skipped. The DAP samples track the priors
        // of the ranked trials, so the comparison must ignore the others.
        let thetas: Vec<Vec<f64>> = (0..200).map(|i| vec![f64::from(i) / 200.0]).collect();
        let simulations = Simulations::new(thetas, vec![(); 200]).unwrap();

        let mut ranks = RankCollection::new(1, 9);
        let mut dap_samples = Vec::new();
        for trial in 0..100 {
            ranks.push(trial, &[trial % 10]);
            dap_samples.push(vec![simulations.theta(trial)[0] + 0.001]);
        }
        let solution = Solution {
            status: crate::run::Status::Complete,
            ranks,
            dap_samples,
            skipped: (100..200).collect(),
        };

        let report = check_sbc(&simulations, &solution, 5).unwrap();
        assert!(report.dap[0].p_value > 0.99);
        assert!(report.passes(0.01));

        // Against every prior sample the same DAP would look shifted.
        let all = dap_ks(simulations.thetas(), &solution.dap_samples).unwrap();
        assert!(all[0].p_value < 1e-6);
    }

    #[test]
    fn report_flags_rejected_dims() {
        let report = Report {
            ks: vec![
                KsTest {
                    statistic: 0.01,
                    p_value: 0.8,
                },
                KsTest {
                    statistic: 0.3,
                    p_value: 0.001,
                },
            ],
            chi_square: vec![
                ChiSquareTest {
                    statistic: 3.0,
                    dof: 4,
                    p_value: 0.55,
                },
                ChiSquareTest {
                    statistic: 40.0,
                    dof: 4,
                    p_value: 1e-7,
                },
            ],
            dap: vec![],
        };

        assert!(!report.passes(0.01));
        assert!(report.passes(1e-8));
        assert_eq!(report.rejected_dims(0.01), vec![1]);
    }
}
