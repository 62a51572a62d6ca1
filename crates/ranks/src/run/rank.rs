use sbc_core::Reduction;

use super::Error;

/// Ranks and DAP sample computed for a single trial.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TrialRanks {
    pub(super) ranks: Vec<usize>,
    pub(super) dap_sample: Vec<f64>,
}

/// Returns how many `values` are strictly less than `truth`.
///
/// Ties never count, and neither does NaN, so a posterior that puts mass
/// exactly on the truth ranks it at the bottom of the tied block. This is the
/// only comparison used to rank a trial. NaN draws are tolerated here, but
/// [`check::dap_ks`](crate::check::dap_ks) rejects non-finite DAP samples.
#[must_use]
pub fn rank_of(truth: f64, values: impl IntoIterator<Item = f64>) -> usize {
    values.into_iter().filter(|&v| v < truth).count()
}

/// Ranks the true parameter of one trial within its posterior samples.
///
/// The reduction is applied to the truth and to each sample, then each
/// dimension is ranked with [`rank_of`].
pub(super) fn rank_trial<X, R>(
    trial: usize,
    theta: &[f64],
    observation: &X,
    samples: Vec<Vec<f64>>,
    expected_count: usize,
    reduction: &R,
) -> Result<TrialRanks, Error>
where
    R: Reduction<X>,
{
    if samples.len() != expected_count {
        return Err(Error::SampleCount {
            trial,
            expected: expected_count,
            found: samples.len(),
        });
    }
    if let Some(sample) = samples.iter().find(|s| s.len() != theta.len()) {
        return Err(Error::DimensionMismatch {
            trial,
            expected: theta.len(),
            found: sample.len(),
        });
    }

    let truth = reduction.reduce(theta, observation);
    let reduced: Vec<Vec<f64>> = samples
        .iter()
        .map(|sample| reduction.reduce(sample, observation))
        .collect();

    let ranks = truth
        .iter()
        .enumerate()
        .map(|(d, &t)| rank_of(t, reduced.iter().map(|r| r[d])))
        .collect();

    let dap_sample = samples.into_iter().next().unwrap_or_default();

    Ok(TrialRanks { ranks, dap_sample })
}
