use statrs::distribution::{Binomial, DiscreteCDF};

/// Central binomial interval for a count out of `trials` with success
/// probability `p`.
///
/// Returns the `(1 - c) / 2` and `(1 + c) / 2` quantiles of
/// Binomial(`trials`, `p`), where the `q` quantile is the smallest `k` with
/// `P(X ≤ k) ≥ q`. Returns `None` if `p` is not a probability.
pub(crate) fn binomial_interval(trials: u64, p: f64, confidence: f64) -> Option<(u64, u64)> {
    let dist = Binomial::new(p, trials).ok()?;
    let lower = quantile(&dist, trials, (1.0 - confidence) / 2.0);
    let upper = quantile(&dist, trials, (1.0 + confidence) / 2.0);
    Some((lower, upper))
}

fn quantile(dist: &Binomial, trials: u64, q: f64) -> u64 {
    let (mut lo, mut hi) = (0, trials);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if dist.cdf(mid) >= q {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}
