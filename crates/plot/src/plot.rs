use sbc_core::RankCollection;
use tracing::debug;

use crate::{PlotConfig, PlotError, PlotKind, band::binomial_interval};

/// Plot-ready rank data, one panel per ranked dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankPlot {
    /// How the ranks are drawn.
    pub kind: PlotKind,

    /// Number of ranked trials `N`.
    pub num_trials: usize,

    /// Number of posterior samples `M` behind each rank.
    pub num_posterior_samples: usize,

    /// Confidence level of the bands.
    pub confidence: f64,

    /// One panel per ranked dimension.
    pub panels: Vec<Panel>,
}

/// The plot of a single ranked dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Panel {
    pub label: String,
    pub data: PanelData,
}

/// Histogram bins or ECDF points, depending on the plot kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PanelData {
    Histogram(Vec<HistogramBin>),
    Ecdf(Vec<EcdfPoint>),
}

/// One histogram bin covering ranks `first_rank..=last_rank`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistogramBin {
    pub first_rank: usize,
    pub last_rank: usize,

    /// Number of ranks that fell in the bin.
    pub count: usize,

    /// Expected count under uniform ranks.
    pub expected: f64,

    /// Lower end of the binomial band.
    pub lower: usize,

    /// Upper end of the binomial band.
    pub upper: usize,
}

impl HistogramBin {
    /// Returns `true` if the count lies inside the band.
    #[must_use]
    pub fn within_band(&self) -> bool {
        (self.lower..=self.upper).contains(&self.count)
    }
}

/// The ECDF of normalized ranks at one grid point `u`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EcdfPoint {
    pub u: f64,

    /// Fraction of normalized ranks `(r + 1) / (M + 1)` at or below `u`.
    pub ecdf: f64,

    pub lower: f64,
    pub upper: f64,
}

impl EcdfPoint {
    /// Returns `true` if the ECDF lies inside the band.
    #[must_use]
    pub fn within_band(&self) -> bool {
        self.lower <= self.ecdf && self.ecdf <= self.upper
    }
}

impl Panel {
    /// Returns the indices of bins or grid points that fall outside the band.
    #[must_use]
    pub fn outside_band(&self) -> Vec<usize> {
        match &self.data {
            PanelData::Histogram(bins) => outside(bins.iter().map(HistogramBin::within_band)),
            PanelData::Ecdf(points) => outside(points.iter().map(EcdfPoint::within_band)),
        }
    }
}

fn outside(within: impl Iterator<Item = bool>) -> Vec<usize> {
    within
        .enumerate()
        .filter_map(|(i, ok)| (!ok).then_some(i))
        .collect()
}

/// Builds plot data for the ranks of a calibration run.
///
/// Under a calibrated posterior, each bin count (or ECDF value) falls inside
/// its band with probability about `confidence`, so occasional excursions
/// are expected.
///
/// # Errors
///
/// Returns an error if `ranks` is empty, the number of bins exceeds the
/// number of distinct ranks `M + 1`, or the number of labels does not match
/// the ranked dimension.
pub fn sbc_rank_plot(ranks: &RankCollection, config: &PlotConfig) -> Result<RankPlot, PlotError> {
    if ranks.is_empty() {
        return Err(PlotError::Empty);
    }

    let labels: Vec<String> = match config.labels() {
        Some(labels) if labels.len() != ranks.dim() => {
            return Err(PlotError::LabelCount {
                expected: ranks.dim(),
                found: labels.len(),
            });
        }
        Some(labels) => labels.to_vec(),
        None => (0..ranks.dim()).map(|d| format!("dim {d}")).collect(),
    };

    let panel_data: Vec<PanelData> = match config.kind() {
        PlotKind::Histogram => histograms(ranks, config)?,
        PlotKind::Ecdf => ecdfs(ranks, config),
    };

    let panels: Vec<Panel> = labels
        .into_iter()
        .zip(panel_data)
        .map(|(label, data)| Panel { label, data })
        .collect();

    debug!(
        kind = ?config.kind(),
        panels = panels.len(),
        outside_band = panels.iter().map(|p| p.outside_band().len()).sum::<usize>(),
        "built rank plot"
    );

    Ok(RankPlot {
        kind: config.kind(),
        num_trials: ranks.len(),
        num_posterior_samples: ranks.num_posterior_samples(),
        confidence: config.confidence(),
        panels,
    })
}

fn histograms(ranks: &RankCollection, config: &PlotConfig) -> Result<Vec<PanelData>, PlotError> {
    let values = ranks.num_posterior_samples() + 1;
    let num_bins = config.num_bins(ranks.num_posterior_samples());
    if num_bins > values {
        return Err(PlotError::TooManyBins {
            num_bins,
            max: values,
        });
    }

    let n = ranks.len();
    let mut first_rank = 0;
    let template: Vec<HistogramBin> = ranks
        .bin_widths(num_bins)
        .into_iter()
        .map(|width| {
            let p = width as f64 / values as f64;
            let (lower, upper) = band(n, p, config.confidence());
            let bin = HistogramBin {
                first_rank,
                last_rank: first_rank + width - 1,
                count: 0,
                expected: n as f64 * p,
                lower,
                upper,
            };
            first_rank += width;
            bin
        })
        .collect();

    Ok((0..ranks.dim())
        .map(|d| {
            let bins = ranks
                .histogram(d, num_bins)
                .into_iter()
                .zip(&template)
                .map(|(count, bin)| HistogramBin { count, ..*bin })
                .collect();
            PanelData::Histogram(bins)
        })
        .collect())
}

fn ecdfs(ranks: &RankCollection, config: &PlotConfig) -> Vec<PanelData> {
    let n = ranks.len();
    let values = ranks.num_posterior_samples() + 1;
    let steps = config.num_points() - 1;

    let template: Vec<EcdfPoint> = (0..=steps)
        .map(|i| {
            let u = i as f64 / steps as f64;
            let (lower, upper) = band(n, u, config.confidence());
            EcdfPoint {
                u,
                ecdf: 0.0,
                lower: lower as f64 / n as f64,
                upper: upper as f64 / n as f64,
            }
        })
        .collect();

    (0..ranks.dim())
        .map(|d| {
            let mut sorted: Vec<usize> = ranks.column(d).collect();
            sorted.sort_unstable();

            // (r + 1) / (M + 1) <= i / steps, compared in integers.
            let points = template
                .iter()
                .enumerate()
                .map(|(i, point)| {
                    let below = sorted.partition_point(|&r| (r + 1) * steps <= i * values);
                    EcdfPoint {
                        ecdf: below as f64 / n as f64,
                        ..*point
                    }
                })
                .collect();
            PanelData::Ecdf(points)
        })
        .collect()
}

/// Binomial band as counts, falling back to the full range for a
/// probability statrs rejects.
fn band(n: usize, p: f64, confidence: f64) -> (usize, usize) {
    let (lower, upper) = binomial_interval(n as u64, p.clamp(0.0, 1.0), confidence)
        .unwrap_or((0, n as u64));
    (
        usize::try_from(lower).unwrap_or(n),
        usize::try_from(upper).unwrap_or(n),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn uniform(m: usize, repeats: usize) -> RankCollection {
        let rows: Vec<Vec<usize>> = (0..repeats)
            .flat_map(|_| (0..=m).map(move |r| vec![r, m - r]))
            .collect();
        RankCollection::from_rows(&rows, m).unwrap()
    }

    fn bins(panel: &Panel) -> &[HistogramBin] {
        match &panel.data {
            PanelData::Histogram(bins) => bins,
            PanelData::Ecdf(_) => panic!("expected histogram"),
        }
    }

    fn points(panel: &Panel) -> &[EcdfPoint] {
        match &panel.data {
            PanelData::Ecdf(points) => points,
            PanelData::Histogram(_) => panic!("expected ECDF"),
        }
    }

    #[test]
    fn histogram_has_one_panel_per_dimension() {
        let ranks = uniform(19, 10);
        let plot = sbc_rank_plot(&ranks, &PlotConfig::default()).unwrap();

        assert_eq!(plot.kind, PlotKind::Histogram);
        assert_eq!(plot.num_trials, 200);
        assert_eq!(plot.panels.len(), 2);
        assert_eq!(plot.panels[0].label, "dim 0");
        assert_eq!(plot.panels[1].label, "dim 1");

        // 20 distinct ranks in the default 20 bins.
        let bins = bins(&plot.panels[0]);
        assert_eq!(bins.len(), 20);
        for (k, bin) in bins.iter().enumerate() {
            assert_eq!((bin.first_rank, bin.last_rank), (k, k));
            assert_eq!(bin.count, 10);
            assert_relative_eq!(bin.expected, 10.0);
        }
    }

    #[test]
    fn band_contains_the_expected_count() {
        let ranks = uniform(10, 30);
        let config = PlotConfig::default().with_bins(3).unwrap();
        let plot = sbc_rank_plot(&ranks, &config).unwrap();

        let bins = bins(&plot.panels[0]);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 330);
        assert_eq!(
            bins.iter().map(|b| (b.first_rank, b.last_rank)).collect::<Vec<_>>(),
            vec![(0, 3), (4, 7), (8, 10)]
        );
        for bin in bins {
            assert!(bin.lower as f64 <= bin.expected && bin.expected <= bin.upper as f64);
            assert!(bin.within_band());
        }
        assert!(plot.panels[0].outside_band().is_empty());
    }

    #[test]
    fn piled_up_ranks_leave_the_band() {
        let ranks = RankCollection::from_rows(&vec![vec![0]; 100], 9).unwrap();
        let plot = sbc_rank_plot(&ranks, &PlotConfig::default()).unwrap();

        // Everything lands in the first bin; every bin is outside its band.
        assert_eq!(bins(&plot.panels[0])[0].count, 100);
        assert_eq!(plot.panels[0].outside_band().len(), 10);
    }

    #[test]
    fn ecdf_band_is_monotone_and_pinned_at_the_ends() {
        let ranks = uniform(49, 4);
        let plot = sbc_rank_plot(&ranks, &PlotConfig::ecdf()).unwrap();
        let points = points(&plot.panels[0]);

        assert_eq!(points.len(), 100);
        assert_relative_eq!(points[0].u, 0.0);
        assert_relative_eq!(points[99].u, 1.0);
        assert_relative_eq!(points[0].upper, 0.0);
        assert_relative_eq!(points[0].ecdf, 0.0);
        assert_relative_eq!(points[99].lower, 1.0);
        assert_relative_eq!(points[99].ecdf, 1.0);

        for pair in points.windows(2) {
            assert!(pair[0].lower <= pair[1].lower);
            assert!(pair[0].upper <= pair[1].upper);
            assert!(pair[0].ecdf <= pair[1].ecdf);
        }
        for point in points {
            assert!(point.lower <= point.u && point.u <= point.upper);
        }
    }

    #[test]
    fn ecdf_counts_ranks_at_or_below_each_point() {
        // Ranks 0..=4 out of M = 4 normalize to 0.2, 0.4, ..., 1.0.
        let ranks = uniform(4, 1);
        let config = PlotConfig::ecdf().with_points(5).unwrap();
        let plot = sbc_rank_plot(&ranks, &config).unwrap();

        let ecdf: Vec<f64> = points(&plot.panels[0]).iter().map(|p| p.ecdf).collect();
        assert_eq!(ecdf, vec![0.0, 0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn uses_labels() {
        let config = PlotConfig::ecdf().with_labels(["mu", "sigma"]);
        let plot = sbc_rank_plot(&uniform(4, 2), &config).unwrap();
        assert_eq!(plot.panels[0].label, "mu");
        assert_eq!(plot.panels[1].label, "sigma");
    }

    #[test]
    fn rejects_invalid_input() {
        let ranks = uniform(4, 2);

        assert_eq!(
            sbc_rank_plot(&RankCollection::new(1, 4), &PlotConfig::default()),
            Err(PlotError::Empty)
        );
        assert_eq!(
            sbc_rank_plot(&ranks, &PlotConfig::default().with_bins(6).unwrap()),
            Err(PlotError::TooManyBins {
                num_bins: 6,
                max: 5
            })
        );
        assert_eq!(
            sbc_rank_plot(&ranks, &PlotConfig::default().with_labels(["only one"])),
            Err(PlotError::LabelCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_to_json() {
        let plot = sbc_rank_plot(&uniform(4, 2), &PlotConfig::default()).unwrap();
        let json = serde_json::to_string(&plot).expect("serializable");
        let back: RankPlot = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, plot);
    }
}
