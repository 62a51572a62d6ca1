use thiserror::Error;

/// Confidence level of the band drawn when none is given.
pub const DEFAULT_CONFIDENCE: f64 = 0.99;

/// Upper limit on the default number of histogram bins.
pub const DEFAULT_MAX_BINS: usize = 20;

/// Number of ECDF grid points drawn when none is given.
pub const DEFAULT_NUM_POINTS: usize = 100;

/// How ranks are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlotKind {
    /// Binned rank counts with a per-bin binomial band.
    #[default]
    Histogram,

    /// Empirical CDF of normalized ranks with a pointwise binomial band.
    Ecdf,
}

/// Configuration for building a rank plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    kind: PlotKind,
    confidence: f64,
    num_bins: Option<usize>,
    num_points: usize,
    labels: Option<Vec<String>>,
}

/// Errors that can occur when validating a plot config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("confidence must be strictly between 0 and 1")]
    Confidence,

    #[error("num_bins must be at least 1")]
    ZeroBins,

    #[error("num_points must be at least 2")]
    TooFewPoints,
}

impl Default for PlotConfig {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(PlotKind::Histogram, DEFAULT_CONFIDENCE).unwrap()
    }
}

impl PlotConfig {
    /// Creates a config with default bins and grid points.
    ///
    /// # Errors
    ///
    /// Returns an error if `confidence` is not strictly between 0 and 1.
    pub fn new(kind: PlotKind, confidence: f64) -> Result<Self, ConfigError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ConfigError::Confidence);
        }

        Ok(Self {
            kind,
            confidence,
            num_bins: None,
            num_points: DEFAULT_NUM_POINTS,
            labels: None,
        })
    }

    /// Creates a default ECDF config.
    #[must_use]
    pub fn ecdf() -> Self {
        Self {
            kind: PlotKind::Ecdf,
            ..Self::default()
        }
    }

    /// Sets the number of histogram bins.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bins` is zero.
    pub fn with_bins(mut self, num_bins: usize) -> Result<Self, ConfigError> {
        if num_bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        self.num_bins = Some(num_bins);
        Ok(self)
    }

    /// Sets the number of ECDF grid points.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_points` is less than 2.
    pub fn with_points(mut self, num_points: usize) -> Result<Self, ConfigError> {
        if num_points < 2 {
            return Err(ConfigError::TooFewPoints);
        }
        self.num_points = num_points;
        Ok(self)
    }

    /// Sets one label per ranked dimension.
    ///
    /// Without labels, panels are named `dim 0`, `dim 1`, and so on.
    #[must_use]
    pub fn with_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the plot kind.
    #[must_use]
    pub fn kind(&self) -> PlotKind {
        self.kind
    }

    /// Returns the confidence level of the band.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the number of histogram bins for ranks out of
    /// `num_posterior_samples`.
    ///
    /// Defaults to `min(20, M + 1)` when not set.
    #[must_use]
    pub fn num_bins(&self, num_posterior_samples: usize) -> usize {
        self.num_bins
            .unwrap_or_else(|| DEFAULT_MAX_BINS.min(num_posterior_samples + 1))
    }

    /// Returns the number of ECDF grid points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Returns the panel labels, if set.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }
}
