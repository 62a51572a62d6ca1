//! Rank histograms and ECDF plots with confidence bands.
//!
//! [`sbc_rank_plot`] turns the ranks of a calibration run into plot-ready
//! data: one [`Panel`] per ranked dimension, holding either histogram bins or
//! ECDF points together with a binomial confidence band under the hypothesis
//! of uniform ranks. The data can be drawn with any plotting backend.
//!
//! # Features
//!
//! - `show` — Enables [`RankPlot::show`], which opens a native egui window.
//!   This feature adds dependencies on `eframe` and `egui_plot`.
//! - `serde` — Derives `Serialize` and `Deserialize` for the plot data.

mod band;
mod config;
mod error;
mod plot;

#[cfg(feature = "show")]
mod show;

pub use config::{
    ConfigError, DEFAULT_CONFIDENCE, DEFAULT_MAX_BINS, DEFAULT_NUM_POINTS, PlotConfig, PlotKind,
};
pub use error::PlotError;
pub use plot::{EcdfPoint, HistogramBin, Panel, PanelData, RankPlot, sbc_rank_plot};

#[cfg(feature = "show")]
pub use show::ShowConfig;
