//! Native window for rank plots.
//!
//! See [`RankPlot::show`] and [`ShowConfig`] for usage.

use eframe::egui;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::{EcdfPoint, HistogramBin, Panel, PanelData, RankPlot};

/// Configuration for rendering a [`RankPlot`].
///
/// Construct with [`ShowConfig::new`] and chain builder methods as needed.
///
/// # Example
///
/// ```ignore
/// plot.show(ShowConfig::new().title("SBC ranks").legend())?;
/// ```
pub struct ShowConfig {
    title: Option<String>,
    legend: bool,
    expected: bool,
}

impl ShowConfig {
    /// Creates a new `ShowConfig` with defaults: no title, no legend, expected
    /// line drawn.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            legend: false,
            expected: true,
        }
    }

    /// Sets the window title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enables a legend in each panel.
    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Hides the line marking the expected count or CDF.
    #[must_use]
    pub fn hide_expected(mut self) -> Self {
        self.expected = false;
        self
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RankPlot {
    /// Opens a blocking egui window with one stacked plot per panel.
    ///
    /// Blocks until the window is closed by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), eframe::Error> {
        let title = config.title.clone().unwrap_or_else(|| "SBC ranks".into());

        eframe::run_native(
            &title,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| {
                Ok(Box::new(PlotApp {
                    panels: self.panels,
                    config,
                }))
            }),
        )
    }
}

/// The egui [`eframe::App`] that renders rank panels.
struct PlotApp {
    panels: Vec<Panel>,
    config: ShowConfig,
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let count = self.panels.len().max(1) as f32;
            let spacing = ui.spacing().item_spacing.y;
            let height = (ui.available_height() - spacing * (count - 1.0)) / count;

            for (i, panel) in self.panels.iter().enumerate() {
                let mut plot = Plot::new(("rank_panel", i)).height(height);
                if self.config.legend {
                    plot = plot.legend(Legend::default());
                }
                plot.show(ui, |plot_ui| match &panel.data {
                    PanelData::Histogram(bins) => {
                        plot_ui.bar_chart(BarChart::new(bars(bins)).name(&panel.label));
                        plot_ui.line(Line::new(steps(bins, |b| b.lower as f64)).name("band"));
                        plot_ui.line(Line::new(steps(bins, |b| b.upper as f64)).name("band"));
                        if self.config.expected {
                            plot_ui.line(Line::new(steps(bins, |b| b.expected)).name("expected"));
                        }
                    }
                    PanelData::Ecdf(points) => {
                        plot_ui.line(Line::new(trace(points, |p| p.ecdf)).name(&panel.label));
                        plot_ui.line(Line::new(trace(points, |p| p.lower)).name("band"));
                        plot_ui.line(Line::new(trace(points, |p| p.upper)).name("band"));
                        if self.config.expected {
                            plot_ui.line(Line::new(trace(points, |p| p.u)).name("expected"));
                        }
                    }
                });
            }
        });
    }
}

fn bars(bins: &[HistogramBin]) -> Vec<Bar> {
    bins.iter()
        .map(|bin| {
            let width = (bin.last_rank - bin.first_rank + 1) as f64;
            Bar::new(bin.first_rank as f64 - 0.5 + width / 2.0, bin.count as f64).width(width)
        })
        .collect()
}

/// Draws a per-bin value as a horizontal step across each bin.
fn steps(bins: &[HistogramBin], value: impl Fn(&HistogramBin) -> f64) -> PlotPoints {
    bins.iter()
        .flat_map(|bin| {
            let y = value(bin);
            [
                [bin.first_rank as f64 - 0.5, y],
                [bin.last_rank as f64 + 0.5, y],
            ]
        })
        .collect()
}

fn trace(points: &[EcdfPoint], value: impl Fn(&EcdfPoint) -> f64) -> PlotPoints {
    points.iter().map(|p| [p.u, value(p)]).collect()
}
