//! Renderer-agnostic description of a chart's data.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// The kinds of chart the factory knows how to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Doughnut,
    Pie,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::HorizontalBar => "horizontalBar",
            Self::Doughnut => "doughnut",
            Self::Pie => "pie",
        }
    }

    /// Whether the chart draws its values against a pair of axes.
    pub fn has_axes(self) -> bool {
        matches!(self, Self::Line | Self::Bar | Self::HorizontalBar)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Styling hints for a single dataset.
///
/// `background_colors` holds either one color for the whole dataset or one
/// color per data point (doughnut/pie slices, per-bar colors).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStyle {
    pub border_color: Option<String>,
    pub background_colors: Vec<String>,
    pub fill: bool,
    pub tension: Option<f64>,
    pub border_width: u32,
    pub border_radius: Option<u32>,
}

/// One series of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    pub style: DatasetStyle,
}

impl Dataset {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
            style: DatasetStyle::default(),
        }
    }

    pub fn style(mut self, style: DatasetStyle) -> Self {
        self.style = style;
        self
    }
}

/// Labels plus the datasets drawn against them.
///
/// Index `i` of `labels` corresponds to index `i` of every dataset's values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSpec {
    pub fn new(labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        Self { labels, datasets }
    }

    /// Whether every dataset has exactly one value per label.
    pub fn is_aligned(&self) -> bool {
        self.datasets
            .iter()
            .all(|dataset| dataset.values.len() == self.labels.len())
    }
}

/// The data point a tooltip is being generated for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPoint<'a> {
    pub dataset_index: usize,
    pub dataset_label: &'a str,
    pub data_index: usize,
    pub label: &'a str,
    pub value: f64,
}

/// Produces the tooltip lines for one data point.
pub type TooltipCallback = Arc<dyn Fn(&TooltipPoint<'_>) -> Vec<String> + Send + Sync>;

/// Caller supplied options merged into the generated chart configuration.
#[derive(Clone, Default)]
pub struct ChartOptions {
    /// Tooltip content per data point. Passed through to the renderer untouched.
    pub tooltip: Option<TooltipCallback>,
    /// Set to `Some(false)` to hide the legend on bar charts.
    pub show_legend: Option<bool>,
}

impl ChartOptions {
    pub fn tooltip(
        mut self,
        callback: impl Fn(&TooltipPoint<'_>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.tooltip = Some(Arc::new(callback));
        self
    }

    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = Some(show);
        self
    }
}

impl fmt::Debug for ChartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartOptions")
            .field("tooltip", &self.tooltip.as_ref().map(|_| "<callback>"))
            .field("show_legend", &self.show_legend)
            .finish()
    }
}
