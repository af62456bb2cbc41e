//! Kind specific chart configuration.
//!
//! [ChartConfig::build] applies the per-kind defaults for legend, axis
//! orientation and grid lines, then splices in the caller's options.

use std::fmt;

use crate::{
    chart::spec::{ChartKind, ChartOptions, ChartSpec, TooltipCallback},
    format::GRID_COLOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendConfig {
    pub display: bool,
    pub position: LegendPosition,
}

impl LegendConfig {
    fn bottom(display: bool) -> Self {
        Self {
            display,
            position: LegendPosition::Bottom,
        }
    }
}

/// How grid lines are drawn for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLines {
    Visible { color: &'static str },
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisScale {
    pub begin_at_zero: bool,
    pub grid: GridLines,
}

impl AxisScale {
    fn gridded() -> Self {
        Self {
            begin_at_zero: true,
            grid: GridLines::Visible { color: GRID_COLOR },
        }
    }

    fn ungridded() -> Self {
        Self {
            begin_at_zero: false,
            grid: GridLines::Hidden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scales {
    pub x: AxisScale,
    pub y: AxisScale,
}

/// The axis that carries the category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAxis {
    /// Categories along the horizontal axis, values grow upwards.
    X,
    /// Categories along the vertical axis, values grow to the right.
    Y,
}

/// Hover behaviour: `Index` highlights every series at the hovered label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Index,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub mode: InteractionMode,
    pub intersect: bool,
}

/// Everything a surface needs to draw one chart.
#[derive(Clone)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub spec: ChartSpec,
    pub legend: LegendConfig,
    pub index_axis: IndexAxis,
    /// `None` for charts without axes (doughnut, pie).
    pub scales: Option<Scales>,
    pub interaction: Option<Interaction>,
    pub tooltip: Option<TooltipCallback>,
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
}

impl ChartConfig {
    /// Build the configuration for `kind` from `spec` and the caller's `options`.
    pub fn build(kind: ChartKind, spec: ChartSpec, options: ChartOptions) -> Self {
        let base = Self {
            kind,
            spec,
            legend: LegendConfig::bottom(true),
            index_axis: IndexAxis::X,
            scales: None,
            interaction: None,
            tooltip: options.tooltip,
            responsive: true,
            maintain_aspect_ratio: false,
        };

        match kind {
            ChartKind::Line => Self {
                interaction: Some(Interaction {
                    mode: InteractionMode::Index,
                    intersect: false,
                }),
                scales: Some(Scales {
                    x: AxisScale::gridded(),
                    y: AxisScale::gridded(),
                }),
                ..base
            },
            ChartKind::Bar => Self {
                legend: LegendConfig::bottom(options.show_legend != Some(false)),
                scales: Some(Scales {
                    x: AxisScale::ungridded(),
                    y: AxisScale::gridded(),
                }),
                ..base
            },
            ChartKind::HorizontalBar => Self {
                legend: LegendConfig::bottom(false),
                index_axis: IndexAxis::Y,
                scales: Some(Scales {
                    x: AxisScale::gridded(),
                    y: AxisScale::ungridded(),
                }),
                ..base
            },
            ChartKind::Doughnut | ChartKind::Pie => base,
        }
    }
}

impl fmt::Debug for ChartConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartConfig")
            .field("kind", &self.kind)
            .field("spec", &self.spec)
            .field("legend", &self.legend)
            .field("index_axis", &self.index_axis)
            .field("scales", &self.scales)
            .field("interaction", &self.interaction)
            .field("tooltip", &self.tooltip.as_ref().map(|_| "<callback>"))
            .finish()
    }
}
