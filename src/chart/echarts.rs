//! Renders chart configurations as ECharts options and mounts them on a page.
//!
//! [EChartsSurface] stands in for the chart containers of one HTML page. Each
//! mount, unmount and clear is recorded as a [ScriptCommand], and
//! [EChartsSurface::script] turns those into the JavaScript that performs them
//! in the browser.

use std::collections::BTreeSet;

use charming::{
    Chart,
    component::{Axis, Grid, Legend},
    element::{
        AreaStyle, AxisType, Color, ItemStyle, JsFunction, LineStyle, SplitLine, Tooltip, Trigger,
    },
    datatype::DataPointItem,
    series::{Bar, Line, Pie},
};

use crate::chart::{
    config::{AxisScale, ChartConfig, GridLines, IndexAxis, LegendPosition},
    factory::ChartSurface,
    spec::{ChartKind, Dataset, TooltipPoint},
};

/// Handle to a chart mounted on an [EChartsSurface].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EChartsHandle {
    pub target: String,
    pub generation: u64,
}

/// A browser side operation on one chart container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    /// Dispose whatever is drawn on `target`, then draw `options` on it.
    Mount { target: String, options: String },
    /// Dispose the chart drawn on `target`.
    Dispose { target: String },
    /// Dispose the chart drawn on `target` and empty the container.
    Clear { target: String },
}

/// The chart containers of one page, addressed by element ID.
#[derive(Debug, Default)]
pub struct EChartsSurface {
    targets: BTreeSet<String>,
    generation: u64,
    commands: Vec<ScriptCommand>,
}

impl EChartsSurface {
    /// Create a surface for a page that lays out a chart container for each of `targets`.
    pub fn new<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    /// Whether any command has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// JavaScript that replays the recorded commands in order.
    pub fn script(&self) -> String {
        let script = self
            .commands
            .iter()
            .map(command_script)
            .collect::<Vec<_>>()
            .join("\n");

        // Keep option strings from closing the surrounding <script> element.
        script.replace("</", "<\\/")
    }
}

impl ChartSurface for EChartsSurface {
    type Handle = EChartsHandle;

    fn has_target(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    fn mount(&mut self, target: &str, config: &ChartConfig) -> EChartsHandle {
        self.generation += 1;
        self.commands.push(ScriptCommand::Mount {
            target: target.to_owned(),
            options: echarts_options(config).to_string(),
        });

        EChartsHandle {
            target: target.to_owned(),
            generation: self.generation,
        }
    }

    fn unmount(&mut self, target: &str, _handle: EChartsHandle) {
        self.commands.push(ScriptCommand::Dispose {
            target: target.to_owned(),
        });
    }

    fn clear(&mut self, target: &str) {
        self.commands.push(ScriptCommand::Clear {
            target: target.to_owned(),
        });
    }
}

/// Disposes the chart on `chartDom` and removes the window listeners its
/// mount script added.
const RELEASE_CHART: &str = r#"const existing = echarts.getInstanceByDom(chartDom);
                if (existing) existing.dispose();
                if (chartDom.releaseListeners) {
                    chartDom.releaseListeners();
                    delete chartDom.releaseListeners;
                }"#;

fn command_script(command: &ScriptCommand) -> String {
    match command {
        ScriptCommand::Mount { target, options } => format!(
            r#"(function() {{
                const chartDom = document.getElementById({target});
                if (!chartDom) return;
                {release}
                const chart = echarts.init(chartDom);
                chart.setOption({options});

                const resize = () => {{
                    if (!chart.isDisposed()) chart.resize();
                }};
                window.addEventListener('resize', resize);

                const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                const updateTheme = () => {{
                    if (chart.isDisposed()) return;
                    chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                }};
                darkModeMediaQuery.addEventListener('change', updateTheme);
                updateTheme();

                chartDom.releaseListeners = () => {{
                    window.removeEventListener('resize', resize);
                    darkModeMediaQuery.removeEventListener('change', updateTheme);
                }};
            }})();"#,
            target = js_string(target),
            release = RELEASE_CHART,
        ),
        ScriptCommand::Dispose { target } => format!(
            r#"(function() {{
                const chartDom = document.getElementById({target});
                if (!chartDom) return;
                {release}
            }})();"#,
            target = js_string(target),
            release = RELEASE_CHART,
        ),
        ScriptCommand::Clear { target } => format!(
            r#"(function() {{
                const chartDom = document.getElementById({target});
                if (!chartDom) return;
                {release}
                chartDom.replaceChildren();
            }})();"#,
            target = js_string(target),
            release = RELEASE_CHART,
        ),
    }
}

fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Convert a chart configuration into ECharts options.
pub fn echarts_options(config: &ChartConfig) -> Chart {
    let chart = Chart::new()
        .legend(legend(config))
        .tooltip(tooltip(config));

    match config.kind {
        ChartKind::Line | ChartKind::Bar | ChartKind::HorizontalBar => axis_chart(chart, config),
        ChartKind::Doughnut | ChartKind::Pie => circular_chart(chart, config),
    }
}

fn legend(config: &ChartConfig) -> Legend {
    let legend = Legend::new().show(config.legend.display);

    match config.legend.position {
        LegendPosition::Top => legend.top(0),
        LegendPosition::Bottom => legend.bottom(0),
    }
}

fn tooltip(config: &ChartConfig) -> Tooltip {
    let trigger = match config.kind {
        ChartKind::Line => Trigger::Axis,
        _ => Trigger::Item,
    };
    let tooltip = Tooltip::new().trigger(trigger);

    match tooltip_table(config) {
        Some(table) => tooltip.formatter(JsFunction::new_with_args(
            "params",
            &format!(
                "const lines = {};
                const points = Array.isArray(params) ? params : [params];
                return points
                    .map((point) => ((lines[point.seriesIndex] || [])[point.dataIndex] || []).join('<br/>'))
                    .filter((text) => text.length > 0)
                    .join('<br/>');",
                serde_json::Value::from(table)
            ),
        )),
        None => tooltip,
    }
}

/// Evaluate the tooltip callback for every data point, indexed by `[dataset][data point]`.
pub fn tooltip_table(config: &ChartConfig) -> Option<Vec<Vec<Vec<String>>>> {
    let callback = config.tooltip.as_ref()?;

    let table = config
        .spec
        .datasets
        .iter()
        .enumerate()
        .map(|(dataset_index, dataset)| {
            dataset
                .values
                .iter()
                .enumerate()
                .map(|(data_index, value)| {
                    let point = TooltipPoint {
                        dataset_index,
                        dataset_label: &dataset.label,
                        data_index,
                        label: config
                            .spec
                            .labels
                            .get(data_index)
                            .map_or("", String::as_str),
                        value: *value,
                    };

                    callback(&point)
                        .iter()
                        .map(|line| escape_html(line))
                        .collect()
                })
                .collect()
        })
        .collect();

    Some(table)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn axis_chart(chart: Chart, config: &ChartConfig) -> Chart {
    let legend_space = if config.legend.display { "12%" } else { "3%" };
    let chart = chart.grid(
        Grid::new()
            .left("3%")
            .right("4%")
            .bottom(legend_space)
            .contain_label(true),
    );

    let (x_scale, y_scale) = match config.scales {
        Some(scales) => (Some(scales.x), Some(scales.y)),
        None => (None, None),
    };

    let category_axis = |scale: Option<AxisScale>| {
        with_grid_lines(
            Axis::new()
                .type_(AxisType::Category)
                .data(config.spec.labels.clone()),
            scale,
        )
    };
    let value_axis = |scale: Option<AxisScale>| {
        with_grid_lines(Axis::new().type_(AxisType::Value), scale)
    };

    let mut chart = match config.index_axis {
        IndexAxis::X => chart
            .x_axis(category_axis(x_scale))
            .y_axis(value_axis(y_scale)),
        // ECharts puts the first category at the bottom, so flip it to list rows top-down.
        IndexAxis::Y => chart
            .x_axis(value_axis(x_scale))
            .y_axis(category_axis(y_scale).inverse(true)),
    };

    for dataset in &config.spec.datasets {
        chart = match config.kind {
            ChartKind::Line => chart.series(line_series(dataset)),
            _ => chart.series(bar_series(dataset)),
        };
    }

    chart
}

fn with_grid_lines(axis: Axis, scale: Option<AxisScale>) -> Axis {
    match scale.map(|scale| scale.grid) {
        Some(GridLines::Visible { color }) => axis.split_line(
            SplitLine::new()
                .show(true)
                .line_style(LineStyle::new().color(color)),
        ),
        Some(GridLines::Hidden) => axis.split_line(SplitLine::new().show(false)),
        None => axis,
    }
}

fn line_series(dataset: &Dataset) -> Line {
    let style = &dataset.style;
    let mut line = Line::new()
        .name(dataset.label.as_str())
        .data(dataset.values.clone());

    if style.tension.is_some_and(|tension| tension > 0.0) {
        line = line.smooth(true);
    }

    if let Some(color) = &style.border_color {
        line = line
            .item_style(ItemStyle::new().color(color.as_str()))
            .line_style(
                LineStyle::new()
                    .color(color.as_str())
                    .width(f64::from(style.border_width.max(1))),
            );
    }

    if style.fill {
        if let Some(color) = style.background_colors.first() {
            line = line.area_style(AreaStyle::new().color(color.as_str()));
        }
    }

    line
}

fn bar_series(dataset: &Dataset) -> Bar {
    let style = &dataset.style;
    let bar = Bar::new().name(dataset.label.as_str());
    let item_style = match style.border_radius {
        Some(radius) => ItemStyle::new().border_radius(f64::from(radius)),
        None => ItemStyle::new(),
    };

    match style.background_colors.as_slice() {
        [] => bar.item_style(item_style).data(dataset.values.clone()),
        [color] => bar
            .item_style(item_style.color(color.as_str()))
            .data(dataset.values.clone()),
        colors => bar.item_style(item_style.clone()).data(
            dataset
                .values
                .iter()
                .zip(colors.iter().cycle())
                .map(|(value, color)| {
                    DataPointItem::new(*value).item_style(item_style.clone().color(color.as_str()))
                })
                .collect(),
        ),
    }
}

fn circular_chart(chart: Chart, config: &ChartConfig) -> Chart {
    let Some(dataset) = config.spec.datasets.first() else {
        return chart;
    };

    let colors: Vec<Color> = dataset
        .style
        .background_colors
        .iter()
        .map(|color| Color::from(color.as_str()))
        .collect();

    let data: Vec<(f64, &str)> = dataset
        .values
        .iter()
        .zip(config.spec.labels.iter())
        .map(|(value, label)| (*value, label.as_str()))
        .collect();

    let pie = Pie::new().name(dataset.label.as_str()).data(data);
    let pie = match config.kind {
        ChartKind::Doughnut => pie.radius(vec!["45%", "70%"]),
        _ => pie.radius("70%"),
    };

    let chart = if colors.is_empty() {
        chart
    } else {
        chart.color(colors)
    };

    chart.series(pie)
}

#[cfg(test)]
mod tests {
    use crate::chart::{
        factory::{ChartFactory, ChartSurface},
        spec::{ChartKind, ChartOptions, ChartSpec, Dataset, DatasetStyle},
    };

    use super::{EChartsSurface, ScriptCommand, tooltip_table};

    fn cash_flow_spec() -> ChartSpec {
        ChartSpec::new(
            vec!["Jan".to_owned(), "Feb".to_owned()],
            vec![
                Dataset::new("Income", vec![100.0, 200.0]).style(DatasetStyle {
                    border_color: Some("#10B981".to_owned()),
                    background_colors: vec!["#10B98120".to_owned()],
                    tension: Some(0.4),
                    border_width: 2,
                    ..Default::default()
                }),
            ],
        )
    }

    #[test]
    fn surface_resolves_only_known_targets() {
        let surface = EChartsSurface::new(["cashFlowChart"]);

        assert!(surface.has_target("cashFlowChart"));
        assert!(!surface.has_target("temporalChart"));
    }

    #[test]
    fn mount_records_valid_echarts_options() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["cashFlowChart"]));

        factory.create(
            ChartKind::Line,
            "cashFlowChart",
            Some(cash_flow_spec()),
            ChartOptions::default(),
        );

        let surface = factory.into_surface();
        let [ScriptCommand::Mount { target, options }] = surface.commands() else {
            panic!("expected a single mount, got {:?}", surface.commands());
        };
        assert_eq!(target, "cashFlowChart");
        let options: serde_json::Value =
            serde_json::from_str(options).expect("options should be valid JSON");
        let text = options.to_string();
        assert!(text.contains("\"Income\""), "{text}");
        assert!(text.contains("\"Jan\""), "{text}");
    }

    #[test]
    fn replacing_a_chart_disposes_before_mounting() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["cashFlowChart"]));

        for _ in 0..2 {
            factory.create(
                ChartKind::Line,
                "cashFlowChart",
                Some(cash_flow_spec()),
                ChartOptions::default(),
            );
        }

        let kinds: Vec<_> = factory
            .surface()
            .commands()
            .iter()
            .map(|command| match command {
                ScriptCommand::Mount { .. } => "mount",
                ScriptCommand::Dispose { .. } => "dispose",
                ScriptCommand::Clear { .. } => "clear",
            })
            .collect();
        assert_eq!(kinds, vec!["mount", "dispose", "mount"]);
    }

    #[test]
    fn script_targets_element_and_sets_options() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["expenseDistributionChart"]));
        factory.clear("expenseDistributionChart");

        let script = factory.surface().script();

        assert!(script.contains(r#"document.getElementById("expenseDistributionChart")"#));
        assert!(script.contains("chartDom.replaceChildren()"));
    }

    #[test]
    fn disposing_removes_listeners_added_by_mount() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["cashFlowChart"]));
        factory.create(
            ChartKind::Line,
            "cashFlowChart",
            Some(cash_flow_spec()),
            ChartOptions::default(),
        );
        factory.destroy("cashFlowChart");

        let script = factory.surface().script();
        let (mount, dispose) = script
            .split_once("})();")
            .expect("expected a mount and a dispose script");

        assert!(mount.contains("window.addEventListener('resize', resize)"));
        assert!(mount.contains("chartDom.releaseListeners = () =>"));
        assert!(mount.contains("window.removeEventListener('resize', resize)"));
        assert!(mount.contains("darkModeMediaQuery.removeEventListener('change', updateTheme)"));
        assert!(dispose.contains("existing.dispose()"));
        assert!(dispose.contains("chartDom.releaseListeners()"));
    }

    fn mounted_options(factory: &ChartFactory<EChartsSurface>) -> serde_json::Value {
        let Some(ScriptCommand::Mount { options, .. }) = factory.surface().commands().last() else {
            panic!("expected a mount, got {:?}", factory.surface().commands());
        };

        serde_json::from_str(options).expect("options should be valid JSON")
    }

    #[test]
    fn horizontal_bars_list_first_row_at_top() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["serviceRevenueChart"]));
        let spec = ChartSpec::new(
            vec!["Plumbing".to_owned(), "Gas".to_owned()],
            vec![Dataset::new("Revenue", vec![200.0, 100.0])],
        );

        factory.create(
            ChartKind::HorizontalBar,
            "serviceRevenueChart",
            Some(spec),
            ChartOptions::default(),
        );

        let options = mounted_options(&factory);
        assert_eq!(options["yAxis"]["type"], "category");
        assert_eq!(options["yAxis"]["inverse"], true);
        assert_eq!(options["xAxis"]["type"], "value");
    }

    #[test]
    fn bars_use_per_bar_colors_and_border_radius() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["businessLinesChart"]));
        let spec = ChartSpec::new(
            vec!["Residential".to_owned(), "Commercial".to_owned()],
            vec![Dataset::new("Revenue", vec![42.0, 7.0]).style(DatasetStyle {
                background_colors: vec!["#3B82F6".to_owned(), "#10B981".to_owned()],
                border_radius: Some(8),
                ..Default::default()
            })],
        );

        factory.create(
            ChartKind::Bar,
            "businessLinesChart",
            Some(spec),
            ChartOptions::default(),
        );

        let options = mounted_options(&factory);
        let data = &options["series"][0]["data"];
        assert_eq!(data[0]["value"], 42.0);
        assert_eq!(data[0]["itemStyle"]["color"], "#3B82F6");
        assert_eq!(data[1]["itemStyle"]["color"], "#10B981");
        assert_eq!(data[1]["itemStyle"]["borderRadius"], 8.0);
    }

    #[test]
    fn script_escapes_closing_tags() {
        let mut factory = ChartFactory::new(EChartsSurface::new(["a"]));
        let spec = ChartSpec::new(
            vec!["</script><b>".to_owned()],
            vec![Dataset::new("Values", vec![1.0])],
        );
        factory.create(ChartKind::Bar, "a", Some(spec), ChartOptions::default());

        let script = factory.surface().script();

        assert!(!script.contains("</script>"), "{script}");
    }

    #[test]
    fn tooltip_table_evaluates_callback_per_point() {
        let config = crate::chart::config::ChartConfig::build(
            ChartKind::Line,
            cash_flow_spec(),
            ChartOptions::default().tooltip(|point| {
                vec![format!(
                    "{} {}: {} <{}>",
                    point.dataset_label, point.label, point.value, point.data_index
                )]
            }),
        );

        let table = tooltip_table(&config).expect("tooltip callback was provided");

        assert_eq!(
            table,
            vec![vec![
                vec!["Income Jan: 100 &lt;0&gt;".to_owned()],
                vec!["Income Feb: 200 &lt;1&gt;".to_owned()],
            ]]
        );
    }

    #[test]
    fn no_tooltip_table_without_callback() {
        let config = crate::chart::config::ChartConfig::build(
            ChartKind::Line,
            cash_flow_spec(),
            ChartOptions::default(),
        );

        assert!(tooltip_table(&config).is_none());
    }
}
