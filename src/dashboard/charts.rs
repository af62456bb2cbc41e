//! Turns dashboard API payloads into charts.
//!
//! Each render function maps one widget's rows onto a [ChartSpec] and hands
//! it to the [ChartFactory]. [DashboardCharts::init] renders every widget in a
//! fixed order and keeps going when one widget's data is malformed.

use std::fmt;

use serde_json::Value;

use crate::{
    chart::{
        factory::{ChartFactory, ChartSurface},
        spec::{ChartKind, ChartOptions, ChartSpec, Dataset, DatasetStyle, TooltipPoint},
    },
    dashboard::payload::{
        BusinessLineRevenue, CashFlowPoint, DashboardPayload, ExpenseCategoryTotal, ExpenseTrends,
        ServiceProfitability, ServiceRevenue, decode_section,
    },
    format::{
        Palette, colors, format_amount, format_currency, format_number, format_percent,
        format_percentage, parse_float_safe, with_alpha,
    },
};

/// The element IDs of the dashboard's chart containers.
pub mod targets {
    pub const CASH_FLOW: &str = "cashFlowChart";
    pub const EXPENSE_DISTRIBUTION: &str = "expenseDistributionChart";
    pub const SERVICE_REVENUE: &str = "serviceRevenueChart";
    pub const SERVICE_PROFITABILITY: &str = "serviceProfitabilityChart";
    pub const EXPENSE_TRENDS: &str = "expenseTrendsChart";
    pub const BUSINESS_LINES: &str = "businessLinesChart";

    /// Every chart container, in render order.
    pub const ALL: [&str; 6] = [
        CASH_FLOW,
        EXPENSE_DISTRIBUTION,
        SERVICE_REVENUE,
        SERVICE_PROFITABILITY,
        EXPENSE_TRENDS,
        BUSINESS_LINES,
    ];
}

/// A chart on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartWidget {
    CashFlow,
    ExpenseDistribution,
    ServiceRevenue,
    ServiceProfitability,
    ExpenseTrends,
    BusinessLines,
}

impl ChartWidget {
    pub fn target(self) -> &'static str {
        match self {
            Self::CashFlow => targets::CASH_FLOW,
            Self::ExpenseDistribution => targets::EXPENSE_DISTRIBUTION,
            Self::ServiceRevenue => targets::SERVICE_REVENUE,
            Self::ServiceProfitability => targets::SERVICE_PROFITABILITY,
            Self::ExpenseTrends => targets::EXPENSE_TRENDS,
            Self::BusinessLines => targets::BUSINESS_LINES,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CashFlow => "Cash Flow",
            Self::ExpenseDistribution => "Expense Distribution",
            Self::ServiceRevenue => "Service Revenue",
            Self::ServiceProfitability => "Service Profitability",
            Self::ExpenseTrends => "Expense Trends",
            Self::BusinessLines => "Business Lines",
        }
    }
}

impl fmt::Display for ChartWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The widgets whose payload section could not be decoded during [DashboardCharts::init].
#[derive(Debug, Default)]
pub struct InitReport {
    pub failures: Vec<(ChartWidget, String)>,
}

impl InitReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders the dashboard's charts onto a surface.
pub struct DashboardCharts<S: ChartSurface> {
    factory: ChartFactory<S>,
    palette: Palette,
}

impl<S: ChartSurface> DashboardCharts<S> {
    pub fn new(surface: S, palette: Palette) -> Self {
        Self {
            factory: ChartFactory::new(surface),
            palette,
        }
    }

    /// Render every chart from `payload`.
    ///
    /// Charts are rendered in a fixed order. A section that fails to decode
    /// is logged and reported, and the remaining charts are still rendered.
    pub fn init(&mut self, payload: &DashboardPayload) -> InitReport {
        let mut report = InitReport::default();

        match decode_section::<Vec<CashFlowPoint>>(&payload.cashflow_data) {
            Ok(data) => {
                self.render_cash_flow(data.as_deref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::CashFlow, error),
        }

        match decode_section::<Vec<ExpenseCategoryTotal>>(&payload.expense_distribution) {
            Ok(data) => {
                self.render_expense_distribution(data.as_deref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::ExpenseDistribution, error),
        }

        match decode_section::<Vec<ServiceRevenue>>(&payload.service_revenue) {
            Ok(data) => {
                self.render_service_revenue(data.as_deref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::ServiceRevenue, error),
        }

        match decode_section::<Vec<ServiceProfitability>>(&payload.service_profitability) {
            Ok(data) => {
                self.render_service_profitability(data.as_deref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::ServiceProfitability, error),
        }

        match decode_section::<ExpenseTrends>(&payload.expense_trends) {
            Ok(data) => {
                self.render_expense_trends(data.as_ref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::ExpenseTrends, error),
        }

        match decode_section::<Vec<BusinessLineRevenue>>(&payload.business_lines_data) {
            Ok(data) => {
                self.render_business_lines(data.as_deref());
            }
            Err(error) => report_failure(&mut report, ChartWidget::BusinessLines, error),
        }

        report
    }

    /// Destroy every chart rendered so far.
    pub fn destroy(&mut self) {
        self.factory.destroy_all();
    }

    /// Income, expenses and net cash flow per month.
    ///
    /// Empty or absent data leaves any existing chart as it is.
    pub fn render_cash_flow(&mut self, data: Option<&[CashFlowPoint]>) -> bool {
        let Some(rows) = data.filter(|rows| !rows.is_empty()) else {
            return false;
        };

        let labels = rows.iter().map(|row| row.month.clone()).collect();
        let series: [(&str, fn(&CashFlowPoint) -> &Value, &str, bool); 3] = [
            ("Income", |row| &row.income, colors::SUCCESS, false),
            ("Expenses", |row| &row.expenses, colors::DANGER, false),
            ("Cash Flow", |row| &row.cash_flow, colors::PRIMARY, true),
        ];

        let datasets = series
            .into_iter()
            .filter(|(_, field, _, _)| rows.iter().any(|row| !field(row).is_null()))
            .map(|(label, field, color, fill)| {
                let values = rows.iter().map(|row| parse_float_safe(field(row))).collect();
                line_dataset(label, values, color, "20", fill)
            })
            .collect();

        self.factory
            .create(
                ChartKind::Line,
                targets::CASH_FLOW,
                Some(ChartSpec::new(labels, datasets)),
                ChartOptions::default().tooltip(series_currency_tooltip),
            )
            .is_some()
    }

    /// Share of expenses per category.
    ///
    /// Unlike the other charts, empty or absent data clears the chart so a
    /// filtered view with no expenses does not keep showing stale slices.
    pub fn render_expense_distribution(&mut self, data: Option<&[ExpenseCategoryTotal]>) -> bool {
        let target = targets::EXPENSE_DISTRIBUTION;

        let Some(rows) = data.filter(|rows| !rows.is_empty()) else {
            self.factory.clear(target);
            return false;
        };

        let labels = rows.iter().map(|row| row.name.clone()).collect();
        let values = rows.iter().map(|row| parse_float_safe(&row.total)).collect();
        let slice_colors = self
            .palette
            .generate(rows.len())
            .into_iter()
            .map(str::to_owned)
            .collect();
        let dataset = Dataset::new("Expenses", values).style(DatasetStyle {
            background_colors: slice_colors,
            ..Default::default()
        });

        let percentages: Vec<Value> = rows.iter().map(|row| row.percentage.clone()).collect();
        let tooltip = move |point: &TooltipPoint<'_>| {
            let percentage = percentages.get(point.data_index).unwrap_or(&Value::Null);
            vec![format!(
                "{}: {} ({})",
                point.label,
                format_amount(point.value),
                format_percentage(percentage)
            )]
        };

        self.factory
            .create(
                ChartKind::Doughnut,
                target,
                Some(ChartSpec::new(labels, vec![dataset])),
                ChartOptions::default().tooltip(tooltip),
            )
            .is_some()
    }

    /// Revenue per service type, with job count and average job value in the tooltip.
    pub fn render_service_revenue(&mut self, data: Option<&[ServiceRevenue]>) -> bool {
        let Some(rows) = data.filter(|rows| !rows.is_empty()) else {
            return false;
        };

        let labels = rows.iter().map(|row| row.name.clone()).collect();
        let values = rows
            .iter()
            .map(|row| parse_float_safe(&row.revenue))
            .collect();
        let dataset = bar_dataset("Revenue", values, colors::PRIMARY);

        let rows = rows.to_vec();
        let tooltip = move |point: &TooltipPoint<'_>| {
            let Some(row) = rows.get(point.data_index) else {
                return vec![];
            };

            vec![
                format!(
                    "Revenue: {} ({})",
                    format_amount(point.value),
                    format_percentage(&row.percentage)
                ),
                format!("Jobs: {}", format_number(&row.count)),
                format!("Average: {}", format_currency(&row.avg_revenue)),
            ]
        };

        self.factory
            .create(
                ChartKind::HorizontalBar,
                targets::SERVICE_REVENUE,
                Some(ChartSpec::new(labels, vec![dataset])),
                ChartOptions::default().tooltip(tooltip),
            )
            .is_some()
    }

    /// Profit margin per service type, with revenue in the tooltip.
    pub fn render_service_profitability(&mut self, data: Option<&[ServiceProfitability]>) -> bool {
        let Some(rows) = data.filter(|rows| !rows.is_empty()) else {
            return false;
        };

        let labels = rows.iter().map(|row| row.name.clone()).collect();
        let values = rows
            .iter()
            .map(|row| parse_float_safe(&row.profit_margin))
            .collect();
        let dataset = bar_dataset("Profit Margin (%)", values, colors::SUCCESS);

        let revenues: Vec<Value> = rows.iter().map(|row| row.revenue.clone()).collect();
        let tooltip = move |point: &TooltipPoint<'_>| {
            let revenue = revenues.get(point.data_index).unwrap_or(&Value::Null);
            vec![format!(
                "{} margin ({} revenue)",
                format_percent(point.value),
                format_currency(revenue)
            )]
        };

        self.factory
            .create(
                ChartKind::HorizontalBar,
                targets::SERVICE_PROFITABILITY,
                Some(ChartSpec::new(labels, vec![dataset])),
                ChartOptions::default().tooltip(tooltip),
            )
            .is_some()
    }

    /// Monthly totals for the top expense categories, one line per category.
    pub fn render_expense_trends(&mut self, data: Option<&ExpenseTrends>) -> bool {
        let Some(trends) =
            data.filter(|trends| !trends.categories.is_empty() && !trends.monthly_trends.is_empty())
        else {
            return false;
        };

        let labels = trends
            .monthly_trends
            .iter()
            .map(|month| month.month.clone())
            .collect();
        let datasets = trends
            .categories
            .iter()
            .enumerate()
            .map(|(index, category)| {
                let values = trends
                    .monthly_trends
                    .iter()
                    .map(|month| month.total_for(category))
                    .collect();
                line_dataset(
                    &category.name,
                    values,
                    self.palette.color_at(index),
                    "30",
                    false,
                )
            })
            .collect();

        self.factory
            .create(
                ChartKind::Line,
                targets::EXPENSE_TRENDS,
                Some(ChartSpec::new(labels, datasets)),
                ChartOptions::default().tooltip(series_currency_tooltip),
            )
            .is_some()
    }

    /// Revenue per business line.
    pub fn render_business_lines(&mut self, data: Option<&[BusinessLineRevenue]>) -> bool {
        let Some(rows) = data.filter(|rows| !rows.is_empty()) else {
            return false;
        };

        let labels = rows.iter().map(|row| row.name.clone()).collect();
        let values = rows
            .iter()
            .map(|row| parse_float_safe(&row.revenue))
            .collect();
        let dataset = Dataset::new("Revenue", values).style(DatasetStyle {
            background_colors: (0..rows.len())
                .map(|index| self.palette.color_at(index).to_owned())
                .collect(),
            border_radius: Some(8),
            ..Default::default()
        });

        let percentages: Vec<Value> = rows.iter().map(|row| row.percentage.clone()).collect();
        let tooltip = move |point: &TooltipPoint<'_>| {
            let percentage = percentages.get(point.data_index).unwrap_or(&Value::Null);
            vec![format!(
                "Revenue: {} ({})",
                format_amount(point.value),
                format_percentage(percentage)
            )]
        };

        self.factory
            .create(
                ChartKind::Bar,
                targets::BUSINESS_LINES,
                Some(ChartSpec::new(labels, vec![dataset])),
                ChartOptions::default().show_legend(false).tooltip(tooltip),
            )
            .is_some()
    }

    pub fn factory(&self) -> &ChartFactory<S> {
        &self.factory
    }

    pub fn surface(&self) -> &S {
        self.factory.surface()
    }

    pub fn into_surface(self) -> S {
        self.factory.into_surface()
    }
}

fn report_failure(report: &mut InitReport, widget: ChartWidget, error: serde_json::Error) {
    tracing::warn!("could not decode {widget} data, skipping chart: {error}");
    report.failures.push((widget, error.to_string()));
}

fn series_currency_tooltip(point: &TooltipPoint<'_>) -> Vec<String> {
    vec![format!(
        "{}: {}",
        point.dataset_label,
        format_amount(point.value)
    )]
}

fn line_dataset(label: &str, values: Vec<f64>, color: &str, alpha: &str, fill: bool) -> Dataset {
    Dataset::new(label, values).style(DatasetStyle {
        border_color: Some(color.to_owned()),
        background_colors: vec![with_alpha(color, alpha)],
        fill,
        tension: Some(0.4),
        border_width: 2,
        border_radius: None,
    })
}

fn bar_dataset(label: &str, values: Vec<f64>, color: &str) -> Dataset {
    Dataset::new(label, values).style(DatasetStyle {
        background_colors: vec![color.to_owned()],
        border_radius: Some(8),
        ..Default::default()
    })
}
