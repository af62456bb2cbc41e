//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The handler for the full dashboard page
//! - The handler for re-rendering one widget for a time range (htmx fragment)
//! - The maud views for chart cards and preset buttons

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, PreEscaped, html};
use serde::Deserialize;

use crate::{
    AppState, Error,
    api::{BusinessLineLevel, DashboardApi, Session},
    chart::echarts::EChartsSurface,
    dashboard::{
        charts::{ChartWidget, DashboardCharts, targets},
        payload::DashboardPayload,
        widgets::{Refresh, Widget, WidgetFilter, WidgetSequences},
    },
    endpoints::{self, format_endpoint},
    format::Palette,
    html::{
        CARD_STYLE, CARD_TITLE_STYLE, ECHARTS_SCRIPT, HeadElement, PAGE_CONTAINER_STYLE,
        PRESET_BUTTON_ACTIVE_STYLE, PRESET_BUTTON_INACTIVE_STYLE, PRESET_BUTTON_STYLE, base,
        on_page_load,
    },
    time_range::{Preset, preset_buttons},
    timezone::local_today,
};

/// The cards on the dashboard, in page order.
const CHART_WIDGETS: [ChartWidget; 6] = [
    ChartWidget::CashFlow,
    ChartWidget::ExpenseDistribution,
    ChartWidget::ServiceRevenue,
    ChartWidget::ServiceProfitability,
    ChartWidget::ExpenseTrends,
    ChartWidget::BusinessLines,
];

/// The state needed for displaying the dashboard page.
#[derive(Clone)]
pub struct DashboardState {
    /// Where the dashboard's data comes from.
    pub api: Arc<dyn DashboardApi>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub widget_sequences: WidgetSequences,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            local_timezone: state.local_timezone.clone(),
            widget_sequences: state.widget_sequences.clone(),
        }
    }
}

/// Query parameters for re-rendering a widget.
#[derive(Debug, Default, Deserialize)]
pub struct WidgetQuery {
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub level: BusinessLineLevel,
}

/// Display the dashboard with every chart rendered from the overview payload.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    session: Session,
) -> Result<Response, Error> {
    // Fail early on a bad timezone, the widget fragments would fail on it anyway.
    local_today(&state.local_timezone)?;

    let (payload, load_failed) = match state.api.overview(&session).await {
        Ok(payload) => (payload, false),
        Err(error) => {
            tracing::error!("could not load dashboard overview: {error}");
            (DashboardPayload::default(), true)
        }
    };

    let mut charts = DashboardCharts::new(EChartsSurface::new(targets::ALL), Palette::default());
    let report = charts.init(&payload);
    let failed_widgets: HashSet<ChartWidget> =
        report.failures.iter().map(|(widget, _)| *widget).collect();
    let script = charts.into_surface().script();

    Ok(dashboard_view(&failed_widgets, load_failed, &script).into_response())
}

/// Re-render one widget's chart for the selected time range.
///
/// Responds with the widget's preset buttons, swapped out-of-band so the
/// selection is highlighted, and the script that redraws the chart.
///
/// Responds with 204 No Content, so htmx swaps nothing, if a newer request for
/// the same widget arrived from the same session while this one was fetching.
pub async fn get_widget_fragment(
    State(state): State<DashboardState>,
    Path(slug): Path<String>,
    Query(query): Query<WidgetQuery>,
    session: Session,
) -> Response {
    let Ok(widget) = slug.parse::<Widget>() else {
        return Error::NotFound.into_response();
    };

    match render_widget(&state, widget, &query, session).await {
        Ok(Some(fragment)) => fragment.into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => widget_error_response(error),
    }
}

/// A poisoned chart lock leaves nothing sensible to swap in, so send the
/// client to the error page instead of an alert.
fn widget_error_response(error: Error) -> Response {
    match error {
        Error::ChartLockError => {
            tracing::error!("{error}");
            (
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                StatusCode::OK,
            )
                .into_response()
        }
        error => error.into_alert_response(),
    }
}

async fn render_widget(
    state: &DashboardState,
    widget: Widget,
    query: &WidgetQuery,
    session: Session,
) -> Result<Option<Markup>, Error> {
    let today = local_today(&state.local_timezone)?;
    let sequence = state.widget_sequences.get(widget, &session)?;

    let charts = Arc::new(Mutex::new(DashboardCharts::new(
        EChartsSurface::new([widget.target()]),
        Palette::default(),
    )));
    let filter = WidgetFilter::new(widget, state.api.clone(), charts.clone(), today)
        .session(session)
        .sequence(sequence)
        .level(query.level);

    if let Refresh::Stale { .. } = filter.select(query.preset).await? {
        return Ok(None);
    }

    let script = charts
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire chart lock: {error}"))
        .map_err(|_| Error::ChartLockError)?
        .surface()
        .script();

    Ok(Some(widget_fragment(
        widget,
        query.preset,
        query.level,
        &script,
    )))
}

fn widget_url(widget: Widget, preset: Preset, level: BusinessLineLevel) -> String {
    let path = format_endpoint(endpoints::DASHBOARD_WIDGET, widget.slug());

    match widget {
        Widget::BusinessLines => format!("{path}?preset={preset}&level={}", level.get()),
        _ => format!("{path}?preset={preset}"),
    }
}

fn script_container_id(widget: Widget) -> String {
    format!("{}Script", widget.target())
}

fn filterable(chart: ChartWidget) -> Option<Widget> {
    Widget::ALL
        .into_iter()
        .find(|widget| widget.target() == chart.target())
}

fn preset_button_group(
    widget: Widget,
    active: Preset,
    level: BusinessLineLevel,
    out_of_band: bool,
) -> Markup {
    let script_target = format!("#{}", script_container_id(widget));
    let sync = format!("#{}:replace", widget.filter_id());

    html! {
        div
            id=(widget.filter_id())
            role="group"
            aria-label={ (widget.title()) " time range" }
            class="flex flex-wrap gap-1"
            hx-swap-oob=[out_of_band.then_some("true")]
        {
            @for button in preset_buttons(active) {
                @let state_style = if button.active {
                    PRESET_BUTTON_ACTIVE_STYLE
                } else {
                    PRESET_BUTTON_INACTIVE_STYLE
                };

                button
                    type="button"
                    class={ (PRESET_BUTTON_STYLE) " " (state_style) }
                    data-preset=(button.preset.as_query_value())
                    aria-pressed=(button.active)
                    hx-get=(widget_url(widget, button.preset, level))
                    hx-target=(script_target)
                    hx-swap="innerHTML"
                    hx-sync=(sync)
                {
                    (button.preset.label())
                }
            }
        }
    }
}

fn chart_card(chart: ChartWidget, failed: bool) -> Markup {
    let widget = filterable(chart);

    html! {
        div class=(CARD_STYLE)
        {
            div class="flex flex-wrap items-center justify-between gap-2"
            {
                h3 class=(CARD_TITLE_STYLE) { (chart.title()) }

                @if let Some(widget) = widget {
                    (preset_button_group(widget, Preset::All, BusinessLineLevel::default(), false))
                }
            }

            @if failed {
                p class="text-sm text-red-600 dark:text-red-400"
                {
                    "This chart could not be displayed because its data was malformed."
                }
            }

            div
                id=(chart.target())
                class="min-h-[320px] rounded dark:bg-gray-100"
            {}

            @if let Some(widget) = widget {
                div id=(script_container_id(widget)) class="hidden" {}
            }
        }
    }
}

fn dashboard_view(failed_widgets: &HashSet<ChartWidget>, load_failed: bool, script: &str) -> Markup {
    let content = html!(
        div
            id="dashboard-content"
            class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-2xl font-bold my-4 self-start" { "Dashboard" }

            @if load_failed {
                div
                    role="alert"
                    class="w-full p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50
                        dark:bg-gray-800 dark:text-red-400"
                {
                    "Could not load the dashboard data. Try refreshing the page."
                }
            }

            section
                id="charts"
                class="w-full mx-auto mb-4"
            {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @for chart in CHART_WIDGETS {
                        (chart_card(chart, failed_widgets.contains(&chart)))
                    }
                }
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        on_page_load(script),
    ];

    base("Dashboard", &scripts, &content)
}

fn widget_fragment(widget: Widget, preset: Preset, level: BusinessLineLevel, script: &str) -> Markup {
    html! {
        (preset_button_group(widget, preset, level, true))

        script { (PreEscaped(script)) }
    }
}
