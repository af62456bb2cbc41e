//! Widgets whose chart can be narrowed to a time range.
//!
//! A [WidgetFilter] ties a [TimeRangeFilter] to one chart: each selection
//! fetches fresh rows from the dashboard API and re-renders the chart.
//! Selections can overlap while a fetch is in flight, so every refresh takes
//! a ticket from a [RequestSequence] and only the newest ticket may render.

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    api::{BusinessLineLevel, DashboardApi, Session},
    chart::factory::ChartSurface,
    dashboard::{
        charts::{DashboardCharts, targets},
        payload::{BusinessLineRevenue, ExpenseCategoryTotal, ServiceRevenue},
    },
    time_range::{Preset, RangeChange, TimeRangeFilter},
};

/// A chart with its own time range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Widget {
    ExpenseDistribution,
    ServiceRevenue,
    BusinessLines,
}

impl Widget {
    pub const ALL: [Widget; 3] = [
        Self::ExpenseDistribution,
        Self::ServiceRevenue,
        Self::BusinessLines,
    ];

    /// The element ID of the widget's chart container.
    pub fn target(self) -> &'static str {
        match self {
            Self::ExpenseDistribution => targets::EXPENSE_DISTRIBUTION,
            Self::ServiceRevenue => targets::SERVICE_REVENUE,
            Self::BusinessLines => targets::BUSINESS_LINES,
        }
    }

    /// The element ID of the widget's preset buttons.
    pub fn filter_id(self) -> &'static str {
        match self {
            Self::ExpenseDistribution => "expenseDistributionFilter",
            Self::ServiceRevenue => "serviceRevenueFilter",
            Self::BusinessLines => "businessLinesFilter",
        }
    }

    /// The path segment identifying the widget in fragment routes.
    pub fn slug(self) -> &'static str {
        match self {
            Self::ExpenseDistribution => "expense-distribution",
            Self::ServiceRevenue => "service-revenue",
            Self::BusinessLines => "business-lines",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ExpenseDistribution => "Expense Distribution",
            Self::ServiceRevenue => "Service Revenue",
            Self::BusinessLines => "Business Lines",
        }
    }

    /// Fetch the widget's rows for `range`.
    pub async fn fetch(
        self,
        api: &dyn DashboardApi,
        range: &RangeChange,
        level: BusinessLineLevel,
        session: &Session,
    ) -> Result<WidgetRows, Error> {
        match self {
            Self::ExpenseDistribution => api
                .expense_distribution(range, session)
                .await
                .map(WidgetRows::ExpenseDistribution),
            Self::ServiceRevenue => api
                .service_revenue(range, session)
                .await
                .map(WidgetRows::ServiceRevenue),
            Self::BusinessLines => api
                .business_lines(range, level, session)
                .await
                .map(WidgetRows::BusinessLines),
        }
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown widget \"{0}\"")]
pub struct UnknownWidget(pub String);

impl FromStr for Widget {
    type Err = UnknownWidget;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|widget| widget.slug() == slug)
            .ok_or_else(|| UnknownWidget(slug.to_owned()))
    }
}

impl<'de> Deserialize<'de> for Widget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let slug = String::deserialize(deserializer)?;
        slug.parse().map_err(serde::de::Error::custom)
    }
}

/// Rows fetched for one widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetRows {
    ExpenseDistribution(Vec<ExpenseCategoryTotal>),
    ServiceRevenue(Vec<ServiceRevenue>),
    BusinessLines(Vec<BusinessLineRevenue>),
}

impl WidgetRows {
    /// No rows, as rendered when a fetch fails.
    pub fn empty(widget: Widget) -> Self {
        match widget {
            Widget::ExpenseDistribution => Self::ExpenseDistribution(vec![]),
            Widget::ServiceRevenue => Self::ServiceRevenue(vec![]),
            Widget::BusinessLines => Self::BusinessLines(vec![]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::ExpenseDistribution(rows) => rows.len(),
            Self::ServiceRevenue(rows) => rows.len(),
            Self::BusinessLines(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the rows on their widget's chart, returning whether a chart was drawn.
    pub fn render<S: ChartSurface>(&self, charts: &mut DashboardCharts<S>) -> bool {
        match self {
            Self::ExpenseDistribution(rows) => charts.render_expense_distribution(Some(rows)),
            Self::ServiceRevenue(rows) => charts.render_service_revenue(Some(rows)),
            Self::BusinessLines(rows) => charts.render_business_lines(Some(rows)),
        }
    }
}

/// Hands out increasing tickets and remembers the newest one.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket that supersedes every ticket taken before it.
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

/// The [RequestSequence] of each widget for each session.
///
/// Fragment requests build a fresh [WidgetFilter] each time, so the sequences
/// live here to let a newer request for the same widget and session
/// supersede an older one that is still fetching.
#[derive(Debug, Clone, Default)]
pub struct WidgetSequences {
    sequences: Arc<Mutex<HashMap<(Widget, Option<String>), RequestSequence>>>,
}

impl WidgetSequences {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence shared by every request for `widget` from `session`.
    pub fn get(&self, widget: Widget, session: &Session) -> Result<RequestSequence, Error> {
        let mut sequences = self
            .sequences
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire widget sequences lock: {error}"))
            .map_err(|_| Error::ChartLockError)?;

        Ok(sequences
            .entry((widget, session.cookie().map(str::to_owned)))
            .or_default()
            .clone())
    }
}

/// The result of a [WidgetFilter] refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The rows were rendered; `drawn` is false when there was nothing to draw.
    Rendered { change: RangeChange, drawn: bool },
    /// A newer selection was made while fetching, so the rows were discarded.
    Stale { change: RangeChange },
}

/// Refreshes one widget's chart whenever its time range changes.
pub struct WidgetFilter<S: ChartSurface> {
    widget: Widget,
    level: BusinessLineLevel,
    api: Arc<dyn DashboardApi>,
    session: Session,
    charts: Arc<Mutex<DashboardCharts<S>>>,
    filter: Mutex<TimeRangeFilter>,
    sequence: RequestSequence,
}

impl<S: ChartSurface> WidgetFilter<S> {
    pub fn new(
        widget: Widget,
        api: Arc<dyn DashboardApi>,
        charts: Arc<Mutex<DashboardCharts<S>>>,
        today: Date,
    ) -> Self {
        Self {
            widget,
            level: BusinessLineLevel::default(),
            api,
            session: Session::anonymous(),
            charts,
            filter: Mutex::new(TimeRangeFilter::new(today)),
            sequence: RequestSequence::new(),
        }
    }

    /// Send `session` with every fetch.
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Take tickets from `sequence`, so that selections made through other
    /// filters sharing it also supersede this one.
    pub fn sequence(mut self, sequence: RequestSequence) -> Self {
        self.sequence = sequence;
        self
    }

    /// Request business lines at `level`. Ignored by the other widgets.
    pub fn level(mut self, level: BusinessLineLevel) -> Self {
        self.level = level;
        self
    }

    pub fn widget(&self) -> Widget {
        self.widget
    }

    /// Select [Preset::All] and render the widget.
    pub async fn init(&self) -> Result<Refresh, Error> {
        self.select(Preset::All).await
    }

    /// Select `preset`, fetch the rows for its range and render them.
    ///
    /// A failed fetch is logged and rendered as no rows. If another selection
    /// is made before the fetch completes, this one's rows are discarded.
    pub async fn select(&self, preset: Preset) -> Result<Refresh, Error> {
        let change = self
            .filter
            .lock()
            .map_err(|_| Error::ChartLockError)?
            .select(preset);
        let ticket = self.sequence.next();

        let rows = self
            .widget
            .fetch(self.api.as_ref(), &change, self.level, &self.session)
            .await
            .unwrap_or_else(|error| {
                tracing::error!("could not fetch {} data: {error}", self.widget);
                WidgetRows::empty(self.widget)
            });

        if !self.sequence.is_latest(ticket) {
            tracing::debug!(
                "discarding {} rows for \"{}\": a newer selection was made",
                self.widget,
                change.preset
            );
            return Ok(Refresh::Stale { change });
        }

        let mut charts = self
            .charts
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire chart lock: {error}"))
            .map_err(|_| Error::ChartLockError)?;
        let drawn = rows.render(&mut charts);

        Ok(Refresh::Rendered { change, drawn })
    }

    pub fn preset(&self) -> Preset {
        self.filter
            .lock()
            .map(|filter| filter.state().current_preset)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use time::macros::date;

    use crate::{
        api::Session,
        dashboard::charts::{DashboardCharts, targets},
        format::Palette,
        test_utils::{FakeDashboardApi, RecordingSurface, SurfaceEvent},
        time_range::Preset,
    };

    use super::{Refresh, RequestSequence, Widget, WidgetFilter, WidgetSequences};

    fn charts() -> Arc<Mutex<DashboardCharts<RecordingSurface>>> {
        Arc::new(Mutex::new(DashboardCharts::new(
            RecordingSurface::with_targets(&targets::ALL),
            Palette::default(),
        )))
    }

    #[test]
    fn only_newest_ticket_is_latest() {
        let sequence = RequestSequence::new();

        let first = sequence.next();
        let second = sequence.next();

        assert!(!sequence.is_latest(first));
        assert!(sequence.is_latest(second));
    }

    #[test]
    fn sequences_are_shared_per_widget_and_session() {
        let sequences = WidgetSequences::new();
        let session = Session::with_cookie("sessionid=abc");

        let first = sequences.get(Widget::ServiceRevenue, &session).unwrap();
        let ticket = first.next();
        let same = sequences.get(Widget::ServiceRevenue, &session).unwrap();
        let other_widget = sequences.get(Widget::BusinessLines, &session).unwrap();
        let other_session = sequences
            .get(Widget::ServiceRevenue, &Session::anonymous())
            .unwrap();

        assert!(same.is_latest(ticket));
        same.next();
        assert!(!first.is_latest(ticket));
        assert!(!other_widget.is_latest(ticket));
        assert!(!other_session.is_latest(ticket));
    }

    #[tokio::test]
    async fn filters_sharing_a_sequence_discard_older_selection() {
        let api = Arc::new(
            FakeDashboardApi::default().delay_for("2025-05-15", Duration::from_millis(100)),
        );
        let sequence = RequestSequence::new();
        let older = WidgetFilter::new(
            Widget::ServiceRevenue,
            api.clone(),
            charts(),
            date!(2025 - 06 - 15),
        )
        .sequence(sequence.clone());
        let newer = WidgetFilter::new(
            Widget::ServiceRevenue,
            api,
            charts(),
            date!(2025 - 06 - 15),
        )
        .sequence(sequence);

        let (older, newer) = tokio::join!(older.select(Preset::Month), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            newer.select(Preset::Year).await
        });

        assert!(matches!(older.unwrap(), Refresh::Stale { .. }));
        assert!(matches!(newer.unwrap(), Refresh::Rendered { .. }));
    }

    #[test]
    fn widgets_parse_from_slugs() {
        for widget in Widget::ALL {
            assert_eq!(widget.slug().parse::<Widget>(), Ok(widget));
        }
        assert!("cash-flow".parse::<Widget>().is_err());
    }

    #[tokio::test]
    async fn selection_renders_fetched_rows() {
        let api = Arc::new(FakeDashboardApi::default());
        let charts = charts();
        let filter = WidgetFilter::new(
            Widget::ServiceRevenue,
            api.clone(),
            charts.clone(),
            date!(2025 - 06 - 15),
        );

        let refresh = filter.select(Preset::Month).await.unwrap();

        assert!(matches!(refresh, Refresh::Rendered { drawn: true, .. }));
        assert_eq!(
            api.requests(),
            vec![(
                Widget::ServiceRevenue,
                Some("2025-05-15".to_owned()),
                Some("2025-06-15".to_owned())
            )]
        );
        let charts = charts.lock().unwrap();
        let config = charts.surface().config(targets::SERVICE_REVENUE);
        assert_eq!(config.spec.labels, vec!["Plumbing".to_owned()]);
    }

    #[tokio::test]
    async fn failed_fetch_renders_empty() {
        let api = Arc::new(FakeDashboardApi::failing());
        let charts = charts();
        let filter = WidgetFilter::new(
            Widget::ExpenseDistribution,
            api,
            charts.clone(),
            date!(2025 - 06 - 15),
        );

        let refresh = filter.init().await.unwrap();

        assert!(matches!(refresh, Refresh::Rendered { drawn: false, .. }));
        let charts = charts.lock().unwrap();
        assert_eq!(
            charts.surface().events,
            vec![SurfaceEvent::Clear(targets::EXPENSE_DISTRIBUTION.to_owned())]
        );
    }

    #[tokio::test]
    async fn slow_response_for_older_selection_is_discarded() {
        let api = Arc::new(
            FakeDashboardApi::default().delay_for("2025-05-15", Duration::from_millis(100)),
        );
        let charts = charts();
        let filter = WidgetFilter::new(
            Widget::BusinessLines,
            api,
            charts.clone(),
            date!(2025 - 06 - 15),
        );

        let (older, newer) = tokio::join!(filter.select(Preset::Month), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            filter.select(Preset::Year).await
        });

        assert!(matches!(older.unwrap(), Refresh::Stale { .. }));
        assert!(matches!(newer.unwrap(), Refresh::Rendered { drawn: true, .. }));
        assert_eq!(filter.preset(), Preset::Year);
        let charts = charts.lock().unwrap();
        let mounts = charts
            .surface()
            .events
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Mount(_)))
            .count();
        assert_eq!(mounts, 1);
    }
}
