use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use crate::{
    Error,
    api::{BusinessLineLevel, DashboardApi, Session},
    dashboard::{
        payload::{BusinessLineRevenue, DashboardPayload, ExpenseCategoryTotal, ServiceRevenue},
        widgets::Widget,
    },
    time_range::RangeChange,
};

type Request = (Widget, Option<String>, Option<String>);

/// A dashboard API that serves canned rows and records what was asked for.
pub(crate) struct FakeDashboardApi {
    fail: bool,
    delays: Vec<(String, Duration)>,
    overview: DashboardPayload,
    requests: Mutex<Vec<Request>>,
    sessions: Mutex<Vec<Session>>,
}

impl Default for FakeDashboardApi {
    fn default() -> Self {
        Self {
            fail: false,
            delays: vec![],
            overview: serde_json::from_value(json!({
                "cashflow_data": [
                    {"month": "Jan", "income": "100", "expenses": "40", "cash_flow": "60"},
                    {"month": "Feb", "income": "80", "expenses": "90", "cash_flow": "-10"},
                ],
                "expense_distribution": [{"name": "Fuel", "total": "300", "percentage": 100}],
                "service_revenue": [{"name": "Plumbing", "revenue": "1500", "count": 3}],
                "service_profitability": [{"name": "Plumbing", "revenue": 1500, "profit_margin": 20}],
                "expense_trends": {
                    "categories": [{"id": 1, "name": "Fuel"}],
                    "monthly_trends": [{"month": "Jan", "categories": {"1": 300}}],
                },
                "business_lines_data": [{"name": "Residential", "revenue": 1500, "percentage": 100}],
            }))
            .expect("canned overview should deserialize"),
            requests: Mutex::default(),
            sessions: Mutex::default(),
        }
    }
}

impl FakeDashboardApi {
    /// An API whose every request fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Delay responses to requests whose start date is `start_date`.
    pub(crate) fn delay_for(mut self, start_date: &str, delay: Duration) -> Self {
        self.delays.push((start_date.to_owned(), delay));
        self
    }

    pub(crate) fn with_overview(mut self, overview: DashboardPayload) -> Self {
        self.overview = overview;
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    async fn respond<T>(
        &self,
        widget: Widget,
        range: &RangeChange,
        session: &Session,
        rows: T,
    ) -> Result<T, Error> {
        self.requests.lock().unwrap().push((
            widget,
            range.start_date.clone(),
            range.end_date.clone(),
        ));
        self.sessions.lock().unwrap().push(session.clone());

        let delay = self
            .delays
            .iter()
            .find(|(start_date, _)| range.start_date.as_deref() == Some(start_date))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            Err(Error::UpstreamStatus(
                widget.slug().to_owned(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        } else {
            Ok(rows)
        }
    }
}

#[async_trait]
impl DashboardApi for FakeDashboardApi {
    async fn overview(&self, session: &Session) -> Result<DashboardPayload, Error> {
        self.sessions.lock().unwrap().push(session.clone());

        if self.fail {
            Err(Error::UpstreamUnavailable(
                "overview".to_owned(),
                "connection refused".to_owned(),
            ))
        } else {
            Ok(self.overview.clone())
        }
    }

    async fn expense_distribution(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ExpenseCategoryTotal>, Error> {
        let rows = serde_json::from_value(json!([
            {"name": "Fuel", "total": "300", "percentage": 75},
            {"name": "Food", "total": "100", "percentage": 25},
        ]))
        .unwrap();

        self.respond(Widget::ExpenseDistribution, range, session, rows)
            .await
    }

    async fn service_revenue(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ServiceRevenue>, Error> {
        let rows = serde_json::from_value(json!([{
            "name": "Plumbing",
            "revenue": "1500",
            "percentage": 100,
            "count": 3,
            "avg_revenue": "500",
        }]))
        .unwrap();

        self.respond(Widget::ServiceRevenue, range, session, rows)
            .await
    }

    async fn business_lines(
        &self,
        range: &RangeChange,
        level: BusinessLineLevel,
        session: &Session,
    ) -> Result<Vec<BusinessLineRevenue>, Error> {
        let rows = serde_json::from_value(json!([{
            "name": format!("Level {} line", level.get()),
            "revenue": "42",
            "percentage": 100,
        }]))
        .unwrap();

        self.respond(Widget::BusinessLines, range, session, rows)
            .await
    }
}
