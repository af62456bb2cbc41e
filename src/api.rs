//! Client for the REST API that supplies the dashboard's data.
//!
//! The API is served by the main web application. This crate only consumes
//! it: every request forwards the viewer's session cookie so the API sees
//! the same user that asked for the dashboard.

use std::{convert::Infallible, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap,
        header::{ACCEPT, COOKIE},
        request::Parts,
    },
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error,
    dashboard::payload::{
        BusinessLineRevenue, BusinessLinesResponse, DashboardPayload, ExpenseCategoryTotal,
        ServiceRevenue,
    },
    time_range::RangeChange,
};

/// Paths of the dashboard API, relative to its base URL.
pub mod paths {
    pub const OVERVIEW: &str = "/dashboard/api/overview/";
    pub const EXPENSE_DISTRIBUTION: &str = "/dashboard/api/expense-distribution/";
    pub const SERVICE_REVENUE: &str = "/dashboard/api/service-revenue/";
    pub const BUSINESS_LINES: &str = "/dashboard/api/business-lines/";
}

/// The viewer's credentials, forwarded as-is to the dashboard API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookie: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_cookie(cookie: impl Into<String>) -> Self {
        Self {
            cookie: Some(cookie.into()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            cookie: headers
                .get(COOKIE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("business line level must be between 1 and 3, got {0}")]
pub struct InvalidLevel(pub u8);

/// Depth in the business line hierarchy, from 1 (top level) to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BusinessLineLevel(u8);

impl BusinessLineLevel {
    pub const TOP: Self = Self(1);
    pub const MAX: u8 = 3;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for BusinessLineLevel {
    fn default() -> Self {
        Self::TOP
    }
}

impl TryFrom<u8> for BusinessLineLevel {
    type Error = InvalidLevel;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(InvalidLevel(level))
        }
    }
}

impl From<BusinessLineLevel> for u8 {
    fn from(level: BusinessLineLevel) -> Self {
        level.0
    }
}

/// The query string sent with a widget request. Absent bounds are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<BusinessLineLevel>,
}

impl RangeQuery {
    pub fn new(range: &RangeChange) -> Self {
        Self {
            start_date: range.start_date.clone(),
            end_date: range.end_date.clone(),
            level: None,
        }
    }

    pub fn level(mut self, level: BusinessLineLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_else(|error| {
            tracing::warn!("could not encode dashboard API query {self:?}: {error}");
            String::new()
        })
    }
}

/// The data source behind the dashboard's charts.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Everything the dashboard renders when the page loads.
    async fn overview(&self, session: &Session) -> Result<DashboardPayload, Error>;

    async fn expense_distribution(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ExpenseCategoryTotal>, Error>;

    async fn service_revenue(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ServiceRevenue>, Error>;

    async fn business_lines(
        &self,
        range: &RangeChange,
        level: BusinessLineLevel,
        session: &Session,
    ) -> Result<Vec<BusinessLineRevenue>, Error>;
}

/// A [DashboardApi] that talks to the web application over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: reqwest::Client,
    base_url: String,
    overview_path: String,
}

impl HttpDashboardApi {
    /// Create a client for the API at `base_url` that gives up on requests after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url.trim_end_matches('/');

        if reqwest::Url::parse(base_url).is_err() {
            return Err(Error::InvalidUpstreamUrl(base_url.to_owned()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::UpstreamUnavailable(base_url.to_owned(), error.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            overview_path: paths::OVERVIEW.to_owned(),
        })
    }

    /// Fetch the page load payload from `path` instead of [paths::OVERVIEW].
    pub fn overview_path(mut self, path: impl Into<String>) -> Self {
        self.overview_path = path.into();
        self
    }

    fn url(&self, path: &str, query: &RangeQuery) -> String {
        let query = query.to_query_string();

        if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &RangeQuery,
        session: &Session,
    ) -> Result<T, Error> {
        let url = self.url(path, query);
        tracing::debug!("fetching {url}");

        let mut request = self.client.get(&url).header(ACCEPT, "application/json");
        if let Some(cookie) = session.cookie() {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|error| Error::UpstreamUnavailable(path.to_owned(), error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus(path.to_owned(), status));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| Error::UpstreamDecode(path.to_owned(), error.to_string()))
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn overview(&self, session: &Session) -> Result<DashboardPayload, Error> {
        self.get_json(&self.overview_path, &RangeQuery::default(), session)
            .await
    }

    async fn expense_distribution(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ExpenseCategoryTotal>, Error> {
        self.get_json(paths::EXPENSE_DISTRIBUTION, &RangeQuery::new(range), session)
            .await
    }

    async fn service_revenue(
        &self,
        range: &RangeChange,
        session: &Session,
    ) -> Result<Vec<ServiceRevenue>, Error> {
        self.get_json(paths::SERVICE_REVENUE, &RangeQuery::new(range), session)
            .await
    }

    async fn business_lines(
        &self,
        range: &RangeChange,
        level: BusinessLineLevel,
        session: &Session,
    ) -> Result<Vec<BusinessLineRevenue>, Error> {
        let query = RangeQuery::new(range).level(level);
        let response: BusinessLinesResponse =
            self.get_json(paths::BUSINESS_LINES, &query, session).await?;

        Ok(response.business_lines_data)
    }
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use axum::{
        Json, Router,
        extract::RawQuery,
        http::{HeaderMap, StatusCode, header::COOKIE},
        routing::get,
    };
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        time_range::{Preset, RangeChange},
    };

    use super::{BusinessLineLevel, DashboardApi, HttpDashboardApi, RangeQuery, Session, paths};

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        address
    }

    fn client(address: SocketAddr) -> HttpDashboardApi {
        HttpDashboardApi::new(&format!("http://{address}/"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn query_omits_absent_bounds() {
        let all = RangeChange::new(Preset::All, date!(2025 - 06 - 15));
        let month = RangeChange::new(Preset::Month, date!(2025 - 06 - 15));

        assert_eq!(RangeQuery::new(&all).to_query_string(), "");
        assert_eq!(
            RangeQuery::new(&month)
                .level(BusinessLineLevel::try_from(2).unwrap())
                .to_query_string(),
            "start_date=2025-05-15&end_date=2025-06-15&level=2"
        );
    }

    #[test]
    fn level_must_be_between_one_and_three() {
        assert!(BusinessLineLevel::try_from(0).is_err());
        assert!(BusinessLineLevel::try_from(4).is_err());
        assert_eq!(BusinessLineLevel::try_from(3).map(|level| level.get()), Ok(3));
        assert_eq!(BusinessLineLevel::default(), BusinessLineLevel::TOP);
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = HttpDashboardApi::new("not a url", Duration::from_secs(1));

        assert!(matches!(result, Err(Error::InvalidUpstreamUrl(_))));
    }

    #[tokio::test]
    async fn forwards_range_and_cookie() {
        let router = Router::new().route(
            paths::SERVICE_REVENUE,
            get(|RawQuery(query): RawQuery, headers: HeaderMap| async move {
                let cookie = headers
                    .get(COOKIE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                Json(json!([{
                    "name": format!("{}|{cookie}", query.unwrap_or_default()),
                    "revenue": "10",
                }]))
            }),
        );
        let api = client(serve(router).await);
        let range = RangeChange::new(Preset::Year, date!(2025 - 06 - 15));

        let rows = api
            .service_revenue(&range, &Session::with_cookie("sessionid=abc"))
            .await
            .unwrap();

        assert_eq!(
            rows[0].name,
            "start_date=2024-06-15&end_date=2025-06-15|sessionid=abc"
        );
    }

    #[tokio::test]
    async fn unwraps_business_lines_envelope() {
        let router = Router::new().route(
            paths::BUSINESS_LINES,
            get(|| async {
                Json(json!({"business_lines_data": [{"name": "Residential", "revenue": 5}]}))
            }),
        );
        let api = client(serve(router).await);
        let range = RangeChange::new(Preset::All, date!(2025 - 06 - 15));

        let rows = api
            .business_lines(&range, BusinessLineLevel::TOP, &Session::anonymous())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Residential");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            paths::EXPENSE_DISTRIBUTION,
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let api = client(serve(router).await);
        let range = RangeChange::new(Preset::All, date!(2025 - 06 - 15));

        let result = api
            .expense_distribution(&range, &Session::anonymous())
            .await;

        assert_eq!(
            result,
            Err(Error::UpstreamStatus(
                paths::EXPENSE_DISTRIBUTION.to_owned(),
                StatusCode::FORBIDDEN
            ))
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let router = Router::new().route(
            "/custom/overview",
            get(|| async { "definitely not json" }),
        );
        let api = client(serve(router).await).overview_path("/custom/overview");

        let result = api.overview(&Session::anonymous()).await;

        assert!(matches!(result, Err(Error::UpstreamDecode(..))));
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let api = client(address);

        let result = api.overview(&Session::anonymous()).await;

        assert!(matches!(result, Err(Error::UpstreamUnavailable(..))));
    }
}
