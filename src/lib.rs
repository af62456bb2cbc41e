//! Charts for a small business dashboard.
//!
//! This library renders the dashboard's charts (cash flow, expense
//! distribution, service revenue and profitability, expense trends and
//! business lines) from the JSON served by the business's dashboard API, and
//! serves them as an HTML page whose widgets can be narrowed to a time range.
//!
//! The chart layer is independent of the web server: [chart::factory::ChartFactory]
//! draws on any [chart::factory::ChartSurface], and
//! [dashboard::charts::DashboardCharts] maps API payloads onto charts.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
#[allow(missing_docs)]
pub mod api;
mod app_state;
#[allow(missing_docs)]
pub mod chart;
#[allow(missing_docs)]
pub mod dashboard;
mod endpoints;
mod error;
#[allow(missing_docs)]
pub mod format;
mod html;
mod internal_server_error;
mod logging;
mod not_found;
mod routing;
#[allow(missing_docs)]
pub mod time_range;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use api::{DashboardApi, HttpDashboardApi};
pub use app_state::AppState;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
