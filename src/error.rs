//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The dashboard API could not be reached, or did not answer in time.
    ///
    /// Callers should pass in the endpoint path and the original error as a string.
    #[error("could not reach the dashboard API at {0}: {1}")]
    UpstreamUnavailable(String, String),

    /// The dashboard API answered with a non-success status code.
    #[error("the dashboard API at {0} returned {1}")]
    UpstreamStatus(String, StatusCode),

    /// The dashboard API answered with a body that is not the expected JSON.
    #[error("could not decode the response from the dashboard API at {0}: {1}")]
    UpstreamDecode(String, String),

    /// The configured dashboard API URL could not be used to build a request URL.
    #[error("invalid dashboard API URL \"{0}\"")]
    InvalidUpstreamUrl(String),

    /// Could not acquire the lock on a widget's charts.
    #[error("could not acquire the chart lock")]
    ChartLockError,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,
}

impl Error {
    /// Whether the error came from talking to the dashboard API.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable(..) | Error::UpstreamStatus(..) | Error::UpstreamDecode(..)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::ChartLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error if error.is_upstream() => {
                tracing::error!("{error}");
                (
                    StatusCode::BAD_GATEWAY,
                    Alert::Error {
                        message: "Could not load chart data".to_owned(),
                        details: "The dashboard data service did not respond. Try again later."
                            .to_owned(),
                    },
                )
            }
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
