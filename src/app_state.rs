//! Implements a struct that holds the state of the dashboard server.

use std::{fmt, sync::Arc};

use crate::{
    Error, api::DashboardApi, dashboard::widgets::WidgetSequences, timezone::get_local_offset,
};

/// The state of the dashboard server.
#[derive(Clone)]
pub struct AppState {
    /// Where the dashboard's data comes from.
    pub api: Arc<dyn DashboardApi>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Lets a newer widget request supersede an older one from the same session.
    pub widget_sequences: WidgetSequences,
}

impl AppState {
    /// Create a new [AppState].
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is not a known timezone.
    pub fn new(api: Arc<dyn DashboardApi>, local_timezone: &str) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            api,
            local_timezone: local_timezone.to_owned(),
            widget_sequences: WidgetSequences::new(),
        })
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("local_timezone", &self.local_timezone)
            .finish_non_exhaustive()
    }
}
