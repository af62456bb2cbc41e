//! Dashboard module
//!
//! Provides the business dashboard page: cash flow, expense and revenue
//! charts, with time range filters on the widgets that support them.

pub mod charts;
mod handlers;
pub mod payload;
pub mod widgets;

pub use handlers::{DashboardState, WidgetQuery, get_dashboard_page, get_widget_fragment};
