//! The JSON shapes produced by the dashboard API.
//!
//! Numeric fields are kept as raw [Value]s because the API serializes
//! decimals as strings and occasionally omits fields. They are converted
//! with [parse_float_safe] at render time.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::format::parse_float_safe;

/// Everything the dashboard page renders on load, keyed by section.
///
/// Sections are decoded one at a time so that a malformed section only
/// affects its own chart.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub cashflow_data: Option<Value>,
    #[serde(default)]
    pub expense_distribution: Option<Value>,
    #[serde(default)]
    pub service_revenue: Option<Value>,
    #[serde(default)]
    pub service_profitability: Option<Value>,
    #[serde(default)]
    pub expense_trends: Option<Value>,
    #[serde(default)]
    pub business_lines_data: Option<Value>,
}

/// Decode one payload section, treating `null` and missing sections as absent.
pub fn decode_section<T: DeserializeOwned>(
    section: &Option<Value>,
) -> Result<Option<T>, serde_json::Error> {
    match section {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value).map(Some),
    }
}

/// Accepts any JSON value as a label, rendering non-strings as JSON text.
fn label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(label_text(&Value::deserialize(deserializer)?))
}

fn label_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CashFlowPoint {
    #[serde(default, deserialize_with = "label")]
    pub month: String,
    #[serde(default)]
    pub income: Value,
    #[serde(default)]
    pub expenses: Value,
    #[serde(default)]
    pub cash_flow: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExpenseCategoryTotal {
    #[serde(default, deserialize_with = "label")]
    pub name: String,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub percentage: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServiceRevenue {
    #[serde(default, deserialize_with = "label")]
    pub name: String,
    #[serde(default)]
    pub revenue: Value,
    #[serde(default)]
    pub percentage: Value,
    #[serde(default)]
    pub count: Value,
    #[serde(default)]
    pub avg_revenue: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServiceProfitability {
    #[serde(default, deserialize_with = "label")]
    pub name: String,
    #[serde(default)]
    pub revenue: Value,
    #[serde(default)]
    pub profit_margin: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BusinessLineRevenue {
    #[serde(default, deserialize_with = "label")]
    pub name: String,
    #[serde(default)]
    pub revenue: Value,
    #[serde(default)]
    pub percentage: Value,
}

/// The body of the business lines endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BusinessLinesResponse {
    #[serde(default)]
    pub business_lines_data: Vec<BusinessLineRevenue>,
}

/// Monthly totals for the top expense categories.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExpenseTrends {
    #[serde(default)]
    pub categories: Vec<TrendCategory>,
    #[serde(default)]
    pub monthly_trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TrendCategory {
    /// Either a number or a string; months key their totals by its string form.
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "label")]
    pub name: String,
    #[serde(default)]
    pub total: Value,
}

impl TrendCategory {
    pub fn key(&self) -> String {
        label_text(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MonthlyTrend {
    #[serde(default, deserialize_with = "label")]
    pub month: String,
    #[serde(default)]
    pub categories: Map<String, Value>,
}

impl MonthlyTrend {
    /// The total for `category` in this month, or 0 if the month has no entry for it.
    pub fn total_for(&self, category: &TrendCategory) -> f64 {
        parse_float_safe(
            self.categories
                .get(&category.key())
                .unwrap_or(&Value::Null),
        )
    }
}
