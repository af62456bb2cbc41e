//! Time-range presets for filtering dashboard widgets.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

/// A named time range ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Preset {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "year")]
    Year,
}

impl Preset {
    /// Every preset, in the order the buttons are shown.
    pub const ALL: [Preset; 5] = [
        Self::All,
        Self::Month,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::Year,
    ];

    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Month => "month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Time",
            Self::Month => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::Year => "1Y",
        }
    }

    /// How many whole months the range reaches back, or `None` for an unbounded range.
    pub fn months_back(self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Month => Some(1),
            Self::ThreeMonths => Some(3),
            Self::SixMonths => Some(6),
            Self::Year => Some(12),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range preset \"{0}\"")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_query_value() == value)
            .ok_or_else(|| UnknownPreset(value.to_owned()))
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// Compute the dates covered by `preset` as of `today`.
///
/// Returns `None` for [Preset::All]. Otherwise the range starts the same day
/// of the month N months before `today`, or on the last day of that month if
/// it is shorter.
pub fn calculate_date_range(preset: Preset, today: Date) -> Option<DateRange> {
    let months = preset.months_back()?;

    Some(DateRange {
        start: subtract_months(today, months),
        end: today,
    })
}

fn subtract_months(date: Date, months: u32) -> Date {
    let month_index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 - months as i32;
    let year = month_index.div_euclid(12);
    let month = Month::January.nth_next(month_index.rem_euclid(12) as u8);
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February if time::util::is_leap_year(year) => 29,
        Month::February => 28,
    }
}

const ISO_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

/// Formats a date as `YYYY-MM-DD`.
pub fn iso_date(date: Date) -> String {
    date.format(ISO_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// What a preset selection resolved to.
///
/// Dates are `YYYY-MM-DD` strings, or `None` when the range is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeChange {
    pub preset: Preset,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeChange {
    pub fn new(preset: Preset, today: Date) -> Self {
        let range = calculate_date_range(preset, today);

        Self {
            preset,
            start_date: range.map(|range| iso_date(range.start)),
            end_date: range.map(|range| iso_date(range.end)),
        }
    }
}

/// The current selection of a [TimeRangeFilter].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub current_preset: Preset,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A preset button and whether it is the selected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetButton {
    pub preset: Preset,
    pub active: bool,
}

type ChangeCallback = Box<dyn FnMut(&RangeChange) + Send>;

/// Tracks the selected preset for one widget and reports every change.
pub struct TimeRangeFilter {
    today: Date,
    state: FilterState,
    on_change: Option<ChangeCallback>,
}

impl TimeRangeFilter {
    pub fn new(today: Date) -> Self {
        Self {
            today,
            state: FilterState {
                current_preset: Preset::All,
                start_date: None,
                end_date: None,
            },
            on_change: None,
        }
    }

    /// Register the function called after every selection.
    pub fn on_change(mut self, callback: impl FnMut(&RangeChange) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Select [Preset::All], notifying the change callback.
    pub fn init(&mut self) -> RangeChange {
        self.select(Preset::All)
    }

    /// Select `preset`, notifying the change callback.
    pub fn select(&mut self, preset: Preset) -> RangeChange {
        let change = RangeChange::new(preset, self.today);

        self.state = FilterState {
            current_preset: preset,
            start_date: change.start_date.clone(),
            end_date: change.end_date.clone(),
        };

        if let Some(callback) = self.on_change.as_mut() {
            callback(&change);
        }

        change
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn buttons(&self) -> Vec<PresetButton> {
        preset_buttons(self.state.current_preset)
    }
}

impl fmt::Debug for TimeRangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeRangeFilter")
            .field("today", &self.today)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// The preset buttons with only `active` marked as selected.
pub fn preset_buttons(active: Preset) -> Vec<PresetButton> {
    Preset::ALL
        .into_iter()
        .map(|preset| PresetButton {
            preset,
            active: preset == active,
        })
        .collect()
}
