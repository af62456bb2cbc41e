//! Null-safe number formatting and the dashboard color palette.
//!
//! Every numeric value that reaches a chart or a tooltip goes through
//! [parse_float_safe] first, so malformed payload fields show up as zero
//! instead of breaking a render.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use serde_json::Value;

/// The fixed, ordered color palette used for multi-series and per-item colors.
pub const PALETTE: [&str; 12] = [
    "#3B82F6", "#10B981", "#EF4444", "#F59E0B", "#06B6D4", "#8B5CF6", "#EC4899", "#84CC16",
    "#F97316", "#14B8A6", "#6366F1", "#F43F5E",
];

/// Color used for axis grid lines.
pub const GRID_COLOR: &str = "#E5E7EB";

/// Named colors for series with a fixed meaning.
pub mod colors {
    pub const PRIMARY: &str = "#3B82F6";
    pub const SUCCESS: &str = "#10B981";
    pub const DANGER: &str = "#EF4444";
    pub const WARNING: &str = "#F59E0B";
    pub const INFO: &str = "#06B6D4";
    pub const PURPLE: &str = "#8B5CF6";
    pub const PINK: &str = "#EC4899";
}

/// An ordered list of colors handed out to chart series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<&'static str>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: PALETTE.to_vec(),
        }
    }
}

impl Palette {
    /// Create a palette from `colors`, falling back to [PALETTE] if `colors` is empty.
    pub fn new(colors: Vec<&'static str>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }

        Self { colors }
    }

    /// The first `count` colors, or the whole palette if `count` is larger than it.
    pub fn generate(&self, count: usize) -> Vec<&'static str> {
        self.colors[..count.min(self.colors.len())].to_vec()
    }

    /// The color for the series at `index`, wrapping around when the palette runs out.
    pub fn color_at(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Returns the first `count` entries of the default palette.
///
/// If `count` exceeds the palette length the whole palette is returned, so
/// callers with more series than colors should use [Palette::color_at].
pub fn generate_colors(count: usize) -> Vec<&'static str> {
    Palette::default().generate(count)
}

/// Append a two digit hex alpha channel to a `#RRGGBB` color, e.g. `#3B82F6` -> `#3B82F620`.
pub fn with_alpha(color: &str, alpha: &str) -> String {
    format!("{color}{alpha}")
}

/// Coerce any JSON value into a finite number.
///
/// Numbers pass through. Strings are parsed by their leading numeric prefix,
/// so `"12.5kg"` is `12.5`. Everything else, including `null`, booleans,
/// arrays, objects, empty strings, and non-finite results, is `0.0`.
pub fn parse_float_safe(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_leading_float(text),
        _ => None,
    };

    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut index = 0;

    let sign = match bytes.first() {
        Some(b'-') => {
            index += 1;
            "-"
        }
        Some(b'+') => {
            index += 1;
            ""
        }
        _ => "",
    };

    let integer_start = index;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        index += 1;
    }
    let integer = &text[integer_start..index];

    let mut fraction = "";
    if index < bytes.len() && bytes[index] == b'.' {
        let fraction_start = index + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        fraction = &text[fraction_start..fraction_end];
        index = fraction_end;
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut exponent = "";
    if index < bytes.len() && (bytes[index] == b'e' || bytes[index] == b'E') {
        let mut exponent_end = index + 1;
        if exponent_end < bytes.len() && (bytes[exponent_end] == b'-' || bytes[exponent_end] == b'+')
        {
            exponent_end += 1;
        }
        let digits_start = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > digits_start {
            exponent = &text[index..exponent_end];
        }
    }

    let integer = if integer.is_empty() { "0" } else { integer };
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    format!("{sign}{integer}.{fraction}{exponent}").parse().ok()
}

/// Format a JSON value as a dollar amount with two decimal places, e.g. `$1,234.50`.
///
/// Values that cannot be parsed are formatted as `$0.00`.
pub fn format_currency(value: &Value) -> String {
    format_amount(parse_float_safe(value))
}

/// Format a number as a dollar amount with two decimal places, e.g. `-$40.00`.
///
/// The amount is rounded to the nearest cent, so anything under half a cent
/// is `$0.00`.
pub fn format_amount(amount: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .expect("\"$\" is a valid currency prefix")
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .expect("\"-$\" is a valid currency prefix")
            .precision(Precision::Decimals(2))
    });

    let amount = round_to(amount, 2);

    if !amount.is_finite() || amount == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return "$0.00".to_owned();
    }

    if amount.abs() >= SCIENTIFIC_CUTOFF {
        let sign = if amount < 0.0 { "-" } else { "" };
        return format!("{sign}${}", group_thousands(&format!("{:.2}", amount.abs())));
    }

    let formatted = if amount < 0.0 {
        negative_fmt.fmt_string(amount.abs())
    } else {
        positive_fmt.fmt_string(amount)
    };

    pad_cents(formatted)
}

/// numfmt switches to scientific notation for magnitudes of at least a trillion.
const SCIENTIFIC_CUTOFF: f64 = 1e12;

/// Round half away from zero to `decimals` places.
///
/// numfmt truncates extra digits, so values are rounded before formatting.
fn round_to(number: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (number * factor).round() / factor;

    if rounded.is_finite() { rounded } else { number }
}

/// Insert a comma between every group of three integer digits, e.g. `1234567.5` -> `1,234,567.5`.
///
/// `number` must be unsigned and in fixed-point notation.
fn group_thousands(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };

    let mut grouped = String::with_capacity(number.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    grouped
}

/// numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3" and "12.00" as "12".
fn pad_cents(formatted: String) -> String {
    match formatted.rfind('.') {
        None => format!("{formatted}.00"),
        Some(point) => {
            let decimals = formatted.len() - point - 1;
            if decimals >= 2 {
                formatted
            } else {
                format!("{formatted}{}", "0".repeat(2 - decimals))
            }
        }
    }
}

/// Format a JSON value as a percentage with exactly one decimal place, e.g. `12.3%`.
pub fn format_percentage(value: &Value) -> String {
    format_percent(parse_float_safe(value))
}

/// Format a number as a percentage with exactly one decimal place.
pub fn format_percent(percentage: f64) -> String {
    // Avoid rendering "-0.0%" for tiny negative values.
    let rounded = (percentage * 10.0).round() / 10.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };

    format!("{rounded:.1}%")
}

/// Format a JSON value as a grouped number with up to three decimals, e.g. `1,234.5`.
pub fn format_number(value: &Value) -> String {
    static NUMBER_FMT: OnceLock<Formatter> = OnceLock::new();

    let number_fmt = NUMBER_FMT.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .expect("',' is a valid separator")
            .precision(Precision::Decimals(3))
    });

    let number = round_to(parse_float_safe(value), 3);
    if number == 0.0 {
        return "0".to_owned();
    }

    if number.abs() >= SCIENTIFIC_CUTOFF {
        let sign = if number < 0.0 { "-" } else { "" };
        let fixed = format!("{:.3}", number.abs());
        let fixed = fixed.trim_end_matches('0').trim_end_matches('.');
        return format!("{sign}{}", group_thousands(fixed));
    }

    let formatted = number_fmt.fmt_string(number);

    // Whole numbers come out of numfmt as e.g. "3.0".
    match formatted.strip_suffix(".0") {
        Some(whole) => whole.to_owned(),
        None => formatted,
    }
}
