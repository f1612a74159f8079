//! Classification of raw cell strings into currency, percentage, formula,
//! plain number or text, and rendering them back for display and upload.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::format::{fixed, grouped, percent_of_fraction};

fn currency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$[\d,]+(\.\d+)?$").expect("valid currency regex"))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid number regex")
    })
}

/// What a raw cell string represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Currency,
    Percentage,
    Formula,
    PlainNumber,
    Text,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Currency | ValueKind::Percentage | ValueKind::PlainNumber
        )
    }
}

/// A classified cell value.
///
/// `numeric` is present exactly when the kind is currency, percentage or
/// plain number. Construct through [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedValue {
    kind: ValueKind,
    numeric: Option<f64>,
    display: String,
    #[serde(default, skip_serializing_if = "is_false")]
    rate_like: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ClassifiedValue {
    fn number(kind: ValueKind, numeric: f64, display: String, rate_like: bool) -> Self {
        ClassifiedValue {
            kind,
            numeric: Some(numeric),
            display,
            rate_like,
        }
    }

    fn passthrough(kind: ValueKind, display: &str) -> Self {
        ClassifiedValue {
            kind,
            numeric: None,
            display: display.to_string(),
            rate_like: false,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn numeric(&self) -> Option<f64> {
        self.numeric
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// The value came from an Allocation/Rate/Yield column.
    pub fn is_rate_like(&self) -> bool {
        self.rate_like
    }
}

/// True for column names that hold rates ("Allocation", "Rate", "Yield").
pub fn is_rate_column(name: &str) -> bool {
    ["Allocation", "Rate", "Yield"]
        .iter()
        .any(|term| name.contains(term))
}

/// Parse a plain numeric literal, ignoring `,` grouping.
///
/// Rejects `inf`, `NaN` and anything else `f64::from_str` would accept
/// that a spreadsheet would not show as a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if !number_pattern().is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classify a raw cell string.
///
/// Priority: formula, currency, `%` suffix, rate column decimal (<= 1,
/// scaled x100), plain number, text. Never fails.
pub fn classify(raw: &str, column_hint: Option<&str>) -> ClassifiedValue {
    let trimmed = raw.trim();
    let rate_column = column_hint.is_some_and(is_rate_column);

    if trimmed.starts_with('=') {
        return ClassifiedValue::passthrough(ValueKind::Formula, trimmed);
    }

    if currency_pattern().is_match(trimmed) {
        if let Some(amount) = parse_number(&trimmed[1..]) {
            let decimals = trimmed
                .split_once('.')
                .map(|(_, frac)| frac.len())
                .unwrap_or(0);
            let display = format!("${}", grouped(amount, decimals));
            return ClassifiedValue::number(ValueKind::Currency, amount, display, false);
        }
    }

    if let Some(body) = trimmed.strip_suffix('%') {
        if let Some(value) = parse_number(body) {
            return ClassifiedValue::number(
                ValueKind::Percentage,
                value,
                trimmed.to_string(),
                rate_column,
            );
        }
    }

    if let Some(value) = parse_number(trimmed) {
        if rate_column && value <= 1.0 {
            let scaled = value * 100.0;
            let display = format!("{}%", fixed(scaled, 2));
            return ClassifiedValue::number(ValueKind::Percentage, scaled, display, true);
        }
        return ClassifiedValue::number(
            ValueKind::PlainNumber,
            value,
            trimmed.to_string(),
            rate_column,
        );
    }

    ClassifiedValue::passthrough(ValueKind::Text, raw)
}

/// Render a classified value.
///
/// With `decimals = None` currency and percentages use 2 places and plain
/// numbers use 3 below 10, else 2. Percentages with magnitude <= 1 are
/// treated as fractions and scaled x100.
pub fn to_display_string(value: &ClassifiedValue, decimals: Option<usize>) -> String {
    let numeric = match value.numeric {
        Some(n) => n,
        None => return value.display.clone(),
    };

    match value.kind {
        ValueKind::Currency => format!("${}", grouped(numeric, decimals.unwrap_or(2))),
        ValueKind::Percentage => {
            let scaled = if numeric.abs() <= 1.0 {
                numeric * 100.0
            } else {
                numeric
            };
            format!("{}%", fixed(scaled, decimals.unwrap_or(2)))
        }
        ValueKind::PlainNumber if value.rate_like => {
            format!("{}%", fixed(numeric, decimals.unwrap_or(2)))
        }
        ValueKind::PlainNumber => {
            let places = decimals.unwrap_or(if numeric < 10.0 { 3 } else { 2 });
            grouped(numeric, places)
        }
        ValueKind::Formula | ValueKind::Text => value.display.clone(),
    }
}

/// How an uploaded numeric column is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadColumn {
    /// Fractions rendered as one-decimal percentages (`0.123` -> `12.3%`)
    Percent,
    /// Two-decimal fixed point
    Fixed,
}

/// Render a numeric column for upload. Missing values become `""`.
pub fn upload_format(values: &[Option<f64>], column: UploadColumn) -> Vec<String> {
    values
        .iter()
        .map(|value| match (value, column) {
            (Some(v), UploadColumn::Percent) => percent_of_fraction(*v, 1),
            (Some(v), UploadColumn::Fixed) => fixed(*v, 2),
            (None, _) => String::new(),
        })
        .collect()
}

/// Format an output cell for read-only display.
///
/// Already formatted `$`/`%` values pass through. "Portfolio" fields render
/// as whole dollars and "Allocation"/"Rate" fields as whole percentages.
pub fn format_output_value(raw: &str, field_name: &str) -> String {
    let original = raw.trim();

    if original.starts_with('$') || original.ends_with('%') {
        return original.to_string();
    }

    if field_name.contains("Portfolio") {
        return match parse_number(&original.replace('$', "")) {
            Some(v) => format!("${}", grouped(v, 0)),
            None => original.to_string(),
        };
    }

    if field_name.contains("Allocation") || field_name.contains("Rate") {
        let cleaned = original.replace(['%', '$'], "");
        return match parse_number(&cleaned) {
            Some(v) => {
                let v = if v <= 1.0 { v * 100.0 } else { v };
                format!("{}%", fixed(v, 0))
            }
            None => original.to_string(),
        };
    }

    original.to_string()
}

/// A value submitted for a single input cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
}

/// Render an input-cell value for a `USER_ENTERED` write: numbers in
/// `[0, 1]` keep 4 decimals, other numbers 2, text is trimmed.
pub fn format_input_value(value: &InputValue) -> String {
    match value {
        InputValue::Number(v) if (0.0..=1.0).contains(v) => fixed(*v, 4),
        InputValue::Number(v) => fixed(*v, 2),
        InputValue::Text(s) => s.trim().to_string(),
    }
}
