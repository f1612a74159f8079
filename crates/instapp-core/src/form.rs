//! Entry forms derived from a sheet's header and template row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AddressError, ValidationError};
use crate::range::index_to_column_letter;
use crate::table::SheetTable;
use crate::value::{classify, parse_number, ValueKind};

/// Raw submitted values keyed by field name
pub type Submission = BTreeMap<String, String>;

/// Input widget kind inferred from the template row's sample value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Percentage,
    Currency,
    Date,
    Checkbox,
    Text,
}

impl FieldKind {
    /// Infer a field kind from a sample cell value.
    pub fn infer(sample: Option<&str>, column: &str) -> Self {
        let Some(sample) = sample else {
            return FieldKind::Text;
        };
        match classify(sample, Some(column)).kind() {
            ValueKind::Currency => FieldKind::Currency,
            ValueKind::Percentage => FieldKind::Percentage,
            ValueKind::PlainNumber => FieldKind::Number,
            ValueKind::Formula => FieldKind::Text,
            ValueKind::Text => {
                let trimmed = sample.trim();
                if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
                    FieldKind::Checkbox
                } else if parse_date(trimmed).is_some() {
                    FieldKind::Date
                } else {
                    FieldKind::Text
                }
            }
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// An editable column of an entry form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub column_index: u32,
    pub column_letter: String,
    pub kind: FieldKind,
    pub sample: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl FormField {
    /// Validate a submitted value and render it the way the sheet expects.
    ///
    /// Every field is required except checkboxes, which default to `FALSE`.
    pub fn render_value(&self, raw: Option<&str>) -> Result<String, ValidationError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());

        if self.kind == FieldKind::Checkbox {
            let checked = raw.is_some_and(|s| {
                s.eq_ignore_ascii_case("true") || s == "1" || s.eq_ignore_ascii_case("yes")
            });
            return Ok(if checked { "TRUE" } else { "FALSE" }.to_string());
        }

        let raw = raw.ok_or_else(|| ValidationError::MissingField(self.name.clone()))?;
        let invalid_number = || ValidationError::InvalidNumber {
            field: self.name.clone(),
            value: raw.to_string(),
        };

        match self.kind {
            FieldKind::Number => parse_number(raw)
                .map(|_| raw.to_string())
                .ok_or_else(invalid_number),
            FieldKind::Percentage => {
                let value = parse_number(raw.trim_end_matches('%')).ok_or_else(invalid_number)?;
                Ok(format!("{}%", value))
            }
            FieldKind::Currency => {
                let value = parse_number(raw.trim_start_matches('$')).ok_or_else(invalid_number)?;
                Ok(format!("${:.2}", value))
            }
            FieldKind::Date => parse_date(raw)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .ok_or_else(|| ValidationError::InvalidDate {
                    field: self.name.clone(),
                    value: raw.to_string(),
                }),
            FieldKind::Checkbox | FieldKind::Text => Ok(raw.to_string()),
        }
    }
}

/// Build form fields from a table whose first data row is the template row.
///
/// `formula_columns[i]` marks template cells holding formulas; those columns
/// are computed by the sheet and left out of the form.
pub fn form_fields(
    table: &SheetTable,
    formula_columns: &[bool],
) -> Result<Vec<FormField>, AddressError> {
    let template = table.rows().first();
    let mut fields = Vec::new();

    for (idx, name) in table.headers().iter().enumerate() {
        if formula_columns.get(idx).copied().unwrap_or(false) {
            continue;
        }

        let sample = template
            .and_then(|row| row.cells.get(idx))
            .and_then(|c| c.clone());
        if sample.as_deref().is_some_and(|s| s.trim_start().starts_with('=')) {
            continue;
        }

        let kind = FieldKind::infer(sample.as_deref(), name);
        let (min_value, max_value) = if kind == FieldKind::Number {
            column_bounds(table, idx)
        } else {
            (None, None)
        };

        fields.push(FormField {
            name: name.clone(),
            column_index: idx as u32,
            column_letter: index_to_column_letter(idx as u32)?,
            kind,
            sample,
            min_value,
            max_value,
        });
    }

    Ok(fields)
}

fn column_bounds(table: &SheetTable, col: usize) -> (Option<f64>, Option<f64>) {
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| row.cells.get(col)?.as_deref().and_then(parse_number))
        .collect();
    let min = values.iter().copied().reduce(f64::min);
    let max = values.iter().copied().reduce(f64::max);
    (min, max)
}

/// Validate a submission against the form, returning `(column_index, value)`
/// pairs ready to write.
pub fn render_submission(
    fields: &[FormField],
    submission: &Submission,
) -> Result<Vec<(u32, String)>, ValidationError> {
    fields
        .iter()
        .map(|field| {
            let raw = submission.get(&field.name).map(String::as_str);
            Ok((field.column_index, field.render_value(raw)?))
        })
        .collect()
}

/// `Price * QTY` when both are present and the product is positive.
pub fn payment_amount(submission: &Submission) -> Result<Option<f64>, ValidationError> {
    let (Some(price), Some(qty)) = (submission.get("Price"), submission.get("QTY")) else {
        return Ok(None);
    };
    let price = parse_number(price.trim_start_matches('$')).ok_or_else(|| {
        ValidationError::InvalidNumber {
            field: "Price".to_string(),
            value: price.clone(),
        }
    })?;
    let qty = parse_number(qty).ok_or_else(|| ValidationError::InvalidNumber {
        field: "QTY".to_string(),
        value: qty.clone(),
    })?;
    let amount = price * qty;
    Ok((amount > 0.0).then_some(amount))
}

/// Whether `username` may append to `sheet_name` according to the USERS sheet
/// (`User Name` column, comma-separated `APPENDALL` list).
pub fn can_append(users: &SheetTable, username: &str, sheet_name: &str) -> bool {
    let Some(col) = users.column_index("APPENDALL") else {
        return false;
    };
    let wanted = username.to_lowercase();
    let Some(row) = users.find_row("User Name", |name| name.to_lowercase() == wanted) else {
        return false;
    };
    let Some(Some(allowed)) = row.cells.get(col) else {
        return false;
    };
    allowed.split(',').any(|s| s.trim() == sheet_name.trim())
}
