use instapp_core::{classify, format_input_value, format_output_value, InputValue, ValidationError};
use serde::Serialize;

use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::{SheetStore, ValueRange, ValueRenderOption};

pub const INPUTS_SHEET: &str = "INPUTS";

/// The labelled input cell at `INPUTS!A2:B2`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub name: String,
    pub raw: String,
    pub numeric: Option<f64>,
    pub display: String,
}

/// `None` when A2 or B2 is empty.
pub async fn input_field<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
) -> Result<Option<InputField>, AppError> {
    let range = format!("{INPUTS_SHEET}!A2:B2");
    let values = store
        .read_values(&ctx.spreadsheet_id, &range, ValueRenderOption::FormattedValue)
        .await?;

    let Some([name, raw, ..]) = values.first().map(Vec::as_slice) else {
        tracing::warn!("No data found in INPUTS cells A2 and B2");
        return Ok(None);
    };
    if name.trim().is_empty() || raw.trim().is_empty() {
        return Ok(None);
    }

    let value = classify(raw, Some(name.as_str()));
    Ok(Some(InputField {
        name: name.trim().to_string(),
        raw: raw.clone(),
        numeric: value.numeric(),
        display: format_output_value(raw, name),
    }))
}

/// Write `value` into column B of the INPUTS sheet at `row`.
pub async fn update_input<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
    row: u32,
    value: &InputValue,
) -> Result<String, AppError> {
    if row == 0 {
        return Err(ValidationError::Other("input rows start at 1".to_string()).into());
    }
    let formatted = format_input_value(value);
    if formatted.is_empty() {
        return Err(ValidationError::MissingField("value".to_string()).into());
    }

    let cell = format!("{INPUTS_SHEET}!B{row}");
    store
        .batch_write(&ctx.spreadsheet_id, vec![ValueRange::cell(cell.as_str(), formatted.as_str())])
        .await?;

    tracing::info!(cell = %cell, value = %formatted, "Updated input cell");
    Ok(formatted)
}
