use instapp_core::{
    is_rate_column, parse_number, upload_format, A1Range, UploadColumn, ValidationError,
};
use serde::Serialize;

use super::require_sheet;
use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::SheetStore;

/// Rows beyond this would fall outside the sheet's table range.
const MAX_UPLOAD_ROWS: usize = 999;
const MAX_UPLOAD_COLUMNS: usize = 26;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub range: String,
    pub rows: usize,
    pub columns: usize,
}

/// Parse CSV text into a grid ready to write: header first, fractional
/// numeric columns normalised (rate columns as one-decimal percentages,
/// others to two decimals), integer and text columns unchanged.
pub fn prepare_upload(csv_text: &str) -> Result<Vec<Vec<String>>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ValidationError::Other("CSV has no header row".to_string()).into());
    }
    if headers.len() > MAX_UPLOAD_COLUMNS {
        return Err(ValidationError::Other(format!(
            "CSV has {} columns, at most {MAX_UPLOAD_COLUMNS} are supported",
            headers.len()
        ))
        .into());
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        records.push(row);
    }
    if records.len() > MAX_UPLOAD_ROWS {
        return Err(ValidationError::Other(format!(
            "CSV has {} rows, at most {MAX_UPLOAD_ROWS} are supported",
            records.len()
        ))
        .into());
    }

    for (col, header) in headers.iter().enumerate() {
        let parsed: Vec<Option<f64>> = records
            .iter()
            .map(|row| parse_number(&row[col]))
            .collect();
        let numeric = records
            .iter()
            .zip(&parsed)
            .all(|(row, value)| row[col].is_empty() || value.is_some());
        if !numeric || parsed.iter().all(Option::is_none) {
            continue;
        }
        // Whole-number columns without gaps (years, ids, counts) keep their text.
        let has_gap = parsed.iter().any(Option::is_none);
        let fractional = records
            .iter()
            .any(|row| row[col].contains(['.', 'e', 'E']));
        if !has_gap && !fractional {
            continue;
        }

        let kind = if is_rate_column(header) {
            UploadColumn::Percent
        } else {
            UploadColumn::Fixed
        };
        for (row, value) in records.iter_mut().zip(upload_format(&parsed, kind)) {
            row[col] = value;
        }
    }

    let mut grid = Vec::with_capacity(records.len() + 1);
    grid.push(headers);
    grid.extend(records);
    Ok(grid)
}

/// Replace the top of a sheet with the uploaded CSV.
pub async fn upload_csv<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
    csv_text: &str,
) -> Result<UploadSummary, AppError> {
    let sheet = require_sheet(ctx)?;
    let grid = prepare_upload(csv_text)?;
    let rows = grid.len();
    let columns = grid[0].len();

    let range = A1Range::row(sheet, 0, columns as u32 - 1, 1);
    let range = A1Range {
        end_row: rows as u32,
        ..range
    };
    store
        .write_values(&ctx.spreadsheet_id, &range.to_string(), grid)
        .await?;

    tracing::info!(sheet, rows, columns, "Uploaded CSV");
    Ok(UploadSummary {
        range: range.to_string(),
        rows,
        columns,
    })
}
