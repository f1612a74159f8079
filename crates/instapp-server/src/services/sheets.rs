use instapp_core::{
    form_fields, quote_sheet, to_display_string, ColumnQuality, FormField, ValueKind,
};
use instapp_formula::FormulaTemplate;
use serde::Serialize;

use super::{read_table, require_sheet};
use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::{SheetStore, SpreadsheetFile, ValueRenderOption};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub raw: String,
    pub kind: ValueKind,
    pub numeric: Option<f64>,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub sheet_row: u32,
    pub cells: Vec<Option<CellView>>,
}

/// A sheet shaped for display, with its missing-value report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub quality: Vec<ColumnQuality>,
}

/// Fields of the new-entry form for a sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryForm {
    pub sheet: String,
    pub fields: Vec<FormField>,
    pub next_row: u32,
}

pub async fn list_spreadsheets<S: SheetStore>(store: &S) -> Result<Vec<SpreadsheetFile>, AppError> {
    store.list_spreadsheets().await
}

pub async fn list_sheets<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
) -> Result<Vec<String>, AppError> {
    Ok(store.metadata(&ctx.spreadsheet_id).await?.sheet_titles())
}

pub async fn read_sheet<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
) -> Result<SheetView, AppError> {
    let sheet = require_sheet(ctx)?;
    let table = read_table(store, &ctx.spreadsheet_id, sheet).await?;

    let rows = table
        .rows()
        .iter()
        .zip(table.classified())
        .map(|(row, classified)| RowView {
            sheet_row: row.sheet_row,
            cells: row
                .cells
                .iter()
                .zip(classified)
                .map(|(raw, value)| {
                    let (raw, value) = (raw.as_ref()?, value?);
                    Some(CellView {
                        raw: raw.clone(),
                        kind: value.kind(),
                        numeric: value.numeric(),
                        display: to_display_string(&value, None),
                    })
                })
                .collect(),
        })
        .collect();

    tracing::info!(sheet, rows = table.rows().len(), "Read sheet");
    Ok(SheetView {
        sheet: sheet.to_string(),
        headers: table.headers().to_vec(),
        rows,
        quality: table.quality_report(),
    })
}

/// The template row's formulas as written.
pub async fn read_template<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    sheet: &str,
) -> Result<FormulaTemplate, AppError> {
    let row = FormulaTemplate::DEFAULT_ROW;
    let range = format!("{}!A{row}:Z{row}", quote_sheet(sheet));
    let values = store
        .read_values(spreadsheet_id, &range, ValueRenderOption::Formula)
        .await?;
    let cells = values.into_iter().next().unwrap_or_default();
    Ok(FormulaTemplate::new(row, cells))
}

pub async fn entry_form<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
) -> Result<EntryForm, AppError> {
    let sheet = require_sheet(ctx)?;
    let table = read_table(store, &ctx.spreadsheet_id, sheet).await?;
    let template = read_template(store, &ctx.spreadsheet_id, sheet).await?;
    let fields = form_fields(&table, &template.formula_columns())?;

    Ok(EntryForm {
        sheet: sheet.to_string(),
        fields,
        next_row: table.next_entry_row(),
    })
}
