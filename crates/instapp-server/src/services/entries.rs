use instapp_core::{
    can_append, form_fields, payment_amount, render_submission, A1Range, Submission,
    ValidationError,
};
use instapp_formula::ShiftMode;
use serde::Serialize;

use super::sheets::read_template;
use super::{read_table, require_sheet};
use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::SheetStore;

pub const USERS_SHEET: &str = "USERS";

/// Where a new entry landed and what was written
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub row: u32,
    pub range: String,
    pub values: Vec<String>,
    /// `Price * QTY` when the entry calls for payment
    pub payment_amount: Option<f64>,
}

/// Spreadsheets with a USERS sheet only accept entries from listed users.
async fn check_permission<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
    sheet: &str,
    has_users_sheet: bool,
) -> Result<(), AppError> {
    if !has_users_sheet {
        return Ok(());
    }
    let Some(username) = ctx.username.as_deref() else {
        return Err(AppError::PermissionDenied(
            "a username is required to add entries".to_string(),
        ));
    };
    let users = read_table(store, &ctx.spreadsheet_id, USERS_SHEET).await?;
    if !can_append(&users, username, sheet) {
        tracing::warn!(username, sheet, "Append refused");
        return Err(AppError::PermissionDenied(format!(
            "{username} may not add entries to {sheet}"
        )));
    }
    Ok(())
}

/// Append a validated submission below the last entry.
///
/// The new row starts as a copy of the template row: formulas are shifted to
/// the new row, literal cells are blank, and submitted values fill the form
/// columns. Row formatting is copied from the template when possible.
pub async fn append_entry<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
    submission: &Submission,
    mode: ShiftMode,
) -> Result<AppendOutcome, AppError> {
    let sheet = require_sheet(ctx)?;
    let metadata = store.metadata(&ctx.spreadsheet_id).await?;
    let sheet_id = metadata
        .sheet(sheet)
        .map(|s| s.sheet_id)
        .ok_or_else(|| AppError::NotFound(format!("sheet {sheet}")))?;

    check_permission(store, ctx, sheet, metadata.sheet(USERS_SHEET).is_some()).await?;

    let table = read_table(store, &ctx.spreadsheet_id, sheet).await?;
    let template = read_template(store, &ctx.spreadsheet_id, sheet).await?;
    let fields = form_fields(&table, &template.formula_columns())?;
    let rendered = render_submission(&fields, submission)?;
    let amount = payment_amount(submission)?;

    let row = table.next_entry_row();
    let values = template.merge(row, mode, &rendered);
    if values.is_empty() {
        return Err(ValidationError::Other(format!("{sheet} has no columns to fill")).into());
    }
    let last_col = values.len() as u32 - 1;

    let range = A1Range::row(sheet, 0, last_col, row);
    store
        .write_values(&ctx.spreadsheet_id, &range.to_string(), vec![values.clone()])
        .await?;

    if row != template.source_row() {
        let source =
            A1Range::row(sheet, 0, last_col, template.source_row()).to_grid_range(sheet_id)?;
        let destination = range.to_grid_range(sheet_id)?;
        if let Err(e) = store
            .copy_format(&ctx.spreadsheet_id, source, destination)
            .await
        {
            tracing::warn!(sheet, row, error = %e, "Entry written but formatting was not copied");
        }
    }

    tracing::info!(sheet, row, ?mode, "Appended entry");
    Ok(AppendOutcome {
        row,
        range: range.to_string(),
        values,
        payment_amount: amount,
    })
}
