use instapp_core::{cell_a1, ValidationError};
use serde::Serialize;

use crate::error::AppError;
use crate::payments::CheckoutSession;
use crate::store::{SheetStore, ValueRange, ValueRenderOption};

pub const SPONSORS_SHEET: &str = "Sponsors";
pub const PAID_COLUMN: &str = "Paid";
pub const MAX_PAYMENT_ROW: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub spreadsheet_id: String,
    pub cell: String,
    pub value: String,
}

/// Spreadsheet and row a paid checkout settles, from its metadata.
pub fn confirmation_target(session: &CheckoutSession) -> Result<(String, u32), AppError> {
    if !session.is_paid() {
        return Err(AppError::Payment(format!(
            "payment not completed, status {}",
            session.payment_status.as_deref().unwrap_or("unknown")
        )));
    }
    let spreadsheet_id = session
        .metadata
        .get("spreadsheet_id")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Payment("checkout is missing spreadsheet_id metadata".to_string())
        })?;
    let row = session
        .metadata
        .get("row_number")
        .ok_or_else(|| AppError::Payment("checkout is missing row_number metadata".to_string()))?;
    let row: u32 = row.trim().parse().map_err(|_| ValidationError::InvalidNumber {
        field: "row_number".to_string(),
        value: row.clone(),
    })?;
    Ok((spreadsheet_id.clone(), row))
}

/// Mark `row` of the Sponsors sheet as paid by `session_id`.
pub async fn record_payment<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    row: u32,
    session_id: &str,
) -> Result<PaymentConfirmation, AppError> {
    let metadata = store.metadata(spreadsheet_id).await?;
    if metadata.sheet(SPONSORS_SHEET).is_none() {
        return Err(AppError::NotFound(format!(
            "{SPONSORS_SHEET} sheet in spreadsheet {spreadsheet_id}"
        )));
    }
    if row == 0 || row > MAX_PAYMENT_ROW {
        return Err(ValidationError::Other(format!(
            "row {row} is out of range (1-{MAX_PAYMENT_ROW})"
        ))
        .into());
    }

    let headers = store
        .read_values(
            spreadsheet_id,
            &format!("{SPONSORS_SHEET}!A1:Z1"),
            ValueRenderOption::FormattedValue,
        )
        .await?;
    let paid_col = headers
        .first()
        .and_then(|row| row.iter().position(|h| h.trim() == PAID_COLUMN))
        .ok_or_else(|| {
            AppError::NotFound(format!("{PAID_COLUMN} column in {SPONSORS_SHEET} headers"))
        })?;

    let cell = cell_a1(SPONSORS_SHEET, paid_col as u32, row);
    let value = format!("PAID_STRIPE_{session_id}");
    store
        .batch_write(spreadsheet_id, vec![ValueRange::cell(cell.as_str(), value.as_str())])
        .await?;

    tracing::info!(cell = %cell, "Recorded payment");
    Ok(PaymentConfirmation {
        spreadsheet_id: spreadsheet_id.to_string(),
        cell,
        value,
    })
}
