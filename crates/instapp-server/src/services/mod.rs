//! Operations composed from the store, the codecs and the payment client.
//!
//! Every function takes the store and an explicit [`RequestContext`]; none
//! of them keeps state between calls.

pub mod charts;
pub mod entries;
pub mod inputs;
pub mod payments;
pub mod sheets;
pub mod upload;

use instapp_core::{quote_sheet, SheetTable, ValidationError};

use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::{SheetStore, ValueRenderOption};

/// Largest block read or written for a whole sheet
pub const TABLE_RANGE: &str = "A1:Z1000";

pub fn table_range(sheet: &str) -> String {
    format!("{}!{}", quote_sheet(sheet), TABLE_RANGE)
}

pub(crate) fn require_sheet(ctx: &RequestContext) -> Result<&str, AppError> {
    ctx.sheet
        .as_deref()
        .ok_or_else(|| ValidationError::MissingField("sheet".to_string()).into())
}

/// Read a sheet's table as displayed.
pub async fn read_table<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    sheet: &str,
) -> Result<SheetTable, AppError> {
    let values = store
        .read_values(spreadsheet_id, &table_range(sheet), ValueRenderOption::FormattedValue)
        .await?;
    Ok(SheetTable::from_values(&values, 1))
}
