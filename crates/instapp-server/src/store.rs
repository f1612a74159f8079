//! The remote spreadsheet store seen as a key-range store.

use instapp_core::GridRange;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

use crate::error::AppError;

/// A spreadsheet visible to the credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetMetadata {
    pub spreadsheet_id: String,
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetMetadata {
    pub fn sheet(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets.iter().find(|s| s.title == title)
    }

    pub fn sheet_titles(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }
}

/// How cell contents come back from a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueRenderOption {
    /// As displayed, e.g. `$1,234.50`
    #[default]
    FormattedValue,
    UnformattedValue,
    /// Formulas as written, e.g. `=B2*C2`
    Formula,
}

impl ValueRenderOption {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueRenderOption::FormattedValue => "FORMATTED_VALUE",
            ValueRenderOption::UnformattedValue => "UNFORMATTED_VALUE",
            ValueRenderOption::Formula => "FORMULA",
        }
    }
}

/// One range of a batch write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn new(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            range: range.into(),
            values,
        }
    }

    pub fn cell(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(range, vec![vec![value.into()]])
    }
}

/// Render a JSON cell the way the store displays it.
pub fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Operations the services need from the remote store.
///
/// Writes use `USER_ENTERED` semantics: the store parses numbers, dates
/// and formulas itself.
pub trait SheetStore: Send + Sync {
    fn list_spreadsheets(
        &self,
    ) -> impl Future<Output = Result<Vec<SpreadsheetFile>, AppError>> + Send;

    fn metadata(
        &self,
        spreadsheet_id: &str,
    ) -> impl Future<Output = Result<SpreadsheetMetadata, AppError>> + Send;

    /// Rows of the range; trailing empty cells and rows may be missing.
    fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> impl Future<Output = Result<Vec<Vec<String>>, AppError>> + Send;

    fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn batch_write(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Copy cell formatting from one grid range to another.
    fn copy_format(
        &self,
        spreadsheet_id: &str,
        source: GridRange,
        destination: GridRange,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
