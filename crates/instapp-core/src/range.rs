use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AddressError;

/// Decode column letters to a 0-based index (A -> 0, Z -> 25, AA -> 26).
///
/// Case-insensitive. Every character must be an ASCII letter.
pub fn column_letter_to_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::InvalidAddress(letters.to_string()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(AddressError::InvalidAddress(letters.to_string()));
        }
        col = col
            .checked_mul(26)
            .and_then(|n| n.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
            .ok_or_else(|| AddressError::InvalidAddress(letters.to_string()))?;
    }

    Ok(col - 1)
}

/// Encode a 0-based index as a single column letter.
///
/// New-entry forms only target sheets with at most 26 columns, so anything
/// past `Z` is rejected. Use [`col_to_label`] for the general encoding.
pub fn index_to_column_letter(index: u32) -> Result<String, AddressError> {
    if index > 25 {
        return Err(AddressError::ColumnOutOfRange(index));
    }
    Ok(char::from(b'A' + index as u8).to_string())
}

/// Convert column index (0-indexed) to label (A, B, ..., Z, AA, AB, ...)
pub fn col_to_label(col: u32) -> String {
    let mut label = String::new();
    let mut n = col as u64 + 1;

    while n > 0 {
        n -= 1;
        label.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }

    label
}

/// A1 address of a single cell, `col` 0-based and `row` 1-based.
pub fn cell_a1(sheet: &str, col: u32, row: u32) -> String {
    format!("{}!{}{}", quote_sheet(sheet), col_to_label(col), row)
}

/// Sheet name as it must appear before `!` in an A1 range.
pub fn quote_sheet(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// A rectangular A1 range. Rows are 1-based and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A1Range {
    pub sheet: Option<String>,
    pub start_col: String,
    pub start_row: u32,
    pub end_col: String,
    pub end_row: u32,
}

impl A1Range {
    /// One full row from `first_col` to `last_col` (0-based columns).
    pub fn row(sheet: &str, first_col: u32, last_col: u32, row: u32) -> Self {
        A1Range {
            sheet: Some(sheet.to_string()),
            start_col: col_to_label(first_col),
            start_row: row,
            end_col: col_to_label(last_col),
            end_row: row,
        }
    }

    /// Parse `"Sheet1!A2:D2"`, `"A2:D2"` or a single cell like `"B7"`.
    pub fn parse(range: &str) -> Result<Self, AddressError> {
        let range = range.trim();
        let (sheet, cells) = match range.rsplit_once('!') {
            Some((sheet, cells)) => (Some(unquote_sheet(sheet)), cells),
            None => (None, range),
        };

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, end),
            None => (cells, cells),
        };

        let (start_col, start_row) = split_cell_token(start)?;
        let (end_col, end_row) = split_cell_token(end)?;

        if start_row > end_row {
            return Err(AddressError::MalformedRange(range.to_string()));
        }

        Ok(A1Range {
            sheet,
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }

    /// Convert to the 0-based half-open grid coordinates used by batch updates.
    pub fn to_grid_range(&self, sheet_id: i64) -> Result<GridRange, AddressError> {
        Ok(GridRange {
            sheet_id,
            start_row_index: self.start_row - 1,
            end_row_index: self.end_row,
            start_column_index: column_letter_to_index(&self.start_col)?,
            end_column_index: column_letter_to_index(&self.end_col)? + 1,
        })
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet(sheet))?;
        }
        if self.is_single_cell() {
            write!(f, "{}{}", self.start_col, self.start_row)
        } else {
            write!(
                f,
                "{}{}:{}{}",
                self.start_col, self.start_row, self.end_col, self.end_row
            )
        }
    }
}

fn unquote_sheet(sheet: &str) -> String {
    let sheet = sheet.trim();
    match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}

/// Split `"AB12"` into `("AB", 12)` by character class.
fn split_cell_token(token: &str) -> Result<(String, u32), AddressError> {
    let malformed = || AddressError::MalformedRange(token.to_string());

    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(malformed());
    }

    let split = token
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(malformed)?;
    let (letters, digits) = token.split_at(split);

    if letters.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }

    let row: u32 = digits.parse().map_err(|_| malformed())?;
    if row == 0 {
        return Err(malformed());
    }

    Ok((letters.to_ascii_uppercase(), row))
}

/// 0-based, end-exclusive grid coordinates (`GridRange` in the Sheets API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}
