use serde::{Deserialize, Serialize};

use crate::range::col_to_label;
use crate::value::{classify, ClassifiedValue};

/// One data row with its 1-based row number in the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub sheet_row: u32,
    pub cells: Vec<Option<String>>,
}

/// Missing-value summary for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnQuality {
    pub column: String,
    pub missing_rows: Vec<u32>,
    pub missing_percent: f64,
}

/// A range read from the remote store, shaped into headers and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| is_blank(c))
}

/// More than half of the first row is non-numeric text.
fn looks_like_header(row: &[String]) -> bool {
    if row.is_empty() {
        return false;
    }
    let meaningful = row
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .filter(|c| {
            let digits = c.replace('.', "");
            digits.is_empty() || !digits.chars().all(|d| d.is_ascii_digit())
        })
        .count();
    meaningful * 2 > row.len()
}

impl SheetTable {
    /// Shape raw values whose first row sits at sheet row `first_row`.
    ///
    /// The first row becomes the header when it looks like one; otherwise
    /// letter headers are synthesised and every row is data.
    pub fn from_values(values: &[Vec<String>], first_row: u32) -> Self {
        if values.iter().all(|row| is_blank_row(row)) {
            return SheetTable::default();
        }

        let width = values.iter().map(Vec::len).max().unwrap_or(0);
        let first = &values[0];
        let tabular = !is_blank_row(first) && looks_like_header(first);

        let (mut headers, data_start) = if tabular {
            (first.clone(), 1)
        } else {
            (Vec::new(), 0)
        };
        for i in headers.len()..width {
            headers.push(col_to_label(i as u32));
        }
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                if is_blank(&h) {
                    col_to_label(i as u32)
                } else {
                    h.trim().to_string()
                }
            })
            .collect();

        let rows = values
            .iter()
            .enumerate()
            .skip(data_start)
            .map(|(i, row)| {
                let cells = (0..headers.len())
                    .map(|c| match row.get(c) {
                        Some(cell) if !is_blank(cell) => Some(cell.clone()),
                        _ => None,
                    })
                    .collect();
                TableRow {
                    sheet_row: first_row + i as u32,
                    cells,
                }
            })
            .collect();

        SheetTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell by data-row position and header name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.cells.get(col)?.as_deref()
    }

    /// First row whose `column` matches `predicate`
    pub fn find_row<F>(&self, column: &str, predicate: F) -> Option<&TableRow>
    where
        F: Fn(&str) -> bool,
    {
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| row.cells.get(col).and_then(|c| c.as_deref()).is_some_and(&predicate))
    }

    /// Classify every cell, using its header as the column hint.
    pub fn classified(&self) -> Vec<Vec<Option<ClassifiedValue>>> {
        self.rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .zip(&self.headers)
                    .map(|(cell, header)| {
                        cell.as_deref()
                            .map(|raw| classify(raw, Some(header.as_str())))
                    })
                    .collect()
            })
            .collect()
    }

    /// Columns that have at least one missing value.
    pub fn quality_report(&self) -> Vec<ColumnQuality> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(col, header)| {
                let missing_rows: Vec<u32> = self
                    .rows
                    .iter()
                    .filter(|row| row.cells.get(col).map_or(true, Option::is_none))
                    .map(|row| row.sheet_row)
                    .collect();
                if missing_rows.is_empty() {
                    return None;
                }
                let missing_percent = missing_rows.len() as f64 / self.rows.len() as f64 * 100.0;
                Some(ColumnQuality {
                    column: header.clone(),
                    missing_rows,
                    missing_percent,
                })
            })
            .collect()
    }

    /// Row where the next entry goes: one below the last row holding any
    /// value, or 2 for an empty table. Gaps above that row stay empty.
    pub fn next_entry_row(&self) -> u32 {
        self.rows
            .iter()
            .filter(|row| row.cells.iter().any(Option::is_some))
            .map(|row| row.sheet_row + 1)
            .max()
            .unwrap_or(2)
    }
}
