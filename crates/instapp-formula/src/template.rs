use serde::{Deserialize, Serialize};

use crate::shift::{is_formula, shift_formula, ShiftMode};

/// The formula row new entries are cloned from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaTemplate {
    source_row: u32,
    cells: Vec<String>,
}

impl FormulaTemplate {
    /// Template rows sit directly under the header.
    pub const DEFAULT_ROW: u32 = 2;

    /// `cells` are the template row's formulas as stored, not computed values.
    pub fn new(source_row: u32, cells: Vec<String>) -> Self {
        Self { source_row, cells }
    }

    pub fn source_row(&self) -> u32 {
        self.source_row
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Which columns hold formulas
    pub fn formula_columns(&self) -> Vec<bool> {
        self.cells.iter().map(|c| is_formula(c)).collect()
    }

    /// The template row rewritten for `target_row`.
    ///
    /// Formula cells are shifted; literal cells come back blank.
    pub fn instantiate(&self, target_row: u32, mode: ShiftMode) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| {
                if is_formula(cell) {
                    shift_formula(cell, self.source_row, target_row, mode)
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Instantiate for `target_row` and overlay submitted `(column, value)`
    /// pairs, widening the row when a value lies past the template.
    pub fn merge(&self, target_row: u32, mode: ShiftMode, values: &[(u32, String)]) -> Vec<String> {
        let mut row = self.instantiate(target_row, mode);
        for (col, value) in values {
            let col = *col as usize;
            if col >= row.len() {
                row.resize(col + 1, String::new());
            }
            row[col] = value.clone();
        }
        row
    }
}
