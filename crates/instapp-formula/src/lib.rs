//! Formula row shifting for template-based row appends.

pub mod shift;
pub mod template;

pub use shift::{is_formula, shift_formula, shift_formula_row, shift_formula_row_strict, ShiftMode};
pub use template::FormulaTemplate;
