pub mod chart;
pub mod error;
pub mod form;
pub mod format;
pub mod range;
pub mod table;
pub mod value;

pub use chart::{chart_definitions, sweep_points, ChartDefinition};
pub use error::{AddressError, ValidationError};
pub use form::{
    can_append, form_fields, payment_amount, render_submission, FieldKind, FormField, Submission,
};
pub use range::{
    cell_a1, col_to_label, column_letter_to_index, index_to_column_letter, quote_sheet, A1Range,
    GridRange,
};
pub use table::{ColumnQuality, SheetTable, TableRow};
pub use value::{
    classify, format_input_value, format_output_value, is_rate_column, parse_number,
    to_display_string, upload_format, ClassifiedValue, InputValue, UploadColumn, ValueKind,
};
