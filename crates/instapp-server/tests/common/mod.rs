//! In-memory spreadsheet store for driving the services without a network.

#![allow(dead_code)]

use instapp_core::{column_letter_to_index, A1Range, GridRange};
use instapp_server::error::AppError;
use instapp_server::store::{
    SheetProperties, SheetStore, SpreadsheetFile, SpreadsheetMetadata, ValueRange,
    ValueRenderOption,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub type Grid = Vec<Vec<String>>;
type Recalc = Box<dyn Fn(&mut HashMap<String, Grid>) + Send + Sync>;

pub const SPREADSHEET_ID: &str = "sheet-1";

pub fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[derive(Default)]
pub struct FakeStore {
    titles: Vec<String>,
    sheets: Mutex<HashMap<String, Grid>>,
    writes: Mutex<Vec<(String, Grid)>>,
    formats: Mutex<Vec<(GridRange, GridRange)>>,
    recalc: Option<Recalc>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, title: &str, values: Grid) -> Self {
        self.titles.push(title.to_string());
        self.sheets
            .get_mut()
            .unwrap()
            .insert(title.to_string(), values);
        self
    }

    /// Run after every write, standing in for formula recalculation.
    pub fn with_recalc<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HashMap<String, Grid>) + Send + Sync + 'static,
    {
        self.recalc = Some(Box::new(f));
        self
    }

    pub fn cell(&self, sheet: &str, a1: &str) -> String {
        let range = A1Range::parse(a1).unwrap();
        let col = column_letter_to_index(&range.start_col).unwrap() as usize;
        let row = range.start_row as usize - 1;
        self.sheets.lock().unwrap()[sheet]
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<(String, Grid)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn formats(&self) -> Vec<(GridRange, GridRange)> {
        self.formats.lock().unwrap().clone()
    }

    fn sheet_id(&self, title: &str) -> i64 {
        self.titles.iter().position(|t| t == title).unwrap_or(0) as i64 + 10
    }

    fn locate(range: &str) -> Result<(String, A1Range), AppError> {
        let parsed = A1Range::parse(range)?;
        let sheet = parsed
            .sheet
            .clone()
            .ok_or_else(|| AppError::Internal(format!("range without sheet: {range}")))?;
        Ok((sheet, parsed))
    }

    fn put(&self, range: &str, values: Grid) -> Result<(), AppError> {
        let (sheet, parsed) = Self::locate(range)?;
        let start_col = column_letter_to_index(&parsed.start_col)? as usize;
        {
            let mut sheets = self.sheets.lock().unwrap();
            let grid = sheets
                .get_mut(&sheet)
                .ok_or_else(|| AppError::NotFound(sheet.clone()))?;
            for (i, row_values) in values.iter().enumerate() {
                let row = parsed.start_row as usize - 1 + i;
                if grid.len() <= row {
                    grid.resize(row + 1, Vec::new());
                }
                for (j, value) in row_values.iter().enumerate() {
                    let col = start_col + j;
                    if grid[row].len() <= col {
                        grid[row].resize(col + 1, String::new());
                    }
                    grid[row][col] = value.clone();
                }
            }
            if let Some(recalc) = &self.recalc {
                recalc(&mut *sheets);
            }
        }
        self.writes.lock().unwrap().push((range.to_string(), values));
        Ok(())
    }
}

impl SheetStore for FakeStore {
    async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetFile>, AppError> {
        Ok(vec![SpreadsheetFile {
            id: SPREADSHEET_ID.to_string(),
            name: "Test".to_string(),
        }])
    }

    async fn metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetMetadata, AppError> {
        Ok(SpreadsheetMetadata {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: "Test".to_string(),
            sheets: self
                .titles
                .iter()
                .enumerate()
                .map(|(i, title)| SheetProperties {
                    sheet_id: self.sheet_id(title),
                    title: title.clone(),
                    index: i as i64,
                })
                .collect(),
        })
    }

    async fn read_values(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        _render: ValueRenderOption,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let (sheet, parsed) = Self::locate(range)?;
        let start_col = column_letter_to_index(&parsed.start_col)? as usize;
        let end_col = column_letter_to_index(&parsed.end_col)? as usize;

        let sheets = self.sheets.lock().unwrap();
        let grid = sheets
            .get(&sheet)
            .ok_or_else(|| AppError::NotFound(format!("range {range}")))?;

        let mut rows: Grid = (parsed.start_row as usize - 1..parsed.end_row as usize)
            .map(|r| {
                let row = grid.get(r).cloned().unwrap_or_default();
                let mut cells: Vec<String> = (start_col..=end_col)
                    .map(|c| row.get(c).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(String::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn write_values(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), AppError> {
        self.put(range, values)
    }

    async fn batch_write(
        &self,
        _spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), AppError> {
        for update in data {
            self.put(&update.range, update.values)?;
        }
        Ok(())
    }

    async fn copy_format(
        &self,
        _spreadsheet_id: &str,
        source: GridRange,
        destination: GridRange,
    ) -> Result<(), AppError> {
        self.formats.lock().unwrap().push((source, destination));
        Ok(())
    }
}
