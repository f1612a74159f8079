use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::table::SheetTable;
use crate::value::parse_number;

/// Upper bound on points in one sweep
pub const MAX_SWEEP_POINTS: usize = 500;

/// A what-if chart defined by a row of the CHARTS sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    pub name: String,
    pub chart_type: String,
    /// Cell driven by the sweep, e.g. `INPUTS!B3`
    pub input: String,
    pub input_low: f64,
    pub input_high: f64,
    pub input_step: f64,
    pub output1: String,
    pub output2: Option<String>,
    pub x_axis_low: f64,
    pub x_axis_high: f64,
}

impl ChartDefinition {
    pub fn sweep_points(&self) -> Result<Vec<f64>, ValidationError> {
        sweep_points(self.input_low, self.input_high, self.input_step)
    }
}

fn name_column(table: &SheetTable) -> Option<&'static str> {
    ["ChartName", "CHARTNAME"]
        .into_iter()
        .find(|c| table.column_index(c).is_some())
}

/// Parse every complete chart row of a CHARTS sheet.
///
/// Rows with a name but missing or non-numeric bounds are reported as
/// validation errors rather than skipped.
pub fn chart_definitions(table: &SheetTable) -> Result<Vec<ChartDefinition>, ValidationError> {
    let Some(name_col) = name_column(table) else {
        return Ok(Vec::new());
    };

    let mut charts = Vec::new();
    for row in 0..table.rows().len() {
        let Some(name) = table.get(row, name_col) else {
            continue;
        };
        let text = |column: &str| -> Result<String, ValidationError> {
            table
                .get(row, column)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| ValidationError::MissingField(format!("{name}: {column}")))
        };
        let number = |column: &str| -> Result<f64, ValidationError> {
            let raw = text(column)?;
            parse_number(&raw).ok_or(ValidationError::InvalidNumber {
                field: format!("{name}: {column}"),
                value: raw,
            })
        };

        charts.push(ChartDefinition {
            name: name.trim().to_string(),
            chart_type: text("TYPE")?,
            input: text("INPUT")?,
            input_low: number("INPUT LOW")?,
            input_high: number("INPUT HIGH")?,
            input_step: number("INPUT STEP")?,
            output1: text("OUTPUT1")?,
            output2: text("OUTPUT2").ok(),
            x_axis_low: number("X AXIS Low")?,
            x_axis_high: number("X AXIS HIGH")?,
        });
    }

    Ok(charts)
}

/// Digits after the decimal point in the shortest rendering of `value`.
fn decimal_places(value: f64) -> i32 {
    value
        .to_string()
        .split_once('.')
        .map_or(0, |(_, frac)| frac.len().min(10) as i32)
}

/// Inputs from `low` to `high` inclusive in increments of `step`, rounded
/// to the precision `low` and `step` are written with.
pub fn sweep_points(low: f64, high: f64, step: f64) -> Result<Vec<f64>, ValidationError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(ValidationError::InvalidSweep(format!(
            "step must be positive, got {step}"
        )));
    }
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(ValidationError::InvalidSweep(format!(
            "low {low} must not exceed high {high}"
        )));
    }

    let intervals = ((high - low) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_SWEEP_POINTS as f64 {
        return Err(ValidationError::InvalidSweep(format!(
            "{low} to {high} by {step} exceeds {MAX_SWEEP_POINTS} points"
        )));
    }
    let count = intervals as usize + 1;

    let scale = 10f64.powi(decimal_places(low).max(decimal_places(step)));
    Ok((0..count)
        .map(|i| ((low + step * i as f64) * scale).round() / scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_points_inclusive() {
        assert_eq!(sweep_points(0.0, 1.0, 0.25).unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(sweep_points(5.0, 5.0, 1.0).unwrap(), vec![5.0]);

        let points = sweep_points(0.0, 0.3, 0.1).unwrap();
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_sweep_points_rejects_bad_parameters() {
        assert!(sweep_points(0.0, 1.0, 0.0).is_err());
        assert!(sweep_points(0.0, 1.0, -1.0).is_err());
        assert!(sweep_points(2.0, 1.0, 1.0).is_err());
        assert!(sweep_points(0.0, 1000.0, 0.001).is_err());
    }

    #[test]
    fn test_sweep_points_huge_range_is_rejected() {
        assert!(matches!(
            sweep_points(0.0, 1e20, 1.0),
            Err(ValidationError::InvalidSweep(_))
        ));
        assert!(sweep_points(0.0, 1.0, 1e-300).is_err());
        assert!(sweep_points(-f64::MAX, f64::MAX, 1.0).is_err());
        assert_eq!(sweep_points(0.0, 499.0, 1.0).unwrap().len(), MAX_SWEEP_POINTS);
        assert!(sweep_points(0.0, 500.0, 1.0).is_err());
    }

    #[test]
    fn test_sweep_points_rounded_to_step_precision() {
        let points = sweep_points(0.02, 0.08, 0.01).unwrap();
        assert_eq!(points, vec![0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08]);
        assert_eq!(points[5].to_string(), "0.07");

        assert_eq!(sweep_points(0.0, 0.3, 0.1).unwrap(), vec![0.0, 0.1, 0.2, 0.3]);
        assert_eq!(sweep_points(1.5, 3.0, 0.5).unwrap(), vec![1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn test_chart_definitions() {
        let values: Vec<Vec<String>> = [
            vec![
                "ChartName", "TYPE", "INPUT", "INPUT LOW", "INPUT HIGH", "INPUT STEP", "OUTPUT1",
                "OUTPUT2", "X AXIS Low", "X AXIS HIGH",
            ],
            vec![
                "Retirement", "line", "INPUTS!B3", "0.02", "0.08", "0.01", "OUTPUTS!B2", "", "0",
                "0.1",
            ],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
        let table = SheetTable::from_values(&values, 1);

        let charts = chart_definitions(&table).unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].name, "Retirement");
        assert_eq!(charts[0].input, "INPUTS!B3");
        assert_eq!(charts[0].output2, None);
        assert_eq!(charts[0].sweep_points().unwrap().len(), 7);
    }
}
