use instapp_core::{chart_definitions, parse_number, ChartDefinition};
use serde::Serialize;
use std::time::Duration;

use super::read_table;
use crate::error::AppError;
use crate::session::RequestContext;
use crate::store::{SheetStore, ValueRenderOption};

pub const CHARTS_SHEET: &str = "CHARTS";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub input: f64,
    pub output1: Option<f64>,
    pub output2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub chart: ChartDefinition,
    pub points: Vec<SweepPoint>,
}

/// Charts defined on the CHARTS sheet; empty when there is none.
pub async fn list_charts<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
) -> Result<Vec<ChartDefinition>, AppError> {
    let metadata = store.metadata(&ctx.spreadsheet_id).await?;
    if metadata.sheet(CHARTS_SHEET).is_none() {
        return Ok(Vec::new());
    }
    let table = read_table(store, &ctx.spreadsheet_id, CHARTS_SHEET).await?;
    Ok(chart_definitions(&table)?)
}

async fn read_number<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    cell: &str,
) -> Result<Option<f64>, AppError> {
    let values = store
        .read_values(spreadsheet_id, cell, ValueRenderOption::UnformattedValue)
        .await?;
    Ok(values
        .first()
        .and_then(|row| row.first())
        .and_then(|raw| parse_number(raw.trim_start_matches('$').trim_end_matches('%'))))
}

async fn write_cell<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    cell: &str,
    value: String,
) -> Result<(), AppError> {
    store
        .write_values(spreadsheet_id, cell, vec![vec![value]])
        .await
}

async fn sweep<S: SheetStore>(
    store: &S,
    spreadsheet_id: &str,
    chart: &ChartDefinition,
    points: &[f64],
    settle: Duration,
) -> Result<Vec<SweepPoint>, AppError> {
    let mut results = Vec::with_capacity(points.len());
    for &input in points {
        write_cell(store, spreadsheet_id, &chart.input, input.to_string()).await?;
        tokio::time::sleep(settle).await;

        let output1 = read_number(store, spreadsheet_id, &chart.output1).await?;
        let output2 = match &chart.output2 {
            Some(cell) => read_number(store, spreadsheet_id, cell).await?,
            None => None,
        };
        tracing::debug!(chart = %chart.name, input, ?output1, ?output2, "Sweep point");
        results.push(SweepPoint {
            input,
            output1,
            output2,
        });
    }
    Ok(results)
}

/// Drive a chart's input cell across its range and read the outputs after
/// each step.
///
/// Each point writes the input, waits `settle` for the sheet to recalculate,
/// then reads the outputs. The input's original content is written back
/// whether or not the sweep succeeds. Nothing stops another writer from
/// touching the sheet mid-sweep.
pub async fn run_sweep<S: SheetStore>(
    store: &S,
    ctx: &RequestContext,
    chart_name: &str,
    settle: Duration,
) -> Result<SweepResult, AppError> {
    let chart = list_charts(store, ctx)
        .await?
        .into_iter()
        .find(|c| c.name == chart_name)
        .ok_or_else(|| AppError::NotFound(format!("chart {chart_name}")))?;
    let points = chart.sweep_points()?;

    let original = store
        .read_values(&ctx.spreadsheet_id, &chart.input, ValueRenderOption::Formula)
        .await?
        .first()
        .and_then(|row| row.first().cloned())
        .unwrap_or_default();

    tracing::info!(chart = %chart.name, points = points.len(), "Starting sweep");
    let outcome = sweep(store, &ctx.spreadsheet_id, &chart, &points, settle).await;
    let restored = write_cell(store, &ctx.spreadsheet_id, &chart.input, original).await;

    match (outcome, restored) {
        (Ok(points), Ok(())) => Ok(SweepResult { chart, points }),
        (Ok(_), Err(e)) => {
            tracing::error!(cell = %chart.input, error = %e, "Failed to restore sweep input");
            Err(e)
        }
        (Err(e), restored) => {
            if let Err(restore_err) = restored {
                tracing::error!(
                    cell = %chart.input,
                    error = %restore_err,
                    "Failed to restore sweep input"
                );
            }
            Err(e)
        }
    }
}
