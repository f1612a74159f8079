mod common;

use common::{grid, FakeStore, SPREADSHEET_ID};
use instapp_core::{GridRange, InputValue, Submission, ValueKind};
use instapp_formula::ShiftMode;
use instapp_server::error::AppError;
use instapp_server::services::{charts, entries, inputs, payments, sheets, upload};
use instapp_server::session::RequestContext;
use std::time::Duration;

fn orders_store() -> FakeStore {
    FakeStore::new().with_sheet(
        "Orders",
        grid(&[
            &["Name", "Price", "QTY", "Total"],
            &["Widget", "$5.00", "3", "=B2*C2"],
            &["Gadget", "$2.00", "12", "=B3*C3"],
        ]),
    )
}

fn submission(pairs: &[(&str, &str)]) -> Submission {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn orders_ctx() -> RequestContext {
    RequestContext::new(SPREADSHEET_ID).with_sheet("Orders")
}

#[tokio::test]
async fn append_entry_shifts_template_formulas() {
    let store = orders_store();
    let values = submission(&[("Name", "Bolt"), ("Price", "$4"), ("QTY", "2")]);

    let outcome = entries::append_entry(&store, &orders_ctx(), &values, ShiftMode::Textual)
        .await
        .unwrap();

    assert_eq!(outcome.row, 4);
    assert_eq!(outcome.range, "Orders!A4:D4");
    assert_eq!(outcome.values, vec!["Bolt", "$4.00", "2", "=B4*C4"]);
    assert_eq!(outcome.payment_amount, Some(8.0));
    assert_eq!(store.cell("Orders", "D4"), "=B4*C4");

    let formats = store.formats();
    assert_eq!(formats.len(), 1);
    assert_eq!(
        formats[0].1,
        GridRange {
            sheet_id: 10,
            start_row_index: 3,
            end_row_index: 4,
            start_column_index: 0,
            end_column_index: 4,
        }
    );
}

#[tokio::test]
async fn append_entry_skips_past_gaps_in_first_column() {
    let store = FakeStore::new().with_sheet(
        "Orders",
        grid(&[
            &["Name", "Price", "QTY", "Total"],
            &["Widget", "$5.00", "3", "=B2*C2"],
            &["", "", "", ""],
            &["Gadget", "$2.00", "12", "=B4*C4"],
        ]),
    );
    let values = submission(&[("Name", "Bolt"), ("Price", "$4"), ("QTY", "2")]);

    let outcome = entries::append_entry(&store, &orders_ctx(), &values, ShiftMode::Textual)
        .await
        .unwrap();

    assert_eq!(outcome.row, 5);
    assert_eq!(store.cell("Orders", "A4"), "Gadget");
    assert_eq!(store.cell("Orders", "A5"), "Bolt");
    assert_eq!(store.cell("Orders", "D5"), "=B5*C5");
}

#[tokio::test]
async fn append_entry_rejects_missing_fields_without_writing() {
    let store = orders_store();
    let values = submission(&[("Name", "Bolt"), ("Price", "$4")]);

    let err = entries::append_entry(&store, &orders_ctx(), &values, ShiftMode::Textual)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn append_entry_checks_users_sheet() {
    let store = orders_store().with_sheet(
        "USERS",
        grid(&[&["User Name", "APPENDALL"], &["alice", "Orders, Volunteers"]]),
    );
    let values = submission(&[("Name", "Bolt"), ("Price", "$4"), ("QTY", "2")]);

    let anonymous = orders_ctx();
    let err = entries::append_entry(&store, &anonymous, &values, ShiftMode::Textual)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let bob = orders_ctx().with_username(Some("bob".into()));
    let err = entries::append_entry(&store, &bob, &values, ShiftMode::Textual)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let alice = orders_ctx().with_username(Some("Alice".into()));
    let outcome = entries::append_entry(&store, &alice, &values, ShiftMode::Textual)
        .await
        .unwrap();
    assert_eq!(outcome.row, 4);
}

#[tokio::test]
async fn entry_form_skips_formula_columns() {
    let store = orders_store();
    let form = sheets::entry_form(&store, &orders_ctx()).await.unwrap();

    let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Name", "Price", "QTY"]);
    assert_eq!(form.next_row, 4);
}

#[tokio::test]
async fn read_sheet_classifies_cells() {
    let store = orders_store();
    let view = sheets::read_sheet(&store, &orders_ctx()).await.unwrap();

    assert_eq!(view.headers, vec!["Name", "Price", "QTY", "Total"]);
    assert_eq!(view.rows.len(), 2);

    let price = view.rows[1].cells[1].as_ref().unwrap();
    assert_eq!(price.kind, ValueKind::Currency);
    assert_eq!(price.numeric, Some(2.0));
    assert_eq!(price.display, "$2.00");

    let total = view.rows[0].cells[3].as_ref().unwrap();
    assert_eq!(total.kind, ValueKind::Formula);
    assert!(view.quality.is_empty());
}

#[tokio::test]
async fn read_sheet_requires_sheet_name() {
    let store = orders_store();
    let err = sheets::read_sheet(&store, &RequestContext::new(SPREADSHEET_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

fn chart_store(output1: &str) -> FakeStore {
    FakeStore::new()
        .with_sheet(
            "CHARTS",
            grid(&[
                &[
                    "ChartName", "TYPE", "INPUT", "INPUT LOW", "INPUT HIGH", "INPUT STEP",
                    "OUTPUT1", "OUTPUT2", "X AXIS Low", "X AXIS HIGH",
                ],
                &["Growth", "line", "INPUTS!B3", "1", "3", "1", output1, "", "0", "5"],
            ]),
        )
        .with_sheet(
            "INPUTS",
            grid(&[&["Name", "Value"], &["Rate", "5%"], &["Years", "10"]]),
        )
        .with_sheet("OUTPUTS", grid(&[&["Name", "Value"], &["Total", "20"]]))
        .with_recalc(|sheets| {
            let years: f64 = sheets["INPUTS"][2][1].parse().unwrap_or(0.0);
            sheets.get_mut("OUTPUTS").unwrap()[1][1] = (years * 2.0).to_string();
        })
}

#[tokio::test]
async fn sweep_reads_outputs_and_restores_input() {
    let store = chart_store("OUTPUTS!B2");
    let ctx = RequestContext::new(SPREADSHEET_ID);

    let result = charts::run_sweep(&store, &ctx, "Growth", Duration::ZERO)
        .await
        .unwrap();

    let inputs: Vec<f64> = result.points.iter().map(|p| p.input).collect();
    let outputs: Vec<Option<f64>> = result.points.iter().map(|p| p.output1).collect();
    assert_eq!(inputs, vec![1.0, 2.0, 3.0]);
    assert_eq!(outputs, vec![Some(2.0), Some(4.0), Some(6.0)]);
    assert!(result.points.iter().all(|p| p.output2.is_none()));
    assert_eq!(store.cell("INPUTS", "B3"), "10");
}

#[tokio::test]
async fn sweep_restores_input_after_failure() {
    let store = chart_store("MISSING!B2");
    let ctx = RequestContext::new(SPREADSHEET_ID);

    let err = charts::run_sweep(&store, &ctx, "Growth", Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(store.cell("INPUTS", "B3"), "10");
    let last_write = store.writes().pop().unwrap();
    assert_eq!(last_write.0, "INPUTS!B3");
}

#[tokio::test]
async fn sweep_unknown_chart_is_not_found() {
    let store = chart_store("OUTPUTS!B2");
    let ctx = RequestContext::new(SPREADSHEET_ID);
    let err = charts::run_sweep(&store, &ctx, "Nope", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn input_cell_read_and_update() {
    let store = FakeStore::new().with_sheet(
        "INPUTS",
        grid(&[&["Name", "Value"], &["Allocation", "0.25"]]),
    );
    let ctx = RequestContext::new(SPREADSHEET_ID);

    let field = inputs::input_field(&store, &ctx).await.unwrap().unwrap();
    assert_eq!(field.name, "Allocation");
    assert_eq!(field.numeric, Some(25.0));
    assert_eq!(field.display, "25%");

    let written = inputs::update_input(&store, &ctx, 3, &InputValue::Number(0.5))
        .await
        .unwrap();
    assert_eq!(written, "0.5000");
    assert_eq!(store.cell("INPUTS", "B3"), "0.5000");

    let err = inputs::update_input(&store, &ctx, 0, &InputValue::Number(1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn input_field_missing_is_none() {
    let store = FakeStore::new().with_sheet("INPUTS", grid(&[&["Name", "Value"]]));
    let field = inputs::input_field(&store, &RequestContext::new(SPREADSHEET_ID))
        .await
        .unwrap();
    assert!(field.is_none());
}

fn sponsors_store() -> FakeStore {
    FakeStore::new().with_sheet(
        "Sponsors",
        grid(&[&["Name", "Amount", "Paid"], &["Acme", "$100.00"]]),
    )
}

#[tokio::test]
async fn record_payment_marks_paid_column() {
    let store = sponsors_store();
    let confirmation = payments::record_payment(&store, SPREADSHEET_ID, 2, "cs_test_1")
        .await
        .unwrap();

    assert_eq!(confirmation.cell, "Sponsors!C2");
    assert_eq!(confirmation.value, "PAID_STRIPE_cs_test_1");
    assert_eq!(store.cell("Sponsors", "C2"), "PAID_STRIPE_cs_test_1");
}

#[tokio::test]
async fn record_payment_validates_target() {
    let store = sponsors_store();
    let err = payments::record_payment(&store, SPREADSHEET_ID, 1001, "cs_test_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let store = FakeStore::new().with_sheet("Sponsors", grid(&[&["Name", "Amount"]]));
    let err = payments::record_payment(&store, SPREADSHEET_ID, 2, "cs_test_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let store = FakeStore::new().with_sheet("Orders", grid(&[&["Paid"]]));
    let err = payments::record_payment(&store, SPREADSHEET_ID, 2, "cs_test_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn upload_writes_formatted_grid() {
    let store = FakeStore::new().with_sheet("Funds", Vec::new());
    let ctx = RequestContext::new(SPREADSHEET_ID).with_sheet("Funds");

    let summary = upload::upload_csv(&store, &ctx, "Fund,Yield\nA,0.05\nB,0.1\n")
        .await
        .unwrap();

    assert_eq!(summary.range, "Funds!A1:B3");
    assert_eq!(summary.rows, 3);
    assert_eq!(store.cell("Funds", "B2"), "5.0%");
    assert_eq!(store.cell("Funds", "B3"), "10.0%");
}

#[tokio::test]
async fn list_sheets_uses_metadata() {
    let store = orders_store().with_sheet("USERS", Vec::new());
    let titles = sheets::list_sheets(&store, &RequestContext::new(SPREADSHEET_ID))
        .await
        .unwrap();
    assert_eq!(titles, vec!["Orders", "USERS"]);

    let files = sheets::list_spreadsheets(&store).await.unwrap();
    assert_eq!(files[0].id, SPREADSHEET_ID);
}
