use std::path::PathBuf;

use polars::df;
use polars::prelude::DataFrame;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::domain::{Message, SiftConfig, TableOptions};
use crate::model::{Model, Status};

fn people_df() -> DataFrame {
    df!(
        "Name" => ["Ann", "Bo", "Cy"],
        "Age" => ["30", "41", "30"],
        "City" => ["NYC", "LA", "NYC"],
    )
    .unwrap()
}

fn people_model(options: TableOptions) -> Model {
    let config = SiftConfig {
        options,
        ..SiftConfig::default()
    };
    let mut model = Model::init(&config, 120, 40);
    model.attach_dataframe("people.csv", people_df()).unwrap();
    model
}

fn press(model: &mut Model, code: KeyCode) {
    model
        .update(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

fn type_text(model: &mut Model, text: &str) {
    for ch in text.chars() {
        press(model, KeyCode::Char(ch));
    }
}

#[test]
fn filter_row_has_one_input_per_searchable_column() {
    let model = people_model(TableOptions::default());
    assert_eq!(model.filter_row().cells().len(), 3);
    assert_eq!(model.filter_row().input_count(), 3);

    let model = people_model(TableOptions::default().with_non_searchable(vec![1]));
    assert_eq!(model.filter_row().cells().len(), 3);
    assert_eq!(model.filter_row().input_count(), 2);
    assert!(model.filter_row().input(1).is_none());
    assert_eq!(
        model.filter_row().cell(1).map(|c| c.header.as_str()),
        Some("Age")
    );
}

#[test]
fn placeholders_equal_header_text() {
    let model = people_model(TableOptions::default());
    let placeholders: Vec<&str> = (0..3)
        .map(|p| model.filter_row().input(p).map(|i| i.placeholder()).unwrap())
        .collect();
    assert_eq!(placeholders, vec!["Name", "Age", "City"]);
}

#[test]
fn typing_applies_wrapped_regex_expression() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab); // Name -> Age
    type_text(&mut model, "30");

    let query = model.column_query(1).unwrap();
    assert_eq!(query.expression(), "((((30))))");
    assert!(query.is_regex());
    assert!(!query.is_smart());
    assert_eq!(model.visible_row_count(), 2);
}

#[test]
fn clearing_restores_smart_matching() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab);
    type_text(&mut model, "30");
    assert_eq!(model.visible_row_count(), 2);

    press(&mut model, KeyCode::Backspace);
    press(&mut model, KeyCode::Backspace);

    let query = model.column_query(1).unwrap();
    assert_eq!(query.expression(), "");
    assert!(!query.is_regex());
    assert!(query.is_smart());
    assert_eq!(model.visible_row_count(), 3);
}

#[test]
fn reapplying_the_same_filter_is_idempotent() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab);
    type_text(&mut model, "30");

    let expression = model.column_query(1).unwrap().expression().to_string();
    let rows = model.visible_values(0);

    // Touch the input so the same value is committed a second time
    type_text(&mut model, "0");
    press(&mut model, KeyCode::Backspace);

    assert_eq!(model.column_query(1).unwrap().expression(), expression);
    assert_eq!(model.visible_values(0), rows);
}

#[test]
fn age_filter_end_to_end() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab);
    type_text(&mut model, "30");

    assert_eq!(model.visible_values(0), vec!["Ann", "Cy"]);
    assert_eq!(model.visible_values(2), vec!["NYC", "NYC"]);

    press(&mut model, KeyCode::Backspace);
    press(&mut model, KeyCode::Backspace);
    assert_eq!(model.visible_values(0), vec!["Ann", "Bo", "Cy"]);
}

#[test]
fn filter_keystrokes_do_not_reach_table_shortcuts() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    assert!(model.raw_keyevents());

    // 'q' is the quit shortcut; while typing it has to end up in the input
    press(&mut model, KeyCode::Char('q'));
    assert_eq!(model.status, Status::READY);
    assert_eq!(model.filter_row().input(0).map(|i| i.value()), Some("q"));

    press(&mut model, KeyCode::Esc);
    assert!(!model.raw_keyevents());
    model.update(Message::Quit).unwrap();
    assert_eq!(model.status, Status::QUITTING);
}

#[test]
fn global_search_spans_all_columns() {
    let mut model = people_model(TableOptions::default());
    model.update(Message::GlobalSearch).unwrap();
    type_text(&mut model, "nyc");
    assert_eq!(model.visible_values(0), vec!["Ann", "Cy"]);

    press(&mut model, KeyCode::Esc);
    // Leaving the search box keeps the query applied
    assert_eq!(model.visible_row_count(), 2);
}

#[test]
fn sort_requests_are_ignored_while_ordering_is_disabled() {
    let df = df!(
        "Name" => ["Ann", "Bo", "Cy"],
        "Age" => [30i64, 41, 30],
    )
    .unwrap();
    let config = SiftConfig::default();
    let mut model = Model::init(&config, 120, 40);
    model.attach_dataframe("people", df).unwrap();

    model.update(Message::MoveRight).unwrap();
    model.update(Message::SortDescending).unwrap();
    assert_eq!(model.visible_values(0), vec!["Ann", "Bo", "Cy"]);
}

#[test]
fn numeric_sort_with_ordering_enabled() {
    let df = df!(
        "Name" => ["Ann", "Bo", "Cy"],
        "Age" => [30i64, 41, 30],
    )
    .unwrap();
    let config = SiftConfig {
        options: TableOptions::default().with_ordering(true),
        ..SiftConfig::default()
    };
    let mut model = Model::init(&config, 120, 40);
    model.attach_dataframe("people", df).unwrap();

    model.update(Message::MoveRight).unwrap();
    model.update(Message::SortDescending).unwrap();
    assert_eq!(model.visible_values(0), vec!["Bo", "Ann", "Cy"]);

    model.update(Message::SortAscending).unwrap();
    assert_eq!(model.visible_values(1), vec!["30", "30", "41"]);
}

#[test]
fn info_line_reflects_filtering() {
    let model = people_model(TableOptions::default());
    assert_eq!(model.get_uidata().info, None);

    let mut model = people_model(TableOptions::default().with_info(true));
    assert_eq!(model.get_uidata().info.as_deref(), Some("3 rows"));

    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab);
    type_text(&mut model, "30");
    assert_eq!(
        model.get_uidata().info.as_deref(),
        Some("2 rows (filtered from 3)")
    );
}

#[test]
fn csv_export_writes_the_visible_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let mut model = people_model(TableOptions::default());
    model.update(Message::FocusFilter).unwrap();
    press(&mut model, KeyCode::Tab);
    type_text(&mut model, "30");

    model.export_csv_to(&path);
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Name,Age,City");
    assert_eq!(lines.len(), 3);
    assert!(content.contains("Ann"));
    assert!(content.contains("Cy"));
    assert!(!content.contains("41"));
}

#[test]
fn export_buttons_follow_the_configuration() {
    let mut model = people_model(TableOptions::default());
    // Slot 2 is Excel in the default button set; no writer in this build
    model.update(Message::Export(2)).unwrap();
    assert!(
        model
            .get_uidata()
            .status_message
            .contains("Excel export is not available")
    );
    // Out-of-range slots are ignored
    model.update(Message::Export(9)).unwrap();
}

#[test]
fn a_table_without_columns_binds_an_empty_filter_row() {
    let config = SiftConfig::default();
    let mut model = Model::init(&config, 80, 24);
    model.attach_dataframe("empty", DataFrame::empty()).unwrap();

    assert_eq!(model.filter_row().input_count(), 0);
    model.update(Message::FocusFilter).unwrap();
    assert!(!model.raw_keyevents());
    model.update(Message::MoveDown).unwrap();
    model.update(Message::MoveEnd).unwrap();
    assert_eq!(model.visible_row_count(), 0);
}

#[test]
fn fixed_header_keeps_the_header_block_on_scroll() {
    let names: Vec<String> = (0..50).map(|i| format!("row{i}")).collect();
    let df = df!("Name" => &names).unwrap();

    let config = SiftConfig {
        options: TableOptions::default().with_fixed_header(false),
        ..SiftConfig::default()
    };
    let mut model = Model::init(&config, 40, 8);
    model.attach_dataframe("rows", df.clone()).unwrap();
    assert!(model.get_uidata().layout.header_visible);
    model.update(Message::MoveEnd).unwrap();
    assert!(!model.get_uidata().layout.header_visible);

    let config = SiftConfig::default();
    let mut model = Model::init(&config, 40, 8);
    model.attach_dataframe("rows", df).unwrap();
    model.update(Message::MoveEnd).unwrap();
    assert!(model.get_uidata().layout.header_visible);
    assert!(model.get_uidata().layout.filter_row_visible);
}

#[test]
fn fixture_csv_loads_and_binds() {
    let config = SiftConfig::default();
    let mut model = Model::init(&config, 120, 40);
    model
        .load_data_file(PathBuf::from("tests/fixtures/people.csv"))
        .unwrap();

    assert_eq!(model.visible_row_count(), 3);
    assert_eq!(model.filter_row().input_count(), 3);
    assert_eq!(
        model.filter_row().input(2).map(|i| i.placeholder()),
        Some("City")
    );
}
