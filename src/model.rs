use arboard::Clipboard;
use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::{ExportButton, HELP_TEXT, Message, SiftConfig, SiftError};
use crate::filter::{FilterInput, FilterRow, search_expression};
use crate::search::ColumnQuery;
use crate::ui::{
    BUTTONS_ROW_HEIGHT, COLUMN_WIDTH_MARGIN, FILTER_ROW_HEIGHT, SCROLLBAR_WIDTH,
    STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT,
};

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

#[derive(Debug)]
pub struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

pub struct Column {
    idx: u16,
    name: String,
    max_width: usize,
    render_width: usize,
    data: Vec<String>,
    dtype: DataType,
}

impl Column {
    pub fn as_string(&self) -> String {
        format!(
            "{} \"{}\", {:?}, width_max: {}, render_width: {}, # rows {}",
            self.idx,
            self.name,
            self.dtype,
            self.max_width,
            self.render_width,
            self.data.len(),
        )
    }
}

#[derive(Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    FILTER,
    SEARCH,
    POPUP,
}

/// View state of the widget: which rows survive the applied queries, where
/// the cursor sits and which part of the table fits on screen.
pub struct TableView {
    name: String,
    rows: Vec<usize>, // Mapping of view row index to data index
    visible_columns: Vec<usize>,
    visible_width: usize,
    cursor_row: usize,
    cursor_column: usize,
    offset_row: usize,
    offset_column: usize,
    data: Vec<ColumnView>,
    height: usize,
    width: usize,
}

impl TableView {
    fn empty() -> Self {
        TableView {
            name: String::new(),
            rows: Vec::new(),
            visible_columns: Vec::new(),
            visible_width: 0,
            cursor_row: 0,
            cursor_column: 0,
            offset_row: 0,
            offset_column: 0,
            data: Vec::new(),
            height: 0,
            width: 0,
        }
    }
}

/// One filter row cell prepared for rendering, aligned with the visible
/// columns of the table window.
#[derive(Clone)]
pub struct FilterCellView {
    pub text: String,
    pub is_placeholder: bool,
    pub has_input: bool,
    pub active: bool,
    pub cursor: Option<usize>,
}

#[derive(Clone)]
pub struct SearchBoxView {
    pub text: String,
    pub cursor: usize,
}

pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub filter_cells: Vec<FilterCellView>,
    pub nrows: usize,
    pub total_rows: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub offset_row: usize,
    pub buttons: Vec<&'static str>,
    pub show_popup: bool,
    pub popup_message: String,
    pub search_box: Option<SearchBoxView>,
    pub filter_hint: Option<String>,
    pub info: Option<String>,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub layout: UILayout,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            table: Vec::new(),
            filter_cells: Vec::new(),
            nrows: 0,
            total_rows: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            offset_row: 0,
            buttons: Vec::new(),
            show_popup: false,
            popup_message: String::new(),
            search_box: None,
            filter_hint: None,
            info: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            layout: UILayout::default(),
            last_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub buttons_height: usize,
    pub header_height: usize,
    pub header_visible: bool,
    pub filter_row_visible: bool,
    pub table_width: usize,
    pub table_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_model(model: &Model, ui_width: usize, ui_height: usize) -> Self {
        let options = &model.config.options;
        let buttons_height = if options.buttons.is_empty() {
            0
        } else {
            BUTTONS_ROW_HEIGHT
        };

        let scrolled = model.table.offset_row > 0;
        let header_visible = options.fixed_header || !scrolled;
        let filter_row_visible = !model.filter_row.is_empty()
            && if options.filter_row_in_header {
                header_visible
            } else {
                !scrolled
            };

        let header_height = if header_visible { TABLE_HEADER_HEIGHT } else { 0 }
            + if filter_row_visible { FILTER_ROW_HEIGHT } else { 0 };

        let table_width = ui_width.saturating_sub(SCROLLBAR_WIDTH);
        let table_height = ui_height
            .saturating_sub(buttons_height + header_height + STATUSLINE_HEIGHT);

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            buttons_height,
            header_height,
            header_visible,
            filter_row_visible,
            table_width,
            table_height,
            statusline_width: ui_width,
            statusline_height: STATUSLINE_HEIGHT,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    file_info: Option<FileInfo>,
    config: SiftConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    data: Vec<Column>,
    table: TableView,
    filter_row: FilterRow,
    active_filter: usize,
    column_queries: Vec<ColumnQuery>,
    global_query: ColumnQuery,
    search_input: FilterInput,
    applied_sort: Option<(usize, bool)>,
    popup: Option<String>,
    uilayout: UILayout,
    uidata: UIData,
    status_message: String,
    last_status_message_update: Instant,
    last_update: Instant,
}

impl Model {
    pub fn init(config: &SiftConfig, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            file_info: None,
            config: config.clone(),
            status: Status::EMPTY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            data: Vec::new(),
            table: TableView::empty(),
            filter_row: FilterRow::default(),
            active_filter: 0,
            column_queries: Vec::new(),
            global_query: ColumnQuery::default(),
            search_input: FilterInput::new("Search"),
            applied_sort: None,
            popup: None,
            uilayout: UILayout::default(),
            uidata: UIData::empty(),
            status_message: "Started colsift!".to_string(),
            last_status_message_update: Instant::now(),
            last_update: Instant::now(),
        };
        model.uilayout.width = ui_width;
        model.uilayout.height = ui_height;
        model.update_table_data();
        model
    }

    pub fn load_data_file(&mut self, path: PathBuf) -> Result<(), SiftError> {
        let file_info = Model::get_file_info(path)?;
        info!(
            "Loading {} ({} bytes) ...",
            file_info.path.display(),
            file_info.file_size
        );
        let frame = match file_info.file_type {
            FileType::CSV => Model::load_csv(&file_info.path)?,
            FileType::PARQUET => Model::load_parquet(&file_info.path)?,
            FileType::ARROW => Model::load_arrow(&file_info.path)?,
        };

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        let df = frame.collect()?;
        self.file_info = Some(file_info);
        self.attach_dataframe(&name, df)
    }

    /// Take ownership of an already-materialized frame. This is the
    /// "table is ready" moment: columns are preformatted, the per-column
    /// search state is reset and the filter row is bound to the header.
    pub fn attach_dataframe(&mut self, name: &str, df: DataFrame) -> Result<(), SiftError> {
        let start_time = Instant::now();

        // Each column is preprocessed in its own thread; all cells are held
        // as strings in memory afterwards.
        let c_: Result<Vec<Column>, _> = df
            .get_column_names()
            .par_iter()
            .enumerate()
            .map(|(idx, name)| Self::load_columns(&df, idx, name))
            .collect();
        let columns = c_?;

        let data_loading_duration = start_time.elapsed().as_millis();
        info!("Loading data took {data_loading_duration}ms ...");
        for c in columns.iter() {
            debug!("Column: {}", c.as_string());
        }

        let nrows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        self.table = TableView::empty();
        self.table.name = name.to_string();
        self.table.rows = (0..nrows).collect();
        self.column_queries = columns.iter().map(|_| ColumnQuery::default()).collect();
        self.global_query = ColumnQuery::default();
        self.applied_sort = None;
        self.data = columns;
        self.status = Status::READY;

        self.bind_filter_row();
        self.update_table_data();
        self.set_status_message(format!("Loaded {name} in {data_loading_duration}ms ..."));
        Ok(())
    }

    // ------------------------- filter row binding ------------------------ //

    /// Resolve a column's position within the header row. Columns declared
    /// non-searchable have no position, mirroring a header cell that cannot
    /// be located.
    fn header_position(&self, column: usize) -> Option<usize> {
        if self.config.options.non_searchable.contains(&column) {
            return None;
        }
        (column < self.data.len()).then_some(column)
    }

    /// Duplicate the header row into the filter row and drop an input into
    /// every cell whose header position resolved. A table without columns
    /// yields an empty filter row, nothing fails.
    fn bind_filter_row(&mut self) {
        let cells: Vec<(usize, String, Option<usize>)> = self
            .data
            .iter()
            .enumerate()
            .map(|(idx, c)| (idx, c.name.clone(), self.header_position(idx)))
            .collect();
        self.filter_row = FilterRow::bind(cells);
        self.active_filter = 0;
        trace!(
            "Bound filter row: {} inputs over {} columns",
            self.filter_row.input_count(),
            self.data.len()
        );
    }

    /// Value of a filter input committed: mirror it into the title, rebuild
    /// the search expression and apply it to the column, then redraw.
    fn filter_input_changed(&mut self, pos: usize) {
        let Some(column) = self.filter_row.cell(pos).map(|c| c.column) else {
            return;
        };
        let Some(input) = self.filter_row.input_mut(pos) else {
            return;
        };
        input.sync_title();
        let value = input.value().to_string();

        let expression = search_expression(&value);
        self.column_search(column, &expression, !value.is_empty(), value.is_empty());
        self.draw();
    }

    /// Apply a search predicate to one column: the expression text plus a
    /// regex flag and a smart-matching flag.
    pub fn column_search(&mut self, column: usize, expression: &str, regex: bool, smart: bool) {
        if let Some(query) = self.column_queries.get_mut(column) {
            trace!("Column {column} search \"{expression}\" (regex: {regex}, smart: {smart})");
            *query = ColumnQuery::new(expression, regex, smart);
        }
    }

    /// Recompute the visible row set from the applied queries and refresh
    /// the view. A row survives when it matches the global query and every
    /// non-empty column query.
    pub fn draw(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let start_time = Instant::now();
        let nrows = self.data[0].data.len();
        let data = &self.data;
        let queries: Vec<(usize, &ColumnQuery)> = self
            .column_queries
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.is_empty())
            .collect();
        let global = &self.global_query;

        let mut rows: Vec<usize> = (0..nrows)
            .into_par_iter()
            .filter(|&ridx| {
                queries.iter().all(|(c, q)| q.matches(&data[*c].data[ridx]))
                    && (global.is_empty() || data.iter().any(|col| global.matches(&col.data[ridx])))
            })
            .collect();

        if let Some((column, ascending)) = self.applied_sort {
            self.sort_rows(&mut rows, column, ascending);
        }

        trace!(
            "Draw kept {}/{} rows in {}ms",
            rows.len(),
            nrows,
            start_time.elapsed().as_millis()
        );

        let table = &mut self.table;
        table.rows = rows;
        if table.offset_row >= table.rows.len() {
            table.offset_row = 0;
        }
        if table.rows.is_empty() {
            table.cursor_row = 0;
        } else {
            table.cursor_row = std::cmp::min(
                table.cursor_row,
                table.rows.len() - table.offset_row - 1,
            );
        }
        self.update_table_data();
    }

    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::FILTER | Modus::SEARCH)
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    // accessors used by the scenario tests
    pub fn filter_row(&self) -> &FilterRow {
        &self.filter_row
    }

    pub fn column_query(&self, column: usize) -> Option<&ColumnQuery> {
        self.column_queries.get(column)
    }

    pub fn visible_row_count(&self) -> usize {
        self.table.rows.len()
    }

    pub fn visible_values(&self, column: usize) -> Vec<String> {
        let Some(col) = self.data.get(column) else {
            return Vec::new();
        };
        self.table
            .rows
            .iter()
            .map(|&ridx| col.data[ridx].clone())
            .collect()
    }

    pub fn update(&mut self, message: Message) -> Result<(), SiftError> {
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_table_selection_down(self.step_size(1)),
                Message::MoveUp => self.move_table_selection_up(self.step_size(1)),
                Message::MoveLeft => self.move_table_selection_left(),
                Message::MoveRight => self.move_table_selection_right(),
                Message::MovePageUp => {
                    self.move_table_selection_up(self.uilayout.table_height.max(1))
                }
                Message::MovePageDown => {
                    self.move_table_selection_down(self.uilayout.table_height.max(1))
                }
                Message::MoveBeginning => self.move_table_selection_beginning(),
                Message::MoveEnd => self.move_table_selection_end(),
                Message::MoveToFirstColumn => self.move_to_first_column(),
                Message::MoveToLastColumn => self.move_to_last_column(),
                Message::FocusFilter => self.enter_filter_mode(),
                Message::GlobalSearch => self.enter_search_mode(),
                Message::CopyCell => self.copy_table_cell(),
                Message::CopyRow => self.copy_table_row(),
                Message::Export(slot) => self.export(slot),
                Message::SortAscending => self.sort_current_column(true),
                Message::SortDescending => self.sort_current_column(false),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::FILTER => match message {
                Message::RawKey(key) => self.filter_raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::SEARCH => match message {
                Message::RawKey(key) => self.search_raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        self.last_update = Instant::now();
        Ok(())
    }

    // ---------------------- filter / search focus ------------------------ //

    fn enter_filter_mode(&mut self) {
        let current = self.table.offset_column + self.table.cursor_column;
        match self.filter_row.first_input_at(current) {
            Some(pos) => {
                trace!("Entering filter mode on cell {pos} ...");
                self.previous_modus = self.modus;
                self.modus = Modus::FILTER;
                self.active_filter = pos;
                self.update_table_data();
            }
            None => self.set_status_message("No filterable columns"),
        }
    }

    fn leave_filter_mode(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::TABLE;
        self.update_table_data();
    }

    /// Keystroke routed into the focused filter input. The key never
    /// reaches the table-level shortcuts; the caret offset is captured
    /// after the edit and restored once the redraw is done.
    fn filter_raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        use ratatui::crossterm::event::KeyCode;
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.leave_filter_mode(),
            KeyCode::Tab => {
                if let Some(pos) = self.filter_row.next_input(self.active_filter) {
                    self.active_filter = pos;
                    self.update_table_data();
                }
            }
            KeyCode::BackTab => {
                if let Some(pos) = self.filter_row.prev_input(self.active_filter) {
                    self.active_filter = pos;
                    self.update_table_data();
                }
            }
            _ => {
                let pos = self.active_filter;
                let Some(input) = self.filter_row.input_mut(pos) else {
                    return;
                };
                let changed = input.read(key);
                let cursor = input.cursor();
                if changed {
                    self.filter_input_changed(pos);
                } else {
                    self.update_table_data();
                }
                if let Some(input) = self.filter_row.input_mut(pos) {
                    input.set_cursor(cursor);
                }
            }
        }
    }

    fn enter_search_mode(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::SEARCH;
        self.update_table_data();
    }

    fn leave_search_mode(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::TABLE;
        self.update_table_data();
    }

    /// The global search box filters across all columns with smart
    /// matching, live on every keystroke like the column inputs.
    fn search_raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        use ratatui::crossterm::event::KeyCode;
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.leave_search_mode(),
            _ => {
                let changed = self.search_input.read(key);
                let cursor = self.search_input.cursor();
                if changed {
                    self.global_query = ColumnQuery::new(self.search_input.value(), false, true);
                    self.draw();
                } else {
                    self.update_table_data();
                }
                self.search_input.set_cursor(cursor);
            }
        }
    }

    // ------------------------------ exports ------------------------------ //

    fn export(&mut self, slot: usize) {
        let Some(&button) = self.config.options.buttons.get(slot) else {
            trace!("No export button in slot {slot}");
            return;
        };
        match button {
            ExportButton::Copy => self.copy_table(),
            ExportButton::Csv => self.export_csv(),
            ExportButton::Excel | ExportButton::Pdf => {
                self.set_status_message(format!(
                    "{} export is not available in the terminal build",
                    button.label()
                ));
            }
        }
    }

    fn wrap_cell_content(c: &String) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c
            .chars()
            .any(|c| c == ' ' || c == '\t' || c == ',' || c == '\n' || c == '"');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    /// The visible (filtered) table as CSV text, all columns, header first.
    fn visible_table_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.table.rows.len() + 1);
        lines.push(
            self.data
                .iter()
                .map(|c| Model::wrap_cell_content(&c.name))
                .collect::<Vec<String>>()
                .join(","),
        );
        for &ridx in self.table.rows.iter() {
            lines.push(
                self.data
                    .iter()
                    .map(|c| Model::wrap_cell_content(&c.data[ridx]))
                    .collect::<Vec<String>>()
                    .join(","),
            );
        }
        lines.join("\n") + "\n"
    }

    fn copy_table(&mut self) {
        let content = self.visible_table_csv();
        self.clipboard_set(content, "Copied table to clipboard");
    }

    fn copy_table_cell(&mut self) {
        let table = &self.table;
        if table.rows.is_empty() || table.visible_columns.is_empty() {
            return;
        }
        let row = table.rows[table.offset_row + table.cursor_row];
        let column = table.visible_columns[table.cursor_column];
        let cell = self.data[column].data[row].clone();
        trace!("Cell content: {}", cell);
        self.clipboard_set(cell, "Copied cell to clipboard");
    }

    fn copy_table_row(&mut self) {
        let table = &self.table;
        if table.rows.is_empty() {
            return;
        }
        let row = table.rows[table.offset_row + table.cursor_row];
        let content = self
            .data
            .iter()
            .map(|c| Model::wrap_cell_content(&c.data[row]))
            .collect::<Vec<String>>()
            .join(",");
        self.clipboard_set(content, "Copied row to clipboard");
    }

    fn clipboard_set(&mut self, content: String, done: &str) {
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(content)) {
            Ok(_) => self.set_status_message(done),
            Err(e) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Clipboard is not available");
            }
        }
    }

    fn export_csv(&mut self) {
        let stem = Path::new(&self.table.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string();
        let path = PathBuf::from(format!("{stem}.filtered.csv"));
        self.export_csv_to(&path);
    }

    pub fn export_csv_to(&mut self, path: &Path) {
        match fs::write(path, self.visible_table_csv()) {
            Ok(_) => {
                self.set_status_message(format!("Wrote {}", path.display()));
            }
            Err(e) => {
                trace!("CSV export failed: {:?}", e);
                self.set_status_message(format!("CSV export failed: {e}"));
            }
        }
    }

    // ------------------------------ sorting ------------------------------ //

    fn is_numeric_type(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    fn sort_current_column(&mut self, ascending: bool) {
        if !self.config.options.ordering {
            trace!("Ordering is disabled, ignoring sort request");
            return;
        }
        if self.table.visible_columns.is_empty() {
            return;
        }
        let column = self.table.visible_columns[self.table.cursor_column];
        self.applied_sort = Some((column, ascending));
        self.draw();
    }

    fn sort_rows(&self, rows: &mut [usize], column: usize, ascending: bool) {
        let Some(col) = self.data.get(column) else {
            return;
        };
        let data = &col.data;

        if Model::is_numeric_type(&col.dtype) {
            // Numeric columns compare as floats where both sides parse,
            // parsed values come before unparsable ones, strings otherwise.
            rows.sort_by(|&a, &b| {
                let a = &data[a];
                let b = &data[b];
                let a_val: Result<f64, _> = a.parse();
                let b_val: Result<f64, _> = b.parse();
                match (a_val, b_val) {
                    (Ok(a_float), Ok(b_float)) => {
                        if ascending {
                            a_float
                                .partial_cmp(&b_float)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        } else {
                            b_float
                                .partial_cmp(&a_float)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        }
                    }
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => {
                        if ascending { a.cmp(b) } else { b.cmp(a) }
                    }
                }
            });
        } else if ascending {
            rows.sort_by(|&a, &b| data[a].cmp(&data[b]));
        } else {
            rows.sort_by(|&a, &b| data[b].cmp(&data[a]));
        }
    }

    // ------------------------------- view -------------------------------- //

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
        self.uidata.last_update = Instant::now();
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup = Some(HELP_TEXT.to_string());
        self.update_table_data();
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.popup = None;
        self.update_table_data();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout.width = width;
        self.uilayout.height = height;
        self.update_table_data();
    }

    /// With paging enabled vertical movement snaps by whole pages, with it
    /// disabled the body scrolls row by row.
    fn step_size(&self, step: usize) -> usize {
        if self.config.options.paging {
            self.uilayout.table_height.max(1)
        } else {
            step
        }
    }

    fn update_table_data(&mut self) {
        if self.data.is_empty() {
            self.uidata = UIData::empty();
            self.uidata.layout = self.uilayout.clone();
            self.uidata.status_message = self.status_message.clone();
            return;
        }

        self.uilayout = UILayout::from_model(self, self.uilayout.width, self.uilayout.height);

        let table = &mut self.table;
        table.width = self.uilayout.table_width;
        table.height = self.uilayout.table_height;

        let rbegin = table.offset_row;
        let rend = std::cmp::min(rbegin + table.height, table.rows.len());

        trace!(
            "Table: Cr {}, Cc {}, Or {}, Oc {}, Rb {}, Re {}, tw: {}, th: {}, uiw: {}, uih: {}",
            table.cursor_row,
            table.cursor_column,
            table.offset_row,
            table.offset_column,
            rbegin,
            rend,
            table.width,
            table.height,
            self.uilayout.width,
            self.uilayout.height
        );

        // Recalculate render widths, then fit columns into the table width
        for column in self.data.iter_mut() {
            column.render_width =
                Self::calculate_column_width(column, self.config.max_column_width);
        }

        table.visible_columns = Vec::new();
        let mut visible_width = 0;
        for (cidx, column) in self.data[table.offset_column..].iter_mut().enumerate() {
            if visible_width + (column.render_width + 1) <= self.uilayout.table_width {
                table.visible_columns.push(cidx + table.offset_column);
                visible_width += column.render_width + 1;
            } else {
                // Add the last partially visible column
                if visible_width < self.uilayout.table_width {
                    let remaining_width = self.uilayout.table_width - visible_width;
                    table.visible_columns.push(cidx + table.offset_column);
                    visible_width += remaining_width;
                    column.render_width = remaining_width;
                }
                break;
            }
        }
        table.visible_width = visible_width;

        // Growing columns can reduce the number of visible columns
        if !table.visible_columns.is_empty() {
            table.cursor_column =
                std::cmp::min(table.cursor_column, table.visible_columns.len() - 1);
        } else {
            table.cursor_column = 0;
        }

        table.data = Vec::with_capacity(table.visible_columns.len());
        for idx in table.visible_columns.clone() {
            if let Some(column) = self.data.get(idx) {
                let col_data = table.rows[rbegin..rend]
                    .iter()
                    .map(|&ridx| column.data[ridx].clone())
                    .collect();
                let name = Self::get_visible_name(column.name.clone(), column.render_width);
                table.data.push(ColumnView {
                    name,
                    width: column.render_width,
                    data: col_data,
                });
            }
        }

        self.update_uidata_for_table();
    }

    fn update_uidata_for_table(&mut self) {
        let table = &self.table;
        let options = &self.config.options;

        let filter_cells: Vec<FilterCellView> = table
            .visible_columns
            .iter()
            .map(|&cidx| {
                let active = self.modus == Modus::FILTER && cidx == self.active_filter;
                match self.filter_row.cell(cidx) {
                    Some(cell) => match &cell.input {
                        Some(input) if !input.value().is_empty() => FilterCellView {
                            text: input.value().to_string(),
                            is_placeholder: false,
                            has_input: true,
                            active,
                            cursor: active.then_some(input.cursor()),
                        },
                        Some(input) => FilterCellView {
                            text: input.placeholder().to_string(),
                            is_placeholder: true,
                            has_input: true,
                            active,
                            cursor: active.then_some(input.cursor()),
                        },
                        None => FilterCellView {
                            text: cell.header.clone(),
                            is_placeholder: true,
                            has_input: false,
                            active: false,
                            cursor: None,
                        },
                    },
                    None => FilterCellView {
                        text: String::new(),
                        is_placeholder: true,
                        has_input: false,
                        active: false,
                        cursor: None,
                    },
                }
            })
            .collect();

        let total_rows = self.data.first().map(|c| c.data.len()).unwrap_or(0);
        let nrows = table.rows.len();
        let info = options.info.then(|| {
            if nrows == total_rows {
                format!("{total_rows} rows")
            } else {
                format!("{nrows} rows (filtered from {total_rows})")
            }
        });

        let filter_hint = (self.modus == Modus::FILTER)
            .then(|| self.filter_row.input(self.active_filter))
            .flatten()
            .filter(|input| !input.title().is_empty())
            .map(|input| format!("{}: {}", input.placeholder(), input.title()));

        let search_box = (self.modus == Modus::SEARCH).then(|| SearchBoxView {
            text: self.search_input.value().to_string(),
            cursor: self.search_input.cursor(),
        });

        self.uidata = UIData {
            name: table.name.clone(),
            table: table.data.clone(),
            filter_cells,
            nrows,
            total_rows,
            selected_row: table.cursor_row,
            selected_column: table.cursor_column,
            abs_selected_row: table.offset_row + table.cursor_row,
            offset_row: table.offset_row,
            buttons: options.buttons.iter().map(|b| b.label()).collect(),
            show_popup: self.popup.is_some(),
            popup_message: self.popup.clone().unwrap_or_default(),
            search_box,
            filter_hint,
            info,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            layout: self.uilayout.clone(),
            last_update: Instant::now(),
        }
    }

    fn get_visible_name(name: String, width: usize) -> String {
        let mut reduced_name = name.clone();
        if width < 3 {
            return "".to_string();
        }
        if reduced_name.len() > width {
            reduced_name = reduced_name[0..width - 3].to_string();
            reduced_name.push_str("...");
        }
        reduced_name
    }

    fn calculate_column_width(column: &Column, max_column_width: usize) -> usize {
        let width = std::cmp::max(column.name.len(), column.max_width) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, max_column_width)
    }

    // ---------------------------- data loading --------------------------- //

    fn detect_file_type(path: &Path) -> Result<FileType, SiftError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(SiftError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, SiftError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SiftError::FileNotFound,
            ErrorKind::PermissionDenied => SiftError::PermissionDenied,
            _ => SiftError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(SiftError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Model::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_columns(df: &DataFrame, idx: usize, col_name: &str) -> Result<Column, PolarsError> {
        let original_dtype = df.column(col_name)?.dtype().clone();

        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut data = Vec::with_capacity(series.len());

        let mut max_width = 0;
        for value in series.into_iter() {
            let ss = match value {
                Some(s) => s.to_string().replace("\r\n", " ↵ ").replace("\n", " ↵ "),
                None => String::from("∅"),
            };
            if ss.len() > max_width {
                max_width = ss.len();
            }
            data.push(ss);
        }

        Ok(Column {
            idx: idx as u16,
            name: col_name.to_string(),
            max_width,
            render_width: 0, // Set on the first layout pass
            data,
            dtype: original_dtype,
        })
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }

    // -------------------- selection movement  ---------------------------- //

    fn move_table_selection_beginning(&mut self) {
        let table = &mut self.table;
        table.cursor_row = 0;
        table.offset_row = 0;
        self.update_table_data();
    }

    fn move_table_selection_end(&mut self) {
        let table = &mut self.table;
        if table.rows.is_empty() || self.uilayout.table_height == 0 {
            return;
        }
        if table.rows.len() < self.uilayout.table_height {
            table.offset_row = 0;
            table.cursor_row = table.rows.len() - 1;
        } else {
            table.offset_row = table.rows.len() - self.uilayout.table_height;
            table.cursor_row = self.uilayout.table_height - 1;
        }
        self.update_table_data();
    }

    fn move_table_selection_up(&mut self, size: usize) {
        let table = &mut self.table;
        if table.cursor_row > 0 {
            // Cursor somewhere in the middle
            table.cursor_row = table.cursor_row.saturating_sub(size);
        } else if table.offset_row > 0 {
            // Cursor at the top, shift table up
            table.offset_row = table.offset_row.saturating_sub(size);
        }
        self.update_table_data();
    }

    fn move_table_selection_down(&mut self, size: usize) {
        let table = &mut self.table;
        if table.rows.is_empty() || self.uilayout.table_height == 0 {
            return;
        }
        if table.cursor_row + table.offset_row < (table.rows.len() - 1) {
            if table.cursor_row < self.uilayout.table_height - 1 {
                // Somewhere in the middle of the table
                table.cursor_row = std::cmp::min(
                    table.cursor_row + size,
                    table.rows.len() - table.offset_row - 1,
                );
                table.cursor_row = std::cmp::min(table.cursor_row, self.uilayout.table_height - 1);
            } else {
                // At the bottom, shift the table down
                table.offset_row = std::cmp::min(table.offset_row + size, table.rows.len() - 1);
                table.cursor_row = std::cmp::min(
                    self.uilayout.table_height - 1,
                    table.rows.len() - table.offset_row - 1,
                );
            }
            self.update_table_data();
        }
    }

    fn move_table_selection_left(&mut self) {
        let table = &mut self.table;
        if table.cursor_column > 0 {
            table.cursor_column = table.cursor_column.saturating_sub(1);
        } else if table.offset_column > 0 {
            table.offset_column = table.offset_column.saturating_sub(1);
        }
        self.update_table_data();
    }

    fn move_table_selection_right(&mut self) {
        let table = &mut self.table;
        if self.data.is_empty() {
            return;
        }
        if table.cursor_column + table.offset_column < (self.data.len() - 1) {
            if table.cursor_column < table.visible_columns.len().saturating_sub(1) {
                table.cursor_column += 1;
            } else {
                table.offset_column += 1;
            }
            self.update_table_data();
        } else if table.visible_width > table.width && table.offset_column < (self.data.len() - 1) {
            // The last column can be wider than the screen
            table.offset_column += 1;
            self.update_table_data();
        }
    }

    fn move_to_first_column(&mut self) {
        let table = &mut self.table;
        table.offset_column = 0;
        table.cursor_column = 0;
        self.update_table_data();
    }

    fn move_to_last_column(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let last = self.data.len() - 1;
        let table = &mut self.table;
        if table.visible_columns.contains(&last) {
            table.cursor_column = table
                .visible_columns
                .iter()
                .position(|&c| c == last)
                .unwrap_or(0);
        } else {
            table.offset_column = last;
            table.cursor_column = 0;
        }
        self.update_table_data();
    }
}
