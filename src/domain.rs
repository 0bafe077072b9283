use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum SiftError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for SiftError {
    fn from(err: Error) -> Self {
        SiftError::IoError(err)
    }
}

impl From<PolarsError> for SiftError {
    fn from(err: PolarsError) -> Self {
        SiftError::PolarsError(err)
    }
}

/// Export actions offered in the buttons bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportButton {
    Copy,
    Csv,
    Excel,
    Pdf,
}

impl ExportButton {
    pub fn label(&self) -> &'static str {
        match self {
            ExportButton::Copy => "Copy",
            ExportButton::Csv => "CSV",
            ExportButton::Excel => "Excel",
            ExportButton::Pdf => "PDF",
        }
    }
}

/// Widget initialization options.
///
/// Defaults mirror a read-only listing table: export buttons enabled, the
/// filter row counted as part of the header, header pinned on scroll, no
/// paging, no sort-on-key, no row-count info.
#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TableOptions {
    pub buttons: Vec<ExportButton>,
    pub filter_row_in_header: bool,
    pub fixed_header: bool,
    pub paging: bool,
    pub ordering: bool,
    pub info: bool,
    /// Columns whose header position does not resolve. Their filter row
    /// cell stays a plain header clone and they cannot be filtered.
    pub non_searchable: Vec<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            buttons: vec![
                ExportButton::Copy,
                ExportButton::Csv,
                ExportButton::Excel,
                ExportButton::Pdf,
            ],
            filter_row_in_header: true,
            fixed_header: true,
            paging: false,
            ordering: false,
            info: false,
            non_searchable: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiftConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub options: TableOptions,
}

impl Default for SiftConfig {
    fn default() -> Self {
        SiftConfig {
            event_poll_time: 100,
            max_column_width: 80,
            options: TableOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    MoveToFirstColumn,
    MoveToLastColumn,
    FocusFilter,
    GlobalSearch,
    CopyCell,
    CopyRow,
    /// Trigger the n-th configured export button.
    Export(usize),
    SortAscending,
    SortDescending,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 colsift key bindings

 Navigation
   Up/Down Left/Right   move selection
   PgUp/PgDn            move by page
   Home/End             first/last row
   0/$                  first/last column

 Filtering
   f                    focus the filter row for the current column
   /                    global search
   Tab/Shift-Tab        next/previous filter input
   Esc or Enter         leave the filter row
   typing filters live; the text is matched as a regex

 Data
   c / C                copy cell / row to the clipboard
   s / S                sort ascending / descending (when enabled)
   1..4                 trigger export button 1..4

 Other
   ?                    this help
   Esc                  close popup
   q                    quit
";
