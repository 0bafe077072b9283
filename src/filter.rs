use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Pattern template a committed filter value is substituted into before it
/// is handed to the column search. The value itself is wrapped in `((( )))`
/// first, so a value `T` ends up as `((((T))))`.
const SEARCH_TEMPLATE: &str = "({search})";

/// Build the search expression for the current input text. An empty input
/// yields an empty expression, which clears the column filter.
pub fn search_expression(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        SEARCH_TEMPLATE.replace("{search}", &format!("((({value})))"))
    }
}

/// A single text entry control in the filter row.
///
/// Holds the typed value and the caret. The title field mirrors the value on
/// every committed change so the full filter text stays visible in the
/// status line even when the cell is too narrow to show it.
#[derive(Debug, Default, Clone)]
pub struct FilterInput {
    placeholder: String,
    value: String,
    title: String,
    cursor: usize,
}

impl FilterInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        FilterInput {
            placeholder: placeholder.into(),
            ..FilterInput::default()
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Restore a caret position captured before a redraw. The value may have
    /// changed in between, so clamp to the current length.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = std::cmp::min(cursor, self.value.chars().count());
    }

    /// Mirror the current value into the title, the change-event side effect.
    pub fn sync_title(&mut self) {
        self.title = self.value.clone();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Apply one keystroke to the input. Returns true when the value
    /// changed and the column search has to be re-applied.
    pub fn read(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Delete, KeyModifiers::NONE) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.value.chars().count() {
                    self.cursor += 1;
                }
                false
            }
            (KeyCode::Home, KeyModifiers::NONE) => {
                self.cursor = 0;
                false
            }
            (KeyCode::End, KeyModifiers::NONE) => {
                self.cursor = self.value.chars().count();
                false
            }
            (code, _) => self.key(code),
        }
    }

    fn key(&mut self, code: KeyCode) -> bool {
        if let Some(chr) = code.as_char() {
            let at = self.byte_pos(self.cursor);
            self.value.insert(at, chr);
            self.cursor += 1;
            trace!("Filter input now \"{}\"", self.value);
            true
        } else {
            false
        }
    }

    fn backspace(&mut self) -> bool {
        if self.cursor > 0 {
            let at = self.byte_pos(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    fn delete(&mut self) -> bool {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_pos(self.cursor);
            self.value.remove(at);
            true
        } else {
            false
        }
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.value.len())
    }
}

/// One cell of the filter row: a clone of the header cell, holding an input
/// when the column's header position resolved.
#[derive(Debug, Clone)]
pub struct FilterCell {
    pub header: String,
    pub column: usize,
    pub input: Option<FilterInput>,
}

/// The header row duplicate that carries the per-column filter inputs.
#[derive(Debug, Default, Clone)]
pub struct FilterRow {
    cells: Vec<FilterCell>,
}

impl FilterRow {
    /// Duplicate the header row and place an input in every cell whose
    /// column resolved to a header position. Cells are ordered by that
    /// position; columns without one keep a plain header clone.
    pub fn bind(columns: impl IntoIterator<Item = (usize, String, Option<usize>)>) -> Self {
        let mut cells: Vec<(usize, FilterCell)> = Vec::new();
        for (column, header, position) in columns {
            let input = position.map(|_| FilterInput::new(header.clone()));
            let at = position.unwrap_or(cells.len());
            cells.push((
                at,
                FilterCell {
                    header,
                    column,
                    input,
                },
            ));
        }
        cells.sort_by_key(|(at, _)| *at);
        FilterRow {
            cells: cells.into_iter().map(|(_, c)| c).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[FilterCell] {
        &self.cells
    }

    pub fn cell(&self, pos: usize) -> Option<&FilterCell> {
        self.cells.get(pos)
    }

    pub fn input(&self, pos: usize) -> Option<&FilterInput> {
        self.cells.get(pos).and_then(|c| c.input.as_ref())
    }

    pub fn input_mut(&mut self, pos: usize) -> Option<&mut FilterInput> {
        self.cells.get_mut(pos).and_then(|c| c.input.as_mut())
    }

    pub fn input_count(&self) -> usize {
        self.cells.iter().filter(|c| c.input.is_some()).count()
    }

    /// First filterable cell at or after the given position (wrapping), if
    /// any.
    pub fn first_input_at(&self, pos: usize) -> Option<usize> {
        let n = self.cells.len();
        if n == 0 {
            return None;
        }
        let pos = pos % n;
        (pos..n)
            .chain(0..pos)
            .find(|&p| self.cells[p].input.is_some())
    }

    pub fn next_input(&self, pos: usize) -> Option<usize> {
        self.first_input_at(pos + 1)
    }

    pub fn prev_input(&self, pos: usize) -> Option<usize> {
        let n = self.cells.len();
        if n == 0 {
            return None;
        }
        let start = (pos + n - 1) % n;
        (0..=start)
            .rev()
            .chain((start + 1..n).rev())
            .find(|&p| self.cells[p].input.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn expression_applies_the_template() {
        assert_eq!(search_expression("30"), "((((30))))");
        assert_eq!(search_expression("a|b"), "((((a|b))))");
        assert_eq!(search_expression(""), "");
    }

    #[test]
    fn bind_skips_unresolved_positions() {
        let row = FilterRow::bind(vec![
            (0, "Name".to_string(), Some(0)),
            (1, "Age".to_string(), None),
            (2, "City".to_string(), Some(2)),
        ]);
        assert_eq!(row.cells().len(), 3);
        assert_eq!(row.input_count(), 2);
        assert!(row.input(1).is_none());
        assert_eq!(row.cell(1).map(|c| c.header.as_str()), Some("Age"));
    }

    #[test]
    fn placeholder_is_the_header_text() {
        let row = FilterRow::bind(vec![
            (0, "Name".to_string(), Some(0)),
            (1, "Age".to_string(), Some(1)),
        ]);
        assert_eq!(row.input(0).map(|i| i.placeholder()), Some("Name"));
        assert_eq!(row.input(1).map(|i| i.placeholder()), Some("Age"));
    }

    #[test]
    fn editing_keeps_the_caret_in_range() {
        let mut input = FilterInput::new("Age");
        assert!(input.read(key(KeyCode::Char('3'))));
        assert!(input.read(key(KeyCode::Char('0'))));
        assert_eq!(input.value(), "30");
        assert_eq!(input.cursor(), 2);

        input.read(key(KeyCode::Left));
        assert!(input.read(key(KeyCode::Char('9'))));
        assert_eq!(input.value(), "390");
        assert_eq!(input.cursor(), 2);

        assert!(input.read(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "30");

        // restoring a stale caret clamps to the new length
        input.set_cursor(10);
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn title_mirrors_value_on_sync() {
        let mut input = FilterInput::new("City");
        input.read(key(KeyCode::Char('N')));
        assert_eq!(input.title(), "");
        input.sync_title();
        assert_eq!(input.title(), "N");
    }

    #[test]
    fn input_cycling_skips_plain_cells() {
        let row = FilterRow::bind(vec![
            (0, "a".to_string(), Some(0)),
            (1, "b".to_string(), None),
            (2, "c".to_string(), Some(2)),
        ]);
        assert_eq!(row.first_input_at(0), Some(0));
        assert_eq!(row.first_input_at(1), Some(2));
        assert_eq!(row.next_input(0), Some(2));
        assert_eq!(row.next_input(2), Some(0));
        assert_eq!(row.prev_input(0), Some(2));
        assert_eq!(row.prev_input(2), Some(0));
    }
}
