use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::model::{FilterCellView, UIData};

pub const BUTTONS_ROW_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const FILTER_ROW_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const SCROLLBAR_WIDTH: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;

/// How long a status message stays highlighted before it is dimmed.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let layout = &uidata.layout;
        let chunks = Layout::vertical([
            Constraint::Length(layout.buttons_height as u16),
            Constraint::Length(layout.header_height as u16),
            Constraint::Min(0),
            Constraint::Length(layout.statusline_height as u16),
        ])
        .split(frame.area());

        if layout.buttons_height > 0 {
            self.draw_buttons(uidata, frame, chunks[0]);
        }
        self.draw_header(uidata, frame, chunks[1]);
        self.draw_body(uidata, frame, chunks[2]);
        self.draw_statusline(uidata, frame, chunks[3]);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_buttons(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans: Vec<Span> = Vec::new();
        for (idx, label) in uidata.buttons.iter().enumerate() {
            spans.push(format!(" {}:{} ", idx + 1, label).blue().bold());
            spans.push(" ".into());
        }
        let line = Line::from(spans);
        let title = Line::from(uidata.name.clone().bold()).right_aligned();
        frame.render_widget(Paragraph::new(line), area);
        frame.render_widget(Paragraph::new(title), area);
    }

    fn draw_header(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if uidata.layout.header_visible {
            let spans: Vec<Span> = uidata
                .table
                .iter()
                .enumerate()
                .flat_map(|(cidx, col)| {
                    let name = pad_cell(&col.name, col.width);
                    let span = if cidx == uidata.selected_column {
                        name.bold().reversed()
                    } else {
                        name.bold()
                    };
                    [span, " ".into()]
                })
                .collect();
            lines.push(Line::from(spans));
        }
        if uidata.layout.filter_row_visible {
            lines.push(self.filter_line(uidata));
        }
        frame.render_widget(Paragraph::new(Text::from(lines)), area);
    }

    /// The filter row: placeholders dim, typed values plain, the focused
    /// input reversed with a block cursor.
    fn filter_line<'a>(&self, uidata: &'a UIData) -> Line<'a> {
        let mut spans: Vec<Span> = Vec::new();
        for (col, cell) in uidata.table.iter().zip(uidata.filter_cells.iter()) {
            self.filter_cell_spans(cell, col.width, &mut spans);
            spans.push(" ".into());
        }
        Line::from(spans)
    }

    fn filter_cell_spans<'a>(
        &self,
        cell: &'a FilterCellView,
        width: usize,
        spans: &mut Vec<Span<'a>>,
    ) {
        if !cell.has_input {
            // Plain header clone, nothing to type into
            spans.push(pad_cell(&cell.text, width).dim());
            return;
        }
        match cell.cursor {
            Some(cursor) if cell.active => {
                // Split around the caret so it renders as a block
                let value = if cell.is_placeholder { "" } else { cell.text.as_str() };
                let before: String = value.chars().take(cursor).collect();
                let at: String = value.chars().skip(cursor).take(1).collect();
                let after: String = value.chars().skip(cursor + 1).collect();
                let rest_width = width.saturating_sub(before.chars().count() + 1);
                spans.push(before.italic());
                if at.is_empty() {
                    spans.push(" ".reversed());
                } else {
                    spans.push(at.reversed());
                }
                spans.push(pad_cell(&after, rest_width).italic());
            }
            _ => {
                let text = pad_cell(&cell.text, width);
                if cell.is_placeholder {
                    spans.push(text.dim().italic());
                } else {
                    spans.push(text.italic());
                }
            }
        }
    }

    fn draw_body(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let nlines = uidata.table.first().map(|c| c.data.len()).unwrap_or(0);
        let mut lines: Vec<Line> = Vec::with_capacity(nlines);
        for ridx in 0..nlines {
            let selected_row = ridx == uidata.selected_row;
            let spans: Vec<Span> = uidata
                .table
                .iter()
                .enumerate()
                .flat_map(|(cidx, col)| {
                    let cell = pad_cell(&col.data[ridx], col.width);
                    let span = if selected_row && cidx == uidata.selected_column {
                        cell.reversed().bold()
                    } else if selected_row {
                        cell.reversed()
                    } else {
                        cell.into()
                    };
                    [span, " ".into()]
                })
                .collect();
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(Text::from(lines)), area);

        if uidata.nrows > 0 {
            let mut state = ScrollbarState::new(uidata.nrows).position(uidata.abs_selected_row);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut state,
            );
        }
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let left: Line = if let Some(search) = &uidata.search_box {
            let before: String = search.text.chars().take(search.cursor).collect();
            let at: String = search.text.chars().skip(search.cursor).take(1).collect();
            let after: String = search.text.chars().skip(search.cursor + 1).collect();
            let mut spans: Vec<Span> = vec!["Search: ".bold(), before.into()];
            if at.is_empty() {
                spans.push(" ".reversed());
            } else {
                spans.push(at.reversed());
            }
            spans.push(after.into());
            Line::from(spans)
        } else if let Some(hint) = &uidata.filter_hint {
            Line::from(hint.clone().italic())
        } else {
            let age = Instant::now().duration_since(uidata.last_status_message_update);
            if age < STATUS_MESSAGE_TTL {
                Line::from(uidata.status_message.clone())
            } else {
                Line::from(uidata.status_message.clone().dim())
            }
        };

        let right = match &uidata.info {
            Some(info) => format!("{} | {}", uidata.name, info),
            None => uidata.name.clone(),
        };

        frame.render_widget(Paragraph::new(left), area);
        frame.render_widget(
            Paragraph::new(Line::from(right.dim()).right_aligned()),
            area,
        );
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 80);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(uidata.popup_message.clone()).block(block),
            area,
        );
    }
}

/// Pad or clip a cell to its column width.
fn pad_cell(content: &str, width: usize) -> String {
    let mut out: String = content.chars().take(width).collect();
    let used = out.chars().count();
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Centered rect taking the given percentages of the frame.
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(ratatui::layout::Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(ratatui::layout::Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_cell_pads_and_clips() {
        assert_eq!(pad_cell("ab", 4), "ab  ");
        assert_eq!(pad_cell("abcdef", 4), "abcd");
        assert_eq!(pad_cell("", 3), "   ");
    }
}
