//! Shared tabular viewport for table pages and query results.
//!
//! The grid is a pure function of (result, cursor, horizontal scroll, area):
//! column widths are computed once per result, the vertical window snaps so
//! the cursor is always visible, and horizontal scrolling is an offset in
//! display columns with no upper clamp — scrolling past the content just
//! renders blank space.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::db::{QueryResult, SortOrder};

use super::Theme;

/// Upper bound on a column's display width.
const MAX_COL_WIDTH: usize = 30;

/// Display columns moved per horizontal scroll step.
pub const H_SCROLL_STEP: usize = 5;

/// A result set plus its per-column display widths. Widths are recomputed
/// when the backing result changes, never incrementally.
#[derive(Debug, Default)]
pub struct GridModel {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub widths: Vec<usize>,
}

impl GridModel {
    pub fn new(result: QueryResult) -> Self {
        let widths = compute_widths(&result.columns, &result.rows);
        Self {
            columns: result.columns,
            rows: result.rows,
            widths,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Cursor and scroll state, owned by the screen that embeds the grid.
#[derive(Debug, Default, Clone)]
pub struct GridState {
    pub cursor: usize,
    pub scroll_x: usize,
}

impl GridState {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.scroll_x = 0;
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, row_count: usize) {
        if row_count > 0 && self.cursor < row_count - 1 {
            self.cursor += 1;
        }
    }

    pub fn scroll_left(&mut self) {
        self.scroll_x = self.scroll_x.saturating_sub(H_SCROLL_STEP);
    }

    pub fn scroll_right(&mut self) {
        self.scroll_x += H_SCROLL_STEP;
    }
}

/// Widget rendering one page of the grid.
pub struct DataGrid<'a> {
    pub model: &'a GridModel,
    pub state: &'a GridState,
    pub theme: &'a Theme,
    /// Column picked for sorting in the table view; marked in the header.
    pub selected_col: Option<usize>,
    pub sort: Option<&'a SortOrder>,
}

impl Widget for DataGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height < 2 {
            return;
        }
        if self.model.is_empty() {
            return;
        }

        let width = area.width as usize;

        let header_cells: Vec<String> = self
            .model
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut text = String::new();
                if self.selected_col == Some(i) {
                    text.push('▸');
                }
                text.push_str(name);
                if let Some(sort) = self.sort {
                    if sort.column == *name {
                        text.push_str(if sort.descending { " ▼" } else { " ▲" });
                    }
                }
                pad_cell(&text, self.model.widths[i])
            })
            .collect();
        let header = format!("│ {} │", header_cells.join(" │ "));

        let separators: Vec<String> = self.model.widths.iter().map(|w| "─".repeat(*w)).collect();
        let separator = format!("├─{}─┤", separators.join("─┼─"));

        buf.set_string(
            area.x,
            area.y,
            line_window(&header, self.state.scroll_x, width),
            self.theme.grid_header,
        );
        buf.set_string(
            area.x,
            area.y + 1,
            line_window(&separator, self.state.scroll_x, width),
            self.theme.dim,
        );

        if self.model.rows.is_empty() {
            buf.set_string(area.x, area.y + 2, " (no rows)", self.theme.muted);
            return;
        }

        let visible = (area.height - 2) as usize;
        let start = if self.state.cursor >= visible {
            self.state.cursor - visible + 1
        } else {
            0
        };
        let end = (start + visible).min(self.model.rows.len());

        for (slot, idx) in (start..end).enumerate() {
            let row = &self.model.rows[idx];
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| pad_cell(cell, self.model.widths.get(i).copied().unwrap_or(0)))
                .collect();
            let line = format!("│ {} │", cells.join(" │ "));

            let style = if idx == self.state.cursor {
                self.theme.grid_selected
            } else {
                self.theme.grid_row
            };
            buf.set_string(
                area.x,
                area.y + 2 + slot as u16,
                line_window(&line, self.state.scroll_x, width),
                style,
            );
        }
    }
}

/// Column width = max(header, widest first-line cell), clamped to
/// [`MAX_COL_WIDTH`]. Multi-line cells count only their first line.
fn compute_widths(columns: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i >= widths.len() {
                break;
            }
            let w = first_line(cell).width();
            if w > widths[i] {
                widths[i] = w;
            }
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COL_WIDTH);
    }
    widths
}

fn first_line(s: &str) -> &str {
    s.split(['\n', '\r']).next().unwrap_or("")
}

/// Clip to the first line, blank out control characters, and pad or truncate
/// to exactly `width` display columns.
fn pad_cell(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for ch in first_line(s).chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }

    if used < width {
        out.push_str(&" ".repeat(width - used));
    }
    out
}

/// Skip `skip` display columns from the left, then take at most `width`.
fn line_window(s: &str, skip: usize, width: usize) -> String {
    let mut out = String::new();
    let mut pos = 0usize;
    let mut taken = 0usize;

    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if pos < skip {
            // A wide char straddling the cut is dropped entirely.
            pos += w;
            continue;
        }
        if taken + w > width {
            break;
        }
        out.push(ch);
        taken += w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn widths_take_max_of_header_and_cells() {
        let model = GridModel::new(result(
            &["id", "description"],
            &[&["1", "short"], &["2", "a bit longer"]],
        ));
        assert_eq!(model.widths, vec![2, "a bit longer".len()]);
    }

    #[test]
    fn widths_clamped_to_upper_bound() {
        let long = "x".repeat(100);
        let model = GridModel::new(result(&["c"], &[&[long.as_str()]]));
        assert_eq!(model.widths, vec![30]);
    }

    #[test]
    fn multiline_cells_measure_first_line_only() {
        let model = GridModel::new(result(&["c"], &[&["ab\nthis line is much longer"]]));
        assert_eq!(model.widths, vec![2]);
    }

    #[test]
    fn cursor_starts_at_zero_and_is_bounded() {
        let mut state = GridState::default();
        assert_eq!(state.cursor, 0);

        let rows = 3;
        state.move_down(rows);
        state.move_down(rows);
        assert_eq!(state.cursor, 2);
        // Further down is a no-op at the last row.
        state.move_down(rows);
        assert_eq!(state.cursor, 2);

        state.move_up();
        state.move_up();
        state.move_up();
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn move_down_on_empty_rows_is_noop() {
        let mut state = GridState::default();
        state.move_down(0);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn horizontal_scroll_floors_at_zero_without_upper_clamp() {
        let mut state = GridState::default();
        state.scroll_left();
        assert_eq!(state.scroll_x, 0);

        for _ in 0..100 {
            state.scroll_right();
        }
        assert_eq!(state.scroll_x, 100 * H_SCROLL_STEP);

        state.scroll_left();
        assert_eq!(state.scroll_x, 99 * H_SCROLL_STEP);
    }

    #[test]
    fn reset_clears_cursor_and_scroll() {
        let mut state = GridState {
            cursor: 7,
            scroll_x: 15,
        };
        state.reset();
        assert_eq!(state.cursor, 0);
        assert_eq!(state.scroll_x, 0);
    }

    #[test]
    fn pad_cell_pads_truncates_and_sanitizes() {
        assert_eq!(pad_cell("ab", 4), "ab  ");
        assert_eq!(pad_cell("abcdef", 4), "abcd");
        assert_eq!(pad_cell("a\tb", 4), "a b ");
        assert_eq!(pad_cell("ab\ncd", 4), "ab  ");
    }

    #[test]
    fn line_window_skips_display_columns() {
        assert_eq!(line_window("abcdef", 2, 3), "cde");
        assert_eq!(line_window("abc", 5, 3), "");
        assert_eq!(line_window("abc", 0, 10), "abc");
    }
}
