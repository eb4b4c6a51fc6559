//! Table browser: one fixed-size page of a relation at a time, with an
//! optional per-column sort. Every page change is a refetch; the previous
//! page stays on screen until its replacement arrives.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::Frame;

use crate::db::{QueryResult, SortOrder, TableRef};

use super::{DataGrid, GridModel, GridState, Theme};

/// What a table-view keypress asks the parent to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    None,
    /// Refetch with the view's current offset/sort.
    Reload,
    /// Return focus to the sidebar.
    Back,
}

pub struct TableView {
    pub table: TableRef,
    page_size: usize,
    pub offset: usize,
    pub sort: Option<SortOrder>,
    /// Column the sort keys act on.
    pub col_cursor: usize,
    pub grid: GridModel,
    pub grid_state: GridState,
    pub loading: bool,
    pub error: Option<String>,
}

impl TableView {
    pub fn new(table: TableRef, page_size: usize) -> Self {
        Self {
            table,
            page_size: page_size.max(1),
            offset: 0,
            sort: None,
            col_cursor: 0,
            grid: GridModel::empty(),
            grid_state: GridState::default(),
            loading: true,
            error: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> TableAction {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::NONE) => {
                return TableAction::Back
            }

            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                self.grid_state.move_down(self.grid.rows.len());
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
                self.grid_state.move_up();
            }
            (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
                self.grid_state.scroll_right();
            }
            (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
                self.grid_state.scroll_left();
            }

            // One fetch at a time: page/sort/refresh keys wait for the
            // in-flight page to land.
            (KeyCode::Char('n'), KeyModifiers::NONE) if !self.loading => {
                self.offset += self.page_size;
                self.loading = true;
                return TableAction::Reload;
            }
            (KeyCode::Char('p'), KeyModifiers::NONE) if !self.loading => {
                if self.offset >= self.page_size {
                    self.offset -= self.page_size;
                    self.loading = true;
                    return TableAction::Reload;
                }
            }
            (KeyCode::Char('r'), KeyModifiers::NONE) if !self.loading => {
                self.loading = true;
                return TableAction::Reload;
            }

            // Sort column selection.
            (KeyCode::Char('a'), KeyModifiers::NONE) => {
                self.col_cursor = self.col_cursor.saturating_sub(1);
            }
            (KeyCode::Char('d'), KeyModifiers::NONE) => {
                if !self.grid.columns.is_empty() && self.col_cursor < self.grid.columns.len() - 1 {
                    self.col_cursor += 1;
                }
            }
            (KeyCode::Char('o'), KeyModifiers::NONE) if !self.loading => {
                let Some(column) = self.grid.columns.get(self.col_cursor).cloned() else {
                    return TableAction::None;
                };
                self.sort = match self.sort.take() {
                    Some(s) if s.column == column => Some(SortOrder {
                        column,
                        descending: !s.descending,
                    }),
                    _ => Some(SortOrder {
                        column,
                        descending: false,
                    }),
                };
                // Offsets into a reordered relation are meaningless.
                self.offset = 0;
                self.loading = true;
                return TableAction::Reload;
            }
            (KeyCode::Char('u'), KeyModifiers::NONE) if !self.loading => {
                if self.sort.take().is_some() {
                    self.offset = 0;
                    self.loading = true;
                    return TableAction::Reload;
                }
            }

            _ => {}
        }
        TableAction::None
    }

    /// Install a fetched page. An empty page past the start means we paged
    /// off the end of the table: step back and refetch, keeping the current
    /// page on screen so there is no flash of zero rows.
    pub fn apply_page(&mut self, result: QueryResult) -> TableAction {
        self.loading = false;

        if result.rows.is_empty() && self.offset > 0 {
            self.offset -= self.page_size;
            self.loading = true;
            return TableAction::Reload;
        }

        self.grid = GridModel::new(result);
        self.grid_state.reset();
        self.error = None;
        if !self.grid.columns.is_empty() {
            self.col_cursor = self.col_cursor.min(self.grid.columns.len() - 1);
        } else {
            self.col_cursor = 0;
        }
        TableAction::None
    }

    /// Fetch failed: clear the stale page and surface the message.
    pub fn apply_error(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
        self.grid = GridModel::empty();
        self.grid_state.reset();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if area.height < 2 {
            return;
        }

        let mut title = vec![Span::styled(
            format!(" {}", self.table.qualified()),
            theme.accent,
        )];
        let row_count = self.grid.rows.len();
        let first = if row_count == 0 { 0 } else { self.offset + 1 };
        title.push(Span::styled(
            format!("  ({} – {})", first, self.offset + row_count),
            theme.muted,
        ));
        if let Some(sort) = &self.sort {
            let arrow = if sort.descending { "▼" } else { "▲" };
            title.push(Span::styled(
                format!("  sort: {} {}", sort.column, arrow),
                theme.warning,
            ));
        }
        if let Some(col) = self.grid.columns.get(self.col_cursor) {
            title.push(Span::styled(format!("  col: {col}"), theme.muted));
        }
        if self.loading {
            title.push(Span::styled("  ⟳", theme.warning));
        }
        Paragraph::new(Line::from(title)).render(area, frame.buffer_mut());

        let body = Rect {
            x: area.x,
            y: area.y + 2,
            width: area.width,
            height: area.height.saturating_sub(2),
        };

        if let Some(err) = &self.error {
            Paragraph::new(Line::styled(format!(" Error: {err}"), theme.error))
                .render(body, frame.buffer_mut());
            return;
        }
        if self.grid.is_empty() {
            let msg = if self.loading { " Loading..." } else { " no data" };
            Paragraph::new(Line::styled(msg, theme.muted)).render(body, frame.buffer_mut());
            return;
        }

        DataGrid {
            model: &self.grid,
            state: &self.grid_state,
            theme,
            selected_col: Some(self.col_cursor),
            sort: self.sort.as_ref(),
        }
        .render(body, frame.buffer_mut());
    }
}
