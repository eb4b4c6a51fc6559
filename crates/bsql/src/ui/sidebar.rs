//! Table sidebar: the full table list, loaded once per session, with an
//! incremental case-insensitive substring filter. Filtering and cursor moves
//! are purely local; no network calls happen here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::db::TableRef;

use super::Theme;

/// What a sidebar keypress asks the parent to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    OpenTable(TableRef),
    OpenEditor,
    Disconnect,
}

pub struct Sidebar {
    tables: Vec<TableRef>,
    /// Indices into `tables` surviving the current filter.
    filtered: Vec<usize>,
    pub cursor: usize,
    pub filtering: bool,
    pub query: String,
    pub loading: bool,
    pub error: Option<String>,
    pub focused: bool,
}

impl Sidebar {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            filtered: Vec::new(),
            cursor: 0,
            filtering: false,
            query: String::new(),
            loading: true,
            error: None,
            focused: true,
        }
    }

    pub fn set_tables(&mut self, tables: Vec<TableRef>) {
        self.tables = tables;
        self.loading = false;
        self.error = None;
        self.apply_filter();
        self.cursor = 0;
    }

    pub fn set_error(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
    }

    pub fn selected(&self) -> Option<&TableRef> {
        self.filtered
            .get(self.cursor)
            .and_then(|&i| self.tables.get(i))
    }

    pub fn visible_len(&self) -> usize {
        self.filtered.len()
    }

    fn apply_filter(&mut self) {
        if self.query.is_empty() {
            self.filtered = (0..self.tables.len()).collect();
            return;
        }
        let needle = self.query.to_lowercase();
        self.filtered = self
            .tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SidebarAction {
        if self.filtering {
            match (key.code, key.modifiers) {
                (KeyCode::Esc, _) => {
                    self.filtering = false;
                    self.query.clear();
                    self.apply_filter();
                    self.cursor = 0;
                }
                (KeyCode::Backspace, _) => {
                    if self.query.pop().is_some() {
                        self.apply_filter();
                        self.cursor = 0;
                    }
                }
                (KeyCode::Down, _) => self.move_down(),
                (KeyCode::Up, _) => self.move_up(),
                (KeyCode::Enter, _) => {
                    self.filtering = false;
                    if let Some(table) = self.selected() {
                        return SidebarAction::OpenTable(table.clone());
                    }
                }
                (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                    self.query.push(c);
                    self.apply_filter();
                    self.cursor = 0;
                }
                _ => {}
            }
            return SidebarAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('/'), KeyModifiers::NONE) => {
                self.filtering = true;
                self.query.clear();
                self.apply_filter();
                self.cursor = 0;
            }
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => self.move_down(),
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => self.move_up(),
            (KeyCode::Enter, _) => {
                if let Some(table) = self.selected() {
                    return SidebarAction::OpenTable(table.clone());
                }
            }
            (KeyCode::Char('s'), KeyModifiers::NONE) => return SidebarAction::OpenEditor,
            (KeyCode::Esc, _) => return SidebarAction::Disconnect,
            _ => {}
        }
        SidebarAction::None
    }

    fn move_down(&mut self) {
        if !self.filtered.is_empty() && self.cursor < self.filtered.len() - 1 {
            self.cursor += 1;
        }
    }

    fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// `qualify` shows `schema.name` instead of the bare table name, used
    /// when the connection is not pinned to one database.
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme, qualify: bool) {
        let width = area.width as usize;
        let mut lines: Vec<Line> = Vec::new();

        let title_style = if self.focused { theme.accent } else { theme.muted };
        lines.push(Line::styled(" TABLES", title_style));

        if self.filtering {
            lines.push(Line::from(vec![
                Span::styled(" /", theme.accent),
                Span::styled(format!("{}█", self.query), theme.text),
            ]));
        } else {
            lines.push(Line::styled("─".repeat(width.max(1)), theme.dim));
        }

        if self.loading {
            lines.push(Line::styled("  loading...", theme.muted));
        } else if let Some(err) = &self.error {
            lines.push(Line::styled(format!("  {err}"), theme.error));
        } else if self.filtered.is_empty() {
            let msg = if self.query.is_empty() { "  no tables" } else { "  no match" };
            lines.push(Line::styled(msg, theme.muted));
        } else {
            let visible = (area.height as usize).saturating_sub(2).max(1);
            let start = if self.cursor >= visible {
                self.cursor - visible + 1
            } else {
                0
            };
            let end = (start + visible).min(self.filtered.len());

            for i in start..end {
                let table = &self.tables[self.filtered[i]];
                let mut name = if qualify && !table.schema.is_empty() {
                    table.qualified()
                } else {
                    table.name.clone()
                };
                let max_len = width.saturating_sub(4).max(1);
                if name.width() > max_len {
                    name = name.chars().take(max_len).collect();
                }

                if i == self.cursor {
                    lines.push(Line::styled(format!(" ▶ {name}"), theme.accent));
                } else {
                    lines.push(Line::styled(format!("   {name}"), theme.muted));
                }
            }
        }

        Paragraph::new(lines).render(area, frame.buffer_mut());
    }
}

impl Default for Sidebar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(schema: &str, name: &str) -> TableRef {
        TableRef {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sidebar() -> Sidebar {
        let mut s = Sidebar::new();
        s.set_tables(vec![
            table("public", "users"),
            table("public", "orders"),
            table("audit", "user_events"),
        ]);
        s
    }

    #[test]
    fn loads_unfiltered_with_cursor_at_top() {
        let s = sidebar();
        assert!(!s.loading);
        assert_eq!(s.visible_len(), 3);
        assert_eq!(s.selected().unwrap().name, "users");
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut s = sidebar();
        s.handle_key(key(KeyCode::Char('/')));
        assert!(s.filtering);
        for c in "USER".chars() {
            s.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(s.visible_len(), 2);
        assert_eq!(s.selected().unwrap().name, "users");
    }

    #[test]
    fn cursor_resets_on_every_filter_change() {
        let mut s = sidebar();
        s.handle_key(key(KeyCode::Down));
        assert_eq!(s.cursor, 1);

        s.handle_key(key(KeyCode::Char('/')));
        assert_eq!(s.cursor, 0);
        s.handle_key(key(KeyCode::Char('e')));
        s.handle_key(key(KeyCode::Down));
        assert_eq!(s.cursor, 1);
        s.handle_key(key(KeyCode::Char('r')));
        assert_eq!(s.cursor, 0, "narrowing the filter resets the cursor");
        s.handle_key(key(KeyCode::Backspace));
        assert_eq!(s.cursor, 0, "widening the filter resets the cursor");
    }

    #[test]
    fn escape_while_filtering_clears_filter_only() {
        let mut s = sidebar();
        s.handle_key(key(KeyCode::Char('/')));
        s.handle_key(key(KeyCode::Char('z')));
        assert_eq!(s.visible_len(), 0);

        let action = s.handle_key(key(KeyCode::Esc));
        assert_eq!(action, SidebarAction::None);
        assert!(!s.filtering);
        assert!(s.query.is_empty());
        assert_eq!(s.visible_len(), 3);
    }

    #[test]
    fn escape_outside_filter_requests_disconnect() {
        let mut s = sidebar();
        assert_eq!(s.handle_key(key(KeyCode::Esc)), SidebarAction::Disconnect);
    }

    #[test]
    fn enter_opens_selected_table_and_leaves_filter_mode() {
        let mut s = sidebar();
        s.handle_key(key(KeyCode::Char('/')));
        s.handle_key(key(KeyCode::Char('o')));
        s.handle_key(key(KeyCode::Char('r')));

        let action = s.handle_key(key(KeyCode::Enter));
        assert_eq!(action, SidebarAction::OpenTable(table("public", "orders")));
        assert!(!s.filtering);
    }

    #[test]
    fn enter_with_no_match_does_nothing() {
        let mut s = sidebar();
        s.handle_key(key(KeyCode::Char('/')));
        s.handle_key(key(KeyCode::Char('z')));
        assert_eq!(s.handle_key(key(KeyCode::Enter)), SidebarAction::None);
    }

    #[test]
    fn s_opens_editor_only_outside_filter_mode() {
        let mut s = sidebar();
        assert_eq!(s.handle_key(key(KeyCode::Char('s'))), SidebarAction::OpenEditor);

        s.handle_key(key(KeyCode::Char('/')));
        assert_eq!(s.handle_key(key(KeyCode::Char('s'))), SidebarAction::None);
        assert_eq!(s.query, "s");
    }

    #[test]
    fn cursor_bounded_by_filtered_list() {
        let mut s = sidebar();
        for _ in 0..10 {
            s.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(s.cursor, 2);
        for _ in 0..10 {
            s.handle_key(key(KeyCode::Char('k')));
        }
        assert_eq!(s.cursor, 0);
    }
}
