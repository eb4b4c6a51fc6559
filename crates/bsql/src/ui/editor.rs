//! SQL editor: a free-text buffer over a results viewport, with completion
//! driven by a schema catalog loaded once when the editor opens.

use std::collections::BTreeMap;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};
use ratatui::Frame;
use tui_textarea::{Input, TextArea};

use crate::db::QueryResult;

use super::completion::{popup_lines, POPUP_MAX_ITEMS, POPUP_WIDTH};
use super::{word_context, CompletionState, DataGrid, GridModel, GridState, Theme};

/// What an editor keypress asks the parent to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// Execute the whole buffer as one statement.
    Run(String),
    /// Return focus to the sidebar.
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFocus {
    Edit,
    Results,
}

pub struct EditorView {
    pub textarea: TextArea<'static>,
    pub focus: EditorFocus,
    pub completion: CompletionState,

    tables: Vec<String>,
    columns_by_table: BTreeMap<String, Vec<String>>,
    pub catalog_loaded: bool,

    pub grid: GridModel,
    pub grid_state: GridState,
    pub running: bool,
    pub error: Option<String>,
    pub elapsed: Option<Duration>,
    has_result: bool,
}

impl EditorView {
    pub fn new(lowercase_keywords: bool) -> Self {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("SELECT * FROM ...");

        Self {
            textarea,
            focus: EditorFocus::Edit,
            completion: CompletionState::new(lowercase_keywords),
            tables: Vec::new(),
            columns_by_table: BTreeMap::new(),
            catalog_loaded: false,
            grid: GridModel::empty(),
            grid_state: GridState::default(),
            running: false,
            error: None,
            elapsed: None,
            has_result: false,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Install the table/column catalog. Read-only input to completion from
    /// here on; keys are lower-cased table names.
    pub fn set_catalog(&mut self, tables: Vec<String>, columns_by_table: BTreeMap<String, Vec<String>>) {
        self.tables = tables;
        self.columns_by_table = columns_by_table;
        self.catalog_loaded = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        // Run and focus-toggle work from both sub-views.
        match (key.code, key.modifiers) {
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => return self.request_run(),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                self.focus = match self.focus {
                    EditorFocus::Edit => {
                        self.completion.dismiss();
                        EditorFocus::Results
                    }
                    EditorFocus::Results => EditorFocus::Edit,
                };
                return EditorAction::None;
            }
            _ => {}
        }

        match self.focus {
            EditorFocus::Edit => self.handle_edit_key(key),
            EditorFocus::Results => self.handle_results_key(key),
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> EditorAction {
        if self.completion.active {
            match (key.code, key.modifiers) {
                (KeyCode::Tab, KeyModifiers::NONE) => {
                    self.apply_completion();
                    return EditorAction::None;
                }
                (KeyCode::Down, KeyModifiers::NONE)
                | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                    self.completion.next();
                    return EditorAction::None;
                }
                (KeyCode::Up, KeyModifiers::NONE)
                | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
                    self.completion.prev();
                    return EditorAction::None;
                }
                (KeyCode::Esc, _) => {
                    self.completion.dismiss();
                    return EditorAction::None;
                }
                _ => {}
            }
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => EditorAction::Back,
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                self.completion.toggle_keyword_case();
                self.refresh_completion();
                EditorAction::None
            }
            _ => {
                let modified = self.textarea.input(Input::from(key));
                if modified {
                    self.refresh_completion();
                } else {
                    // Plain cursor movement: the word under the cursor is no
                    // longer the one the popup was built for.
                    self.completion.dismiss();
                }
                EditorAction::None
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> EditorAction {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return EditorAction::Back,
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
            _ => {}
        }
        EditorAction::None
    }

    /// Recompute suggestions for the word at the cursor.
    fn refresh_completion(&mut self) {
        let (row, col) = self.textarea.cursor();
        let lines = self.textarea.lines();
        let Some(line) = lines.get(row) else {
            self.completion.dismiss();
            return;
        };
        let ctx = word_context(line, col);
        self.completion
            .refresh(&ctx, &self.tables, &self.columns_by_table);
    }

    /// Replace the current word with the selected suggestion.
    fn apply_completion(&mut self) {
        let Some((text, chars_to_delete)) = self.completion.accepted() else {
            self.completion.dismiss();
            return;
        };
        for _ in 0..chars_to_delete {
            self.textarea.delete_char();
        }
        self.textarea.insert_str(&text);
        self.completion.dismiss();
    }

    fn request_run(&mut self) -> EditorAction {
        if self.running {
            return EditorAction::None;
        }
        let sql = self.text();
        if sql.trim().is_empty() {
            // Rejected locally; no command is dispatched.
            self.error = Some("empty query".to_string());
            self.focus = EditorFocus::Results;
            return EditorAction::None;
        }
        self.running = true;
        self.completion.dismiss();
        EditorAction::Run(sql)
    }

    pub fn apply_result(&mut self, result: QueryResult, elapsed: Duration) {
        self.running = false;
        self.error = None;
        self.elapsed = Some(elapsed);
        self.grid = GridModel::new(result);
        self.grid_state.reset();
        self.has_result = true;
        self.focus = EditorFocus::Results;
    }

    pub fn apply_error(&mut self, error: String) {
        self.running = false;
        self.error = Some(error);
        self.grid = GridModel::empty();
        self.grid_state.reset();
        self.has_result = false;
        // Switch to the results pane so the error is visible.
        self.focus = EditorFocus::Results;
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let ed_h = editor_height(area.height);
        let chunks = Layout::vertical([
            Constraint::Length(ed_h),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

        let editing = self.focus == EditorFocus::Edit;

        let editor_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if editing {
                theme.border_focused
            } else {
                theme.border_unfocused
            })
            .title(" SQL Editor ")
            .title_style(if editing { theme.accent } else { theme.muted });
        self.textarea.set_block(editor_block);
        self.textarea.set_placeholder_style(theme.dim);
        frame.render_widget(&self.textarea, chunks[0]);

        let status = if self.running {
            Line::styled(" ⟳  Running...", theme.warning)
        } else if let Some(err) = &self.error {
            Line::styled(format!(" ✗  {err}"), theme.error)
        } else if self.has_result {
            let ms = self.elapsed.map(|e| e.as_millis()).unwrap_or(0);
            Line::styled(
                format!(" ✓  {} rows  ({ms}ms)", self.grid.rows.len()),
                theme.success,
            )
        } else {
            Line::styled(" ─  no results yet", theme.dim)
        };
        Paragraph::new(status).render(chunks[1], frame.buffer_mut());

        let results_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if editing {
                theme.border_unfocused
            } else {
                theme.border_focused
            })
            .title(" Results ")
            .title_style(if editing { theme.muted } else { theme.accent });
        let inner = results_block.inner(chunks[2]);
        results_block.render(chunks[2], frame.buffer_mut());

        if let Some(err) = &self.error {
            Paragraph::new(Line::styled(format!(" {err}"), theme.error))
                .render(inner, frame.buffer_mut());
        } else if !self.has_result {
            Paragraph::new(Line::styled(" Run a query with Ctrl+E", theme.dim))
                .render(inner, frame.buffer_mut());
        } else {
            DataGrid {
                model: &self.grid,
                state: &self.grid_state,
                theme,
                selected_col: None,
                sort: None,
            }
            .render(inner, frame.buffer_mut());
        }

        if editing && self.completion.active {
            self.render_popup(frame, chunks[0], theme);
        }
    }

    fn render_popup(&self, frame: &mut Frame, editor_area: Rect, theme: &Theme) {
        let lines = popup_lines(&self.completion, theme);
        let height = (lines.len() as u16 + 2)
            .min(POPUP_MAX_ITEMS as u16 + 3)
            .min(frame.area().height);
        let width = POPUP_WIDTH.min(frame.area().width);

        // Anchor under the cursor, at the start of the word being completed.
        // The textarea may scroll internally, so this is an estimate.
        let (cursor_row, cursor_col) = self.textarea.cursor();
        let col = cursor_col.saturating_sub(self.completion.prefix_chars());
        let x = (editor_area.x + 1 + col as u16).min(frame.area().width.saturating_sub(width));
        let mut y = editor_area.y + 2 + cursor_row as u16;
        if y + height > frame.area().height {
            y = frame.area().height.saturating_sub(height);
        }

        let popup_area = Rect {
            x,
            y,
            width,
            height,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.popup_hint);

        frame.render_widget(Clear, popup_area);
        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}

/// Editor pane takes two fifths of the content height, within reason.
fn editor_height(total: u16) -> u16 {
    (total * 2 / 5).clamp(6, 18)
}
