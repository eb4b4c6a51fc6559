//! Connect screen: a connection form next to the saved-connection history.
//!
//! The form never applies driver defaults to the fields themselves — empty
//! fields keep meaning "driver default" and the placeholders track the
//! driver toggle instead, so switching drivers never clobbers user input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Widget};
use ratatui::Frame;

use crate::config::{self, ConnectionConfig};
use crate::db::Driver;

use super::Theme;

const PANEL_WIDTH: u16 = 54;
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 116;
/// History rows addressable with the numeric shortcuts.
const MAX_HISTORY_ROWS: usize = 9;

/// What a connect-screen keypress asks the parent to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectAction {
    None,
    /// Start an async connect with this descriptor.
    Submit(ConnectionConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Driver,
    Host,
    Port,
    User,
    Password,
    Database,
}

const FIELD_ORDER: [Field; 7] = [
    Field::Name,
    Field::Driver,
    Field::Host,
    Field::Port,
    Field::User,
    Field::Password,
    Field::Database,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Driver => "Driver",
            Field::Host => "Host",
            Field::Port => "Port",
            Field::User => "User",
            Field::Password => "Password",
            Field::Database => "Database",
        }
    }

    fn next(self) -> Self {
        let i = FIELD_ORDER.iter().position(|f| *f == self).unwrap_or(0);
        FIELD_ORDER[(i + 1) % FIELD_ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = FIELD_ORDER.iter().position(|f| *f == self).unwrap_or(0);
        FIELD_ORDER[(i + FIELD_ORDER.len() - 1) % FIELD_ORDER.len()]
    }
}

pub struct ConnectScreen {
    name: String,
    host: String,
    port: String,
    user: String,
    password: String,
    database: String,

    name_cursor: usize,
    host_cursor: usize,
    port_cursor: usize,
    user_cursor: usize,
    password_cursor: usize,
    database_cursor: usize,

    pub driver: Driver,
    focused: Field,

    pub history: Vec<ConnectionConfig>,
    pub history_focused: bool,
    pub selected_history: usize,

    /// Set while a history row is being edited; label-only, persistence is
    /// the usual upsert-by-key on connect.
    pub editing: bool,
    pub connecting: bool,
    pub error: Option<String>,
}

impl ConnectScreen {
    pub fn new(history: Vec<ConnectionConfig>) -> Self {
        Self {
            name: String::new(),
            host: String::new(),
            port: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            name_cursor: 0,
            host_cursor: 0,
            port_cursor: 0,
            user_cursor: 0,
            password_cursor: 0,
            database_cursor: 0,
            driver: Driver::Postgres,
            focused: Field::Name,
            history_focused: !history.is_empty(),
            history,
            selected_history: 0,
            editing: false,
            connecting: false,
            error: None,
        }
    }

    /// Placeholder shown when a field is empty; port/user/database track the
    /// driver toggle.
    fn placeholder(&self, field: Field) -> &'static str {
        match field {
            Field::Name => "My Production DB  (optional)",
            Field::Driver => "",
            Field::Host => "localhost",
            Field::Port => self.driver.default_port(),
            Field::User => self.driver.default_user(),
            Field::Database => match self.driver {
                Driver::Postgres => "postgres",
                Driver::Mysql => "mydb",
            },
            Field::Password => "••••••••",
        }
    }

    pub fn build_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            name: self.name.clone(),
            driver: self.driver,
            host: self.host.clone(),
            port: self.port.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            last_used: None,
        }
    }

    /// Connect attempt failed: surface the message, allow resubmission.
    pub fn set_error(&mut self, error: String) {
        self.connecting = false;
        self.error = Some(error);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ConnectAction {
        if self.history_focused {
            return self.handle_history_key(key);
        }

        match (key.code, key.modifiers) {
            (KeyCode::Down, _) => {
                self.focused = self.focused.next();
            }
            (KeyCode::Up, _) => {
                self.focused = self.focused.prev();
            }
            (KeyCode::Tab, _) => match self.focused {
                Field::Driver => self.driver = self.driver.toggled(),
                Field::Name => self.focused = Field::Driver,
                _ => {
                    if !self.history.is_empty() {
                        self.history_focused = true;
                        self.editing = false;
                    }
                }
            },
            (KeyCode::Enter, _) => {
                if self.connecting {
                    return ConnectAction::None;
                }
                self.connecting = true;
                self.error = None;
                return ConnectAction::Submit(self.build_config());
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear_field(),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert_char(c),
            (KeyCode::Backspace, _) => self.delete_char_before(),
            (KeyCode::Delete, _) => self.delete_char_at(),
            (KeyCode::Left, _) => self.move_cursor_left(),
            (KeyCode::Right, _) => self.move_cursor_right(),
            (KeyCode::Home, _) => self.move_cursor_home(),
            (KeyCode::End, _) => self.move_cursor_end(),
            _ => {}
        }
        ConnectAction::None
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> ConnectAction {
        match (key.code, key.modifiers) {
            (KeyCode::Down, _) => {
                if !self.history.is_empty() && self.selected_history < self.history.len() - 1 {
                    self.selected_history += 1;
                }
            }
            (KeyCode::Up, _) => {
                self.selected_history = self.selected_history.saturating_sub(1);
            }
            (KeyCode::Enter, _) => return self.submit_history(self.selected_history),
            (KeyCode::Tab, _) | (KeyCode::Esc, _) => {
                self.history_focused = false;
            }
            (KeyCode::Char('d'), KeyModifiers::NONE) => self.delete_selected(),
            (KeyCode::Char('e'), KeyModifiers::NONE) => {
                if let Some(entry) = self.history.get(self.selected_history).cloned() {
                    self.prefill(&entry);
                    self.editing = true;
                    self.history_focused = false;
                    self.focused = Field::Name;
                }
            }
            (KeyCode::Char(c), KeyModifiers::NONE) if c.is_ascii_digit() && c != '0' => {
                let idx = (c as usize) - ('1' as usize);
                if idx < self.history.len() {
                    return self.submit_history(idx);
                }
            }
            _ => {}
        }
        ConnectAction::None
    }

    fn submit_history(&mut self, idx: usize) -> ConnectAction {
        let Some(entry) = self.history.get(idx).cloned() else {
            return ConnectAction::None;
        };
        if self.connecting {
            return ConnectAction::None;
        }
        // Mirror the stored descriptor into the form so a failure leaves the
        // user editing what they tried to connect with.
        self.prefill(&entry);
        self.history_focused = false;
        self.connecting = true;
        self.error = None;
        ConnectAction::Submit(entry)
    }

    fn delete_selected(&mut self) {
        let Some(entry) = self.history.get(self.selected_history) else {
            return;
        };
        // Persistence errors are not fatal to the screen; the in-memory
        // reload below reflects whatever actually happened on disk.
        let _ = config::delete_connection(entry);
        self.history = config::load_history().unwrap_or_default();
        if self.history.is_empty() {
            self.history_focused = false;
            self.selected_history = 0;
        } else if self.selected_history >= self.history.len() {
            self.selected_history = self.history.len() - 1;
        }
    }

    fn prefill(&mut self, entry: &ConnectionConfig) {
        self.name = entry.name.clone();
        self.driver = entry.driver;
        self.host = entry.host.clone();
        self.port = entry.port.clone();
        self.user = entry.user.clone();
        self.password = entry.password.clone();
        self.database = entry.database.clone();
        self.name_cursor = self.name.chars().count();
        self.host_cursor = self.host.chars().count();
        self.port_cursor = self.port.chars().count();
        self.user_cursor = self.user.chars().count();
        self.password_cursor = self.password.chars().count();
        self.database_cursor = self.database.chars().count();
    }

    fn current_field(&mut self) -> Option<(&mut String, &mut usize)> {
        match self.focused {
            Field::Name => Some((&mut self.name, &mut self.name_cursor)),
            Field::Host => Some((&mut self.host, &mut self.host_cursor)),
            Field::Port => Some((&mut self.port, &mut self.port_cursor)),
            Field::User => Some((&mut self.user, &mut self.user_cursor)),
            Field::Password => Some((&mut self.password, &mut self.password_cursor)),
            Field::Database => Some((&mut self.database, &mut self.database_cursor)),
            Field::Driver => None,
        }
    }

    fn insert_char(&mut self, c: char) {
        if self.focused == Field::Port && !c.is_ascii_digit() {
            return;
        }
        if let Some((field, cursor)) = self.current_field() {
            let byte_idx = field
                .char_indices()
                .nth(*cursor)
                .map(|(i, _)| i)
                .unwrap_or(field.len());
            field.insert(byte_idx, c);
            *cursor += 1;
        }
    }

    fn delete_char_before(&mut self) {
        if let Some((field, cursor)) = self.current_field() {
            if *cursor > 0 {
                *cursor -= 1;
                if let Some((i, _)) = field.char_indices().nth(*cursor) {
                    field.remove(i);
                }
            }
        }
    }

    fn delete_char_at(&mut self) {
        if let Some((field, cursor)) = self.current_field() {
            if let Some((i, _)) = field.char_indices().nth(*cursor) {
                field.remove(i);
            }
        }
    }

    fn move_cursor_left(&mut self) {
        if let Some((_, cursor)) = self.current_field() {
            *cursor = cursor.saturating_sub(1);
        }
    }

    fn move_cursor_right(&mut self) {
        if let Some((field, cursor)) = self.current_field() {
            if *cursor < field.chars().count() {
                *cursor += 1;
            }
        }
    }

    fn move_cursor_home(&mut self) {
        if let Some((_, cursor)) = self.current_field() {
            *cursor = 0;
        }
    }

    fn move_cursor_end(&mut self) {
        if let Some((field, cursor)) = self.current_field() {
            *cursor = field.chars().count();
        }
    }

    fn clear_field(&mut self) {
        if let Some((field, cursor)) = self.current_field() {
            field.clear();
            *cursor = 0;
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let has_history = !self.history.is_empty();

        if has_history && area.width >= SIDE_BY_SIDE_MIN_WIDTH {
            let total_w = PANEL_WIDTH * 2 + 2;
            let x = area.x + area.width.saturating_sub(total_w) / 2;
            self.render_form(frame, Rect { x, ..area }, theme);
            self.render_history(
                frame,
                Rect {
                    x: x + PANEL_WIDTH + 2,
                    ..area
                },
                theme,
            );
        } else if self.history_focused && has_history {
            let x = area.x + area.width.saturating_sub(PANEL_WIDTH) / 2;
            self.render_history(frame, Rect { x, ..area }, theme);
        } else {
            let x = area.x + area.width.saturating_sub(PANEL_WIDTH) / 2;
            self.render_form(frame, Rect { x, ..area }, theme);
        }
    }

    fn field_line(&self, field: Field, theme: &Theme) -> Line<'static> {
        let active = self.focused == field && !self.history_focused;
        let mut spans = Vec::new();

        if active {
            spans.push(Span::styled("▸ ", theme.accent));
        } else {
            spans.push(Span::raw("  "));
        }
        let label_style = if active { theme.accent } else { theme.muted };
        spans.push(Span::styled(format!("{:<9}", field.label()), label_style));

        if field == Field::Driver {
            let (pg_style, my_style) = if self.driver == Driver::Postgres {
                (theme.grid_selected, theme.muted)
            } else {
                (theme.muted, theme.grid_selected)
            };
            spans.push(Span::styled(" postgres ", pg_style));
            spans.push(Span::styled(" · ", theme.dim));
            spans.push(Span::styled(" mysql ", my_style));
            spans.push(Span::styled("  Tab to switch", theme.dim));
            return Line::from(spans);
        }

        let (value, cursor) = match field {
            Field::Name => (&self.name, self.name_cursor),
            Field::Host => (&self.host, self.host_cursor),
            Field::Port => (&self.port, self.port_cursor),
            Field::User => (&self.user, self.user_cursor),
            Field::Password => (&self.password, self.password_cursor),
            Field::Database => (&self.database, self.database_cursor),
            Field::Driver => unreachable!(),
        };

        if value.is_empty() && !active {
            spans.push(Span::styled(self.placeholder(field).to_string(), theme.dim));
            return Line::from(spans);
        }

        let mut shown: String = if field == Field::Password {
            "•".repeat(value.chars().count())
        } else {
            value.clone()
        };
        if active {
            let byte_idx = shown
                .char_indices()
                .nth(cursor)
                .map(|(i, _)| i)
                .unwrap_or(shown.len());
            shown.insert(byte_idx, '█');
        }
        spans.push(Span::styled(shown, theme.text));
        Line::from(spans)
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines: Vec<Line> = Vec::new();
        let inner_w = PANEL_WIDTH as usize - 4;

        let title = if self.editing {
            format!("{}  bsql  ✎ Edit", self.driver.icon())
        } else {
            format!("{}  bsql", self.driver.icon())
        };
        let driver_label = self.driver.label();
        let gap = inner_w
            .saturating_sub(title.chars().count() + driver_label.len())
            .max(1);
        lines.push(Line::from(vec![
            Span::styled(title, theme.accent),
            Span::raw(" ".repeat(gap)),
            Span::styled(driver_label, theme.text),
        ]));
        lines.push(Line::styled("─".repeat(inner_w), theme.dim));

        for field in FIELD_ORDER {
            lines.push(self.field_line(field, theme));
            if field == Field::Name {
                lines.push(Line::styled("─".repeat(inner_w), theme.dim));
            }
        }

        lines.push(Line::raw(""));
        if let Some(err) = &self.error {
            let mut msg = format!("✕  {err}");
            if msg.chars().count() > inner_w {
                msg = msg.chars().take(inner_w.saturating_sub(1)).collect::<String>() + "…";
            }
            lines.push(Line::styled(msg, theme.error));
        } else if self.connecting {
            lines.push(Line::styled("⟳  Connecting…", theme.muted));
        } else {
            let label = if self.editing {
                "[ Save & Connect ]"
            } else {
                "[ Connect ]"
            };
            let pad = inner_w.saturating_sub(label.len()) / 2;
            lines.push(Line::from(vec![
                Span::raw(" ".repeat(pad)),
                Span::styled(label, theme.grid_selected),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "↑↓ navigate · Enter connect · Ctrl+C quit",
            theme.muted,
        ));

        let border = if self.history_focused {
            theme.border_unfocused
        } else {
            theme.border_focused
        };
        self.render_panel(frame, area, lines, border);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let inner_w = PANEL_WIDTH as usize - 4;
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::styled("Recent Connections", theme.text));
        lines.push(Line::styled("─".repeat(inner_w), theme.dim));
        lines.push(Line::raw(""));

        for (i, entry) in self.history.iter().take(MAX_HISTORY_ROWS).enumerate() {
            let active = self.history_focused && i == self.selected_history;

            let mut spans = Vec::new();
            if active {
                spans.push(Span::styled("▸ ", theme.accent));
            } else {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("{} ", i + 1),
                if active { theme.accent } else { theme.muted },
            ));
            let tag = match entry.driver {
                Driver::Postgres => Span::styled(" pg ", theme.popup_keyword),
                Driver::Mysql => Span::styled(" my ", theme.warning),
            };
            spans.push(tag);

            let mut name = entry.display_name();
            let max = inner_w.saturating_sub(10);
            if name.chars().count() > max {
                name = name.chars().take(max.saturating_sub(1)).collect::<String>() + "…";
            }
            spans.push(Span::styled(
                format!("  {name}"),
                if active { theme.text } else { theme.muted },
            ));
            lines.push(Line::from(spans));
        }

        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "↑↓ select · 1-9/Enter connect · e edit · d delete",
            theme.muted,
        ));

        let border = if self.history_focused {
            theme.border_focused
        } else {
            theme.border_unfocused
        };
        self.render_panel(frame, area, lines, border);
    }

    fn render_panel(
        &self,
        frame: &mut Frame,
        area: Rect,
        lines: Vec<Line<'static>>,
        border_style: ratatui::style::Style,
    ) {
        let height = (lines.len() as u16 + 2).min(area.height);
        let y = area.y + area.height.saturating_sub(height) / 2;
        let rect = Rect {
            x: area.x,
            y,
            width: PANEL_WIDTH.min(area.width),
            height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(ratatui::widgets::Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, frame.buffer_mut());
        Paragraph::new(lines).render(inner, frame.buffer_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(screen: &mut ConnectScreen, s: &str) {
        for c in s.chars() {
            screen.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn entry(name: &str, user: &str, host: &str) -> ConnectionConfig {
        ConnectionConfig {
            name: name.to_string(),
            user: user.to_string(),
            host: host.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_history_starts_on_the_form() {
        let screen = ConnectScreen::new(Vec::new());
        assert!(!screen.history_focused);
        assert_eq!(screen.focused, Field::Name);
    }

    #[test]
    fn existing_history_starts_focused() {
        let screen = ConnectScreen::new(vec![entry("a", "u", "h")]);
        assert!(screen.history_focused);
        assert_eq!(screen.selected_history, 0);
    }

    #[test]
    fn driver_toggle_changes_placeholders_not_values() {
        let mut screen = ConnectScreen::new(Vec::new());
        type_str(&mut screen, "myname");
        // Move to the driver field and toggle.
        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.focused, Field::Driver);
        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.driver, Driver::Mysql);
        assert_eq!(screen.placeholder(Field::Port), "3306");
        assert_eq!(screen.placeholder(Field::User), "root");
        assert_eq!(screen.name, "myname", "typed values survive the toggle");

        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.driver, Driver::Postgres);
        assert_eq!(screen.placeholder(Field::Port), "5432");
        assert_eq!(screen.placeholder(Field::User), "postgres");
    }

    #[test]
    fn arrows_cycle_fields_with_wraparound() {
        let mut screen = ConnectScreen::new(Vec::new());
        screen.handle_key(key(KeyCode::Up));
        assert_eq!(screen.focused, Field::Database);
        screen.handle_key(key(KeyCode::Down));
        assert_eq!(screen.focused, Field::Name);
        screen.handle_key(key(KeyCode::Down));
        assert_eq!(screen.focused, Field::Driver);
    }

    #[test]
    fn port_accepts_digits_only() {
        let mut screen = ConnectScreen::new(Vec::new());
        for _ in 0..3 {
            screen.handle_key(key(KeyCode::Down));
        }
        assert_eq!(screen.focused, Field::Port);
        type_str(&mut screen, "54x32");
        assert_eq!(screen.build_config().port, "5432");
    }

    #[test]
    fn enter_submits_current_fields() {
        let mut screen = ConnectScreen::new(Vec::new());
        type_str(&mut screen, "prod");
        screen.handle_key(key(KeyCode::Down));
        screen.handle_key(key(KeyCode::Down));
        type_str(&mut screen, "db.internal");

        let action = screen.handle_key(key(KeyCode::Enter));
        let ConnectAction::Submit(config) = action else {
            panic!("expected submit");
        };
        assert_eq!(config.name, "prod");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.driver, Driver::Postgres);
        assert!(screen.connecting);
    }

    #[test]
    fn enter_is_ignored_while_connecting() {
        let mut screen = ConnectScreen::new(Vec::new());
        assert!(matches!(
            screen.handle_key(key(KeyCode::Enter)),
            ConnectAction::Submit(_)
        ));
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), ConnectAction::None);
    }

    #[test]
    fn connect_error_allows_resubmission() {
        let mut screen = ConnectScreen::new(Vec::new());
        screen.handle_key(key(KeyCode::Enter));
        screen.set_error("connection refused".to_string());
        assert!(!screen.connecting);
        assert_eq!(screen.error.as_deref(), Some("connection refused"));

        let action = screen.handle_key(key(KeyCode::Enter));
        assert!(matches!(action, ConnectAction::Submit(_)));
        assert_eq!(screen.error, None);
    }

    #[test]
    fn tab_moves_between_form_and_history() {
        let mut screen = ConnectScreen::new(vec![entry("a", "u", "h")]);
        assert!(screen.history_focused);
        screen.handle_key(key(KeyCode::Tab));
        assert!(!screen.history_focused);

        // Tab from Name goes to the driver toggle, not back to history.
        assert_eq!(screen.focused, Field::Name);
        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.focused, Field::Driver);

        // From any later field it returns to the history list.
        screen.handle_key(key(KeyCode::Down));
        screen.handle_key(key(KeyCode::Tab));
        assert!(screen.history_focused);
    }

    #[test]
    fn history_enter_submits_stored_descriptor() {
        let mut screen = ConnectScreen::new(vec![
            entry("first", "u1", "h1"),
            entry("second", "u2", "h2"),
        ]);
        screen.handle_key(key(KeyCode::Down));

        let action = screen.handle_key(key(KeyCode::Enter));
        let ConnectAction::Submit(config) = action else {
            panic!("expected submit");
        };
        assert_eq!(config.name, "second");
        // The form now mirrors the descriptor being connected.
        assert_eq!(screen.build_config().user, "u2");
        assert!(screen.connecting);
        assert!(!screen.history_focused);
    }

    #[test]
    fn numeric_shortcut_connects_by_position() {
        let mut screen = ConnectScreen::new(vec![
            entry("first", "u1", "h1"),
            entry("second", "u2", "h2"),
        ]);
        let action = screen.handle_key(key(KeyCode::Char('2')));
        let ConnectAction::Submit(config) = action else {
            panic!("expected submit");
        };
        assert_eq!(config.name, "second");

        // Out-of-range digits do nothing.
        let mut screen = ConnectScreen::new(vec![entry("only", "u", "h")]);
        assert_eq!(
            screen.handle_key(key(KeyCode::Char('9'))),
            ConnectAction::None
        );
    }

    #[test]
    fn history_selection_is_clamped() {
        let mut screen = ConnectScreen::new(vec![
            entry("a", "u1", "h1"),
            entry("b", "u2", "h2"),
        ]);
        for _ in 0..5 {
            screen.handle_key(key(KeyCode::Down));
        }
        assert_eq!(screen.selected_history, 1);
        for _ in 0..5 {
            screen.handle_key(key(KeyCode::Up));
        }
        assert_eq!(screen.selected_history, 0);
    }

    #[test]
    fn edit_prefills_form_without_removing_entry() {
        let mut screen = ConnectScreen::new(vec![entry("prod", "alice", "db1")]);
        screen.handle_key(key(KeyCode::Char('e')));

        assert!(screen.editing);
        assert!(!screen.history_focused);
        assert_eq!(screen.focused, Field::Name);
        assert_eq!(screen.history.len(), 1, "edit does not remove the entry");

        let config = screen.build_config();
        assert_eq!(config.name, "prod");
        assert_eq!(config.user, "alice");
        assert_eq!(config.host, "db1");
    }

    #[test]
    #[serial]
    fn delete_removes_row_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("BSQL_CONFIG_DIR", dir.path());

        config::save_connection(&entry("a", "u1", "h1")).unwrap();
        config::save_connection(&entry("b", "u2", "h2")).unwrap();

        let history = config::load_history().unwrap();
        assert_eq!(history.len(), 2);

        let mut screen = ConnectScreen::new(history);
        // Most recent first: selected row 0 is "b".
        screen.handle_key(key(KeyCode::Char('d')));

        assert_eq!(screen.history.len(), 1);
        assert_eq!(screen.history[0].name, "a");

        let on_disk = config::load_history().unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].name, "a");

        // Deleting the last row drops focus back to the form.
        screen.handle_key(key(KeyCode::Char('d')));
        assert!(screen.history.is_empty());
        assert!(!screen.history_focused);

        std::env::remove_var("BSQL_CONFIG_DIR");
    }
}
