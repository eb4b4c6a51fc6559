use std::collections::BTreeMap;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use super::state::{BrowseFocus, Screen};
use crate::config::{self, Config, ConnectionConfig};
use crate::db::{self, Db, QueryResult, TableRef};
use crate::ui::{
    ConnectAction, ConnectScreen, EditorAction, EditorFocus, EditorView, Sidebar, SidebarAction,
    TableAction, TableView, Theme,
};

/// The browse screen's content pane. Replaced wholesale when a table or the
/// editor is opened; surviving an Esc back to the sidebar.
pub enum Content {
    Welcome,
    Table(TableView),
    Editor(EditorView),
}

/// Completion of one asynchronous command, tagged with the epoch it was
/// issued under. Events from a superseded screen are dropped at the drain.
pub struct DbEvent {
    pub epoch: u64,
    pub payload: DbPayload,
}

pub enum DbPayload {
    Connected {
        db: Arc<dyn Db>,
        config: ConnectionConfig,
    },
    ConnectFailed {
        error: String,
    },
    TablesLoaded {
        tables: Vec<TableRef>,
    },
    TablesFailed {
        error: String,
    },
    PageLoaded {
        result: QueryResult,
    },
    PageFailed {
        error: String,
    },
    CatalogLoaded {
        tables: Vec<String>,
        columns_by_table: BTreeMap<String, Vec<String>>,
    },
    CatalogFailed {
        error: String,
    },
    QueryFinished {
        result: QueryResult,
        elapsed: Duration,
    },
    QueryFailed {
        error: String,
    },
}

/// What a routed browse keypress asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseOutcome {
    None,
    OpenTable(TableRef),
    OpenEditor,
    Disconnect,
    ReloadPage,
    RunQuery(String),
}

/// The connected session: sidebar plus one content pane.
pub struct BrowseScreen {
    pub db: Arc<dyn Db>,
    pub config: ConnectionConfig,
    pub sidebar: Sidebar,
    pub content: Content,
    pub focus: BrowseFocus,
}

impl BrowseScreen {
    fn new(db: Arc<dyn Db>, config: ConnectionConfig) -> Self {
        Self {
            db,
            config,
            sidebar: Sidebar::new(),
            content: Content::Welcome,
            focus: BrowseFocus::Sidebar,
        }
    }

    /// Route one key through the focus hierarchy, translating child actions
    /// into outcomes for the app to interpret. Children never see the app.
    fn route_key(&mut self, key: KeyEvent) -> BrowseOutcome {
        // Tab toggles sidebar/content focus — unless the sidebar filter is
        // capturing input, or the editor's completion popup wants to accept.
        if key.code == KeyCode::Tab && key.modifiers == KeyModifiers::NONE {
            let editor_wants_tab = matches!(
                &self.content,
                Content::Editor(ed) if self.focus == BrowseFocus::Content
                    && ed.focus == EditorFocus::Edit
                    && ed.completion.active
            );
            if !editor_wants_tab && !self.sidebar.filtering {
                match self.focus {
                    BrowseFocus::Sidebar => {
                        if !matches!(self.content, Content::Welcome) {
                            self.focus = BrowseFocus::Content;
                            self.sidebar.focused = false;
                        }
                    }
                    BrowseFocus::Content => {
                        self.focus = BrowseFocus::Sidebar;
                        self.sidebar.focused = true;
                    }
                }
                return BrowseOutcome::None;
            }
        }

        match self.focus {
            BrowseFocus::Sidebar => match self.sidebar.handle_key(key) {
                SidebarAction::OpenTable(table) => BrowseOutcome::OpenTable(table),
                SidebarAction::OpenEditor => BrowseOutcome::OpenEditor,
                SidebarAction::Disconnect => BrowseOutcome::Disconnect,
                SidebarAction::None => BrowseOutcome::None,
            },
            BrowseFocus::Content => match &mut self.content {
                Content::Welcome => BrowseOutcome::None,
                Content::Table(tv) => match tv.handle_key(key) {
                    TableAction::Reload => BrowseOutcome::ReloadPage,
                    TableAction::Back => {
                        self.focus = BrowseFocus::Sidebar;
                        self.sidebar.focused = true;
                        BrowseOutcome::None
                    }
                    TableAction::None => BrowseOutcome::None,
                },
                Content::Editor(ed) => match ed.handle_key(key) {
                    EditorAction::Run(sql) => BrowseOutcome::RunQuery(sql),
                    EditorAction::Back => {
                        self.focus = BrowseFocus::Sidebar;
                        self.sidebar.focused = true;
                        BrowseOutcome::None
                    }
                    EditorAction::None => BrowseOutcome::None,
                },
            },
        }
    }
}

pub struct App {
    pub config: Config,
    pub theme: Theme,
    pub screen: Screen,
    pub connect: ConnectScreen,
    pub browse: Option<BrowseScreen>,

    /// Bumped on every screen/content transition; stale command completions
    /// carry an older value and are dropped.
    epoch: u64,

    rt: tokio::runtime::Handle,
    db_events_tx: mpsc::UnboundedSender<DbEvent>,
    db_events_rx: mpsc::UnboundedReceiver<DbEvent>,

    should_quit: bool,
}

impl App {
    pub fn new(
        rt: tokio::runtime::Handle,
        db_events_tx: mpsc::UnboundedSender<DbEvent>,
        db_events_rx: mpsc::UnboundedReceiver<DbEvent>,
        config: Config,
    ) -> Self {
        let history = config::load_history().unwrap_or_default();
        Self {
            config,
            theme: Theme::default(),
            screen: Screen::Connect,
            connect: ConnectScreen::new(history),
            browse: None,
            epoch: 0,
            rt,
            db_events_tx,
            db_events_rx,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.drain_db_events();

            terminal.draw(|frame| self.draw(frame))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
                    // Layout is recomputed from the frame area on every
                    // draw, so a resize only needs the next tick.
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Connect => match self.connect.handle_key(key) {
                ConnectAction::Submit(config) => self.start_connect(config),
                ConnectAction::None => {}
            },
            Screen::Browse => {
                let outcome = match self.browse.as_mut() {
                    Some(browse) => browse.route_key(key),
                    None => return,
                };
                match outcome {
                    BrowseOutcome::None => {}
                    BrowseOutcome::OpenTable(table) => self.open_table(table),
                    BrowseOutcome::OpenEditor => self.open_editor(),
                    BrowseOutcome::Disconnect => self.disconnect(),
                    BrowseOutcome::ReloadPage => self.spawn_fetch_page(),
                    BrowseOutcome::RunQuery(sql) => self.spawn_exec_query(sql),
                }
            }
        }
    }

    // --- async command dispatch -------------------------------------------

    fn start_connect(&mut self, config: ConnectionConfig) {
        let epoch = self.epoch;
        let tx = self.db_events_tx.clone();
        self.rt.spawn(async move {
            let payload = match db::connect(&config).await {
                Ok(db) => DbPayload::Connected { db, config },
                Err(e) => DbPayload::ConnectFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(DbEvent { epoch, payload });
        });
    }

    fn spawn_list_tables(&mut self) {
        let Some(browse) = self.browse.as_ref() else {
            return;
        };
        let db = browse.db.clone();
        let epoch = self.epoch;
        let tx = self.db_events_tx.clone();
        self.rt.spawn(async move {
            let payload = match db.list_tables().await {
                Ok(tables) => DbPayload::TablesLoaded { tables },
                Err(e) => DbPayload::TablesFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(DbEvent { epoch, payload });
        });
    }

    fn spawn_fetch_page(&mut self) {
        let Some(browse) = self.browse.as_ref() else {
            return;
        };
        let Content::Table(tv) = &browse.content else {
            return;
        };
        let db = browse.db.clone();
        let schema = tv.table.schema.clone();
        let table = tv.table.name.clone();
        let limit = tv.page_size();
        let offset = tv.offset;
        let sort = tv.sort.clone();
        let epoch = self.epoch;
        let tx = self.db_events_tx.clone();
        self.rt.spawn(async move {
            let payload = match db
                .fetch_table_data(&schema, &table, limit, offset, sort.as_ref())
                .await
            {
                Ok(result) => DbPayload::PageLoaded { result },
                Err(e) => DbPayload::PageFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(DbEvent { epoch, payload });
        });
    }

    fn spawn_load_catalog(&mut self) {
        let Some(browse) = self.browse.as_ref() else {
            return;
        };
        let db = browse.db.clone();
        let epoch = self.epoch;
        let tx = self.db_events_tx.clone();
        self.rt.spawn(async move {
            let payload = match load_catalog(db).await {
                Ok((tables, columns_by_table)) => DbPayload::CatalogLoaded {
                    tables,
                    columns_by_table,
                },
                Err(e) => DbPayload::CatalogFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(DbEvent { epoch, payload });
        });
    }

    fn spawn_exec_query(&mut self, sql: String) {
        let Some(browse) = self.browse.as_ref() else {
            return;
        };
        let db = browse.db.clone();
        let epoch = self.epoch;
        let tx = self.db_events_tx.clone();
        self.rt.spawn(async move {
            let started = Instant::now();
            let payload = match db.exec_query(&sql).await {
                Ok(result) => DbPayload::QueryFinished {
                    result,
                    elapsed: started.elapsed(),
                },
                Err(e) => DbPayload::QueryFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(DbEvent { epoch, payload });
        });
    }

    // --- transitions ------------------------------------------------------

    fn open_table(&mut self, table: TableRef) {
        let page_size = self.config.display.page_size;
        self.epoch += 1;
        if let Some(browse) = self.browse.as_mut() {
            browse.content = Content::Table(TableView::new(table, page_size));
            browse.focus = BrowseFocus::Content;
            browse.sidebar.focused = false;
        }
        self.spawn_fetch_page();
    }

    fn open_editor(&mut self) {
        let lowercase = self.config.sql.lowercase_keywords;
        self.epoch += 1;
        if let Some(browse) = self.browse.as_mut() {
            browse.content = Content::Editor(EditorView::new(lowercase));
            browse.focus = BrowseFocus::Content;
            browse.sidebar.focused = false;
        }
        self.spawn_load_catalog();
    }

    fn disconnect(&mut self) {
        if let Some(browse) = self.browse.take() {
            let db = browse.db;
            self.rt.spawn(async move {
                let _ = db.close().await;
            });
        }
        self.epoch += 1;
        let history = config::load_history().unwrap_or_default();
        self.connect = ConnectScreen::new(history);
        self.screen = Screen::Connect;
    }

    // --- async command completion -----------------------------------------

    fn drain_db_events(&mut self) {
        while let Ok(event) = self.db_events_rx.try_recv() {
            if event.epoch != self.epoch {
                // Completion for a screen the user already left.
                continue;
            }
            self.apply_db_event(event.payload);
        }
    }

    fn apply_db_event(&mut self, payload: DbPayload) {
        match payload {
            DbPayload::Connected { db, config } => {
                // History write is best-effort; a read-only config dir
                // shouldn't block the session.
                let _ = config::save_connection(&config);
                self.epoch += 1;
                self.browse = Some(BrowseScreen::new(db, config));
                self.screen = Screen::Browse;
                self.spawn_list_tables();
            }
            DbPayload::ConnectFailed { error } => {
                self.connect.set_error(error);
            }
            DbPayload::TablesLoaded { tables } => {
                if let Some(browse) = self.browse.as_mut() {
                    browse.sidebar.set_tables(tables);
                }
            }
            DbPayload::TablesFailed { error } => {
                if let Some(browse) = self.browse.as_mut() {
                    browse.sidebar.set_error(error);
                }
            }
            DbPayload::PageLoaded { result } => {
                let mut reload = false;
                if let Some(browse) = self.browse.as_mut() {
                    if let Content::Table(tv) = &mut browse.content {
                        reload = tv.apply_page(result) == TableAction::Reload;
                    }
                }
                if reload {
                    self.spawn_fetch_page();
                }
            }
            DbPayload::PageFailed { error } => {
                if let Some(browse) = self.browse.as_mut() {
                    if let Content::Table(tv) = &mut browse.content {
                        tv.apply_error(error);
                    }
                }
            }
            DbPayload::CatalogLoaded {
                tables,
                columns_by_table,
            } => {
                if let Some(browse) = self.browse.as_mut() {
                    if let Content::Editor(ed) = &mut browse.content {
                        ed.set_catalog(tables, columns_by_table);
                    }
                }
            }
            DbPayload::CatalogFailed { error: _ } => {
                // Not fatal: completion degrades to keywords only.
            }
            DbPayload::QueryFinished { result, elapsed } => {
                if let Some(browse) = self.browse.as_mut() {
                    if let Content::Editor(ed) = &mut browse.content {
                        ed.apply_result(result, elapsed);
                    }
                }
            }
            DbPayload::QueryFailed { error } => {
                if let Some(browse) = self.browse.as_mut() {
                    if let Content::Editor(ed) = &mut browse.content {
                        ed.apply_error(error);
                    }
                }
            }
        }
    }

    // --- rendering --------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        match self.screen {
            Screen::Connect => self.connect.render(frame, area, &self.theme),
            Screen::Browse => self.draw_browse(frame, area),
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let sidebar_width = self.config.display.sidebar_width;
        let Some(browse) = self.browse.as_mut() else {
            return;
        };

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        render_header(frame, chunks[0], browse, theme);
        Paragraph::new(Line::styled("─".repeat(area.width as usize), theme.dim))
            .render(chunks[1], frame.buffer_mut());
        Paragraph::new(Line::styled("─".repeat(area.width as usize), theme.dim))
            .render(chunks[3], frame.buffer_mut());
        render_footer(frame, chunks[4], browse, theme);

        let body =
            Layout::horizontal([Constraint::Length(sidebar_width), Constraint::Min(1)])
                .split(chunks[2]);

        // Sidebar names carry their schema when no database is pinned.
        let qualify = browse.config.database.is_empty();
        browse.sidebar.render(frame, body[0], theme, qualify);

        let sep_style = if browse.focus == BrowseFocus::Sidebar {
            theme.border_focused
        } else {
            theme.border_unfocused
        };
        let content_block = Block::default()
            .borders(Borders::LEFT)
            .border_style(sep_style);
        let content_area = content_block.inner(body[1]);
        content_block.render(body[1], frame.buffer_mut());

        match &mut browse.content {
            Content::Welcome => {
                let y = content_area.y + content_area.height / 2;
                let msg = "Select a table from the sidebar  ·  [s] Open SQL editor";
                let x = content_area.x
                    + content_area
                        .width
                        .saturating_sub(msg.chars().count() as u16)
                        / 2;
                Paragraph::new(Line::styled(msg, theme.dim)).render(
                    Rect {
                        x,
                        y,
                        width: content_area.width.saturating_sub(x - content_area.x),
                        height: 1,
                    },
                    frame.buffer_mut(),
                );
            }
            Content::Table(tv) => tv.render(frame, content_area, theme),
            Content::Editor(ed) => ed.render(frame, content_area, theme),
        }
    }
}

fn render_header(frame: &mut Frame, area: Rect, browse: &BrowseScreen, theme: &Theme) {
    let config = &browse.config;
    let db_name = if config.database.is_empty() {
        config.effective_host().to_string()
    } else {
        config.database.clone()
    };

    let left = format!(
        "  ●  {} {} @ {}",
        config.driver.icon(),
        db_name,
        config.effective_host()
    );
    let right = "[s] SQL  [Tab] Switch  [Esc] Disconnect ";
    let gap = (area.width as usize)
        .saturating_sub(" bsql".len() + left.chars().count() + 2 + right.chars().count())
        .max(1);

    let line = Line::from(vec![
        Span::styled(" bsql", theme.accent),
        Span::styled(left, theme.muted),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, theme.muted),
    ]);
    Paragraph::new(line).render(area, frame.buffer_mut());
}

fn render_footer(frame: &mut Frame, area: Rect, browse: &BrowseScreen, theme: &Theme) {
    let hints = if browse.focus == BrowseFocus::Sidebar {
        if browse.sidebar.filtering {
            "type to filter  ·  ↑↓ navigate  ·  Enter open  ·  Esc clear filter"
        } else {
            "↑↓ navigate  ·  Enter open  ·  / filter  ·  s SQL  ·  Tab switch  ·  Esc disconnect"
        }
    } else {
        match &browse.content {
            Content::Welcome => "Tab sidebar",
            Content::Table(_) => {
                "↑↓ rows  ·  ←→ scroll  ·  a/d column  ·  o sort  ·  u clear  ·  n/p page  ·  r refresh  ·  Tab sidebar  ·  Esc close"
            }
            Content::Editor(ed) => {
                if ed.focus == EditorFocus::Edit {
                    "Ctrl+E run  ·  Ctrl+R editor↔results  ·  Tab sidebar  ·  Esc sidebar"
                } else {
                    "↑↓ rows  ·  ←→ scroll  ·  Ctrl+R editor↔results  ·  Tab sidebar  ·  Esc sidebar"
                }
            }
        }
    };
    Paragraph::new(Line::styled(format!(" {hints}"), theme.dim))
        .render(area, frame.buffer_mut());
}

async fn load_catalog(
    db: Arc<dyn Db>,
) -> Result<(Vec<String>, BTreeMap<String, Vec<String>>)> {
    let tables = db.list_tables().await?;
    let columns = db.list_columns().await?;

    let names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
    let mut columns_by_table: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for col in columns {
        columns_by_table
            .entry(col.table.to_lowercase())
            .or_default()
            .push(col.name);
    }
    Ok((names, columns_by_table))
}
