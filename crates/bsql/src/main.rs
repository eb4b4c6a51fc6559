use std::env;
use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use bsql::app::App;
use bsql::config;

fn print_version() {
    println!("bsql {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("bsql - a keyboard-first terminal browser for Postgres and MySQL");
    eprintln!();
    eprintln!("Usage: bsql [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help     Print this help message");
    eprintln!("  -V, --version  Print version information");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file:  {}", path.display());
    }
    if let Some(path) = config::history_path() {
        eprintln!("  Connections:  {}", path.display());
    }
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Connect   ↑↓ fields, Tab driver/history, Enter connect");
    eprintln!("  Sidebar   / filter, Enter open table, s SQL editor, Esc disconnect");
    eprintln!("  Table     n/p page, o sort, u clear sort, r refresh");
    eprintln!("  Editor    Ctrl+E run, Ctrl+R editor<->results, Tab accept completion");
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }
    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    // Load configuration from ~/.config/bsql/config.toml
    let cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        config::Config::default()
    });

    let rt = Runtime::new().context("failed to initialize tokio runtime")?;
    let (db_events_tx, db_events_rx) = mpsc::unbounded_channel();

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(rt.handle().clone(), db_events_tx, db_events_rx, cfg);
    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;

    res
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
