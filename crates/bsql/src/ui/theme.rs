//! UI theme and styling.
//!
//! One immutable [`Theme`] is built at startup and passed down by reference;
//! nothing styles itself from globals.

use ratatui::style::{Color, Modifier, Style};

const ACCENT: Color = Color::Rgb(0xff, 0x6f, 0x61);
const MUTED: Color = Color::Rgb(0x8b, 0x94, 0x9e);
const DIM: Color = Color::Rgb(0x30, 0x36, 0x3d);
const TEXT: Color = Color::Rgb(0xe6, 0xed, 0xf3);
const POPUP_BG: Color = Color::Rgb(0x1c, 0x21, 0x28);

/// Application theme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Style,
    pub muted: Style,
    pub dim: Style,
    pub text: Style,
    pub error: Style,
    pub success: Style,
    pub warning: Style,

    // Panel borders
    pub border_focused: Style,
    pub border_unfocused: Style,

    // Results grid
    pub grid_header: Style,
    pub grid_row: Style,
    pub grid_selected: Style,

    // Completion popup
    pub popup_selected: Style,
    pub popup_keyword: Style,
    pub popup_table: Style,
    pub popup_column: Style,
    pub popup_hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            muted: Style::default().fg(MUTED),
            dim: Style::default().fg(DIM),
            text: Style::default().fg(TEXT),
            error: Style::default().fg(Color::Rgb(0xff, 0x55, 0x55)),
            success: Style::default().fg(Color::Rgb(0x3f, 0xb9, 0x50)),
            warning: Style::default().fg(Color::Rgb(0xe3, 0xb3, 0x41)),

            border_focused: Style::default().fg(ACCENT),
            border_unfocused: Style::default().fg(DIM),

            grid_header: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            grid_row: Style::default().fg(TEXT),
            grid_selected: Style::default().bg(ACCENT).fg(Color::Black),

            popup_selected: Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(0x31, 0x6d, 0xca))
                .add_modifier(Modifier::BOLD),
            popup_keyword: Style::default().fg(Color::Rgb(0x6c, 0xb6, 0xff)).bg(POPUP_BG),
            popup_table: Style::default().fg(Color::Rgb(0x57, 0xab, 0x5a)).bg(POPUP_BG),
            popup_column: Style::default().fg(Color::Rgb(0xdc, 0xbd, 0xfb)).bg(POPUP_BG),
            popup_hint: Style::default().fg(Color::Rgb(0x44, 0x4c, 0x56)).bg(POPUP_BG),
        }
    }
}
