mod completion;
mod connect;
mod editor;
mod grid;
mod sidebar;
mod table;
mod theme;

pub use completion::{popup_lines, word_context, CompletionState, Suggestion, SuggestionKind, WordContext};
pub use connect::{ConnectAction, ConnectScreen};
pub use editor::{EditorAction, EditorFocus, EditorView};
pub use grid::{DataGrid, GridModel, GridState};
pub use sidebar::{Sidebar, SidebarAction};
pub use table::{TableAction, TableView};
pub use theme::Theme;
