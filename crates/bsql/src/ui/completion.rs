//! Context-aware SQL completion.
//!
//! The engine is fed the word under the cursor (plus an optional `table.`
//! qualifier) and ranks candidates from three pools — keywords, table names,
//! and column names — with fuzzy matching. It holds no reference to the
//! editor; the editor asks for the accepted replacement and applies it to its
//! own buffer.

use std::collections::BTreeMap;

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use ratatui::text::Line;

use super::Theme;

/// Completion dictionary. Matched case-insensitively; rendered upper- or
/// lower-case depending on the keyword-case toggle.
const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "ON",
    "GROUP", "ORDER", "BY", "HAVING", "LIMIT", "OFFSET", "INSERT", "INTO", "VALUES", "UPDATE",
    "SET", "DELETE", "CREATE", "TABLE", "DROP", "ALTER", "ADD", "COLUMN", "INDEX", "PRIMARY",
    "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "NOT", "NULL", "AND", "OR", "IN", "IS", "LIKE",
    "ILIKE", "BETWEEN", "EXISTS", "AS", "DISTINCT", "COUNT", "SUM", "AVG", "MAX", "MIN", "CASE",
    "WHEN", "THEN", "ELSE", "END", "WITH", "UNION", "ALL", "INTERSECT", "EXCEPT", "RETURNING",
    "COALESCE", "NULLIF", "CAST", "OVER", "PARTITION", "WINDOW", "ROW_NUMBER", "RANK",
    "DENSE_RANK", "TRUE", "FALSE",
];

/// Characters that end the word being completed.
const WORD_DELIMITERS: &[char] = &[' ', '\t', ',', ';', '(', ')', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Keyword,
    Table,
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
}

/// The partial token at the cursor, split on a `table.column` separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordContext {
    pub word: String,
    pub table: Option<String>,
}

/// Scan back from the cursor to the nearest delimiter and split the token on
/// the first `.` if present. `col` is a character offset into `line`.
pub fn word_context(line: &str, col: usize) -> WordContext {
    let before: Vec<char> = line.chars().take(col).collect();
    let start = before
        .iter()
        .rposition(|c| WORD_DELIMITERS.contains(c))
        .map(|i| i + 1)
        .unwrap_or(0);
    let token: String = before[start..].iter().collect();

    match token.split_once('.') {
        Some((table, word)) => WordContext {
            word: word.to_string(),
            table: Some(table.to_string()),
        },
        None => WordContext {
            word: token,
            table: None,
        },
    }
}

/// Suggestion list, selection, and the text span an acceptance replaces.
/// Fully recomputed by [`refresh`](Self::refresh) on every buffer edit.
pub struct CompletionState {
    items: Vec<Suggestion>,
    pub selected: usize,
    pub active: bool,
    /// The exact text to replace on acceptance (`word` or `table.word`).
    prefix: String,
    pub lowercase_keywords: bool,
}

impl CompletionState {
    pub fn new(lowercase_keywords: bool) -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            active: false,
            prefix: String::new(),
            lowercase_keywords,
        }
    }

    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    /// Number of characters the accepted suggestion replaces.
    pub fn prefix_chars(&self) -> usize {
        self.prefix.chars().count()
    }

    pub fn refresh(
        &mut self,
        ctx: &WordContext,
        tables: &[String],
        columns_by_table: &BTreeMap<String, Vec<String>>,
    ) {
        if let Some(table) = &ctx.table {
            self.prefix = format!("{}.{}", table, ctx.word);

            // Unknown qualifier: nothing to offer.
            let Some(cols) = columns_by_table.get(&table.to_lowercase()) else {
                self.deactivate();
                return;
            };

            let matched: Vec<String> = if ctx.word.is_empty() {
                cols.clone()
            } else {
                fuzzy_rank(&ctx.word, cols.iter().cloned())
            };

            self.items = matched
                .into_iter()
                .map(|col| Suggestion {
                    text: format!("{table}.{col}"),
                    kind: SuggestionKind::Column,
                })
                .collect();
            self.finish_refresh();
            return;
        }

        self.prefix = ctx.word.clone();
        if ctx.word.is_empty() {
            self.deactivate();
            return;
        }

        let lowercase = self.lowercase_keywords;
        let keywords = fuzzy_rank(&ctx.word, SQL_KEYWORDS.iter().map(|kw| kw.to_string()))
            .into_iter()
            .map(move |kw| Suggestion {
                text: if lowercase { kw.to_lowercase() } else { kw },
                kind: SuggestionKind::Keyword,
            });

        let table_matches = fuzzy_rank(&ctx.word, tables.iter().cloned())
            .into_iter()
            .map(|t| Suggestion {
                text: t,
                kind: SuggestionKind::Table,
            });

        // Column pool deduplicated across tables, catalog order preserved.
        let mut seen = Vec::new();
        let mut all_columns = Vec::new();
        for cols in columns_by_table.values() {
            for col in cols {
                if !seen.contains(col) {
                    seen.push(col.clone());
                    all_columns.push(col.clone());
                }
            }
        }
        let column_matches = fuzzy_rank(&ctx.word, all_columns.into_iter())
            .into_iter()
            .map(|col| Suggestion {
                text: col,
                kind: SuggestionKind::Column,
            });

        self.items = keywords.chain(table_matches).chain(column_matches).collect();
        self.finish_refresh();
    }

    fn finish_refresh(&mut self) {
        self.active = !self.items.is_empty();
        if self.selected >= self.items.len() {
            self.selected = 0;
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.items.clear();
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.items.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.items.len() - 1);
        }
    }

    pub fn current(&self) -> Option<&Suggestion> {
        if !self.active {
            return None;
        }
        self.items.get(self.selected)
    }

    /// Replacement for the current selection: the text to insert (keywords
    /// get exactly one trailing space) and the character count to delete
    /// before the cursor.
    pub fn accepted(&self) -> Option<(String, usize)> {
        let item = self.current()?;
        let mut text = item.text.clone();
        if item.kind == SuggestionKind::Keyword {
            text.push(' ');
        }
        Some((text, self.prefix_chars()))
    }

    pub fn dismiss(&mut self) {
        self.active = false;
        self.items.clear();
        self.selected = 0;
        self.prefix.clear();
    }

    pub fn toggle_keyword_case(&mut self) {
        self.lowercase_keywords = !self.lowercase_keywords;
    }
}

/// Rank candidates against a pattern, best match first, non-matches dropped.
/// Ties keep candidate order, so the keyword dictionary stays stable.
fn fuzzy_rank(pattern: &str, candidates: impl Iterator<Item = String>) -> Vec<String> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pat = Pattern::parse(pattern, CaseMatching::Ignore, Normalization::Smart);

    let mut scored: Vec<(u32, String)> = candidates
        .filter_map(|cand| {
            let mut buf = Vec::new();
            let haystack = Utf32Str::new(&cand, &mut buf);
            pat.score(haystack, &mut matcher).map(|score| (score, cand))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, cand)| cand).collect()
}

pub const POPUP_WIDTH: u16 = 30;
pub const POPUP_MAX_ITEMS: usize = 6;

/// Popup body: up to [`POPUP_MAX_ITEMS`] suggestions plus a hint row.
pub fn popup_lines(state: &CompletionState, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let inner = POPUP_WIDTH as usize - 2;

    for (i, item) in state.items.iter().take(POPUP_MAX_ITEMS).enumerate() {
        let mut text = format!(" {}", item.text);
        if text.chars().count() > inner {
            text = text.chars().take(inner).collect();
        }

        let style = if i == state.selected {
            theme.popup_selected
        } else {
            match item.kind {
                SuggestionKind::Keyword => theme.popup_keyword,
                SuggestionKind::Table => theme.popup_table,
                SuggestionKind::Column => theme.popup_column,
            }
        };
        lines.push(Line::styled(text, style));
    }

    let kw_mode = if state.lowercase_keywords {
        "KW:lower"
    } else {
        "KW:UPPER"
    };
    let hint = if state.items.len() > POPUP_MAX_ITEMS {
        format!(
            " +{}  ↑↓ Tab Esc  ^T {}",
            state.items.len() - POPUP_MAX_ITEMS,
            kw_mode
        )
    } else {
        format!(" ↑↓ Tab Esc  ^T {}", kw_mode)
    };
    lines.push(Line::styled(hint, theme.popup_hint));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (Vec<String>, BTreeMap<String, Vec<String>>) {
        let tables = vec!["users".to_string(), "orders".to_string()];
        let mut columns = BTreeMap::new();
        columns.insert(
            "users".to_string(),
            vec!["id".to_string(), "name".to_string(), "email".to_string()],
        );
        columns.insert(
            "orders".to_string(),
            vec!["id".to_string(), "user_id".to_string(), "total".to_string()],
        );
        (tables, columns)
    }

    #[test]
    fn word_context_takes_token_after_last_delimiter() {
        let line = "SELECT * FROM users WHERE us";
        let ctx = word_context(line, line.chars().count());
        assert_eq!(ctx, WordContext { word: "us".to_string(), table: None });
    }

    #[test]
    fn word_context_splits_table_qualifier() {
        let ctx = word_context("u.nam", 5);
        assert_eq!(ctx.word, "nam");
        assert_eq!(ctx.table.as_deref(), Some("u"));
    }

    #[test]
    fn word_context_respects_cursor_position() {
        // Cursor in the middle of the line only sees text before it.
        let ctx = word_context("SELECT name", 6);
        assert_eq!(ctx.word, "SELECT");
        assert_eq!(ctx.table, None);
    }

    #[test]
    fn word_context_delimiters() {
        for line in ["a,wo", "a;wo", "a(wo", "a)wo", "a\two"] {
            let ctx = word_context(line, line.chars().count());
            assert_eq!(ctx.word, "wo", "line {line:?}");
        }
    }

    #[test]
    fn word_context_empty_at_delimiter() {
        let ctx = word_context("SELECT ", 7);
        assert_eq!(ctx.word, "");
        assert_eq!(ctx.table, None);
    }

    #[test]
    fn empty_word_without_qualifier_is_inactive() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(&WordContext::default(), &tables, &columns);
        assert!(!state.active);
        assert!(state.items().is_empty());
    }

    #[test]
    fn keyword_ranked_first_for_sel() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "sel".to_string(), table: None },
            &tables,
            &columns,
        );
        assert!(state.active);
        assert_eq!(state.items()[0].text, "SELECT");
        assert_eq!(state.items()[0].kind, SuggestionKind::Keyword);
    }

    #[test]
    fn pools_come_in_priority_order() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        // "or" matches the OR keyword, the orders table, and no column... but
        // user_id/total have no subsequence o-r; ORDER does.
        state.refresh(
            &WordContext { word: "or".to_string(), table: None },
            &tables,
            &columns,
        );
        let kinds: Vec<SuggestionKind> = state.items().iter().map(|s| s.kind).collect();
        let first_table = kinds.iter().position(|k| *k == SuggestionKind::Table);
        let last_keyword = kinds.iter().rposition(|k| *k == SuggestionKind::Keyword);
        assert!(state.items().iter().any(|s| s.text == "orders"));
        if let (Some(t), Some(k)) = (first_table, last_keyword) {
            assert!(k < t, "keywords precede tables");
        }
    }

    #[test]
    fn qualified_word_offers_that_tables_columns_only() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "nam".to_string(), table: Some("users".to_string()) },
            &tables,
            &columns,
        );
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].text, "users.name");
        assert_eq!(state.items()[0].kind, SuggestionKind::Column);
    }

    #[test]
    fn qualifier_is_matched_case_insensitively() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: String::new(), table: Some("Users".to_string()) },
            &tables,
            &columns,
        );
        // Empty word with a known qualifier lists every column.
        assert_eq!(state.items().len(), 3);
        assert_eq!(state.items()[0].text, "Users.id");
    }

    #[test]
    fn unknown_qualifier_yields_nothing() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "x".to_string(), table: Some("ghost".to_string()) },
            &tables,
            &columns,
        );
        assert!(!state.active);
        assert!(state.items().is_empty());
    }

    #[test]
    fn column_pool_is_deduplicated() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        // "id" appears in both tables; the pool carries it once.
        state.refresh(
            &WordContext { word: "id".to_string(), table: None },
            &tables,
            &columns,
        );
        let ids = state
            .items()
            .iter()
            .filter(|s| s.kind == SuggestionKind::Column && s.text == "id")
            .count();
        assert_eq!(ids, 1);
    }

    #[test]
    fn selection_cycles_and_wraps() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: String::new(), table: Some("users".to_string()) },
            &tables,
            &columns,
        );
        assert_eq!(state.selected, 0);
        state.next();
        state.next();
        assert_eq!(state.selected, 2);
        state.next();
        assert_eq!(state.selected, 0);
        state.prev();
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn selection_resets_when_out_of_bounds() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: String::new(), table: Some("users".to_string()) },
            &tables,
            &columns,
        );
        state.selected = 2;
        // Narrow to a single match; the old index is out of range.
        state.refresh(
            &WordContext { word: "nam".to_string(), table: Some("users".to_string()) },
            &tables,
            &columns,
        );
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn accepted_keyword_gets_one_trailing_space() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "sel".to_string(), table: None },
            &tables,
            &columns,
        );
        let (text, chars) = state.accepted().unwrap();
        assert_eq!(text, "SELECT ");
        assert_eq!(chars, 3);
    }

    #[test]
    fn accepted_column_has_no_trailing_space() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "nam".to_string(), table: Some("u".to_string()) },
            &tables,
            &columns,
        );
        // "u" is not a known table, so nothing to accept.
        assert!(state.accepted().is_none());

        state.refresh(
            &WordContext { word: "nam".to_string(), table: Some("users".to_string()) },
            &tables,
            &columns,
        );
        let (text, chars) = state.accepted().unwrap();
        assert_eq!(text, "users.name");
        assert_eq!(chars, "users.nam".chars().count());
    }

    #[test]
    fn lowercase_toggle_changes_rendering_only() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(true);
        state.refresh(
            &WordContext { word: "sel".to_string(), table: None },
            &tables,
            &columns,
        );
        assert_eq!(state.items()[0].text, "select");
        let (text, _) = state.accepted().unwrap();
        assert_eq!(text, "select ");
    }

    #[test]
    fn dismiss_clears_everything() {
        let (tables, columns) = catalog();
        let mut state = CompletionState::new(false);
        state.refresh(
            &WordContext { word: "sel".to_string(), table: None },
            &tables,
            &columns,
        );
        assert!(state.active);
        state.dismiss();
        assert!(!state.active);
        assert!(state.items().is_empty());
        assert_eq!(state.selected, 0);
    }
}
