//! Search — incremental, directional, wrapping search over rendered rows.
//!
//! A [`SearchSession`] is the [`PromptHandler`] behind the find prompt. Each
//! key the user types re-runs the search; arrow keys step to the next or
//! previous match without changing the query.
//!
//! # Search flow
//!
//! 1. The editor snapshots cursor and scroll, then opens a
//!    [`Prompt`](crate::prompt::Prompt) with a fresh `SearchSession`
//! 2. Typing or deleting restarts the search from the top of the buffer
//! 3. Down/Right find the next match, Up/Left the previous one, wrapping
//!    around either end
//! 4. Enter keeps the cursor on the match; Escape lets the editor restore
//!    the snapshot
//!
//! # Match highlighting
//!
//! The matched span is painted with [`Highlight::Match`] directly in the
//! row's highlight array. The array from before the overlay is kept and put
//! back on the next key, so the classifier's output is never lost.
//!
//! Matching is a literal byte comparison against the **rendered** row (tabs
//! expanded); the match offset is mapped back to a raw column for the cursor.

use tracing::debug;

use crate::position::Position;
use crate::prompt::{PromptHandler, PromptKey};
use crate::session::Session;
use crate::syntax::Highlight;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// SearchSession
// ---------------------------------------------------------------------------

/// State carried between keystrokes of one find prompt.
#[derive(Debug, Default)]
pub struct SearchSession {
    /// Row of the current match.
    last_match: Option<usize>,
    direction: SearchDirection,
    /// Row overlaid for the current match and its highlight from before.
    saved: Option<(usize, Vec<Highlight>)>,
}

impl SearchSession {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_match: None,
            direction: SearchDirection::Forward,
            saved: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    #[inline]
    #[must_use]
    pub const fn direction(&self) -> SearchDirection {
        self.direction
    }

    /// React to `key` with `query` as typed so far.
    ///
    /// Restores any previous overlay first, then either ends the session
    /// (Enter, Escape), steps (arrows), or restarts (anything else). On a
    /// hit the cursor moves to the match, its row goes to the top of the
    /// screen, and the span is highlighted. A miss leaves the cursor alone.
    pub fn handle_key(&mut self, session: &mut Session, query: &str, key: PromptKey) {
        if let Some((row, saved)) = self.saved.take() {
            session.buffer_mut().restore_highlight(row, saved);
        }

        match key {
            PromptKey::Enter | PromptKey::Escape => {
                self.reset();
                return;
            }
            PromptKey::Down | PromptKey::Right => self.direction = SearchDirection::Forward,
            PromptKey::Up | PromptKey::Left => self.direction = SearchDirection::Backward,
            _ => self.reset(),
        }
        if self.last_match.is_none() {
            self.direction = SearchDirection::Forward;
        }

        if query.is_empty() {
            return;
        }

        let rows = session.buffer().row_count();
        let mut current = self.last_match;
        for _ in 0..rows {
            let next = match (current, self.direction) {
                (None, _) => 0,
                (Some(row), SearchDirection::Forward) => (row + 1) % rows,
                (Some(row), SearchDirection::Backward) => row.checked_sub(1).unwrap_or(rows - 1),
            };
            current = Some(next);

            let Some(row) = session.buffer().row(next) else {
                break;
            };
            let Some(rx) = find_bytes(row.render(), query.as_bytes()) else {
                continue;
            };

            let col = row.render_to_raw(rx);
            self.last_match = Some(next);
            session.jump_to_top(Position::new(next, col));
            self.saved = session
                .buffer_mut()
                .overlay(next, rx, query.len(), Highlight::Match)
                .map(|saved| (next, saved));
            debug!(row = next, col, direction = ?self.direction, "search hit");
            return;
        }
    }

    const fn reset(&mut self) {
        self.last_match = None;
        self.direction = SearchDirection::Forward;
    }
}

impl PromptHandler for SearchSession {
    fn on_key(&mut self, session: &mut Session, input: &str, key: PromptKey) {
        self.handle_key(session, input, key);
    }
}

/// Offset of the first occurrence of `needle` in `haystack`.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
