//! Editing session — one buffer, one cursor, one viewport.
//!
//! The `Session` is the state every key handler works on. The binary owns
//! exactly one and passes it by `&mut` to whatever needs it (edit commands,
//! the line prompt, the search handler); nothing here is global.
//!
//! # Cursor model
//!
//! The cursor is a [`Position`] in raw coordinates. Its line may equal the
//! row count (the virtual empty row after the last line), and its column is
//! always within `0..=row_len`. Motions keep both true; edits move the cursor
//! to wherever the buffer says the text went.
//!
//! The render column is never stored. [`Session::cursor_render_position`]
//! derives it from the current row on every call, so it cannot go stale
//! after an edit.

use crate::buffer::Buffer;
use crate::position::Position;
use crate::syntax::Highlight;
use crate::view::Viewport;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A text-changing command applied at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// Insert one byte and advance.
    InsertChar(u8),
    /// Backspace: delete before the cursor, merging rows at column 0.
    DeleteChar,
    /// Delete the byte under the cursor, pulling the next row up at the end
    /// of a row.
    DeleteForward,
    /// Break the row at the cursor.
    InsertNewline,
    /// Append the current row to the previous one, wherever the cursor is.
    JoinPreviousLine,
}

/// A cursor movement that does not change text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Cursor and scroll position, captured so a cancelled search can put them
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    cursor: Position,
    viewport: Viewport,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The buffer being edited plus where the user is looking at it.
#[derive(Debug)]
pub struct Session {
    buffer: Buffer,
    cursor: Position,
    viewport: Viewport,
}

impl Session {
    /// A session at the top of `buffer` with a `width` x `height` text area.
    #[must_use]
    pub const fn new(buffer: Buffer, width: usize, height: usize) -> Self {
        Self {
            buffer,
            cursor: Position::ZERO,
            viewport: Viewport::new(width, height),
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    pub const fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Position {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Cursor line and render column.
    #[must_use]
    pub fn cursor_render_position(&self) -> (usize, usize) {
        let rx = self
            .buffer
            .row(self.cursor.line)
            .map_or(0, |row| row.raw_to_render(self.cursor.col));
        (self.cursor.line, rx)
    }

    /// Rendered bytes and highlight tags of up to `count` rows from `offset`.
    ///
    /// Yields fewer items near the end of the buffer and nothing past it.
    pub fn visible_rows(
        &self,
        offset: usize,
        count: usize,
    ) -> impl Iterator<Item = (&[u8], &[Highlight])> + '_ {
        self.buffer
            .rows()
            .iter()
            .skip(offset)
            .take(count)
            .map(|row| (row.render(), row.highlight()))
    }

    // -- Editing ------------------------------------------------------------

    /// Apply `event` at the cursor, then keep the cursor on screen.
    pub fn handle_edit(&mut self, event: EditEvent) {
        let Position { line, col } = self.cursor;

        match event {
            EditEvent::InsertChar(byte) => {
                let col = col.min(self.buffer.row_len(line));
                self.buffer.insert_char(line, col, byte);
                self.cursor = Position::new(line, col + 1);
            }
            EditEvent::DeleteChar => {
                if let Some(pos) = self.buffer.delete_char(line, col) {
                    self.cursor = pos;
                }
            }
            EditEvent::DeleteForward => {
                if col < self.buffer.row_len(line) {
                    self.buffer.delete_char(line, col + 1);
                } else if line + 1 < self.buffer.row_count() {
                    self.buffer.delete_char(line + 1, 0);
                }
            }
            EditEvent::InsertNewline => {
                if col == 0 {
                    self.buffer.insert_row(line, Vec::new());
                } else {
                    self.buffer.split_row(line, col);
                }
                self.cursor = Position::new(line + 1, 0);
            }
            EditEvent::JoinPreviousLine => {
                if line < self.buffer.row_count() {
                    if let Some(pos) = self.buffer.delete_char(line, 0) {
                        self.cursor = pos;
                    }
                }
            }
        }

        self.scroll();
    }

    // -- Motion -------------------------------------------------------------

    /// Move the cursor, snap its column to the new row, and scroll.
    pub fn move_cursor(&mut self, motion: Motion) {
        let rows = self.buffer.row_count();
        let Position { mut line, mut col } = self.cursor;

        match motion {
            Motion::Left => {
                if col > 0 {
                    col -= 1;
                } else if line > 0 {
                    line -= 1;
                    col = self.buffer.row_len(line);
                }
            }
            Motion::Right => {
                if line < rows {
                    if col < self.buffer.row_len(line) {
                        col += 1;
                    } else {
                        line += 1;
                        col = 0;
                    }
                }
            }
            Motion::Up => line = line.saturating_sub(1),
            Motion::Down => {
                if line < rows {
                    line += 1;
                }
            }
            Motion::Home => col = 0,
            Motion::End => col = self.buffer.row_len(line),
            Motion::PageUp => {
                line = self
                    .viewport
                    .top_line()
                    .saturating_sub(self.viewport.height());
            }
            Motion::PageDown => {
                let bottom = self.viewport.bottom_line().min(rows);
                line = (bottom + self.viewport.height()).min(rows);
            }
        }

        self.cursor = Position::new(line, col.min(self.buffer.row_len(line)));
        self.scroll();
    }

    /// Put the cursor at `pos` (clamped) and scroll to it.
    pub fn set_cursor(&mut self, pos: Position) {
        let line = pos.line.min(self.buffer.row_count());
        self.cursor = Position::new(line, pos.col.min(self.buffer.row_len(line)));
        self.scroll();
    }

    /// Move to `pos` and make its line the first one on screen.
    pub fn jump_to_top(&mut self, pos: Position) {
        let line = pos.line.min(self.buffer.row_count());
        self.viewport.show_at_top(line);
        self.set_cursor(Position::new(line, pos.col));
    }

    // -- Viewport -----------------------------------------------------------

    /// Slide the viewport so the cursor is visible.
    pub fn scroll(&mut self) {
        let (line, rx) = self.cursor_render_position();
        self.viewport.scroll(line, rx);
    }

    /// Set the text-area size, e.g. after a terminal resize.
    pub fn set_screen_size(&mut self, width: usize, height: usize) {
        self.viewport.set_size(width, height);
        self.scroll();
    }

    #[must_use]
    pub const fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            viewport: self.viewport,
        }
    }

    /// Put back a [`snapshot`](Self::snapshot), keeping the current screen
    /// size.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let (width, height) = (self.viewport.width(), self.viewport.height());
        self.viewport = snapshot.viewport;
        self.viewport.set_size(width, height);
        self.set_cursor(snapshot.cursor);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> Session {
        Session::new(Buffer::from_text(text), 20, 5)
    }

    fn lines(s: &Session) -> Vec<String> {
        s.buffer()
            .rows()
            .iter()
            .map(|row| String::from_utf8_lossy(row.raw()).into_owned())
            .collect()
    }

    // -- Virtual row --------------------------------------------------------

    #[test]
    fn typing_into_empty_buffer_appends_row() {
        let mut s = session("");
        s.handle_edit(EditEvent::InsertChar(b'h'));
        s.handle_edit(EditEvent::InsertChar(b'i'));
        assert_eq!(lines(&s), vec!["hi"]);
        assert_eq!(s.cursor(), Position::new(0, 2));
    }

    #[test]
    fn typing_on_virtual_row_after_last_line() {
        let mut s = session("last");
        s.move_cursor(Motion::Down);
        assert_eq!(s.cursor(), Position::new(1, 0));
        s.handle_edit(EditEvent::InsertChar(b'x'));
        assert_eq!(lines(&s), vec!["last", "x"]);
        assert_eq!(s.cursor(), Position::new(1, 1));
    }

    #[test]
    fn virtual_row_renders_at_column_zero() {
        let mut s = session("\tabc");
        s.move_cursor(Motion::Down);
        assert_eq!(s.cursor_render_position(), (1, 0));
        s.move_cursor(Motion::End);
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn backspace_on_virtual_row_is_noop() {
        let mut s = session("abc");
        s.move_cursor(Motion::Down);
        s.handle_edit(EditEvent::DeleteChar);
        assert_eq!(lines(&s), vec!["abc"]);
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn newline_on_virtual_row_appends_empty_row() {
        let mut s = session("abc");
        s.move_cursor(Motion::Down);
        s.handle_edit(EditEvent::InsertNewline);
        assert_eq!(lines(&s), vec!["abc", ""]);
        assert_eq!(s.cursor(), Position::new(2, 0));
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn backspace_at_column_zero_joins_rows() {
        let mut s = session("abc\ndef");
        s.set_cursor(Position::new(1, 0));
        s.handle_edit(EditEvent::DeleteChar);
        assert_eq!(lines(&s), vec!["abcdef"]);
        assert_eq!(s.cursor(), Position::new(0, 3));
    }

    #[test]
    fn backspace_at_buffer_start_is_noop() {
        let mut s = session("abc");
        s.handle_edit(EditEvent::DeleteChar);
        assert_eq!(lines(&s), vec!["abc"]);
        assert!(!s.buffer().is_dirty());
    }

    #[test]
    fn delete_forward_in_row() {
        let mut s = session("abc");
        s.set_cursor(Position::new(0, 1));
        s.handle_edit(EditEvent::DeleteForward);
        assert_eq!(lines(&s), vec!["ac"]);
        assert_eq!(s.cursor(), Position::new(0, 1));
    }

    #[test]
    fn delete_forward_at_row_end_pulls_next_row() {
        let mut s = session("ab\ncd");
        s.set_cursor(Position::new(0, 2));
        s.handle_edit(EditEvent::DeleteForward);
        assert_eq!(lines(&s), vec!["abcd"]);
        assert_eq!(s.cursor(), Position::new(0, 2));
    }

    #[test]
    fn delete_forward_at_buffer_end_is_noop() {
        let mut s = session("ab");
        s.set_cursor(Position::new(0, 2));
        s.handle_edit(EditEvent::DeleteForward);
        assert_eq!(lines(&s), vec!["ab"]);
    }

    #[test]
    fn newline_splits_at_cursor() {
        let mut s = session("hello");
        s.set_cursor(Position::new(0, 2));
        s.handle_edit(EditEvent::InsertNewline);
        assert_eq!(lines(&s), vec!["he", "llo"]);
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn newline_at_column_zero_opens_row_above() {
        let mut s = session("hello");
        s.handle_edit(EditEvent::InsertNewline);
        assert_eq!(lines(&s), vec!["", "hello"]);
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn join_previous_line_from_mid_row() {
        let mut s = session("one\ntwo");
        s.set_cursor(Position::new(1, 2));
        s.handle_edit(EditEvent::JoinPreviousLine);
        assert_eq!(lines(&s), vec!["onetwo"]);
        assert_eq!(s.cursor(), Position::new(0, 3));
    }

    #[test]
    fn join_previous_line_on_first_row_is_noop() {
        let mut s = session("one\ntwo");
        s.handle_edit(EditEvent::JoinPreviousLine);
        assert_eq!(lines(&s), vec!["one", "two"]);
    }

    // -- Motion -------------------------------------------------------------

    #[test]
    fn left_at_column_zero_wraps_to_previous_row_end() {
        let mut s = session("abc\nd");
        s.set_cursor(Position::new(1, 0));
        s.move_cursor(Motion::Left);
        assert_eq!(s.cursor(), Position::new(0, 3));
        s.move_cursor(Motion::Home);
        s.move_cursor(Motion::Left);
        assert_eq!(s.cursor(), Position::ZERO);
    }

    #[test]
    fn right_at_row_end_wraps_to_next_row_start() {
        let mut s = session("ab\ncd");
        s.move_cursor(Motion::End);
        s.move_cursor(Motion::Right);
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn right_stops_on_virtual_row() {
        let mut s = session("a");
        for _ in 0..5 {
            s.move_cursor(Motion::Right);
        }
        assert_eq!(s.cursor(), Position::new(1, 0));
    }

    #[test]
    fn vertical_motion_snaps_column() {
        let mut s = session("long line\nab\nlong line");
        s.set_cursor(Position::new(0, 8));
        s.move_cursor(Motion::Down);
        assert_eq!(s.cursor(), Position::new(1, 2));
        s.move_cursor(Motion::Down);
        assert_eq!(s.cursor(), Position::new(2, 2));
        s.move_cursor(Motion::Up);
        s.move_cursor(Motion::Up);
        s.move_cursor(Motion::Up);
        assert_eq!(s.cursor(), Position::new(0, 2));
    }

    #[test]
    fn down_stops_at_virtual_row() {
        let mut s = session("a\nb");
        for _ in 0..5 {
            s.move_cursor(Motion::Down);
        }
        assert_eq!(s.cursor().line, 2);
    }

    #[test]
    fn page_down_then_up() {
        let text: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let mut s = session(&text.join("\n"));

        s.move_cursor(Motion::PageDown);
        assert_eq!(s.cursor().line, 9);
        assert_eq!(s.viewport().top_line(), 5);

        s.move_cursor(Motion::PageDown);
        assert_eq!(s.cursor().line, 14);

        s.move_cursor(Motion::PageUp);
        assert_eq!(s.cursor().line, 5);
        assert_eq!(s.viewport().top_line(), 5);
    }

    #[test]
    fn page_down_stops_at_virtual_row() {
        let mut s = session("a\nb");
        s.move_cursor(Motion::PageDown);
        assert_eq!(s.cursor().line, 2);
    }

    // -- Rendering view -----------------------------------------------------

    #[test]
    fn cursor_render_position_expands_tabs() {
        let mut s = session("\tx");
        s.move_cursor(Motion::End);
        assert_eq!(s.cursor(), Position::new(0, 2));
        assert_eq!(s.cursor_render_position(), (0, 9));
    }

    #[test]
    fn horizontal_scroll_follows_render_column() {
        let mut s = session(&"x".repeat(40));
        s.move_cursor(Motion::End);
        assert_eq!(s.viewport().left_col(), 21);
        s.move_cursor(Motion::Home);
        assert_eq!(s.viewport().left_col(), 0);
    }

    #[test]
    fn visible_rows_clips_to_buffer() {
        let s = session("a\tb\nc\nd");
        let rows: Vec<_> = s.visible_rows(1, 10).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b"c");
        assert_eq!(rows[0].1.len(), 1);
        assert_eq!(s.visible_rows(3, 5).count(), 0);
        let (render, hl) = s.visible_rows(0, 1).next().unwrap();
        assert_eq!(render.len(), 9);
        assert_eq!(hl.len(), 9);
    }

    // -- Snapshots ----------------------------------------------------------

    #[test]
    fn snapshot_restores_cursor_and_scroll() {
        let text: Vec<String> = (0..30).map(|i| format!("row {i}")).collect();
        let mut s = session(&text.join("\n"));
        s.set_cursor(Position::new(12, 3));
        let snap = s.snapshot();

        s.jump_to_top(Position::new(25, 0));
        assert_eq!(s.viewport().top_line(), 25);

        s.restore(snap);
        assert_eq!(s.cursor(), Position::new(12, 3));
        assert_eq!(s.viewport().top_line(), 8);
    }

    #[test]
    fn set_cursor_clamps() {
        let mut s = session("ab\ncd");
        s.set_cursor(Position::new(9, 9));
        assert_eq!(s.cursor(), Position::new(2, 0));
        s.set_cursor(Position::new(0, 9));
        assert_eq!(s.cursor(), Position::new(0, 2));
    }
}
