//! Row store — the ordered lines of one file plus their derived data.
//!
//! A `Buffer` owns a `Vec<Row>` and is the only thing allowed to mutate rows.
//! Every editing operation recomputes the touched rows' render bytes and
//! highlight tags before it returns, so readers never see stale derived data.
//!
//! # Design choices
//!
//! - **Bytes, not chars.** Rows are `Vec<u8>` and columns are byte offsets.
//!   The editor does not attempt Unicode-aware widths; a multi-byte character
//!   simply occupies several columns.
//!
//! - **Comment state cascades through a work list.** Reclassifying a row can
//!   open or close a multi-line comment for every row after it. Rather than
//!   recursing, [`Buffer::highlight_from`] walks forward until a row's exit
//!   state stops changing, so a long file costs a loop, never stack depth.
//!
//! - **Out-of-range addresses are ignored.** Editing calls with a row past
//!   the end are no-ops and columns are clamped; nothing here panics on a bad
//!   coordinate or reports it as an error.
//!
//! - **Dirty is a counter.** Each mutation bumps it and a successful save
//!   resets it to zero. Only "zero or not" matters to callers.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::position::Position;
use crate::row::Row;
use crate::syntax::{self, Highlight, Language};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures loading or storing a buffer.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("buffer has no file name")]
    NoFileName,
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// The rows of one file, the active highlighting rules, and save metadata.
///
/// # Coordinate system
///
/// Rows are 0-indexed and columns are raw byte offsets. A row index equal to
/// [`row_count`](Self::row_count) addresses the virtual empty row after the
/// last line: [`insert_char`](Self::insert_char) there appends a new row.
pub struct Buffer {
    rows: Vec<Row>,
    path: Option<PathBuf>,
    language: Option<&'static Language>,
    dirty: usize,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An empty buffer with no file name and no language.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            path: None,
            language: None,
            dirty: 0,
        }
    }

    /// Bulk-load rows, pick a language from `path`, and classify everything.
    ///
    /// The result is clean (not dirty).
    #[must_use]
    pub fn from_rows<I>(rows: I, path: Option<PathBuf>) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let mut row = Row::new(index, raw);
                row.project();
                row
            })
            .collect();

        let mut buffer = Self {
            rows,
            path,
            language: None,
            dirty: 0,
        };
        buffer.select_language();
        buffer
    }

    /// Build an unnamed buffer from text, one row per line.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_rows(split_lines(text.as_bytes()), None)
    }

    /// Load a file.
    ///
    /// Line terminators (`\n`, with any trailing `\r`) are stripped. An empty
    /// file yields a buffer with no rows.
    ///
    /// # Errors
    ///
    /// [`BufferError::Open`] if the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, BufferError> {
        let bytes = fs::read(path).map_err(|source| BufferError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let buffer = Self::from_rows(split_lines(&bytes), Some(path.to_path_buf()));
        info!(
            path = %path.display(),
            rows = buffer.row_count(),
            filetype = buffer.filetype(),
            "opened file"
        );
        Ok(buffer)
    }

    // -- Row access ---------------------------------------------------------

    /// Number of real rows (the virtual row is not counted).
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn row(&self, at: usize) -> Option<&Row> {
        self.rows.get(at)
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Raw length of row `at`, or 0 for the virtual row and beyond.
    #[inline]
    #[must_use]
    pub fn row_len(&self, at: usize) -> usize {
        self.rows.get(at).map_or(0, Row::len)
    }

    /// Every row's raw bytes, each followed by `\n` (the last one included).
    #[must_use]
    pub fn to_text(&self) -> Vec<u8> {
        let size = self.rows.iter().map(|row| row.len() + 1).sum();
        let mut text = Vec::with_capacity(size);
        for row in &self.rows {
            text.extend_from_slice(row.raw());
            text.push(b'\n');
        }
        text
    }

    // -- Row-level editing --------------------------------------------------

    /// Insert a row holding `raw` at index `at`.
    ///
    /// No-op unless `at <= row_count()`.
    pub fn insert_row(&mut self, at: usize, raw: Vec<u8>) {
        if at > self.rows.len() {
            return;
        }

        let mut row = Row::new(at, raw);
        row.project();
        self.rows.insert(at, row);
        self.renumber(at + 1);
        // The row after the new one has a new predecessor.
        self.highlight_from(at, at + 1);
        self.dirty += 1;
    }

    /// Remove row `at`. No-op if out of bounds.
    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }

        self.rows.remove(at);
        self.renumber(at);
        self.highlight_from(at, at);
        self.dirty += 1;
    }

    /// Split row `row` at raw column `col` (clamped): the tail moves to a new
    /// row directly below. No-op past the last row.
    pub fn split_row(&mut self, row: usize, col: usize) {
        let Some(current) = self.rows.get_mut(row) else {
            return;
        };

        let col = col.min(current.len());
        let tail = current.raw_mut().split_off(col);
        current.project();

        let mut next = Row::new(row + 1, tail);
        next.project();
        self.rows.insert(row + 1, next);
        self.renumber(row + 2);
        self.highlight_from(row, row + 2);
        self.dirty += 1;
    }

    /// Append `bytes` to the end of row `row`. No-op past the last row.
    pub fn append_string(&mut self, row: usize, bytes: &[u8]) {
        let Some(current) = self.rows.get_mut(row) else {
            return;
        };
        current.raw_mut().extend_from_slice(bytes);
        self.update_row(row);
        self.dirty += 1;
    }

    // -- Character-level editing --------------------------------------------

    /// Insert `byte` at (`row`, `col`).
    ///
    /// On the virtual row an empty row is appended first. `col` is clamped to
    /// the row length. Rows further past the end are ignored.
    pub fn insert_char(&mut self, row: usize, col: usize, byte: u8) {
        if row > self.rows.len() {
            return;
        }
        if row == self.rows.len() {
            self.insert_row(row, Vec::new());
        }

        let raw = self.rows[row].raw_mut();
        let col = col.min(raw.len());
        raw.insert(col, byte);
        self.update_row(row);
        self.dirty += 1;
    }

    /// Backspace at (`row`, `col`).
    ///
    /// With `col > 0` the byte before `col` is removed. At column 0 the row
    /// is merged onto the end of the previous one. Returns where the cursor
    /// belongs afterwards, or `None` when nothing happened (virtual row, or
    /// the very start of the buffer).
    pub fn delete_char(&mut self, row: usize, col: usize) -> Option<Position> {
        let len = self.rows.get(row)?.len();

        if col > 0 {
            let prev_col = col.min(len).checked_sub(1)?;
            self.rows[row].raw_mut().remove(prev_col);
            self.update_row(row);
            self.dirty += 1;
            return Some(Position::new(row, prev_col));
        }

        let prev = row.checked_sub(1)?;
        let join = self.rows[prev].len();
        let moved = self.rows[row].raw().to_vec();
        self.append_string(prev, &moved);
        self.delete_row(row);
        Some(Position::new(prev, join))
    }

    // -- Highlighting -------------------------------------------------------

    /// The active rule set, if any.
    #[inline]
    #[must_use]
    pub const fn language(&self) -> Option<&'static Language> {
        self.language
    }

    /// Filetype name for display, `None` for plain text.
    #[inline]
    #[must_use]
    pub fn filetype(&self) -> Option<&'static str> {
        self.language.map(|lang| lang.name)
    }

    /// Pick the rule set from the current path and reclassify every row.
    pub fn select_language(&mut self) {
        self.language = self
            .path
            .as_deref()
            .and_then(|path| syntax::select_language(&path.to_string_lossy()));
        debug!(filetype = self.filetype(), "selected language");

        let mut open = false;
        for row in &mut self.rows {
            row.classify(self.language, open);
            open = row.carries_open_comment();
        }
    }

    /// Paint `tag` over `len` rendered bytes of row `row` from `start`.
    ///
    /// Returns the row's highlight array from before the overlay, or `None`
    /// if the row does not exist.
    pub fn overlay(
        &mut self,
        row: usize,
        start: usize,
        len: usize,
        tag: Highlight,
    ) -> Option<Vec<Highlight>> {
        self.rows
            .get_mut(row)
            .map(|r| r.overlay(start, len, tag))
    }

    /// Undo an [`overlay`](Self::overlay). Ignored if the row is gone or its
    /// rendered length changed since.
    pub fn restore_highlight(&mut self, row: usize, saved: Vec<Highlight>) {
        if let Some(r) = self.rows.get_mut(row) {
            r.restore_highlight(saved);
        }
    }

    /// Recompute row `at` after its raw bytes changed.
    fn update_row(&mut self, at: usize) {
        if let Some(row) = self.rows.get_mut(at) {
            row.project();
            self.highlight_from(at, at);
        }
    }

    /// Reclassify from row `at` onward.
    ///
    /// Rows up to `through` are always redone; past that the walk continues
    /// only while each row's exit comment state differs from before.
    fn highlight_from(&mut self, at: usize, through: usize) {
        let mut i = at;
        while i < self.rows.len() {
            let starts_in_comment = i
                .checked_sub(1)
                .is_some_and(|prev| self.rows[prev].carries_open_comment());
            let changed = self.rows[i].classify(self.language, starts_in_comment);
            if !changed && i >= through {
                break;
            }
            i += 1;
        }
    }

    fn renumber(&mut self, from: usize) {
        for (index, row) in self.rows.iter_mut().enumerate().skip(from) {
            row.set_index(index);
        }
    }

    // -- Metadata -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set the file name. The language is re-selected on the next save.
    #[inline]
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// True if anything changed since load or the last save.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty > 0
    }

    // -- File I/O -----------------------------------------------------------

    /// Write [`to_text`](Self::to_text) to the buffer's path.
    ///
    /// Returns the number of bytes written. On success the buffer becomes
    /// clean and the language is re-selected from the (possibly new) name.
    ///
    /// # Errors
    ///
    /// [`BufferError::NoFileName`] without a path, [`BufferError::Save`] if
    /// the write fails. The buffer is left untouched in both cases.
    pub fn save(&mut self) -> Result<usize, BufferError> {
        let path = self.path.clone().ok_or(BufferError::NoFileName)?;
        let text = self.to_text();

        fs::write(&path, &text).map_err(|source| BufferError::Save {
            path: path.clone(),
            source,
        })?;

        self.dirty = 0;
        self.select_language();
        info!(path = %path.display(), bytes = text.len(), "saved file");
        Ok(text.len())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("rows", &self.rows.len())
            .field("dirty", &self.dirty)
            .field("filetype", &self.filetype())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split file content into rows, dropping `\n` and any `\r` before it.
///
/// A final newline does not start another row; a missing one does not drop
/// the last line.
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|&b| b == b'\n')
        .map(|line| {
            let end = line.iter().rposition(|&b| b != b'\r').map_or(0, |i| i + 1);
            line[..end].to_vec()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
