//! A single line of text plus everything derived from it.
//!
//! `raw` is the only field the buffer edits. `render` and `highlight` are
//! regenerated from it (and from the predecessor row's comment state), so a
//! row is never observed with stale derived data once a buffer operation
//! returns.

use crate::render;
use crate::syntax::{self, Highlight, Language};

/// One line of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    raw: Vec<u8>,
    render: Vec<u8>,
    highlight: Vec<Highlight>,
    open_comment: bool,
    index: usize,
}

impl Row {
    /// A row at `index` with the given raw bytes and empty derived data.
    ///
    /// The owning buffer projects and classifies it before handing it out.
    pub(crate) fn new(index: usize, raw: Vec<u8>) -> Self {
        Self {
            raw,
            render: Vec::new(),
            highlight: Vec::new(),
            open_comment: false,
            index,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// The editable bytes, without a line terminator.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The bytes as drawn: tabs expanded.
    #[inline]
    #[must_use]
    pub fn render(&self) -> &[u8] {
        &self.render
    }

    /// One highlight tag per rendered byte.
    #[inline]
    #[must_use]
    pub fn highlight(&self) -> &[Highlight] {
        &self.highlight
    }

    /// Whether a multi-line comment is still open at the end of this row.
    #[inline]
    #[must_use]
    pub const fn carries_open_comment(&self) -> bool {
        self.open_comment
    }

    /// This row's position in the buffer.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Raw byte count.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    // -- Coordinates --------------------------------------------------------

    /// Render column of raw column `raw_col`.
    #[inline]
    #[must_use]
    pub fn raw_to_render(&self, raw_col: usize) -> usize {
        render::raw_to_render(&self.raw, raw_col)
    }

    /// Raw column of render column `render_col`.
    #[inline]
    #[must_use]
    pub fn render_to_raw(&self, render_col: usize) -> usize {
        render::render_to_raw(&self.raw, render_col)
    }

    // -- Crate-internal mutation --------------------------------------------

    pub(crate) const fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) const fn raw_mut(&mut self) -> &mut Vec<u8> {
        &mut self.raw
    }

    /// Regenerate `render` from `raw`.
    pub(crate) fn project(&mut self) {
        self.render = render::project(&self.raw);
    }

    /// Reclassify with the predecessor's comment state.
    ///
    /// Returns `true` when this row's own exit comment state changed, which
    /// means the next row must be reclassified too.
    pub(crate) fn classify(&mut self, language: Option<&Language>, starts_in_comment: bool) -> bool {
        let (highlight, open) = syntax::classify(&self.render, language, starts_in_comment);
        self.highlight = highlight;
        let changed = self.open_comment != open;
        self.open_comment = open;
        changed
    }

    /// Overwrite `highlight[start..start + len]` (clamped) with `tag` and
    /// return the previous array.
    pub(crate) fn overlay(&mut self, start: usize, len: usize, tag: Highlight) -> Vec<Highlight> {
        let saved = self.highlight.clone();
        let start = start.min(self.highlight.len());
        let end = start.saturating_add(len).min(self.highlight.len());
        self.highlight[start..end].fill(tag);
        saved
    }

    /// Put back an array taken by [`overlay`](Self::overlay).
    ///
    /// Ignored if its length no longer matches the rendered bytes.
    pub(crate) fn restore_highlight(&mut self, saved: Vec<Highlight>) {
        if saved.len() == self.render.len() {
            self.highlight = saved;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
