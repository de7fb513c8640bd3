//! Viewport — which slice of the buffer is on screen.
//!
//! A `Viewport` holds only scroll offsets and the text-area size. It doesn't
//! own the buffer or the cursor; the session hands it a cursor line and a
//! render column and it slides to keep them inside the window.
//!
//! All offsets are in **render columns** (tabs expanded), because that is
//! what the screen shows.
//!
//! ```text
//!             left_col
//!                │◀──────── width ────────▶│
//!   top_line ─▶ ┌─────────────────────────┐
//!               │                         │
//!               │      visible text       │ height
//!               │                         │
//!               └─────────────────────────┘
//! ```

/// Scroll state for the text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible row (0-indexed).
    top_line: usize,

    /// First visible render column.
    left_col: usize,

    /// Text rows on screen (status and message bars excluded).
    height: usize,

    /// Text columns on screen.
    width: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 22)
    }
}

impl Viewport {
    /// A viewport at the top-left corner of the buffer.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            top_line: 0,
            left_col: 0,
            height,
            width,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    #[inline]
    #[must_use]
    pub const fn left_col(&self) -> usize {
        self.left_col
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Last visible row, inclusive. Equals `top_line` for a zero-height view.
    #[inline]
    #[must_use]
    pub const fn bottom_line(&self) -> usize {
        self.top_line + self.height.saturating_sub(1)
    }

    // -- Configuration ------------------------------------------------------

    /// Resize the text area. Offsets are kept; the next
    /// [`scroll`](Self::scroll) fixes them up.
    pub const fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Put `line` on the first screen row.
    pub const fn show_at_top(&mut self, line: usize) {
        self.top_line = line;
    }

    // -- Scrolling ----------------------------------------------------------

    /// Slide the window so (`line`, `render_col`) is visible.
    ///
    /// Moves by the smallest amount that works: a cursor above or left of
    /// the window becomes its first row or column, one below or right of it
    /// becomes its last.
    pub const fn scroll(&mut self, line: usize, render_col: usize) {
        if line < self.top_line {
            self.top_line = line;
        }
        if self.height > 0 && line >= self.top_line + self.height {
            self.top_line = line + 1 - self.height;
        }

        if render_col < self.left_col {
            self.left_col = render_col;
        }
        if self.width > 0 && render_col >= self.left_col + self.width {
            self.left_col = render_col + 1 - self.width;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
