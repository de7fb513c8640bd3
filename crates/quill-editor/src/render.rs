//! Render projection — tab expansion and column mapping.
//!
//! Every row keeps two byte strings: the raw bytes the user edits and the
//! rendered bytes the screen shows. The only difference between them is tab
//! expansion: a `\t` advances to the next multiple of [`TAB_STOP`], filled
//! with spaces.
//!
//! Two coordinate systems follow from that:
//!
//! - **raw column** — index into the raw bytes, used for editing
//! - **render column** — index into the rendered bytes, used for drawing
//!   and for search matches
//!
//! [`raw_to_render`] and [`render_to_raw`] walk the same arithmetic in
//! opposite directions, so they agree on every tab-stop boundary.

/// Width of a tab stop in render columns.
pub const TAB_STOP: usize = 8;

/// Render columns a tab occupies when it starts at render column `rx`.
#[inline]
const fn tab_width(rx: usize) -> usize {
    TAB_STOP - (rx % TAB_STOP)
}

/// Expand tabs in `raw`, producing the rendered bytes.
///
/// Non-tab bytes pass through unchanged. A tab always produces at least one
/// space.
#[must_use]
pub fn project(raw: &[u8]) -> Vec<u8> {
    let tabs = raw.iter().filter(|&&b| b == b'\t').count();
    let mut render = Vec::with_capacity(raw.len() + tabs * (TAB_STOP - 1));

    for &byte in raw {
        if byte == b'\t' {
            let fill = tab_width(render.len());
            render.resize(render.len() + fill, b' ');
        } else {
            render.push(byte);
        }
    }

    render
}

/// Convert a raw column into the equivalent render column.
///
/// Columns past the end of `raw` are treated as the end of the row.
#[must_use]
pub fn raw_to_render(raw: &[u8], raw_col: usize) -> usize {
    let end = raw_col.min(raw.len());
    raw[..end].iter().fold(0, |rx, &byte| {
        if byte == b'\t' {
            rx + tab_width(rx)
        } else {
            rx + 1
        }
    })
}

/// Convert a render column back into a raw column.
///
/// Returns the first raw column whose cumulative rendered width exceeds
/// `render_col`. A render column inside a tab's expansion maps to the tab
/// itself. Returns `raw.len()` when `render_col` is beyond the row.
#[must_use]
pub fn render_to_raw(raw: &[u8], render_col: usize) -> usize {
    let mut rx = 0;
    for (cx, &byte) in raw.iter().enumerate() {
        rx += if byte == b'\t' { tab_width(rx) } else { 1 };
        if rx > render_col {
            return cx;
        }
    }
    raw.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
