// SPDX-License-Identifier: MIT
//
// Screen drawing — text rows, status bar, message bar.
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text rows                    │  ← height - 2 rows (the viewport)
//   ├──────────────────────────────┤
//   │ status bar (INVERSE)         │  ← 1 row
//   ├──────────────────────────────┤
//   │ message bar                  │  ← 1 row
//   └──────────────────────────────┘
//
// Everything is written into one frame buffer from the top-left corner.
// Each line ends with "clear to end of line" so nothing from the previous
// frame survives; there is no diffing.
//
// Colors are emitted only when the highlight category changes along a
// row. Normal text uses the terminal's default foreground rather than an
// explicit white.

use std::io::{self, Write};

use quill_editor::session::Session;
use quill_editor::syntax::Highlight;
use quill_term::ansi;

/// Rows taken by the status and message bars.
pub const CHROME_ROWS: usize = 2;

/// Longest file name shown in the status bar, in bytes.
const NAME_WIDTH: usize = 30;

/// Welcome line for an empty buffer.
#[must_use]
pub fn welcome() -> String {
    format!("Quill editor -- version {}", env!("CARGO_PKG_VERSION"))
}

// ─── Text Rows ──────────────────────────────────────────────────────────────

/// Draw every text row of the viewport.
///
/// # Errors
///
/// Only if `out` fails.
pub fn draw_rows(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let view = session.viewport();
    let buffer = session.buffer();
    let width = view.width();

    for y in 0..view.height() {
        let line = view.top_line() + y;
        if let Some(row) = buffer.row(line) {
            let render = row.render();
            let start = view.left_col().min(render.len());
            let end = (start + width).min(render.len());
            draw_highlighted(out, &render[start..end], &row.highlight()[start..end])?;
        } else if buffer.is_empty() && y == view.height() / 3 {
            draw_welcome(out, width)?;
        } else {
            out.write_all(b"~")?;
        }

        ansi::clear_line(out)?;
        out.write_all(b"\r\n")?;
    }
    Ok(())
}

/// Write one visible slice of a row with its colors.
fn draw_highlighted(out: &mut impl Write, bytes: &[u8], tags: &[Highlight]) -> io::Result<()> {
    let mut current: Option<u8> = None;

    for (&byte, &tag) in bytes.iter().zip(tags) {
        if byte.is_ascii_control() {
            let symbol = if byte <= 26 { b'@' + byte } else { b'?' };
            ansi::invert(out)?;
            out.write_all(&[symbol])?;
            ansi::reset(out)?;
            // Reset dropped the color too.
            if let Some(color) = current {
                ansi::fg(out, color)?;
            }
        } else if tag == Highlight::Normal {
            if current.take().is_some() {
                ansi::fg_default(out)?;
            }
            out.write_all(&[byte])?;
        } else {
            let color = tag.ansi_color();
            if current != Some(color) {
                current = Some(color);
                ansi::fg(out, color)?;
            }
            out.write_all(&[byte])?;
        }
    }

    ansi::fg_default(out)
}

fn draw_welcome(out: &mut impl Write, width: usize) -> io::Result<()> {
    let text = welcome();
    let shown = truncate(&text, width);
    let mut padding = (width - shown.len()) / 2;
    if padding > 0 {
        out.write_all(b"~")?;
        padding -= 1;
    }
    write!(out, "{:padding$}{shown}", "")
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

/// Left half of the status bar: name, line count, modified flag.
#[must_use]
pub fn status_left(session: &Session) -> String {
    let buffer = session.buffer();
    let name = buffer
        .path()
        .map_or_else(|| "[No Name]".to_owned(), |p| p.display().to_string());
    format!(
        "{} - {} lines{}",
        truncate(&name, NAME_WIDTH),
        buffer.row_count(),
        if buffer.is_dirty() { " (modified)" } else { "" }
    )
}

/// Right half of the status bar: filetype and cursor line.
#[must_use]
pub fn status_right(session: &Session) -> String {
    let buffer = session.buffer();
    format!(
        "{} | {}/{}",
        buffer.filetype().unwrap_or("plain text"),
        session.cursor().line + 1,
        buffer.row_count()
    )
}

/// Draw the inverted status bar, right half flush with the edge when it
/// fits.
///
/// # Errors
///
/// Only if `out` fails.
pub fn draw_status_bar(out: &mut impl Write, session: &Session, width: usize) -> io::Result<()> {
    let left = status_left(session);
    let right = status_right(session);
    let left = truncate(&left, width);

    ansi::invert(out)?;
    out.write_all(left.as_bytes())?;

    let remaining = width - left.len();
    if remaining >= right.len() {
        write!(out, "{:pad$}{right}", "", pad = remaining - right.len())?;
    } else {
        write!(out, "{:remaining$}", "")?;
    }

    ansi::reset(out)?;
    out.write_all(b"\r\n")
}

// ─── Message Bar ────────────────────────────────────────────────────────────

/// Draw the message bar: `text` clipped to `width`, or nothing.
///
/// # Errors
///
/// Only if `out` fails.
pub fn draw_message_bar(out: &mut impl Write, text: Option<&str>, width: usize) -> io::Result<()> {
    ansi::clear_line(out)?;
    if let Some(text) = text {
        out.write_all(truncate(text, width).as_bytes())?;
    }
    Ok(())
}

/// The longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ─── Tests ──────────────────────────────────────────────────────────────────
