// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop — reads keys, hands them to the application, repaints.
//
// Single-threaded. The terminal is in raw mode with VMIN=0 / VTIME=1, so
// each read() comes back within 100ms whether or not a key was pressed.
// That bounded read is the loop's only clock:
//
//   1. **Keys**: bytes go through the parser; every complete event is
//      handed to `App::on_event`.
//
//   2. **Escape timeout**: a read that returns nothing while the parser
//      holds a lone ESC means the user really pressed Escape, so the
//      pending bytes are flushed as literal events.
//
//   3. **Ticks**: `App::on_tick` runs once per iteration so the
//      application can expire its status message.
//
// # SIGWINCH Handling
//
// Terminal resize is detected via a SIGWINCH handler that sets an
// `AtomicBool`. SA_RESTART is left off: a resize interrupts the blocking
// read, and the next frame already has the new size.
//
// # Frames
//
// A frame is assembled in an `OutputBuffer` (hide cursor, home, paint,
// place cursor, show cursor) and written with one syscall. The screen is
// only repainted when something happened: a key, a resize, or a tick
// that reported a change.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ansi;
use crate::input::{Event, Parser};
use crate::output::OutputBuffer;
use crate::terminal::{self, Size, Terminal};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler. Checked each loop iteration.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only stores to an atomic, which is async-signal-safe.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = 0;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// The loop calls, per iteration:
///
/// 1. [`paint`](App::paint) and [`cursor`](App::cursor), if a repaint is due
/// 2. [`on_event`](App::on_event) for each parsed key
/// 3. [`on_resize`](App::on_resize) when the terminal size changed
/// 4. [`on_tick`](App::on_tick)
///
/// Only [`paint`](App::paint) is required.
pub trait App {
    /// Handle a parsed input event.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_event(&mut self, _event: &Event) -> Action {
        Action::Continue
    }

    /// Handle terminal resize with the new dimensions.
    fn on_resize(&mut self, _size: Size) {}

    /// Called every loop iteration, even when no input arrived.
    ///
    /// Return `true` if state changed and a repaint is needed.
    fn on_tick(&mut self) -> bool {
        false
    }

    /// Write the whole screen into `out`, starting at the top-left corner.
    ///
    /// The cursor is already hidden and homed. Every line should end by
    /// clearing to end of line so stale text from the previous frame
    /// disappears.
    fn paint(&mut self, out: &mut OutputBuffer, size: Size);

    /// Where the hardware cursor goes after painting, as `(x, y)`.
    ///
    /// `None` leaves the cursor hidden.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }
}

/// Assemble one complete frame for `app` into `out`.
///
/// # Errors
///
/// Only if writing to `out` fails, which an `OutputBuffer` never does.
pub fn compose_frame(app: &mut impl App, out: &mut OutputBuffer, size: Size) -> io::Result<()> {
    ansi::cursor_hide(out)?;
    ansi::cursor_home(out)?;
    app.paint(out, size);
    if let Some((x, y)) = app.cursor() {
        ansi::cursor_to(out, x, y)?;
        ansi::cursor_show(out)?;
    }
    Ok(())
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Size of one stdin read. Escape sequences and a burst of typing fit.
const READ_CHUNK: usize = 64;

/// The terminal event loop.
///
/// Owns the terminal and the input parser. Call [`run`](Self::run) to
/// enter the loop; it returns when the application signals
/// [`Action::Quit`].
///
/// # Example
///
/// ```no_run
/// use quill_term::event_loop::{Action, App, EventLoop};
/// use quill_term::input::{Event, KeyCode, KeyEvent};
/// use quill_term::output::OutputBuffer;
/// use quill_term::terminal::Size;
///
/// struct MyApp;
///
/// impl App for MyApp {
///     fn on_event(&mut self, event: &Event) -> Action {
///         if let Event::Key(KeyEvent { code: KeyCode::Char('q'), .. }) = event {
///             return Action::Quit;
///         }
///         Action::Continue
///     }
///
///     fn paint(&mut self, out: &mut OutputBuffer, size: Size) {
///         // Draw the screen here...
///     }
/// }
///
/// let mut event_loop = EventLoop::new()?;
/// event_loop.run(&mut MyApp)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    parser: Parser,
    out: OutputBuffer,
}

impl EventLoop {
    /// Create a new event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new()?,
            parser: Parser::new(),
            out: OutputBuffer::new(),
        })
    }

    /// The current terminal size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Run the event loop until the application returns [`Action::Quit`].
    ///
    /// Enters raw mode and the alternate screen first and always restores
    /// the terminal afterwards, even when the loop fails.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal enter/leave, reading, or writing fails.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.terminal.enter()?;
        install_sigwinch_handler();

        let result = self.run_inner(app);

        self.terminal.leave()?;
        result
    }

    fn run_inner(&mut self, app: &mut impl App) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut dirty = true;

        loop {
            // ── Render if dirty ──────────────────────────────────
            if dirty {
                self.out.clear();
                compose_frame(app, &mut self.out, self.terminal.size())?;
                self.out.flush_stdout()?;
                dirty = false;
            }

            // ── Read (bounded by VTIME) ──────────────────────────
            let n = terminal::read_input(&mut chunk)?;
            let events = if n > 0 {
                self.parser.advance(&chunk[..n])
            } else if self.parser.has_pending() {
                // Lone ESC after a quiet read: the Escape key.
                self.parser.flush()
            } else {
                Vec::new()
            };

            for event in &events {
                if app.on_event(event) == Action::Quit {
                    return Ok(());
                }
            }
            if !events.is_empty() {
                dirty = true;
            }

            // ── Check for terminal resize ────────────────────────
            if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
                let new_size = self.terminal.refresh_size();
                app.on_resize(new_size);
                dirty = true;
            }

            // ── Tick (message expiry) ────────────────────────────
            if app.on_tick() {
                dirty = true;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
