// SPDX-License-Identifier: MIT
//
// quill-term — Terminal layer for the quill editor.
//
// Direct terminal control via raw termios and ANSI escape sequences, with
// no TUI framework in between. Five pieces:
//
//   terminal   → raw mode, alternate screen, size queries, bounded reads
//   input      → byte stream to key events (CSI, SS3, control bytes, UTF-8)
//   ansi       → escape sequence encoders
//   output     → one-syscall frame buffer
//   event_loop → read keys, dispatch to the App, repaint
//
// The editor core never sees a byte of terminal protocol; it only gets
// key events and hands back a painted frame.

pub mod ansi;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod terminal;
