// SPDX-License-Identifier: MIT
//
// The editor application — key bindings, prompts, and status messages on
// top of an editing session.
//
// The Editor implements quill-term's App trait. Each keypress flows through:
//
//   stdin → parser → on_event → prompt or key binding → session mutation
//   paint → screen::draw_* → output buffer → terminal
//
// While a prompt is open (save-as or find) every key goes to it; the
// normal bindings only see keys when no prompt is active. Search runs
// inside the prompt: the SearchSession handler moves the cursor and
// highlights the match after each key, and the Editor restores the saved
// cursor and scroll position when the search is cancelled.

use std::borrow::Cow;
use std::time::Instant;

use quill_editor::buffer::{Buffer, BufferError};
use quill_editor::options::Options;
use quill_editor::prompt::{Prompt, PromptKey, PromptResult};
use quill_editor::search::SearchSession;
use quill_editor::session::{EditEvent, Motion, Session, Snapshot};
use quill_term::event_loop::{Action, App};
use quill_term::input::{Event, KeyCode, KeyEvent, Modifiers};
use quill_term::output::OutputBuffer;
use quill_term::terminal::Size;
use tracing::{debug, info, warn};

use crate::screen::{self, CHROME_ROWS};

const HELP: &str = "HELP: Ctrl-S = save | Ctrl-Q = quit | Ctrl-F = find";
const SAVE_AS: &str = "Save as: {} (ESC to cancel)";
const SEARCH: &str = "Search: {} (Use ESC/Arrows/Enter)";

// ─── Active prompt ──────────────────────────────────────────────────────────

/// The prompt currently owning the message bar.
#[derive(Debug)]
enum ActivePrompt {
    /// Asking for a file name before the first save.
    SaveAs(Prompt<()>),
    /// Incremental search, with where to go back to on Escape.
    Find {
        prompt: Prompt<SearchSession>,
        saved: Snapshot,
    },
}

impl ActivePrompt {
    fn message(&self) -> String {
        match self {
            Self::SaveAs(prompt) => prompt.message(),
            Self::Find { prompt, .. } => prompt.message(),
        }
    }
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The editor application state.
pub struct Editor {
    session: Session,
    options: Options,

    /// Open prompt, if any. Keys go here first.
    prompt: Option<ActivePrompt>,

    /// Status message and when it was set. Dropped once older than
    /// `options.message_timeout`.
    message: Option<(String, Instant)>,

    /// Ctrl-Q presses still needed to abandon unsaved changes.
    quit_remaining: u32,
}

impl Editor {
    /// An editor on `buffer` for a terminal of `size`, showing the help
    /// message.
    pub fn new(buffer: Buffer, size: Size, options: Options) -> Self {
        let (width, height) = text_area(size);
        let mut editor = Self {
            session: Session::new(buffer, width, height),
            options,
            prompt: None,
            message: None,
            quit_remaining: options.quit_times,
        };
        editor.set_message(HELP);
        editor
    }

    fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), Instant::now()));
    }

    /// Drop the status message if it is older than the timeout at `now`.
    /// Returns `true` if one was dropped.
    fn expire_message(&mut self, now: Instant) -> bool {
        let expired = self
            .message
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.options.message_timeout);
        if expired {
            self.message = None;
        }
        expired
    }

    /// What the message bar shows: the open prompt, else the status
    /// message.
    fn message_text(&self) -> Option<Cow<'_, str>> {
        if let Some(prompt) = &self.prompt {
            return Some(Cow::Owned(prompt.message()));
        }
        self.message.as_ref().map(|(msg, _)| Cow::Borrowed(msg.as_str()))
    }

    // ── Key bindings ───────────────────────────────────────────────────

    fn handle_key(&mut self, key: &KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(Modifiers::CTRL);

        if ctrl && key.code == KeyCode::Char('q') {
            return self.request_quit();
        }
        self.quit_remaining = self.options.quit_times;

        match key.code {
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('f') if ctrl => self.start_find(),
            KeyCode::Char('l') if ctrl => {}
            KeyCode::Char('h') if ctrl => self.session.handle_edit(EditEvent::DeleteChar),
            KeyCode::Char(ch) if ctrl => {
                if let Some(byte) = control_byte(ch) {
                    self.session.handle_edit(EditEvent::InsertChar(byte));
                }
            }
            // Alt chords have no binding.
            KeyCode::Char(_) if key.modifiers.contains(Modifiers::ALT) => {}
            KeyCode::Char(ch) => {
                let mut utf8 = [0u8; 4];
                for &byte in ch.encode_utf8(&mut utf8).as_bytes() {
                    self.session.handle_edit(EditEvent::InsertChar(byte));
                }
            }
            KeyCode::Tab => self.session.handle_edit(EditEvent::InsertChar(b'\t')),
            KeyCode::Enter => self.session.handle_edit(EditEvent::InsertNewline),
            KeyCode::Backspace => self.session.handle_edit(EditEvent::DeleteChar),
            KeyCode::Delete => self.session.handle_edit(EditEvent::DeleteForward),
            KeyCode::Escape => {}
            KeyCode::Up => self.session.move_cursor(Motion::Up),
            KeyCode::Down => self.session.move_cursor(Motion::Down),
            KeyCode::Left => self.session.move_cursor(Motion::Left),
            KeyCode::Right => self.session.move_cursor(Motion::Right),
            KeyCode::Home => self.session.move_cursor(Motion::Home),
            KeyCode::End => self.session.move_cursor(Motion::End),
            KeyCode::PageUp => self.session.move_cursor(Motion::PageUp),
            KeyCode::PageDown => self.session.move_cursor(Motion::PageDown),
        }
        Action::Continue
    }

    fn request_quit(&mut self) -> Action {
        if self.session.buffer().is_dirty() && self.quit_remaining > 0 {
            self.set_message(format!(
                "WARNING!!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                self.quit_remaining
            ));
            debug!(remaining = self.quit_remaining, "quit needs confirmation");
            self.quit_remaining -= 1;
            return Action::Continue;
        }
        info!(dirty = self.session.buffer().is_dirty(), "quit");
        Action::Quit
    }

    // ── Save ───────────────────────────────────────────────────────────

    /// Save, asking for a name first if the buffer has none.
    fn save(&mut self) {
        if self.session.buffer().path().is_none() {
            debug!("asking for a file name");
            self.prompt = Some(ActivePrompt::SaveAs(Prompt::new(SAVE_AS, ())));
            return;
        }

        match self.session.buffer_mut().save() {
            Ok(bytes) => self.set_message(format!("{bytes} bytes written to disk")),
            Err(err) => {
                let text = save_error_message(err);
                warn!(error = %text, "save failed");
                self.set_message(text);
            }
        }
    }

    // ── Find ───────────────────────────────────────────────────────────

    fn start_find(&mut self) {
        debug!("search started");
        self.prompt = Some(ActivePrompt::Find {
            prompt: Prompt::new(SEARCH, SearchSession::new()),
            saved: self.session.snapshot(),
        });
    }

    // ── Prompt dispatch ────────────────────────────────────────────────

    fn handle_prompt_key(&mut self, key: &KeyEvent) {
        self.quit_remaining = self.options.quit_times;
        let Some(active) = self.prompt.take() else {
            return;
        };
        let key = prompt_key(key);

        match active {
            ActivePrompt::SaveAs(mut prompt) => match prompt.feed(&mut self.session, key) {
                PromptResult::Pending => self.prompt = Some(ActivePrompt::SaveAs(prompt)),
                PromptResult::Confirmed(name) => {
                    self.session.buffer_mut().set_path(name.into());
                    self.save();
                }
                PromptResult::Cancelled => self.set_message("Save aborted"),
            },
            ActivePrompt::Find { mut prompt, saved } => match prompt.feed(&mut self.session, key) {
                PromptResult::Pending => self.prompt = Some(ActivePrompt::Find { prompt, saved }),
                PromptResult::Confirmed(_) => {}
                PromptResult::Cancelled => self.session.restore(saved),
            },
        }
    }

    // ── Drawing ────────────────────────────────────────────────────────

    fn draw(&self, out: &mut OutputBuffer) -> std::io::Result<()> {
        let width = self.session.viewport().width();
        screen::draw_rows(out, &self.session)?;
        screen::draw_status_bar(out, &self.session, width)?;
        screen::draw_message_bar(out, self.message_text().as_deref(), width)
    }
}

// ─── App implementation ─────────────────────────────────────────────────────

impl App for Editor {
    fn on_event(&mut self, event: &Event) -> Action {
        let Event::Key(key) = event;

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return Action::Continue;
        }
        self.handle_key(key)
    }

    fn on_resize(&mut self, size: Size) {
        let (width, height) = text_area(size);
        debug!(width, height, "resized");
        self.session.set_screen_size(width, height);
    }

    fn on_tick(&mut self) -> bool {
        self.expire_message(Instant::now())
    }

    fn paint(&mut self, out: &mut OutputBuffer, _size: Size) {
        if let Err(err) = self.draw(out) {
            warn!(%err, "frame dropped");
        }
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        let (line, rx) = self.session.cursor_render_position();
        let view = self.session.viewport();
        let x = u16::try_from(rx.checked_sub(view.left_col())?).ok()?;
        let y = u16::try_from(line.checked_sub(view.top_line())?).ok()?;
        Some((x, y))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Text-area width and height for a terminal of `size`.
fn text_area(size: Size) -> (usize, usize) {
    (
        usize::from(size.cols),
        usize::from(size.rows).saturating_sub(CHROME_ROWS),
    )
}

/// The byte Ctrl+`ch` sends, for the letters the parser reports.
fn control_byte(ch: char) -> Option<u8> {
    match ch {
        '@' => Some(0),
        'a'..='z' => u8::try_from(ch).ok().map(|b| b - b'a' + 1),
        _ => None,
    }
}

fn prompt_key(key: &KeyEvent) -> PromptKey {
    let ctrl = key.modifiers.contains(Modifiers::CTRL);
    match key.code {
        KeyCode::Char('h') if ctrl => PromptKey::Backspace,
        KeyCode::Char(_) if ctrl || key.modifiers.contains(Modifiers::ALT) => PromptKey::Other,
        KeyCode::Char(ch) => PromptKey::Char(ch),
        KeyCode::Backspace | KeyCode::Delete => PromptKey::Backspace,
        KeyCode::Enter => PromptKey::Enter,
        KeyCode::Escape => PromptKey::Escape,
        KeyCode::Up => PromptKey::Up,
        KeyCode::Down => PromptKey::Down,
        KeyCode::Left => PromptKey::Left,
        KeyCode::Right => PromptKey::Right,
        _ => PromptKey::Other,
    }
}

/// Status message for a failed save, with the whole cause chain.
fn save_error_message(err: BufferError) -> String {
    format!("I/O Error while saving: {:#}", anyhow::Error::new(err))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use pretty_assertions::assert_eq;
    use quill_editor::position::Position;
    use quill_editor::syntax::Highlight;

    // ── Helpers ───────────────────────────────────────────────────────────

    /// A plain character key press.
    fn press(ch: char) -> Event {
        Event::Key(KeyEvent::plain(KeyCode::Char(ch)))
    }

    /// Ctrl+letter.
    fn ctrl(ch: char) -> Event {
        Event::Key(KeyEvent::ctrl(ch))
    }

    /// A named key.
    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    /// Feed a sequence of events, returning the last action.
    fn feed(editor: &mut Editor, events: &[Event]) -> Action {
        let mut last = Action::Continue;
        for event in events {
            last = editor.on_event(event);
        }
        last
    }

    fn type_str(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            editor.on_event(&press(ch));
        }
    }

    fn editor_with(text: &str) -> Editor {
        Editor::new(
            Buffer::from_text(text),
            Size { cols: 80, rows: 24 },
            Options::default(),
        )
    }

    fn contents(editor: &Editor) -> String {
        String::from_utf8(editor.session.buffer().to_text()).unwrap()
    }

    fn message(editor: &Editor) -> String {
        editor.message_text().unwrap_or_default().into_owned()
    }

    // ── Startup ───────────────────────────────────────────────────────────

    #[test]
    fn starts_with_help_message() {
        let e = editor_with("");
        assert_eq!(message(&e), HELP);
        assert_eq!(e.session.viewport().height(), 22);
        assert_eq!(e.session.viewport().width(), 80);
    }

    // ── Editing keys ──────────────────────────────────────────────────────

    #[test]
    fn typing_inserts_text() {
        let mut e = editor_with("");
        type_str(&mut e, "hi");
        assert_eq!(contents(&e), "hi\n");
        assert_eq!(e.session.cursor(), Position::new(0, 2));
        assert!(e.session.buffer().is_dirty());
    }

    #[test]
    fn non_ascii_inserts_utf8_bytes() {
        let mut e = editor_with("");
        e.on_event(&press('é'));
        assert_eq!(e.session.buffer().row(0).unwrap().raw(), "é".as_bytes());
        assert_eq!(e.session.cursor(), Position::new(0, 2));
    }

    #[test]
    fn enter_backspace_and_delete() {
        let mut e = editor_with("abcd");
        feed(&mut e, &[key(KeyCode::Right), key(KeyCode::Right), key(KeyCode::Enter)]);
        assert_eq!(contents(&e), "ab\ncd\n");
        assert_eq!(e.session.cursor(), Position::new(1, 0));

        e.on_event(&key(KeyCode::Backspace));
        assert_eq!(contents(&e), "abcd\n");
        assert_eq!(e.session.cursor(), Position::new(0, 2));

        e.on_event(&key(KeyCode::Delete));
        assert_eq!(contents(&e), "abd\n");
        assert_eq!(e.session.cursor(), Position::new(0, 2));

        e.on_event(&ctrl('h'));
        assert_eq!(contents(&e), "ad\n");
    }

    #[test]
    fn tab_and_control_letters_insert_bytes() {
        let mut e = editor_with("");
        feed(&mut e, &[key(KeyCode::Tab), ctrl('a')]);
        assert_eq!(e.session.buffer().row(0).unwrap().raw(), b"\t\x01");
    }

    #[test]
    fn refresh_escape_and_alt_do_nothing() {
        let mut e = editor_with("x");
        feed(
            &mut e,
            &[
                ctrl('l'),
                key(KeyCode::Escape),
                Event::Key(KeyEvent {
                    code: KeyCode::Char('b'),
                    modifiers: Modifiers::ALT,
                }),
            ],
        );
        assert_eq!(contents(&e), "x\n");
        assert!(!e.session.buffer().is_dirty());
    }

    // ── Motion keys ───────────────────────────────────────────────────────

    #[test]
    fn arrows_wrap_between_rows() {
        let mut e = editor_with("ab\ncd");
        e.on_event(&key(KeyCode::End));
        assert_eq!(e.session.cursor(), Position::new(0, 2));
        e.on_event(&key(KeyCode::Right));
        assert_eq!(e.session.cursor(), Position::new(1, 0));
        e.on_event(&key(KeyCode::Left));
        assert_eq!(e.session.cursor(), Position::new(0, 2));
        e.on_event(&key(KeyCode::Home));
        assert_eq!(e.session.cursor(), Position::new(0, 0));
    }

    #[test]
    fn page_down_moves_a_screen() {
        let text = (0..100).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut e = editor_with(&text);
        e.on_event(&key(KeyCode::PageDown));
        assert_eq!(e.session.cursor().line, 43);
        e.on_event(&key(KeyCode::PageUp));
        assert!(e.session.cursor().line < 43);
    }

    // ── Quit ──────────────────────────────────────────────────────────────

    #[test]
    fn quit_clean_buffer_immediately() {
        let mut e = editor_with("x");
        assert_eq!(e.on_event(&ctrl('q')), Action::Quit);
    }

    #[test]
    fn quit_dirty_buffer_needs_confirmation() {
        let mut e = editor_with("");
        e.on_event(&press('x'));

        assert_eq!(e.on_event(&ctrl('q')), Action::Continue);
        assert_eq!(
            message(&e),
            "WARNING!!! File has unsaved changes. Press Ctrl-Q 2 more times to quit."
        );
        assert_eq!(e.on_event(&ctrl('q')), Action::Continue);
        assert!(message(&e).contains("Press Ctrl-Q 1 more times"));
        assert_eq!(e.on_event(&ctrl('q')), Action::Quit);
    }

    #[test]
    fn other_key_resets_quit_count() {
        let mut e = editor_with("");
        e.on_event(&press('x'));
        feed(&mut e, &[ctrl('q'), ctrl('q'), key(KeyCode::Left)]);
        assert_eq!(e.on_event(&ctrl('q')), Action::Continue);
        assert!(message(&e).contains("2 more times"));
    }

    // ── Save ──────────────────────────────────────────────────────────────

    #[test]
    fn save_named_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "one\n").unwrap();

        let mut e = Editor::new(
            Buffer::open(&path).unwrap(),
            Size { cols: 80, rows: 24 },
            Options::default(),
        );
        type_str(&mut e, "A");
        e.on_event(&ctrl('s'));

        assert_eq!(message(&e), "5 bytes written to disk");
        assert!(!e.session.buffer().is_dirty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Aone\n");
    }

    #[test]
    fn save_unnamed_buffer_prompts_for_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.c");
        let name = path.to_str().unwrap();

        let mut e = editor_with("int x;");
        e.on_event(&ctrl('s'));
        assert_eq!(message(&e), "Save as:  (ESC to cancel)");

        type_str(&mut e, name);
        assert_eq!(message(&e), format!("Save as: {name} (ESC to cancel)"));

        e.on_event(&key(KeyCode::Enter));
        assert!(e.prompt.is_none());
        assert_eq!(message(&e), "7 bytes written to disk");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "int x;\n");
        assert_eq!(e.session.buffer().filetype(), Some("c"));
    }

    #[test]
    fn save_as_escape_aborts() {
        let mut e = editor_with("x");
        feed(&mut e, &[ctrl('s'), press('a'), key(KeyCode::Escape)]);
        assert!(e.prompt.is_none());
        assert_eq!(message(&e), "Save aborted");
        assert!(e.session.buffer().path().is_none());
    }

    #[test]
    fn save_as_ignores_enter_on_empty_name() {
        let mut e = editor_with("x");
        feed(&mut e, &[ctrl('s'), key(KeyCode::Enter)]);
        assert!(e.prompt.is_some());
        // Keys in the prompt never reach the buffer.
        feed(&mut e, &[press('z'), key(KeyCode::Backspace), key(KeyCode::Escape)]);
        assert_eq!(contents(&e), "x\n");
    }

    #[test]
    fn save_failure_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");

        let mut e = editor_with("x");
        e.session.buffer_mut().set_path(path);
        e.on_event(&ctrl('s'));

        assert!(message(&e).starts_with("I/O Error while saving: failed to write "));
    }

    // ── Find ──────────────────────────────────────────────────────────────

    #[test]
    fn find_moves_to_match_and_enter_keeps_it() {
        let mut e = editor_with("one\ntwo\nthree");
        e.on_event(&ctrl('f'));
        assert_eq!(message(&e), "Search:  (Use ESC/Arrows/Enter)");

        type_str(&mut e, "t");
        assert_eq!(e.session.cursor(), Position::new(1, 0));
        assert_eq!(e.session.buffer().row(1).unwrap().highlight()[0], Highlight::Match);

        e.on_event(&key(KeyCode::Down));
        assert_eq!(e.session.cursor(), Position::new(2, 0));
        e.on_event(&key(KeyCode::Down));
        assert_eq!(e.session.cursor(), Position::new(1, 0));
        e.on_event(&key(KeyCode::Up));
        assert_eq!(e.session.cursor(), Position::new(2, 0));

        e.on_event(&key(KeyCode::Enter));
        assert!(e.prompt.is_none());
        assert_eq!(e.session.cursor(), Position::new(2, 0));
        assert!(
            e.session.buffer().row(2).unwrap().highlight().iter().all(|hl| *hl != Highlight::Match)
        );
    }

    #[test]
    fn find_escape_restores_cursor() {
        let mut e = editor_with("one\ntwo\nthree");
        e.on_event(&key(KeyCode::Right));
        feed(&mut e, &[ctrl('f'), press('h'), key(KeyCode::Escape)]);
        assert!(e.prompt.is_none());
        assert_eq!(e.session.cursor(), Position::new(0, 1));
        assert!(
            e.session.buffer().row(2).unwrap().highlight().iter().all(|hl| *hl != Highlight::Match)
        );
    }

    #[test]
    fn find_does_not_edit() {
        let mut e = editor_with("abc");
        feed(&mut e, &[ctrl('f'), press('z'), key(KeyCode::Backspace), key(KeyCode::Enter)]);
        assert!(e.prompt.is_some());
        e.on_event(&key(KeyCode::Escape));
        assert_eq!(contents(&e), "abc\n");
        assert!(!e.session.buffer().is_dirty());
    }

    // ── Messages ──────────────────────────────────────────────────────────

    #[test]
    fn messages_expire() {
        let mut e = editor_with("");
        let now = Instant::now();
        assert!(!e.expire_message(now));
        assert!(e.expire_message(now + Duration::from_secs(6)));
        assert!(e.message_text().is_none());
        assert!(!e.expire_message(now + Duration::from_secs(7)));
    }

    #[test]
    fn save_error_message_includes_cause() {
        let err = BufferError::Save {
            path: "x".into(),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(
            save_error_message(err),
            "I/O Error while saving: failed to write x: disk full"
        );
    }

    // ── Screen ────────────────────────────────────────────────────────────

    #[test]
    fn paint_draws_whole_frame() {
        let mut e = editor_with("hello");
        let mut out = OutputBuffer::new();
        e.paint(&mut out, Size { cols: 80, rows: 24 });
        let frame = String::from_utf8_lossy(out.as_bytes()).into_owned();

        assert!(frame.starts_with("hello"));
        assert!(frame.contains("[No Name] - 1 lines"));
        assert!(frame.contains("plain text | 1/1"));
        assert!(frame.ends_with(HELP));
        assert_eq!(frame.matches("\r\n").count(), 23);
    }

    #[test]
    fn cursor_follows_render_column_and_scroll() {
        let mut e = editor_with("\tx");
        e.on_event(&key(KeyCode::End));
        assert_eq!(e.cursor(), Some((9, 0)));

        let text = (0..50).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut e = editor_with(&text);
        for _ in 0..30 {
            e.on_event(&key(KeyCode::Down));
        }
        assert_eq!(e.cursor(), Some((0, 21)));
    }

    #[test]
    fn resize_updates_text_area() {
        let mut e = editor_with("x");
        e.on_resize(Size { cols: 40, rows: 10 });
        assert_eq!(e.session.viewport().width(), 40);
        assert_eq!(e.session.viewport().height(), 8);
    }

    #[test]
    fn prompt_replaces_status_message() {
        let mut e = editor_with("x");
        e.on_event(&ctrl('f'));
        let mut out = OutputBuffer::new();
        e.paint(&mut out, Size { cols: 80, rows: 24 });
        let frame = String::from_utf8_lossy(out.as_bytes()).into_owned();
        assert!(frame.ends_with("Search:  (Use ESC/Arrows/Enter)"));
    }
}
