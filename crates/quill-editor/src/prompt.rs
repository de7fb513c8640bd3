//! Line prompt — a one-line input shown in the message bar.
//!
//! A [`Prompt`] collects a string key by key. After every key that does not
//! end the prompt it calls its [`PromptHandler`], which is how incremental
//! search reacts while the user is still typing. Plain prompts (file name
//! for save-as) use `()` as the handler.
//!
//! The prompt never touches the terminal. The caller translates terminal
//! keys into [`PromptKey`], feeds them in, and draws [`Prompt::message`].
//!
//! # Key handling
//!
//! | Key                 | Effect                                         |
//! |---------------------|------------------------------------------------|
//! | printable ASCII     | appended                                       |
//! | Backspace           | last byte removed                              |
//! | Enter, input empty  | ignored (handler still runs)                   |
//! | Enter, input set    | handler runs, then `Confirmed(input)`          |
//! | Escape              | handler runs, then `Cancelled`                 |
//! | anything else       | handler runs, input unchanged                  |

use crate::session::Session;

/// A key as the prompt understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
    Up,
    Down,
    Left,
    Right,
    /// Any key with no meaning to the prompt.
    Other,
}

/// Outcome of feeding one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Pending,
    Confirmed(String),
    Cancelled,
}

/// Callback run after each key the prompt receives.
///
/// `input` is the text typed so far, already updated for `key`.
pub trait PromptHandler {
    fn on_key(&mut self, session: &mut Session, input: &str, key: PromptKey);
}

/// No-op handler for prompts that only collect text.
impl PromptHandler for () {
    fn on_key(&mut self, _session: &mut Session, _input: &str, _key: PromptKey) {}
}

/// An open prompt.
#[derive(Debug)]
pub struct Prompt<H> {
    /// Message template; the first `{}` is replaced by the input.
    template: String,
    input: String,
    handler: H,
}

impl<H: PromptHandler> Prompt<H> {
    #[must_use]
    pub fn new(template: impl Into<String>, handler: H) -> Self {
        Self {
            template: template.into(),
            input: String::new(),
            handler,
        }
    }

    /// Text typed so far.
    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[inline]
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// The message-bar line: the template with the input spliced in.
    #[must_use]
    pub fn message(&self) -> String {
        self.template.replacen("{}", &self.input, 1)
    }

    /// Process one key.
    pub fn feed(&mut self, session: &mut Session, key: PromptKey) -> PromptResult {
        match key {
            PromptKey::Escape => {
                self.handler.on_key(session, &self.input, key);
                return PromptResult::Cancelled;
            }
            PromptKey::Enter if !self.input.is_empty() => {
                self.handler.on_key(session, &self.input, key);
                return PromptResult::Confirmed(std::mem::take(&mut self.input));
            }
            PromptKey::Backspace => {
                self.input.pop();
            }
            PromptKey::Char(ch) if ch.is_ascii() && !ch.is_ascii_control() => {
                self.input.push(ch);
            }
            _ => {}
        }

        self.handler.on_key(session, &self.input, key);
        PromptResult::Pending
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
