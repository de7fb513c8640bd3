//! # quill-editor — Editor core for quill
//!
//! This crate contains the text model and everything derived from it:
//!
//! - **[`position`]** — `Position` (line, raw byte column), 0-indexed
//! - **[`render`]** — tab expansion and raw/render column mapping
//! - **[`syntax`]** — highlight categories, language rule sets, row classifier
//! - **[`row`]** — one line with its render bytes and highlight tags
//! - **[`buffer`]** — the row store, comment-state cascade, and file I/O
//! - **[`view`]** — scroll offsets for the text area
//! - **[`session`]** — buffer + cursor + viewport, edit events and motions
//! - **[`prompt`]** — generic line prompt with a per-key handler
//! - **[`search`]** — incremental search, driven by the prompt
//! - **[`options`]** — runtime settings
//!
//! Nothing here touches the terminal; quill-term and the binary do that.

pub mod buffer;
pub mod options;
pub mod position;
pub mod prompt;
pub mod render;
pub mod row;
pub mod search;
pub mod session;
pub mod syntax;
pub mod view;
