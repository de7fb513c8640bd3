//! Syntax highlighting — rule-based, per-row, byte-oriented.
//!
//! Each row's rendered bytes are classified into [`Highlight`] categories by
//! a single left-to-right scan driven by the active [`Language`] rule set.
//! The only state that crosses row boundaries is whether a multi-line
//! comment is still open when the row ends; [`classify`] takes that state in
//! and hands the row's exit state back so the buffer can decide whether the
//! next row needs reclassifying.
//!
//! # Design choices
//!
//! - **No parser.** Rules are a keyword list, comment markers, and two flags.
//!   That is enough for readable C-like highlighting, and every edit costs
//!   one row scan (plus a cascade only when comment state flips).
//!
//! - **Tier-2 keywords carry a `|` suffix** in the rule table. The marker is
//!   stripped before matching and only selects the color.
//!
//! - **The search overlay is not ours.** [`Highlight::Match`] is never
//!   produced here; the search controller paints it on top and restores the
//!   classified array afterwards.

use std::path::Path;

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Highlight
// ---------------------------------------------------------------------------

/// Category tag for one rendered byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Highlight {
    #[default]
    Normal,
    /// Transient search-match overlay.
    Match,
    Number,
    String,
    /// Single-line comment.
    Comment,
    MultiLineComment,
    /// Control-flow and structural keywords.
    Keyword1,
    /// Type names and other second-tier keywords.
    Keyword2,
}

impl Highlight {
    /// The ANSI SGR foreground code for this category.
    ///
    /// `Normal` maps to 37 for completeness, but the screen drawer emits the
    /// terminal default foreground for it instead.
    #[must_use]
    pub const fn ansi_color(self) -> u8 {
        match self {
            Self::Number => 31,
            Self::Keyword2 => 32,
            Self::Keyword1 => 33,
            Self::Match => 34,
            Self::String => 35,
            Self::Comment | Self::MultiLineComment => 36,
            Self::Normal => 37,
        }
    }
}

// ---------------------------------------------------------------------------
// Language rule sets
// ---------------------------------------------------------------------------

bitflags! {
    /// Optional classification passes enabled for a language.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HighlightFlags: u8 {
        const NUMBERS = 0b0000_0001;
        const STRINGS = 0b0000_0010;
    }
}

/// An immutable highlighting rule set.
#[derive(Debug, PartialEq, Eq)]
pub struct Language {
    /// Filetype name shown in the status bar.
    pub name: &'static str,
    /// Patterns tested against the file name. A leading `.` means "extension
    /// equals"; anything else is a substring match.
    pub file_match: &'static [&'static str],
    /// Keywords; a trailing `|` marks the second tier.
    pub keywords: &'static [&'static str],
    pub single_line_comment: Option<&'static str>,
    /// Start and end markers of a multi-line comment.
    pub multi_line_comment: Option<(&'static str, &'static str)>,
    pub flags: HighlightFlags,
}

/// C and C++.
pub static C: Language = Language {
    name: "c",
    file_match: &[".c", ".h", ".cpp"],
    keywords: &[
        "switch", "if", "while", "for", "break", "continue", "return", "else", "struct",
        "union", "typedef", "static", "enum", "class", "case",
        "int|", "long|", "double|", "float|", "char|", "unsigned|", "signed|", "void|",
    ],
    single_line_comment: Some("//"),
    multi_line_comment: Some(("/*", "*/")),
    flags: HighlightFlags::NUMBERS.union(HighlightFlags::STRINGS),
};

/// Python. No block comments.
pub static PYTHON: Language = Language {
    name: "python",
    file_match: &[".py"],
    keywords: &[
        "if", "elif", "else", "for", "while", "break", "continue", "return", "def", "class",
        "import", "from", "as", "with", "try", "except", "finally", "raise", "pass", "lambda",
        "yield", "in", "is", "not", "and", "or",
        "None|", "True|", "False|", "self|", "int|", "str|", "float|", "list|", "dict|",
        "bool|",
    ],
    single_line_comment: Some("#"),
    multi_line_comment: None,
    flags: HighlightFlags::NUMBERS.union(HighlightFlags::STRINGS),
};

/// Every known rule set, in match priority order.
pub static LANGUAGES: &[&Language] = &[&C, &PYTHON];

/// Pick the rule set for `filename`.
///
/// Rule sets are tried in registration order and the first matching pattern
/// wins. Returns `None` for unrecognized names (plain text).
#[must_use]
pub fn select_language(filename: &str) -> Option<&'static Language> {
    let extension = Path::new(filename).extension().and_then(|e| e.to_str());

    LANGUAGES.iter().copied().find(|lang| {
        lang.file_match.iter().any(|pattern| {
            pattern.strip_prefix('.').map_or_else(
                || filename.contains(*pattern),
                |ext| extension == Some(ext),
            )
        })
    })
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether `byte` delimits words and numbers.
#[inline]
#[must_use]
pub const fn is_separator(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C | 0
            | b',' | b'.' | b'(' | b')' | b'+' | b'-' | b'/' | b'*' | b'='
            | b'~' | b'%' | b'<' | b'>' | b'[' | b']' | b';'
    )
}

/// Classify one row of rendered bytes.
///
/// `starts_in_comment` is the predecessor row's open-comment state. Returns
/// one tag per byte of `render` and whether a multi-line comment is still
/// open at the end of the row. Without a language every byte is `Normal` and
/// no comment is ever open.
#[must_use]
pub fn classify(
    render: &[u8],
    language: Option<&Language>,
    starts_in_comment: bool,
) -> (Vec<Highlight>, bool) {
    let mut hl = vec![Highlight::Normal; render.len()];
    let Some(lang) = language else {
        return (hl, false);
    };

    let strings = lang.flags.contains(HighlightFlags::STRINGS);
    let numbers = lang.flags.contains(HighlightFlags::NUMBERS);

    let mut prev_sep = true;
    let mut in_string: Option<u8> = None;
    let mut in_comment = starts_in_comment;
    let mut i = 0;

    while i < render.len() {
        let c = render[i];
        let rest = &render[i..];
        let prev_hl = if i > 0 { hl[i - 1] } else { Highlight::Normal };

        if let Some(marker) = lang.single_line_comment {
            if in_string.is_none() && !in_comment && rest.starts_with(marker.as_bytes()) {
                hl[i..].fill(Highlight::Comment);
                break;
            }
        }

        if let Some((start, end)) = lang.multi_line_comment {
            if in_string.is_none() {
                if in_comment {
                    hl[i] = Highlight::MultiLineComment;
                    if rest.starts_with(end.as_bytes()) {
                        hl[i..i + end.len()].fill(Highlight::MultiLineComment);
                        i += end.len();
                        in_comment = false;
                        prev_sep = true;
                    } else {
                        i += 1;
                    }
                    continue;
                }
                if rest.starts_with(start.as_bytes()) {
                    hl[i..i + start.len()].fill(Highlight::MultiLineComment);
                    i += start.len();
                    in_comment = true;
                    continue;
                }
            }
        }

        if strings {
            if let Some(quote) = in_string {
                hl[i] = Highlight::String;
                if c == b'\\' && i + 1 < render.len() {
                    hl[i + 1] = Highlight::String;
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
                i += 1;
                prev_sep = true;
                continue;
            }
            if c == b'"' || c == b'\'' {
                in_string = Some(c);
                hl[i] = Highlight::String;
                i += 1;
                continue;
            }
        }

        if numbers
            && ((c.is_ascii_digit() && (prev_sep || prev_hl == Highlight::Number))
                || (c == b'.' && prev_hl == Highlight::Number))
        {
            hl[i] = Highlight::Number;
            i += 1;
            prev_sep = false;
            continue;
        }

        if prev_sep {
            if let Some((len, tag)) = match_keyword(lang, rest) {
                hl[i..i + len].fill(tag);
                i += len;
                prev_sep = false;
                continue;
            }
        }

        prev_sep = is_separator(c);
        i += 1;
    }

    (hl, in_comment)
}

/// Match a keyword at the start of `rest`, requiring a separator (or the end
/// of the row) right after it. Returns its length and tag.
fn match_keyword(lang: &Language, rest: &[u8]) -> Option<(usize, Highlight)> {
    lang.keywords.iter().find_map(|keyword| {
        let (word, tag) = keyword
            .strip_suffix('|')
            .map_or((*keyword, Highlight::Keyword1), |w| (w, Highlight::Keyword2));
        let word = word.as_bytes();

        let boundary = rest.get(word.len()).copied().unwrap_or(0);
        (rest.starts_with(word) && is_separator(boundary)).then_some((word.len(), tag))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
