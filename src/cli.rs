// SPDX-License-Identifier: MIT
//
// Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// A small terminal text editor with syntax highlighting and incremental
/// search.
#[derive(Parser, Debug)]
#[command(name = "quill", version)]
pub struct Cli {
    /// File to open. Without one the editor starts on an empty buffer and
    /// asks for a name on the first save.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Write a trace log to this file (the screen belongs to the editor).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level instead of info.
    #[arg(short, long)]
    pub verbose: bool,
}
