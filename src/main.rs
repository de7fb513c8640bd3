// SPDX-License-Identifier: MIT
//
// quill — a small terminal text editor.
//
// This is the main binary that wires together the two crates:
//
//   quill-term   → terminal control, input parsing, ANSI output, event loop
//   quill-editor → rows, highlighting, cursor and viewport, prompt, search
//
// The Editor struct (editor.rs) implements quill-term's App trait; screen.rs
// turns the session into a frame. Logging goes to a file, never to the
// terminal the editor is drawing on, and only when asked for.

mod cli;
mod editor;
mod screen;

use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use quill_editor::buffer::Buffer;
use quill_editor::options::Options;
use quill_term::event_loop::EventLoop;
use tracing::info;

use crate::cli::Cli;
use crate::editor::Editor;

/// Directory for per-process trace logs when `--log-file` is not given.
const LOG_DIR_VAR: &str = "QUILL_LOG_DIR";

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() {
    if let Err(err) = run() {
        eprintln!("quill: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.log_file.as_deref(), cli.verbose);

    let buffer = match &cli.file {
        Some(path) => Buffer::open(path)?,
        None => Buffer::new(),
    };

    let mut event_loop = EventLoop::new().context("failed to initialize terminal")?;
    let mut editor = Editor::new(buffer, event_loop.size(), Options::default());
    event_loop.run(&mut editor).context("terminal I/O failed")?;

    info!("exiting");
    Ok(())
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Where the trace log goes: the explicit path, else a per-process file in
/// `log_dir`, else nowhere.
fn log_path(explicit: Option<&Path>, log_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let dir = log_dir?;
    Some(dir.join(format!("quill.{}.log", process::id())))
}

fn setup_tracing(explicit: Option<&Path>, verbose: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let Some(path) = log_path(explicit, env::var_os(LOG_DIR_VAR).map(PathBuf::from)) else {
        return;
    };
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if parent.is_some_and(|dir| fs::create_dir_all(dir).is_err()) {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("quill=debug,quill_editor=debug,quill_term=debug")
        } else {
            EnvFilter::new("quill=info,quill_editor=info")
        }
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    info!(path = %path.display(), "tracing initialized");
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_file_wins() {
        let path = log_path(Some(Path::new("/tmp/a.log")), Some(PathBuf::from("/var/log")));
        assert_eq!(path, Some(PathBuf::from("/tmp/a.log")));
    }

    #[test]
    fn log_dir_gets_per_process_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_path(None, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("quill.{}.log", process::id())
        );
    }

    #[test]
    fn no_logging_by_default() {
        assert_eq!(log_path(None, None), None);
    }
}
