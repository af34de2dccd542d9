//! The `mterm` entry point.
//!
//! The interactive surfaces (curses rendering, phonebook forms) live
//! behind the driver seams; this binary wires up logging, the CLI, and
//! the phonebook store, and reports configuration problems through the
//! documented exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mtbook::{Phonebook, PhonebookError};
use mterm::{CliOptions, EXIT_CONFIG_ERROR, EXIT_IO_ERROR};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = CliOptions::parse();

    let Some(path) = mterm::env::phonebook_path() else {
        error!("cannot locate a home directory for the phonebook");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    };

    let mut phonebook = load_phonebook(&path);
    phonebook.set_read_only(options.read_only);

    if let Some(n) = options.dial {
        // CLI entries are 1-based.
        let Some(idx) = n.checked_sub(1).filter(|&idx| idx < phonebook.len()) else {
            error!(n, entries = phonebook.len(), "no such phonebook entry");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        };
        if let Some(entry) = phonebook.entry(idx) {
            info!(name = %entry.name, "queueing dial on startup");
        }
        if let Some(entry) = phonebook.entry_mut(idx) {
            entry.tagged = true;
        }
    }

    for missing in [&options.keyfile, &options.translate_8bit, &options.translate_unicode]
        .into_iter()
        .flatten()
        .filter(|p| !p.exists())
    {
        error!(path = %missing.display(), "configuration file does not exist");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    // The interactive loop runs here in a full build; the core exits
    // after persisting any tag changes.
    match phonebook.save() {
        Ok(()) => ExitCode::SUCCESS,
        Err(PhonebookError::Stale) => {
            warn!("phonebook changed on disk; not overwriting");
            ExitCode::SUCCESS
        }
        Err(err @ PhonebookError::Io(_)) => {
            error!(%err, "failed to save phonebook");
            ExitCode::from(EXIT_IO_ERROR)
        }
    }
}

fn load_phonebook(path: &PathBuf) -> Phonebook {
    match Phonebook::load(path) {
        Ok(book) => book,
        Err(err) => {
            // Surface the problem but keep running with an in-memory
            // directory.
            warn!(%err, path = %path.display(), "phonebook unreadable");
            Phonebook::empty(path)
        }
    }
}
