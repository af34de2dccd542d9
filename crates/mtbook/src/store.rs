//! The file-backed phonebook store.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::entry::PhonebookEntry;
use crate::file;

/// Store failures.
#[derive(Debug)]
pub enum PhonebookError {
    /// Reading or writing the backing file failed.
    Io(io::Error),
    /// The on-disk file changed since our last load/save; saving now
    /// would clobber someone else's edits. Callers prompt and retry
    /// with [`Phonebook::save_forced`].
    Stale,
}

impl fmt::Display for PhonebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhonebookError::Io(err) => write!(f, "phonebook I/O error: {err}"),
            PhonebookError::Stale => {
                write!(f, "phonebook file changed on disk since last save")
            }
        }
    }
}

impl std::error::Error for PhonebookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhonebookError::Io(err) => Some(err),
            PhonebookError::Stale => None,
        }
    }
}

impl From<io::Error> for PhonebookError {
    fn from(err: io::Error) -> Self {
        PhonebookError::Io(err)
    }
}

/// The dialing directory, owned by the session.
#[derive(Debug)]
pub struct Phonebook {
    path: PathBuf,
    entries: Vec<PhonebookEntry>,
    read_only: bool,
    /// mtime of the file as of our last load or save.
    disk_mtime: Option<SystemTime>,
}

impl Phonebook {
    /// An empty in-memory phonebook backed by `path`.
    #[must_use]
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
            entries: Vec::new(),
            read_only: false,
            disk_mtime: None,
        }
    }

    /// Load the phonebook from `path`.
    ///
    /// # Errors
    ///
    /// Return an error if the file cannot be read. A missing file is
    /// not an error; it yields an empty directory.
    pub fn load(path: &Path) -> Result<Self, PhonebookError> {
        let mut book = Self::empty(path);
        match fs::read_to_string(path) {
            Ok(text) => {
                book.entries = file::parse(&text);
                book.disk_mtime = mtime_of(path);
                debug!(entries = book.entries.len(), ?path, "phonebook loaded");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "no phonebook file yet");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(book)
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn entries(&self) -> &[PhonebookEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, idx: usize) -> Option<&PhonebookEntry> {
        self.entries.get(idx)
    }

    pub fn entry_mut(&mut self, idx: usize) -> Option<&mut PhonebookEntry> {
        self.entries.get_mut(idx)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: PhonebookEntry) {
        self.entries.push(entry);
    }

    // ----- tag cycle -----

    /// Indices of all tagged entries, in directory order.
    pub fn tagged_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tagged)
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn tagged_count(&self) -> usize {
        self.tagged_indices().count()
    }

    /// The next tagged entry after `from`, wrapping to the head.
    /// Returns `from` itself when it is the only tagged entry.
    #[must_use]
    pub fn next_tagged(&self, from: usize) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let n = self.entries.len();
        (1..=n)
            .map(|offset| (from + offset) % n)
            .find(|&idx| self.entries[idx].tagged)
    }

    /// Drop an entry from the redial cycle ("kill").
    pub fn untag(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx) {
            entry.tagged = false;
        }
    }

    // ----- persistence -----

    /// Save, honoring the ownership check: if the on-disk file has
    /// been touched since our last load/save, nothing is written.
    ///
    /// # Errors
    ///
    /// [`PhonebookError::Stale`] when the mtime no longer matches;
    /// [`PhonebookError::Io`] on write failure.
    pub fn save(&mut self) -> Result<(), PhonebookError> {
        if self.read_only {
            debug!("phonebook is read-only, skipping save");
            return Ok(());
        }
        let on_disk = mtime_of(&self.path);
        if on_disk.is_some() && on_disk != self.disk_mtime {
            warn!(path = ?self.path, "phonebook changed on disk");
            return Err(PhonebookError::Stale);
        }
        self.write_out()
    }

    /// Save unconditionally, clobbering any concurrent edits.
    ///
    /// # Errors
    ///
    /// Return an error if the write fails.
    pub fn save_forced(&mut self) -> Result<(), PhonebookError> {
        if self.read_only {
            return Ok(());
        }
        self.write_out()
    }

    fn write_out(&mut self) -> Result<(), PhonebookError> {
        // Keep the previous contents as a .bak sibling, then replace
        // atomically via a temp file in the same directory.
        if self.path.exists() {
            fs::copy(&self.path, self.path.with_extension("bak"))?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, file::serialize(&self.entries))?;
        fs::rename(&tmp, &self.path)?;
        self.disk_mtime = mtime_of(&self.path);
        debug!(path = ?self.path, entries = self.entries.len(), "phonebook saved");
        Ok(())
    }
}

fn mtime_of(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
