//! Environment resolution.

use std::env;
use std::path::PathBuf;

/// The directory holding the phonebook and other user data.
///
/// POSIX: `$HOME/.mterm`. Windows: `%USERPROFILE%\Documents\mterm`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        env::var_os("USERPROFILE").map(|profile| {
            let mut dir = PathBuf::from(profile);
            dir.push("Documents");
            dir.push("mterm");
            dir
        })
    }
    #[cfg(not(windows))]
    {
        env::var_os("HOME").map(|home| {
            let mut dir = PathBuf::from(home);
            dir.push(".mterm");
            dir
        })
    }
}

/// The default phonebook path.
#[must_use]
pub fn phonebook_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("phonebook"))
}

/// The external editor used for notes and scripts.
#[must_use]
pub fn editor() -> String {
    env::var("EDITOR").unwrap_or_else(|_| "vi".to_owned())
}
