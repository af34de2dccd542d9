//! The phonebook file format.
//!
//! Line-oriented UTF-8: entries open with `[entry]`, continue with
//! `key=value` lines in any order, and may carry a heredoc notes block
//! (`notes=<<<END` … `END`). `keybindings_filename` is by convention
//! the last key of an entry and closes it even without a separator
//! line. `#` lines and blank lines are comments.

use std::fmt::Write as _;

use tracing::warn;

use crate::entry::{PhonebookEntry, SessionToggles};

/// Parse a whole phonebook file.
///
/// Parsing is forgiving: unknown keys and unparsable values are logged
/// and skipped so that one bad line cannot eat the directory.
#[must_use]
pub fn parse(text: &str) -> Vec<PhonebookEntry> {
    let mut entries = Vec::new();
    let mut current: Option<PhonebookEntry> = None;
    let mut notes_terminator: Option<String> = None;

    for line in text.lines() {
        if let Some(terminator) = &notes_terminator {
            if let Some(entry) = current.as_mut() {
                if line == terminator {
                    notes_terminator = None;
                } else {
                    entry.notes.push(line.to_owned());
                }
            }
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed == "[entry]" {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(PhonebookEntry::default());
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(entry) = current.as_mut() else {
            warn!(line = trimmed, "phonebook line outside any entry");
            continue;
        };
        let Some((key, value)) = trimmed.split_once('=') else {
            warn!(line = trimmed, "phonebook line is not key=value");
            continue;
        };

        if key == "notes" {
            if let Some(terminator) = value.strip_prefix("<<<") {
                notes_terminator = Some(terminator.to_owned());
            } else {
                warn!("notes value must be a heredoc");
            }
            continue;
        }

        apply_key(entry, key, value);

        if key == "keybindings_filename" {
            entries.push(current.take().unwrap_or_default());
        }
    }

    if let Some(done) = current.take() {
        entries.push(done);
    }
    entries
}

fn apply_key(entry: &mut PhonebookEntry, key: &str, value: &str) {
    match key {
        "name" => entry.name = value.to_owned(),
        "address" => entry.address = value.to_owned(),
        "port" => entry.port = parse_or_warn(key, value),
        "username" => entry.username = value.to_owned(),
        "password" => entry.password = value.to_owned(),
        "tagged" => set_bool(key, value, &mut entry.tagged),
        "doorway" => set_parsed(key, value, &mut entry.doorway),
        "method" => set_parsed(key, value, &mut entry.method),
        "emulation" => set_parsed(key, value, &mut entry.emulation),
        "codepage" => set_parsed(key, value, &mut entry.codepage),
        "quicklearn" => set_bool(key, value, &mut entry.quicklearn),
        "use_modem_cfg" => set_bool(key, value, &mut entry.use_modem_cfg),
        "use_default_toggles" => set_bool(key, value, &mut entry.use_default_toggles),
        "toggles" => {
            if let Some(bits) = parse_or_warn(key, value) {
                entry.toggles = SessionToggles::from_bits_truncate(bits);
            }
        }
        "xonxoff" => set_bool(key, value, &mut entry.serial.xonxoff),
        "rtscts" => set_bool(key, value, &mut entry.serial.rtscts),
        "baud" => set_num(key, value, &mut entry.serial.baud),
        "data_bits" => set_num(key, value, &mut entry.serial.data_bits),
        "parity" => set_parsed(key, value, &mut entry.serial.parity),
        "stop_bits" => set_num(key, value, &mut entry.serial.stop_bits),
        "lock_dte_baud" => set_bool(key, value, &mut entry.serial.lock_dte_baud),
        "times_on" => set_num(key, value, &mut entry.times_on),
        "last_call" => set_num(key, value, &mut entry.last_call),
        "script_filename" => entry.script_filename = value.to_owned(),
        "capture_filename" => entry.capture_filename = value.to_owned(),
        "translate_8bit_filename" => entry.translate_8bit_filename = value.to_owned(),
        "translate_unicode_filename" => entry.translate_unicode_filename = value.to_owned(),
        "keybindings_filename" => entry.keybindings_filename = value.to_owned(),
        _ => warn!(key, "unknown phonebook key"),
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value, "unparsable phonebook value");
            None
        }
    }
}

fn set_num<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    if let Some(parsed) = parse_or_warn(key, value) {
        *target = parsed;
    }
}

fn set_parsed<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    if let Some(parsed) = parse_or_warn(key, value) {
        *target = parsed;
    }
}

fn set_bool(key: &str, value: &str, target: &mut bool) {
    match value {
        "true" => *target = true,
        "false" => *target = false,
        _ => warn!(key, value, "boolean must be literal true or false"),
    }
}

/// Serialize entries back to the file format. `keybindings_filename`
/// is always written last so it doubles as the entry terminator.
#[must_use]
pub fn serialize(entries: &[PhonebookEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "[entry]");
        let _ = writeln!(out, "name={}", entry.name);
        let _ = writeln!(out, "address={}", entry.address);
        if let Some(port) = entry.port {
            let _ = writeln!(out, "port={port}");
        }
        let _ = writeln!(out, "username={}", entry.username);
        let _ = writeln!(out, "password={}", entry.password);
        let _ = writeln!(out, "tagged={}", entry.tagged);
        let _ = writeln!(out, "doorway={}", entry.doorway);
        let _ = writeln!(out, "method={}", entry.method);
        let _ = writeln!(out, "emulation={}", entry.emulation);
        let _ = writeln!(out, "codepage={}", entry.codepage);
        let _ = writeln!(out, "quicklearn={}", entry.quicklearn);
        let _ = writeln!(out, "use_modem_cfg={}", entry.use_modem_cfg);
        let _ = writeln!(out, "use_default_toggles={}", entry.use_default_toggles);
        let _ = writeln!(out, "toggles={}", entry.toggles.bits());
        let _ = writeln!(out, "xonxoff={}", entry.serial.xonxoff);
        let _ = writeln!(out, "rtscts={}", entry.serial.rtscts);
        let _ = writeln!(out, "baud={}", entry.serial.baud);
        let _ = writeln!(out, "data_bits={}", entry.serial.data_bits);
        let _ = writeln!(out, "parity={}", entry.serial.parity);
        let _ = writeln!(out, "stop_bits={}", entry.serial.stop_bits);
        let _ = writeln!(out, "lock_dte_baud={}", entry.serial.lock_dte_baud);
        let _ = writeln!(out, "times_on={}", entry.times_on);
        let _ = writeln!(out, "last_call={}", entry.last_call);
        let _ = writeln!(out, "script_filename={}", entry.script_filename);
        let _ = writeln!(out, "capture_filename={}", entry.capture_filename);
        let _ = writeln!(out, "translate_8bit_filename={}", entry.translate_8bit_filename);
        let _ = writeln!(
            out,
            "translate_unicode_filename={}",
            entry.translate_unicode_filename
        );
        if !entry.notes.is_empty() {
            let _ = writeln!(out, "notes=<<<END");
            for line in &entry.notes {
                let _ = writeln!(out, "{line}");
            }
            let _ = writeln!(out, "END");
        }
        let _ = writeln!(out, "keybindings_filename={}", entry.keybindings_filename);
        let _ = writeln!(out);
    }
    out
}
