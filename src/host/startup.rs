//! Startup entry listing written as CSV
//!
//! Covers the per-user and machine-wide `Run`/`RunOnce` keys plus both
//! Startup folders. Sources that cannot be read are logged and left out.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::parse::OutputParser;
use crate::runner;

const RUN_KEYS: &[&str] = &[
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run",
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\RunOnce",
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Run",
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\RunOnce",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Run",
];

const STARTUP_SUBDIR: &str = r"Microsoft\Windows\Start Menu\Programs\Startup";

const CSV_HEADER: [&str; 3] = ["Location", "Name", "Command"];

/// One program launched at sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupEntry {
    pub location: String,
    pub name: String,
    pub command: String,
}

/// Gather entries from every known startup source
pub fn collect(parser: &OutputParser) -> Vec<StartupEntry> {
    let mut entries = Vec::new();

    for key in RUN_KEYS {
        match runner::output("reg", &["query", key]) {
            Ok(out) if out.success => {
                entries.extend(parser.reg_lines(&out.stdout).into_iter().map(|line| {
                    StartupEntry {
                        location: (*key).to_string(),
                        name: line.name,
                        command: line.data,
                    }
                }));
            }
            Ok(out) => log::debug!("Skipping {key}: {}", out.combined()),
            Err(e) => log::warn!("Could not query {key}: {e}"),
        }
    }

    for dir in startup_folders() {
        entries.extend(folder_entries(&dir));
    }

    log::debug!("Collected {} startup entries", entries.len());
    entries
}

fn startup_folders() -> Vec<PathBuf> {
    let mut folders = Vec::new();
    if let Ok(app_data) = std::env::var("APPDATA") {
        folders.push(Path::new(&app_data).join(STARTUP_SUBDIR));
    }
    if let Ok(program_data) = std::env::var("ProgramData") {
        folders.push(Path::new(&program_data).join(STARTUP_SUBDIR));
    }
    folders
}

/// Files in a Startup folder; `desktop.ini` is folder metadata, not an entry
fn folder_entries(dir: &Path) -> Vec<StartupEntry> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            log::debug!("Skipping {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut entries: Vec<_> = read
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| !entry.file_name().eq_ignore_ascii_case("desktop.ini"))
        .map(|entry| StartupEntry {
            location: dir.display().to_string(),
            name: entry.file_name().to_string_lossy().into_owned(),
            command: entry.path().display().to_string(),
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

// ============================================================================
// CSV
// ============================================================================

/// Quote a field when it holds a separator, quote, or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    write!(out, "{}\r\n", row.join(","))
}

/// Write entries as CSV with a header row
pub fn write_csv<W: Write>(out: &mut W, entries: &[StartupEntry]) -> io::Result<()> {
    csv_row(out, &CSV_HEADER)?;
    for entry in entries {
        csv_row(out, &[&entry.location, &entry.name, &entry.command])?;
    }
    out.flush()
}
