// SPDX-License-Identifier: MIT
//! Snippet engine settings.
//!
//! Settings are read through the [`SettingsReader`] collaborator so the
//! embedding editor can back them with whatever store it already has. The
//! engine re-reads them on every relevant-configuration-changed event; live
//! sessions are never touched by a reload.

use std::path::Path;

use tracing::error;

use crate::host::SettingsReader;

const DEFAULT_STATUS_TEXT: &str = "SNIP";
const DEFAULT_HIGHLIGHT: bool = false;
const DEFAULT_PREFER_COMPLETE: bool = false;

/// Setting keys, in the editor's dotted-key convention.
pub const KEY_STATUS_TEXT: &str = "snippet.status_text";
pub const KEY_HIGHLIGHT: &str = "snippet.highlight";
pub const KEY_PREFER_COMPLETE: &str = "snippet.prefer_complete_over_jump";

/// Snapshot of the settings the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetConfig {
    /// Text shown by the status indicator while a session is active.
    /// Default: "SNIP".
    pub status_text: String,
    /// Highlight the active placeholder region. Default: false.
    pub highlight: bool,
    /// When the completion popup is open, prefer accepting a completion over
    /// jumping to the next placeholder. Default: false.
    pub prefer_complete_over_jump: bool,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            status_text: DEFAULT_STATUS_TEXT.to_string(),
            highlight: DEFAULT_HIGHLIGHT,
            prefer_complete_over_jump: DEFAULT_PREFER_COMPLETE,
        }
    }
}

impl SnippetConfig {
    /// Read a fresh snapshot, falling back to defaults key by key.
    pub fn load(settings: &dyn SettingsReader) -> Self {
        Self {
            status_text: settings.get_str(KEY_STATUS_TEXT, DEFAULT_STATUS_TEXT),
            highlight: settings.get_bool(KEY_HIGHLIGHT, DEFAULT_HIGHLIGHT),
            prefer_complete_over_jump: settings
                .get_bool(KEY_PREFER_COMPLETE, DEFAULT_PREFER_COMPLETE),
        }
    }
}

// ─── TOML-backed settings ─────────────────────────────────────────────────────

/// [`SettingsReader`] backed by a TOML table, for front-ends without a
/// settings store of their own. Dotted keys address nested tables
/// (`snippet.status_text` → `[snippet] status_text`).
#[derive(Debug, Default)]
pub struct TomlSettings {
    table: toml::Table,
}

impl TomlSettings {
    /// Parse settings from a TOML string. A parse error logs and yields an
    /// empty table (all defaults) — never a panic.
    pub fn parse(contents: &str) -> Self {
        match contents.parse::<toml::Table>() {
            Ok(table) => Self { table },
            Err(e) => {
                error!(err = %e, "failed to parse settings TOML, using defaults");
                Self::default()
            }
        }
    }

    /// Load settings from a TOML file. A missing or unreadable file yields
    /// all defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(_) => Self::default(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut current: Option<&toml::Value> = None;
        for part in key.split('.') {
            current = match current {
                None => self.table.get(part),
                Some(toml::Value::Table(table)) => table.get(part),
                Some(_) => return None,
            };
            current?;
        }
        current
    }
}

impl SettingsReader for TomlSettings {
    fn get_str(&self, key: &str, default: &str) -> String {
        match self.lookup(key) {
            Some(toml::Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.lookup(key) {
            Some(toml::Value::Boolean(b)) => *b,
            _ => default,
        }
    }
}
