// SPDX-License-Identifier: MIT
//! Collaborator interfaces the engine consumes from the embedding editor.
//!
//! The engine never touches a document directly: every buffer read, edit,
//! cursor move, and settings lookup goes through [`EditorHost`]. The editor
//! front-end implements these traits and feeds [`EditorEvent`]s into the
//! [`EventCoordinator`](crate::events::EventCoordinator).

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{BufferId, FormatOptions, Position, Range};

// ─── Editor events ────────────────────────────────────────────────────────────

/// Events emitted by the editor's event source, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Buffer text changed (normal mode). May arrive for background buffers.
    TextChanged { buffer: BufferId },
    /// Buffer text changed while in insert mode.
    InsertTextChanged { buffer: BufferId },
    /// The completion popup opened, changed, or closed in the focused buffer.
    CompletionChanged { buffer: BufferId },
    /// A character is about to be inserted through the completion UI.
    PreInsertChar { buffer: BufferId },
    /// The buffer is being torn down.
    BufferUnload { buffer: BufferId },
    /// The user entered insert mode in this buffer.
    InsertEnter { buffer: BufferId },
    /// A different editor window gained focus.
    FocusChanged { buffer: BufferId },
    /// A setting relevant to the snippet engine changed.
    ConfigChanged,
}

// ─── Buffer / document accessor ───────────────────────────────────────────────

/// Buffer and document access provided by the embedding editor.
///
/// Methods that query or mutate live editor state are async — they are the
/// suspension points of the engine's cooperative concurrency model.
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// Whether the buffer is connected to live editing.
    fn is_attached(&self, buffer: BufferId) -> bool;

    /// Number of lines currently in the buffer.
    fn line_count(&self, buffer: BufferId) -> u64;

    /// Text of one line (without trailing newline).
    async fn line_text(&self, buffer: BufferId, line: u64) -> Result<String>;

    /// Current cursor position in the buffer.
    async fn cursor_position(&self, buffer: BufferId) -> Result<Position>;

    /// Delete the text covered by `range`.
    async fn delete_range(&self, buffer: BufferId, range: Range) -> Result<()>;

    /// Move the cursor to `pos`.
    async fn move_cursor(&self, buffer: BufferId, pos: Position) -> Result<()>;

    /// Formatting options of the focused editor window showing this buffer,
    /// if one is focused. Cheap, non-suspending.
    fn live_format_options(&self, buffer: BufferId) -> Option<FormatOptions>;

    /// Persisted per-document formatting options. May suspend (the editor may
    /// consult workspace settings storage).
    async fn resolved_format_options(&self, buffer: BufferId) -> Result<FormatOptions>;

    /// Tell the editor's own snippet-mode indicator to disable. Issued when a
    /// navigation call finds no session, keeping externally visible state
    /// consistent.
    fn disable_editor_snippet_mode(&self);
}

// ─── Status indicator ─────────────────────────────────────────────────────────

/// Process-wide status-bar handle. Visible iff the focused buffer currently
/// has an active session.
pub trait StatusIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn set_text(&self, text: &str);
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Typed settings lookup by key with defaults. Implemented by the editor's
/// configuration layer; [`TomlSettings`](crate::config::TomlSettings) is a
/// file-backed implementation shipped with the crate.
pub trait SettingsReader: Send + Sync {
    fn get_str(&self, key: &str, default: &str) -> String;
    fn get_bool(&self, key: &str, default: bool) -> bool;
}
