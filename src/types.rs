// SPDX-License-Identifier: MIT
//! Value types shared across the snippet engine.

use serde::{Deserialize, Serialize};

/// Editor buffer number. The editor assigns these starting at 1; the engine
/// never invents ids of its own and only keys state by them.
pub type BufferId = u64;

// ─── Geometry ─────────────────────────────────────────────────────────────────

/// Zero-based line/character position in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u64,
    pub character: u64,
}

impl Position {
    pub fn new(line: u64, character: u64) -> Self {
        Self { line, character }
    }
}

/// Half-open text range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at `pos` — where a snippet lands when no explicit
    /// range is supplied.
    pub fn cursor(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Collapse to a zero-width range at the start point.
    pub fn collapse_to_start(&self) -> Self {
        Self::cursor(self.start)
    }
}

// ─── Insertion parameters ─────────────────────────────────────────────────────

/// How raw snippet text is adjusted before insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertTextMode {
    /// Insert the text exactly as given.
    AsIs,
    /// Reindent the snippet against the current line's leading whitespace.
    #[default]
    AdjustIndentation,
}

/// Formatting options applied when a snippet is reindented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Width of one indentation level in columns. Default: 2.
    pub tab_size: u32,
    /// Indent with spaces rather than hard tabs. Default: true.
    pub insert_spaces: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            tab_size: 2,
            insert_spaces: true,
        }
    }
}

/// Metadata enabling an alternate snippet-syntax dialect's evaluation
/// semantics. Supplying one also selects the compatibility insertion branch:
/// a non-empty target range is deleted and collapsed before the session
/// starts, matching the dialect's trigger-substitution behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatContext {
    /// Trigger kind of the originating dialect (e.g. "w", "i", "b").
    pub trigger_kind: Option<String>,
    /// Captured groups from a regex trigger match.
    pub regex_groups: Vec<String>,
    /// Free-form evaluation context forwarded to the dialect engine.
    pub context: Option<serde_json::Value>,
}

/// Ephemeral per-insert value handed to the session when it starts. Never
/// persisted beyond one `insert_snippet` call.
#[derive(Debug, Clone)]
pub struct InsertionContext {
    /// Final (possibly collapsed) insertion range.
    pub range: Range,
    /// Text of the line at the range's start, captured before any edit.
    pub line: String,
    /// Compatibility-dialect metadata, if the caller supplied any.
    pub compat: Option<CompatContext>,
}

/// Caller-facing knobs for [`insert_snippet`](crate::SnippetManager::insert_snippet).
#[derive(Debug, Clone)]
pub struct InsertOptions {
    /// Select the first placeholder after insertion. Default: true.
    pub select: bool,
    /// Explicit insertion range; a zero-width range at the cursor otherwise.
    pub range: Option<Range>,
    /// Whether to reindent the snippet text. Default: adjust indentation.
    pub insert_text_mode: InsertTextMode,
    /// Alternate-dialect evaluation metadata. Also enables the compatibility
    /// pre-delete branch for non-empty ranges.
    pub compat: Option<CompatContext>,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            select: true,
            range: None,
            insert_text_mode: InsertTextMode::default(),
            compat: None,
        }
    }
}
