// SPDX-License-Identifier: MIT
//! Insertion normalizer: compute the final insertable text from raw snippet
//! text, current-line indentation, and formatting options.
//!
//! Pure given its inputs and the two possibly-suspending lookups on the
//! editor host. No registry or session interaction.

use anyhow::Result;

use crate::host::EditorHost;
use crate::types::{BufferId, FormatOptions, InsertTextMode};

/// Text-reformatting collaborator. The actual reindentation algorithm lives
/// with the snippet-expansion engine, not here.
pub trait SnippetFormatter: Send + Sync {
    /// Whether the snippet's shape should be kept verbatim (e.g. it spans
    /// constructs the reindenter would mangle).
    fn keep_verbatim(&self, snippet: &str) -> bool;

    /// Reformat `snippet` against the given indentation baseline and options.
    fn reformat(&self, snippet: &str, base_indent: &str, options: &FormatOptions) -> String;
}

/// Leading whitespace of `line` — the reindentation baseline.
fn leading_indent(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Compute the final insertable text for a snippet.
///
/// Literal insertion (`AsIs`) and formatter-vetoed snippets pass through
/// unchanged. Otherwise the snippet is reformatted against the current line's
/// leading whitespace, using the focused editor's live format options or,
/// absent a focused editor for the buffer, the workspace's persisted
/// per-document options (which may suspend).
pub async fn normalize_insert_text(
    host: &dyn EditorHost,
    formatter: &dyn SnippetFormatter,
    buffer: BufferId,
    snippet: &str,
    current_line: &str,
    mode: InsertTextMode,
) -> Result<String> {
    if mode == InsertTextMode::AsIs || formatter.keep_verbatim(snippet) {
        return Ok(snippet.to_string());
    }

    let base_indent = leading_indent(current_line);
    let options = match host.live_format_options(buffer) {
        Some(options) => options,
        None => host.resolved_format_options(buffer).await?,
    };

    Ok(formatter.reformat(snippet, base_indent, &options))
}
