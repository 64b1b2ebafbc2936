// SPDX-License-Identifier: MIT
//! Error taxonomy for the snippet engine.
//!
//! Only two conditions are fatal to a call and surfaced as typed errors: an
//! unattached target buffer and an out-of-bounds insertion range. A session
//! declining to start is a normal `Ok(false)`, and a cursor found outside any
//! placeholder on insert-mode entry is silently tolerated — neither is an
//! error here.

use crate::types::BufferId;

/// Errors surfaced by the snippet engine's public surface.
#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    /// The target buffer is not connected to live editing. Never retried.
    #[error("buffer {0} is not attached")]
    BufferNotAttached(BufferId),

    /// The requested range lies outside `[line 0, line_count + 1)`.
    #[error("range at line {line} is outside buffer {buffer} ({line_count} lines)")]
    RangeOutOfBounds {
        buffer: BufferId,
        line: u64,
        line_count: u64,
    },

    /// A collaborator (editor host, session, formatter) failed.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SnippetError>;
