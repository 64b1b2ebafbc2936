// SPDX-License-Identifier: MIT
//! snipkit — snippet-session engine for editor front-ends.
//!
//! Manages interactive, in-buffer snippet editing sessions: inserting
//! templated text with navigable placeholders, keeping placeholder state
//! synchronized as the user types, and surviving the races between editor
//! events and an in-progress edit. The invariant the whole crate exists to
//! uphold: **at most one live session per buffer**, across racing,
//! possibly-suspending editor events.
//!
//! The engine is deliberately thin. Snippet parsing, tabstop computation,
//! reindentation, and the physical application of edits all live with the
//! embedding editor, plugged in through the traits in [`host`] and
//! [`session`]. What lives here is the session registry, the insert
//! orchestrator with its guarded replace protocol, and the event coordinator.

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod manager;
pub mod session;
pub mod types;

pub use config::{SnippetConfig, TomlSettings};
pub use error::{Result, SnippetError};
pub use events::EventCoordinator;
pub use host::{EditorEvent, EditorHost, SettingsReader, StatusIndicator};
pub use manager::SnippetManager;
pub use session::normalize::{normalize_insert_text, SnippetFormatter};
pub use session::{CancelHook, SessionEntry, SessionFactory, SessionRegistry, SnippetSession};
pub use types::{
    BufferId, CompatContext, FormatOptions, InsertOptions, InsertTextMode, InsertionContext,
    Position, Range,
};
