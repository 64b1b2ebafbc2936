// SPDX-License-Identifier: MIT
//! Event coordinator: drives registry and session operations from the
//! editor's event stream.
//!
//! Dispatch itself never suspends — an event either completes synchronously
//! (cancel, eviction, indicator toggles, config reload) or hands its
//! suspending work to a spawned task. That keeps the popup/pre-insert cancel
//! guarantee intact: the cancel is issued before any other event can
//! interleave. Per-buffer ordering of synchronize calls comes from the
//! session entry's gate, not from the dispatch loop, so buffers never stall
//! each other.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SnippetConfig;
use crate::host::{EditorEvent, SettingsReader};
use crate::session::SessionRegistry;

/// Subscribes to the editor event stream and reacts per event kind. Owns its
/// dispatch-task handle explicitly; [`shutdown`](Self::shutdown) releases the
/// subscription deterministically.
pub struct EventCoordinator {
    task: JoinHandle<()>,
}

impl EventCoordinator {
    /// Spawn the dispatch loop over `events`.
    pub fn spawn(
        registry: Arc<SessionRegistry>,
        settings: Arc<dyn SettingsReader>,
        config: Arc<RwLock<SnippetConfig>>,
        mut events: UnboundedReceiver<EditorEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                dispatch(&registry, settings.as_ref(), &config, event);
            }
            debug!("editor event stream closed");
        });
        Self { task }
    }

    /// Release the event subscription. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for EventCoordinator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Handle one event. Synchronous — suspending reactions are spawned.
fn dispatch(
    registry: &Arc<SessionRegistry>,
    settings: &dyn SettingsReader,
    config: &Arc<RwLock<SnippetConfig>>,
    event: EditorEvent,
) {
    match event {
        EditorEvent::TextChanged { buffer } | EditorEvent::InsertTextChanged { buffer } => {
            if let Some(entry) = registry.get(buffer) {
                tokio::spawn(async move {
                    // The entry gate serializes with any in-flight
                    // synchronize for this buffer.
                    if let Err(e) = entry.synchronize().await {
                        warn!(session = %entry.id(), buffer, err = %e, "synchronize failed");
                    }
                });
            }
        }

        // Interacting with the completion UI concurrently with a synchronize
        // can leave placeholder state inconsistent with displayed text;
        // cancel pre-emptively, before anything can suspend.
        EditorEvent::CompletionChanged { buffer } | EditorEvent::PreInsertChar { buffer } => {
            if let Some(entry) = registry.get(buffer) {
                debug!(session = %entry.id(), buffer, "completion activity, cancelling session");
                entry.session().cancel();
            }
        }

        EditorEvent::BufferUnload { buffer } => {
            if let Some(entry) = registry.get(buffer) {
                entry.session().deactivate();
                // Deactivation is terminal and always evicts, even against a
                // session that fails to fire its hook. Idempotent.
                registry.evict(buffer);
            }
        }

        EditorEvent::InsertEnter { buffer } => {
            if let Some(entry) = registry.get(buffer) {
                tokio::spawn(async move {
                    // Cursor-outside-placeholder is a normal Ok; only host
                    // failures land here.
                    if let Err(e) = entry.session().check_position().await {
                        debug!(session = %entry.id(), buffer, err = %e, "check_position failed");
                    }
                });
            }
        }

        EditorEvent::FocusChanged { buffer } => {
            registry.set_focused(buffer);
            if registry.get(buffer).is_some() {
                let indicator = registry.indicator();
                indicator.set_text(&config.read().status_text);
                indicator.show();
            } else {
                registry.indicator().hide();
            }
        }

        EditorEvent::ConfigChanged => {
            let fresh = SnippetConfig::load(settings);
            debug!(status_text = %fresh.status_text, "snippet settings reloaded");
            *config.write() = fresh;
        }
    }
}
