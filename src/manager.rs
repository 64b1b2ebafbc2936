// SPDX-License-Identifier: MIT
//! Public surface of the snippet engine.
//!
//! [`SnippetManager`] is the one entry point callers use directly; everything
//! else reaches the registry through editor events. Every operation that
//! concerns a particular buffer takes the buffer id explicitly — there is no
//! ambient "current buffer" state on this surface.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::config::SnippetConfig;
use crate::error::{Result, SnippetError};
use crate::events::EventCoordinator;
use crate::host::{EditorEvent, EditorHost, SettingsReader, StatusIndicator};
use crate::session::normalize::{normalize_insert_text, SnippetFormatter};
use crate::session::{SessionEntry, SessionFactory, SessionRegistry};
use crate::types::{BufferId, CompatContext, InsertOptions, InsertionContext, Range};

/// Owns the session registry, the event coordinator, and the collaborator
/// handles, and exposes the caller-facing snippet operations.
pub struct SnippetManager {
    host: Arc<dyn EditorHost>,
    factory: Arc<dyn SessionFactory>,
    formatter: Arc<dyn SnippetFormatter>,
    registry: Arc<SessionRegistry>,
    config: Arc<RwLock<SnippetConfig>>,
    coordinator: EventCoordinator,
}

impl SnippetManager {
    /// Wire the engine together and subscribe to the editor event stream.
    pub fn new(
        host: Arc<dyn EditorHost>,
        indicator: Arc<dyn StatusIndicator>,
        settings: Arc<dyn SettingsReader>,
        factory: Arc<dyn SessionFactory>,
        formatter: Arc<dyn SnippetFormatter>,
        events: UnboundedReceiver<EditorEvent>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new(indicator));
        let config = Arc::new(RwLock::new(SnippetConfig::load(settings.as_ref())));
        let coordinator =
            EventCoordinator::spawn(registry.clone(), settings, config.clone(), events);
        Self {
            host,
            factory,
            formatter,
            registry,
            config,
            coordinator,
        }
    }

    // ─── Insert-snippet orchestrator ──────────────────────────────────────────

    /// Insert a snippet into `buffer`, creating a session (or superseding the
    /// buffer's existing one). Returns whether a session ended up active.
    ///
    /// Fails with [`SnippetError::BufferNotAttached`] if the buffer is not
    /// connected to live editing, and [`SnippetError::RangeOutOfBounds`] if an
    /// explicit range falls outside `[line 0, line_count + 1)`. A session
    /// declining to start is `Ok(false)`, not an error. Every exit path
    /// leaves the registry and indicator consistent with whichever session is
    /// actually active.
    pub async fn insert_snippet(
        &self,
        buffer: BufferId,
        snippet: &str,
        options: InsertOptions,
    ) -> Result<bool> {
        if !self.host.is_attached(buffer) {
            return Err(SnippetError::BufferNotAttached(buffer));
        }

        let line_count = self.host.line_count(buffer);
        let range = match options.range {
            Some(range) => {
                if range.start.line > range.end.line || range.end.line > line_count {
                    return Err(SnippetError::RangeOutOfBounds {
                        buffer,
                        line: range.end.line,
                        line_count,
                    });
                }
                range
            }
            None => Range::cursor(self.host.cursor_position(buffer).await?),
        };

        // Captured before any edit — the indentation baseline.
        let line = self.host.line_text(buffer, range.start.line).await?;
        let text = normalize_insert_text(
            self.host.as_ref(),
            self.formatter.as_ref(),
            buffer,
            snippet,
            &line,
            options.insert_text_mode,
        )
        .await?;

        // Compatibility dialects expect the triggering selection to be
        // consumed: delete the range's text and collapse to its start before
        // the session sees it.
        let compat_delete = options.compat.is_some() && !range.is_empty();
        let final_range = if compat_delete {
            range.collapse_to_start()
        } else {
            range
        };

        let host = self.host.clone();
        let prep = async move {
            if compat_delete {
                host.delete_range(buffer, range).await?;
                host.move_cursor(buffer, range.start).await?;
            }
            Ok::<(), SnippetError>(())
        };
        let entry = self.registry.replace(buffer, &self.factory, prep).await?;

        let context = InsertionContext {
            range: final_range,
            line: line.clone(),
            compat: options.compat.clone(),
        };
        let started = entry
            .session()
            .start(&text, final_range, options.select, Some(context))
            .await;

        match started {
            Ok(true) => {
                self.registry.register(entry.clone());
                let indicator = self.registry.indicator();
                indicator.set_text(&self.config.read().status_text);
                indicator.show();
                info!(session = %entry.id(), buffer, "snippet session active");
                Ok(true)
            }
            Ok(false) => {
                debug!(session = %entry.id(), buffer, "session declined to start");
                self.registry.evict(buffer);
                self.registry.indicator().hide();
                Ok(false)
            }
            Err(e) => {
                self.registry.evict(buffer);
                self.registry.indicator().hide();
                Err(e.into())
            }
        }
    }

    // ─── Placeholder navigation ───────────────────────────────────────────────

    /// Jump to the next placeholder of `buffer`'s session. Returns `""` —
    /// editors bind this to expression mappings that expect a string result.
    pub async fn next_placeholder(&self, buffer: BufferId) -> Result<&'static str> {
        match self.registry.get(buffer) {
            Some(entry) => entry.session().next_placeholder().await?,
            None => self.no_session_fallback(),
        }
        Ok("")
    }

    /// Jump to the previous placeholder. Returns `""` (see
    /// [`next_placeholder`](Self::next_placeholder)).
    pub async fn previous_placeholder(&self, buffer: BufferId) -> Result<&'static str> {
        match self.registry.get(buffer) {
            Some(entry) => entry.session().previous_placeholder().await?,
            None => self.no_session_fallback(),
        }
        Ok("")
    }

    /// Re-select the current placeholder of `buffer`'s session.
    pub async fn select_current_placeholder(
        &self,
        buffer: BufferId,
        trigger_autocmd: bool,
    ) -> Result<()> {
        match self.registry.get(buffer) {
            Some(entry) => {
                entry
                    .session()
                    .select_current_placeholder(trigger_autocmd)
                    .await?
            }
            None => self.no_session_fallback(),
        }
        Ok(())
    }

    /// Whether a placeholder jump is currently possible in `buffer`: a
    /// session exists and its placeholder index is not the reserved 0
    /// sentinel.
    pub fn jumpable(&self, buffer: BufferId) -> bool {
        self.registry
            .get(buffer)
            .map(|entry| entry.placeholder_index() != 0)
            .unwrap_or(false)
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Cancel `buffer`'s session. With no session, instruct the editor's own
    /// snippet-mode to disable and hide the indicator instead.
    pub fn cancel(&self, buffer: BufferId) {
        match self.registry.get(buffer) {
            Some(entry) => entry.session().cancel(),
            None => self.no_session_fallback(),
        }
    }

    /// Statically resolve snippet text without starting a session.
    pub async fn resolve_snippet(
        &self,
        text: &str,
        compat: Option<&CompatContext>,
    ) -> Result<String> {
        Ok(self.factory.resolve(text, compat).await?)
    }

    /// Pure registry read: the live session entry for `buffer`, if any.
    pub fn session(&self, buffer: BufferId) -> Option<Arc<SessionEntry>> {
        self.registry.get(buffer)
    }

    /// Snapshot of the current snippet settings.
    pub fn config(&self) -> SnippetConfig {
        self.config.read().clone()
    }

    /// Cancel all sessions and release the event subscription.
    pub fn dispose(&self) {
        debug!("disposing snippet manager");
        self.registry.cancel_all();
        self.coordinator.shutdown();
    }

    /// No session to act on: keep externally visible state consistent anyway.
    fn no_session_fallback(&self) {
        self.host.disable_editor_snippet_mode();
        self.registry.indicator().hide();
    }
}
