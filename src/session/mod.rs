// SPDX-License-Identifier: MIT
//! Session contract, registry, and the guarded replace protocol.
//!
//! The registry is the sole owner of session lifetime bookkeeping: a buffer id
//! maps to an entry iff an active, non-terminal session exists for that
//! buffer. All mutation happens on the single logical thread driving the
//! engine; the lock is never held across an `.await`.
//!
//! Replacing a session is the concurrency-correctness core. Cancellation is
//! cooperative and may not have fully settled by the time a replacement is
//! requested, and the caller's own pre-insertion edits suspend — either window
//! can admit a racing synchronize or a second replace. [`SessionRegistry::replace`]
//! therefore re-validates the map after every suspension point:
//! cancel → caller prep → force-synchronize any survivor → re-check → create.

pub mod normalize;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SnippetError;
use crate::host::StatusIndicator;
use crate::types::{BufferId, InsertionContext, Range};

// ─── Session contract ─────────────────────────────────────────────────────────

/// External behavior a snippet-editing session must provide. Implemented by
/// the snippet-expansion collaborator, consumed here.
///
/// `cancel` and `deactivate` are synchronous and cooperative: they perform no
/// suspending work and must fire the [`CancelHook`] the session was created
/// with. Everything else may suspend.
#[async_trait]
pub trait SnippetSession: Send + Sync {
    /// The buffer this session is bound to.
    fn buffer(&self) -> BufferId;

    /// Current placeholder index. 0 is the reserved sentinel meaning
    /// "no navigable placeholder".
    fn placeholder_index(&self) -> u32;

    /// Insert `text` at `range` and activate placeholder tracking.
    /// `Ok(false)` is a normal decline, not an error.
    async fn start(
        &self,
        text: &str,
        range: Range,
        select: bool,
        context: Option<InsertionContext>,
    ) -> Result<bool>;

    /// Cancel the session. Must fire the cancel hook.
    fn cancel(&self);

    /// Terminal deactivation on buffer teardown. Must fire the cancel hook.
    fn deactivate(&self);

    /// Reconcile placeholder state with the buffer's current text.
    async fn synchronize(&self) -> Result<()>;

    /// Non-deferrable synchronize, invoked before a session is replaced.
    async fn force_synchronize(&self) -> Result<()>;

    /// Validate that the cursor still lies in a navigable placeholder region.
    /// A cursor outside any placeholder is `Ok(())` — a normal terminal
    /// condition, never a failure.
    async fn check_position(&self) -> Result<()>;

    async fn next_placeholder(&self) -> Result<()>;

    async fn previous_placeholder(&self) -> Result<()>;

    async fn select_current_placeholder(&self, trigger_autocmd: bool) -> Result<()>;
}

/// Creates sessions and resolves snippet text without a session. Implemented
/// by the snippet-expansion collaborator.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a session for `buffer`. The session must fire `on_cancel` when
    /// it becomes terminal (explicit cancel, deactivation, failed start).
    fn create(&self, buffer: BufferId, on_cancel: CancelHook) -> Arc<dyn SnippetSession>;

    /// Static snippet resolution (expand without starting a session).
    async fn resolve(
        &self,
        text: &str,
        compat: Option<&crate::types::CompatContext>,
    ) -> Result<String>;
}

// ─── Cancel hook ──────────────────────────────────────────────────────────────

/// One-shot callback a session fires when it becomes terminal. Firing evicts
/// the registry entry and updates the status indicator; repeat fires are
/// no-ops.
#[derive(Clone)]
pub struct CancelHook {
    fired: Arc<AtomicBool>,
    run: Arc<dyn Fn() + Send + Sync>,
}

impl CancelHook {
    pub fn new(run: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            run: Arc::new(run),
        }
    }

    /// Hook that does nothing — for sessions constructed outside a registry
    /// (tests, static resolution probes).
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn fire(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            (self.run)();
        }
    }
}

impl std::fmt::Debug for CancelHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHook")
            .field("fired", &self.fired.load(Ordering::SeqCst))
            .finish()
    }
}

// ─── Registry entry ───────────────────────────────────────────────────────────

/// Registry slot for one live session: the session itself, a per-buffer
/// synchronize gate, and a correlation id for log lines.
pub struct SessionEntry {
    id: Uuid,
    session: Arc<dyn SnippetSession>,
    sync_gate: Mutex<()>,
}

impl SessionEntry {
    pub fn new(session: Arc<dyn SnippetSession>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session,
            sync_gate: Mutex::new(()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer(&self) -> BufferId {
        self.session.buffer()
    }

    pub fn placeholder_index(&self) -> u32 {
        self.session.placeholder_index()
    }

    pub fn session(&self) -> &Arc<dyn SnippetSession> {
        &self.session
    }

    /// Non-forcing synchronize, serialized per buffer: a new call waits for
    /// the prior one on the same entry to finish. Entries for different
    /// buffers have independent gates and proceed concurrently.
    pub async fn synchronize(&self) -> Result<()> {
        let _gate = self.sync_gate.lock().await;
        self.session.synchronize().await
    }

    /// Forcing synchronize through the same gate, so it also waits out any
    /// in-flight non-forcing call.
    pub async fn force_synchronize(&self) -> Result<()> {
        let _gate = self.sync_gate.lock().await;
        self.session.force_synchronize().await
    }
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("id", &self.id)
            .field("buffer", &self.buffer())
            .finish()
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

/// Buffer-id → session mapping, plus the indicator bookkeeping that must stay
/// consistent with it.
pub struct SessionRegistry {
    inner: RwLock<HashMap<BufferId, Arc<SessionEntry>>>,
    indicator: Arc<dyn StatusIndicator>,
    /// Last buffer the editor reported focused; 0 = none. Written only by the
    /// event coordinator, read when an eviction decides indicator visibility.
    focused: AtomicU64,
}

impl SessionRegistry {
    pub fn new(indicator: Arc<dyn StatusIndicator>) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            indicator,
            focused: AtomicU64::new(0),
        }
    }

    /// Pure, side-effect-free read.
    pub fn get(&self, buffer: BufferId) -> Option<Arc<SessionEntry>> {
        self.inner.read().get(&buffer).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Record the focused buffer (0 = none). Called on focus-change events.
    pub fn set_focused(&self, buffer: BufferId) {
        self.focused.store(buffer, Ordering::SeqCst);
    }

    pub fn focused(&self) -> BufferId {
        self.focused.load(Ordering::SeqCst)
    }

    pub fn indicator(&self) -> &Arc<dyn StatusIndicator> {
        &self.indicator
    }

    /// Register `entry` as the live session for its buffer.
    pub fn register(&self, entry: Arc<SessionEntry>) {
        let buffer = entry.buffer();
        debug!(session = %entry.id(), buffer, "session registered");
        self.inner.write().insert(buffer, entry);
    }

    /// Remove the entry for `buffer`, hiding the indicator if that buffer is
    /// focused. Idempotent — cancel hooks and unload handling may both land
    /// here for the same session.
    pub fn evict(&self, buffer: BufferId) {
        let removed = self.inner.write().remove(&buffer);
        if let Some(entry) = removed {
            info!(session = %entry.id(), buffer, "session evicted");
            if self.focused() == buffer {
                self.indicator.hide();
            }
        }
    }

    /// Build the one-shot hook wired into a new session: fires → evict.
    fn cancel_hook(self: &Arc<Self>, buffer: BufferId) -> CancelHook {
        let registry = Arc::downgrade(self);
        CancelHook::new(move || {
            if let Some(registry) = Weak::upgrade(&registry) {
                registry.evict(buffer);
            }
        })
    }

    /// Guarded replace: hand out a session for `buffer`, guaranteeing at most
    /// one stays alive across the suspension points in between.
    ///
    /// Protocol: cancel any live session immediately; run the caller's
    /// pre-insertion work (`prep`); if an entry still occupies the buffer the
    /// cancellation has not settled, so force it to fully synchronize; then
    /// re-check once more and only construct a fresh session if the buffer is
    /// genuinely free. A surviving entry is returned for the caller to
    /// restart rather than shadowed by a duplicate.
    ///
    /// The returned entry is *not* registered — the caller registers it only
    /// after the session accepts its start.
    pub async fn replace<P>(
        self: &Arc<Self>,
        buffer: BufferId,
        factory: &Arc<dyn SessionFactory>,
        prep: P,
    ) -> crate::error::Result<Arc<SessionEntry>>
    where
        P: std::future::Future<Output = crate::error::Result<()>>,
    {
        if let Some(live) = self.get(buffer) {
            debug!(session = %live.id(), buffer, "cancelling session before replace");
            live.session().cancel();
        }

        prep.await?;

        if let Some(live) = self.get(buffer) {
            warn!(session = %live.id(), buffer, "session survived cancel, forcing synchronize");
            live.force_synchronize().await.map_err(SnippetError::from)?;
        }

        if let Some(live) = self.get(buffer) {
            return Ok(live);
        }

        let hook = self.cancel_hook(buffer);
        let session = factory.create(buffer, hook);
        let entry = Arc::new(SessionEntry::new(session));
        debug!(session = %entry.id(), buffer, "session created");
        Ok(entry)
    }

    /// Cancel every live session and clear the map. Used on dispose.
    pub fn cancel_all(&self) {
        let entries: Vec<Arc<SessionEntry>> = self.inner.read().values().cloned().collect();
        for entry in entries {
            entry.session().cancel();
        }
        // Cancel hooks evict as they fire; clear defensively for sessions
        // that are already terminal.
        self.inner.write().clear();
        self.indicator.hide();
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.inner.read().len())
            .field("focused", &self.focused())
            .finish()
    }
}
