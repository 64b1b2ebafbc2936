//! Shared mock collaborators for the integration tests: a scripted editor
//! host, a recording status indicator, map-backed settings, and a
//! controllable session/factory pair.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};

use snipkit::{
    BufferId, CancelHook, CompatContext, EditorEvent, EditorHost, FormatOptions, InsertionContext,
    Position, Range, SessionFactory, SettingsReader, SnippetFormatter, SnippetManager,
    SnippetSession, StatusIndicator,
};

// ─── Editor host ──────────────────────────────────────────────────────────────

/// Scripted editor host: fixed line counts and line text, recorded edits.
pub struct MockHost {
    pub attached: Mutex<Vec<BufferId>>,
    pub line_count: u64,
    pub lines: Mutex<HashMap<(BufferId, u64), String>>,
    pub cursor: Mutex<HashMap<BufferId, Position>>,
    pub deletes: Mutex<Vec<(BufferId, Range)>>,
    pub cursor_moves: Mutex<Vec<(BufferId, Position)>>,
    pub live_options: Option<FormatOptions>,
    pub snippet_mode_disables: AtomicU64,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            attached: Mutex::new(vec![]),
            line_count: 10,
            lines: Mutex::new(HashMap::new()),
            cursor: Mutex::new(HashMap::new()),
            deletes: Mutex::new(vec![]),
            cursor_moves: Mutex::new(vec![]),
            live_options: Some(FormatOptions::default()),
            snippet_mode_disables: AtomicU64::new(0),
        }
    }

    pub fn attach(&self, buffer: BufferId) {
        self.attached.lock().push(buffer);
    }

    pub fn set_line(&self, buffer: BufferId, line: u64, text: &str) {
        self.lines.lock().insert((buffer, line), text.to_string());
    }

    pub fn set_cursor(&self, buffer: BufferId, pos: Position) {
        self.cursor.lock().insert(buffer, pos);
    }
}

#[async_trait]
impl EditorHost for MockHost {
    fn is_attached(&self, buffer: BufferId) -> bool {
        self.attached.lock().contains(&buffer)
    }

    fn line_count(&self, _buffer: BufferId) -> u64 {
        self.line_count
    }

    async fn line_text(&self, buffer: BufferId, line: u64) -> Result<String> {
        Ok(self
            .lines
            .lock()
            .get(&(buffer, line))
            .cloned()
            .unwrap_or_default())
    }

    async fn cursor_position(&self, buffer: BufferId) -> Result<Position> {
        Ok(self
            .cursor
            .lock()
            .get(&buffer)
            .copied()
            .unwrap_or(Position::new(0, 0)))
    }

    async fn delete_range(&self, buffer: BufferId, range: Range) -> Result<()> {
        self.deletes.lock().push((buffer, range));
        Ok(())
    }

    async fn move_cursor(&self, buffer: BufferId, pos: Position) -> Result<()> {
        self.cursor_moves.lock().push((buffer, pos));
        Ok(())
    }

    fn live_format_options(&self, _buffer: BufferId) -> Option<FormatOptions> {
        self.live_options
    }

    async fn resolved_format_options(&self, _buffer: BufferId) -> Result<FormatOptions> {
        Ok(FormatOptions::default())
    }

    fn disable_editor_snippet_mode(&self) {
        self.snippet_mode_disables.fetch_add(1, Ordering::SeqCst);
    }
}

// ─── Status indicator ─────────────────────────────────────────────────────────

/// Records visibility and the text it was last given.
pub struct RecordingIndicator {
    pub visible: AtomicBool,
    pub text: Mutex<String>,
    pub shows: AtomicU64,
    pub hides: AtomicU64,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(false),
            text: Mutex::new(String::new()),
            shows: AtomicU64::new(0),
            hides: AtomicU64::new(0),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl StatusIndicator for RecordingIndicator {
    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.hides.fetch_add(1, Ordering::SeqCst);
    }

    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Mutable map-backed settings, so tests can change values between
/// configuration-changed events.
#[derive(Default)]
pub struct MapSettings {
    pub strs: Mutex<HashMap<String, String>>,
    pub bools: Mutex<HashMap<String, bool>>,
}

impl MapSettings {
    pub fn set_str(&self, key: &str, value: &str) {
        self.strs.lock().insert(key.to_string(), value.to_string());
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.bools.lock().insert(key.to_string(), value);
    }
}

impl SettingsReader for MapSettings {
    fn get_str(&self, key: &str, default: &str) -> String {
        self.strs
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.bools.lock().get(key).copied().unwrap_or(default)
    }
}

// ─── Formatter ────────────────────────────────────────────────────────────────

/// Formatter that never vetoes and returns the snippet unchanged, so tests
/// can assert on the exact text a session receives.
pub struct IdentityFormatter;

impl SnippetFormatter for IdentityFormatter {
    fn keep_verbatim(&self, _snippet: &str) -> bool {
        false
    }

    fn reformat(&self, snippet: &str, _base_indent: &str, _options: &FormatOptions) -> String {
        snippet.to_string()
    }
}

// ─── Session + factory ────────────────────────────────────────────────────────

/// What a mock session's `start` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartBehavior {
    Accept,
    Decline,
    Fail,
}

/// One recorded `start` call.
#[derive(Debug, Clone)]
pub struct StartCall {
    pub text: String,
    pub range: Range,
    pub select: bool,
    pub context: Option<InsertionContext>,
}

/// Controllable session: scripted start behavior, counters for every
/// contract method, optional synchronize delay, and an "ignore cancel" mode
/// to exercise the replace protocol's survivor path.
pub struct MockSession {
    buffer: BufferId,
    hook: CancelHook,
    shared: Arc<FactoryShared>,
    pub placeholder: AtomicU32,
    pub cancelled: AtomicBool,
    pub start_behavior: Mutex<StartBehavior>,
    pub starts: Mutex<Vec<StartCall>>,
    pub sync_count: AtomicU64,
    pub force_sync_count: AtomicU64,
    pub check_position_count: AtomicU64,
    pub next_count: AtomicU64,
    pub prev_count: AtomicU64,
    pub select_count: AtomicU64,
    /// If true, `cancel` records but does not fire the hook (a cancellation
    /// that has not settled yet).
    pub ignore_cancel: AtomicBool,
    pub sync_delay: Mutex<Duration>,
}

impl MockSession {
    /// Fire the cancel hook directly, as a session whose cooperative
    /// cancellation finally settles would.
    pub fn settle_cancel(&self) {
        self.hook.fire();
    }
}

#[async_trait]
impl SnippetSession for MockSession {
    fn buffer(&self) -> BufferId {
        self.buffer
    }

    fn placeholder_index(&self) -> u32 {
        self.placeholder.load(Ordering::SeqCst)
    }

    async fn start(
        &self,
        text: &str,
        range: Range,
        select: bool,
        context: Option<InsertionContext>,
    ) -> Result<bool> {
        self.starts.lock().push(StartCall {
            text: text.to_string(),
            range,
            select,
            context,
        });
        match *self.start_behavior.lock() {
            StartBehavior::Accept => {
                self.placeholder.store(1, Ordering::SeqCst);
                Ok(true)
            }
            StartBehavior::Decline => Ok(false),
            StartBehavior::Fail => {
                self.hook.fire();
                Err(anyhow!("session failed to start"))
            }
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if !self.ignore_cancel.load(Ordering::SeqCst) {
            self.hook.fire();
        }
    }

    fn deactivate(&self) {
        self.hook.fire();
    }

    async fn synchronize(&self) -> Result<()> {
        let delay = *self.sync_delay.lock();
        let running = self.shared.syncs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared
            .max_syncs_in_flight
            .fetch_max(running, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.shared.syncs_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sync_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn force_synchronize(&self) -> Result<()> {
        self.force_sync_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn check_position(&self) -> Result<()> {
        self.check_position_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_placeholder(&self) -> Result<()> {
        self.next_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn previous_placeholder(&self) -> Result<()> {
        self.prev_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn select_current_placeholder(&self, _trigger_autocmd: bool) -> Result<()> {
        self.select_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Counters shared by every session a factory creates, for cross-buffer
/// interleaving assertions.
#[derive(Default)]
pub struct FactoryShared {
    pub syncs_in_flight: AtomicU64,
    pub max_syncs_in_flight: AtomicU64,
}

/// Factory handing out [`MockSession`]s and remembering each one.
pub struct MockFactory {
    pub sessions: Mutex<Vec<Arc<MockSession>>>,
    pub next_start_behavior: Mutex<StartBehavior>,
    pub next_ignores_cancel: AtomicBool,
    pub shared: Arc<FactoryShared>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(vec![]),
            next_start_behavior: Mutex::new(StartBehavior::Accept),
            next_ignores_cancel: AtomicBool::new(false),
            shared: Arc::new(FactoryShared::default()),
        }
    }

    pub fn created(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn session(&self, index: usize) -> Arc<MockSession> {
        self.sessions.lock()[index].clone()
    }

    pub fn last_session(&self) -> Arc<MockSession> {
        self.sessions.lock().last().expect("no session created").clone()
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    fn create(&self, buffer: BufferId, on_cancel: CancelHook) -> Arc<dyn SnippetSession> {
        let session = Arc::new(MockSession {
            buffer,
            hook: on_cancel,
            shared: self.shared.clone(),
            placeholder: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            start_behavior: Mutex::new(*self.next_start_behavior.lock()),
            starts: Mutex::new(vec![]),
            sync_count: AtomicU64::new(0),
            force_sync_count: AtomicU64::new(0),
            check_position_count: AtomicU64::new(0),
            next_count: AtomicU64::new(0),
            prev_count: AtomicU64::new(0),
            select_count: AtomicU64::new(0),
            ignore_cancel: AtomicBool::new(self.next_ignores_cancel.load(Ordering::SeqCst)),
            sync_delay: Mutex::new(Duration::ZERO),
        });
        self.sessions.lock().push(session.clone());
        session
    }

    async fn resolve(&self, text: &str, _compat: Option<&CompatContext>) -> Result<String> {
        Ok(format!("resolved:{text}"))
    }
}

// ─── Test bed ─────────────────────────────────────────────────────────────────

/// Fully wired manager plus handles to every mock, the way the daemon tests
/// build a complete context up front.
pub struct TestBed {
    pub manager: SnippetManager,
    pub host: Arc<MockHost>,
    pub indicator: Arc<RecordingIndicator>,
    pub settings: Arc<MapSettings>,
    pub factory: Arc<MockFactory>,
    pub events: UnboundedSender<EditorEvent>,
}

/// Opt-in log output for debugging test failures: `RUST_LOG=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn testbed() -> TestBed {
    init_tracing();
    let host = Arc::new(MockHost::new());
    let indicator = Arc::new(RecordingIndicator::new());
    let settings = Arc::new(MapSettings::default());
    let factory = Arc::new(MockFactory::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let manager = SnippetManager::new(
        host.clone(),
        indicator.clone(),
        settings.clone(),
        factory.clone(),
        Arc::new(IdentityFormatter),
        rx,
    );
    TestBed {
        manager,
        host,
        indicator,
        settings,
        factory,
        events: tx,
    }
}

/// Let spawned dispatch/synchronize tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}
