//! Shell session store: one PTY shell per session key, shared by every
//! connection attached to that key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, RwLock};

use panes_common::{PanesError, SessionKey};
use panes_config::schema::ShellConfig;

use crate::pty::{bootstrap_input, spawn_pty, PtyHandle, PtyOutput, DEFAULT_COLS, DEFAULT_ROWS};

// =============================================================================
// SESSION
// =============================================================================

/// A running shell and the channel its output is published on.
pub struct ShellSession {
    key: SessionKey,
    pty: Mutex<PtyHandle>,
    output: broadcast::Sender<PtyOutput>,
    attached: AtomicUsize,
    idle_since: Mutex<Option<Instant>>,
}

impl ShellSession {
    fn pty(&self) -> MutexGuard<'_, PtyHandle> {
        self.pty.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write client input to the shell verbatim.
    pub fn write_input(&self, data: &[u8]) -> Result<(), PanesError> {
        self.pty().write_input(data)
    }

    pub fn is_finished(&self) -> bool {
        self.pty().is_finished()
    }

    /// Number of connections currently attached.
    pub fn attached(&self) -> usize {
        self.attached.load(Ordering::Acquire)
    }

    /// How long the session has had no attached connection.
    pub fn idle_for(&self) -> Option<Duration> {
        let idle_since = *self.idle_since.lock().unwrap_or_else(|e| e.into_inner());
        idle_since.map(|since| since.elapsed())
    }

    fn shutdown(&self) {
        let code = self.pty().shutdown();
        tracing::info!(session = %self.key, exit_code = ?code, "shell terminated");
    }

    fn attach(self: &Arc<Self>) -> Attachment {
        self.attached.fetch_add(1, Ordering::AcqRel);
        *self.idle_since.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Attachment {
            output: self.output.subscribe(),
            session: self.clone(),
        }
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("key", &self.key)
            .field("attached", &self.attached())
            .finish()
    }
}

/// One connection's hold on a shell session. Dropping it detaches.
pub struct Attachment {
    session: Arc<ShellSession>,
    pub output: broadcast::Receiver<PtyOutput>,
}

impl Attachment {
    pub fn session(&self) -> &ShellSession {
        &self.session
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        let remaining = self.session.attached.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            *self
                .session
                .idle_since
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        }
        tracing::debug!(session = %self.session.key, remaining, "connection detached");
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Thread-safe map of shell sessions by key.
#[derive(Clone)]
pub struct ShellStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Arc<ShellSession>>>>,
    shell: Arc<ShellConfig>,
    capacity: usize,
}

impl ShellStore {
    /// `capacity` bounds the output backlog of a slow connection; beyond it
    /// the connection skips ahead.
    pub fn new(shell: ShellConfig, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shell: Arc::new(shell),
            capacity: capacity.max(1),
        }
    }

    /// Attach to the shell for `key`, spawning it if there is none or the
    /// previous one has exited.
    pub async fn attach(&self, key: &SessionKey) -> Result<Attachment, PanesError> {
        let mut map = self.sessions.write().await;

        if let Some(existing) = map.get(key) {
            if !existing.is_finished() {
                tracing::info!(session = %key, "re-attaching to shell");
                return Ok(existing.attach());
            }
            tracing::info!(session = %key, "shell exited, replacing");
            if let Some(old) = map.remove(key) {
                old.shutdown();
            }
        }

        let (tx, rx) = broadcast::channel(self.capacity);
        let mut pty = spawn_pty(&self.shell, DEFAULT_COLS, DEFAULT_ROWS, tx.clone())?;
        if let Err(e) = pty.write_input(bootstrap_input(&self.shell).as_bytes()) {
            pty.shutdown();
            return Err(e);
        }

        let (cols, rows) = pty.size();
        let session = Arc::new(ShellSession {
            key: key.clone(),
            pty: Mutex::new(pty),
            output: tx,
            attached: AtomicUsize::new(1),
            idle_since: Mutex::new(None),
        });
        map.insert(key.clone(), session.clone());
        tracing::info!(session = %key, cols, rows, "shell spawned");

        Ok(Attachment {
            session,
            output: rx,
        })
    }

    /// Remove shells that exited or had no connection for longer than
    /// `max_idle`. Returns how many were removed.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|key, session| {
            let expired = session.attached() == 0
                && session.idle_for().is_some_and(|idle| idle > max_idle);
            let stale = expired || session.is_finished();
            if stale {
                tracing::info!(session = %key, "reaping shell session");
                session.shutdown();
            }
            !stale
        });
        before - map.len()
    }

    /// Kill every shell. Used during graceful shutdown.
    pub async fn kill_all(&self) {
        let mut map = self.sessions.write().await;
        let count = map.len();
        for (_, session) in map.drain() {
            session.shutdown();
        }
        tracing::info!(count, "all shells killed");
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
