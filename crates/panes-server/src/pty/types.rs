//! PTY types: the per-session PTY handle and the output it publishes.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use portable_pty::{Child, MasterPty, PtySize};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Maximum bytes read from a PTY in one call (8 KB).
pub const PTY_READ_CHUNK: usize = 8_192;

/// Default terminal columns.
pub const DEFAULT_COLS: u16 = 80;

/// Default terminal rows.
pub const DEFAULT_ROWS: u16 = 24;

// =============================================================================
// OUTPUT
// =============================================================================

/// What the PTY reader thread publishes to attached connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyOutput {
    Data(String),
    /// The shell exited; nothing follows.
    Exited,
}

// =============================================================================
// PTY HANDLE
// =============================================================================

/// One shell running on the master side of a PTY pair.
///
/// Output is read on a background thread and published on a broadcast
/// channel; see [`spawn_pty`](super::spawn_pty).
pub struct PtyHandle {
    /// Writer to send input bytes to the PTY.
    pub(super) writer: Box<dyn Write + Send>,
    /// Child process handle (for wait / kill).
    pub(super) child: Box<dyn Child + Send + Sync>,
    /// Master PTY handle; dropping it closes the terminal.
    pub(super) master: Box<dyn MasterPty + Send>,
    /// Set by the reader thread when the shell side hits EOF.
    pub(super) exited: Arc<AtomicBool>,
    pub(super) size: PtySize,
}

impl PtyHandle {
    pub fn size(&self) -> (u16, u16) {
        (self.size.cols, self.size.rows)
    }

    pub(super) fn reader_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle")
            .field("cols", &self.size.cols)
            .field("rows", &self.size.rows)
            .field("exited", &self.reader_exited())
            .finish()
    }
}

