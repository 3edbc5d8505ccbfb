//! PTY I/O operations: write input, lifecycle.

use std::io::Write;

use panes_common::PanesError;

use super::types::PtyHandle;

// =============================================================================
// INPUT (WRITE TO PTY)
// =============================================================================

impl PtyHandle {
    /// Write raw input bytes to the PTY (text frames from a pane).
    pub fn write_input(&mut self, data: &[u8]) -> Result<(), PanesError> {
        self.writer
            .write_all(data)
            .map_err(|e| PanesError::Terminal(format!("PTY write failed: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| PanesError::Terminal(format!("PTY flush failed: {e}")))?;
        Ok(())
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl PtyHandle {
    /// Whether the shell has exited (reader hit EOF or the child is reaped).
    pub fn is_finished(&mut self) -> bool {
        if self.reader_exited() {
            return true;
        }
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Kill the PTY child process.
    pub fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!("PTY kill error (may already be dead): {e}");
        }
    }

    /// Wait for the child process to exit and return the exit code.
    pub fn wait_exit_code(&mut self) -> Option<u32> {
        match self.child.wait() {
            Ok(status) => Some(status.exit_code()),
            Err(e) => {
                tracing::debug!("PTY wait error: {e}");
                None
            }
        }
    }

    /// Kill and reap.
    pub fn shutdown(&mut self) -> Option<u32> {
        self.kill();
        self.wait_exit_code()
    }
}

// =============================================================================
// TESTS
// =============================================================================
