//! PTY bridge: shells backing `/ws-shell/{key}` sessions.
//!
//! Uses `portable-pty` for cross-platform PTY spawning. Each shell session
//! gets its own PTY with a background reader thread that publishes output on
//! a broadcast channel, so any number of connections can watch one shell.

mod io;
mod spawn;
mod types;

pub use spawn::{bootstrap_input, spawn_pty};
pub use types::{PtyHandle, PtyOutput, DEFAULT_COLS, DEFAULT_ROWS};
