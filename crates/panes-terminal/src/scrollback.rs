//! Scrollback ring buffer for a terminal surface's transcript.
//!
//! Stores completed lines up to a configurable maximum plus the line still
//! being written. Oldest lines are dropped when the capacity is exceeded.
//! Text is kept verbatim, control sequences included.

use std::collections::VecDeque;

/// Default maximum number of scrollback lines.
const DEFAULT_MAX_LINES: usize = 10_000;

pub struct Scrollback {
    lines: VecDeque<String>,
    partial: String,
    max_lines: usize,
}

impl Scrollback {
    /// Create an empty buffer with the given maximum capacity (at least 1).
    pub fn new(max_lines: usize) -> Self {
        Scrollback {
            lines: VecDeque::new(),
            partial: String::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Append text at the cursor. `\n` completes the current line; a `\r`
    /// directly before it is dropped.
    pub fn append(&mut self, text: &str) {
        let mut rest = text;
        while let Some(pos) = rest.find('\n') {
            self.partial.push_str(&rest[..pos]);
            if self.partial.ends_with('\r') {
                self.partial.pop();
            }
            let line = std::mem::take(&mut self.partial);
            self.push_line(line);
            rest = &rest[pos + 1..];
        }
        self.partial.push_str(rest);
    }

    fn push_line(&mut self, line: String) {
        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Number of completed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if nothing has been written since the last clear.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.partial.is_empty()
    }

    /// Retrieve a completed line by index (`0` = oldest).
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// The line still being written.
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Iterate over completed lines (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// The whole transcript, lines joined with `\n`, partial line last.
    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.partial);
        out
    }

    /// Remove all stored text.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.partial.clear();
    }

    /// Find `pattern` in completed lines and the partial line.
    ///
    /// Returns `(line_index, byte_column)` pairs; the partial line has index
    /// `len()`.
    pub fn search(&self, pattern: &str) -> Vec<(usize, usize)> {
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        let all = self.lines.iter().map(String::as_str).chain([self.partial.as_str()]);
        for (line_idx, text) in all.enumerate() {
            for (col, _) in text.match_indices(pattern) {
                results.push((line_idx, col));
            }
        }
        results
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Scrollback::new(DEFAULT_MAX_LINES)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
