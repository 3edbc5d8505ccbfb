//! Per-pane history of submitted lines with cursor navigation.
//!
//! Owns the staged (not yet submitted) line as well, since history
//! navigation overwrites it. Nothing here is persisted; the history lives and
//! dies with its pane.

/// Submitted lines plus the navigation cursor and the staged line.
///
/// `cursor` counts back from the newest entry: `Some(0)` is the most recent
/// submission, `None` means "not browsing".
#[derive(Debug, Clone, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    staged: String,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line. Stops browsing and clears the staged line.
    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        self.cursor = None;
        self.staged.clear();
    }

    /// Step one entry further into the past and stage it.
    ///
    /// Clamps at the oldest entry. On an empty history nothing changes.
    /// Returns the staged line after the step.
    pub fn older(&mut self) -> &str {
        if self.entries.is_empty() {
            return &self.staged;
        }
        let last = self.entries.len() - 1;
        let cursor = match self.cursor {
            None => 0,
            Some(c) => (c + 1).min(last),
        };
        self.select(cursor);
        &self.staged
    }

    /// Step one entry towards the present.
    ///
    /// Leaving the newest entry stops browsing and empties the staged line.
    /// When not browsing this is a no-op. Returns the staged line after the
    /// step.
    pub fn newer(&mut self) -> &str {
        match self.cursor {
            None => {}
            Some(0) => {
                self.cursor = None;
                self.staged.clear();
            }
            Some(c) => self.select(c - 1),
        }
        &self.staged
    }

    fn select(&mut self, cursor: usize) {
        let index = self.entries.len() - 1 - cursor;
        self.cursor = Some(cursor);
        self.staged.clone_from(&self.entries[index]);
    }

    /// The line currently shown in the input control.
    pub fn staged(&self) -> &str {
        &self.staged
    }

    /// Direct typing. Replaces the staged text; the cursor stays where it is.
    pub fn set_staged(&mut self, text: impl Into<String>) {
        self.staged = text.into();
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Submitted lines, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
