//! Line-oriented prompt input: key handling over the staged line.
//!
//! Arrow keys browse the [`InputHistory`]; printable keys and pastes edit the
//! staged line; Enter submits unless a modifier asks for a literal newline.
//! Nothing here touches the terminal surface or the session.

use crate::history::InputHistory;

/// A key event from the prompt's input control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Paste(String),
    Backspace,
    Up,
    Down,
    /// Enter. With `newline_modifier` (Shift+Enter) a newline is inserted
    /// instead of submitting.
    Enter { newline_modifier: bool },
}

/// What a key did to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    /// The staged line changed.
    Edited,
    /// Enter on a non-empty staged line. The caller performs the submission.
    Submit(String),
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct PromptInput {
    history: InputHistory,
}

impl PromptInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&mut self, key: Key) -> PromptAction {
        match key {
            Key::Char(c) => {
                let mut staged = self.history.staged().to_string();
                staged.push(c);
                self.history.set_staged(staged);
                PromptAction::Edited
            }
            Key::Paste(text) => {
                if text.is_empty() {
                    return PromptAction::Unchanged;
                }
                let staged = format!("{}{text}", self.history.staged());
                self.history.set_staged(staged);
                PromptAction::Edited
            }
            Key::Backspace => {
                let mut staged = self.history.staged().to_string();
                if staged.pop().is_none() {
                    return PromptAction::Unchanged;
                }
                self.history.set_staged(staged);
                PromptAction::Edited
            }
            Key::Up => {
                let before = self.history.staged().to_string();
                Self::changed(before, self.history.older())
            }
            Key::Down => {
                let before = self.history.staged().to_string();
                Self::changed(before, self.history.newer())
            }
            Key::Enter {
                newline_modifier: true,
            } => self.key(Key::Char('\n')),
            Key::Enter {
                newline_modifier: false,
            } => {
                if self.history.staged().is_empty() {
                    PromptAction::Unchanged
                } else {
                    PromptAction::Submit(self.history.staged().to_string())
                }
            }
        }
    }

    fn changed(before: String, after: &str) -> PromptAction {
        if before == after {
            PromptAction::Unchanged
        } else {
            PromptAction::Edited
        }
    }

    pub fn staged(&self) -> &str {
        self.history.staged()
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut InputHistory {
        &mut self.history
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(prompt: &mut PromptInput, text: &str) {
        for c in text.chars() {
            prompt.key(Key::Char(c));
        }
    }

    #[test]
    fn typing_builds_the_staged_line() {
        let mut prompt = PromptInput::new();
        type_str(&mut prompt, "lss");
        assert_eq!(prompt.key(Key::Backspace), PromptAction::Edited);
        assert_eq!(prompt.staged(), "ls");
    }

    #[test]
    fn backspace_on_empty_is_unchanged() {
        let mut prompt = PromptInput::new();
        assert_eq!(prompt.key(Key::Backspace), PromptAction::Unchanged);
    }

    #[test]
    fn enter_submits_staged_line() {
        let mut prompt = PromptInput::new();
        type_str(&mut prompt, "hello");
        assert_eq!(
            prompt.key(Key::Enter {
                newline_modifier: false
            }),
            PromptAction::Submit("hello".into())
        );
        // Recording the submission is the caller's job.
        assert!(prompt.history().is_empty());
    }

    #[test]
    fn enter_on_empty_line_is_ignored() {
        let mut prompt = PromptInput::new();
        assert_eq!(
            prompt.key(Key::Enter {
                newline_modifier: false
            }),
            PromptAction::Unchanged
        );
    }

    #[test]
    fn modified_enter_inserts_newline() {
        let mut prompt = PromptInput::new();
        type_str(&mut prompt, "line one");
        prompt.key(Key::Enter {
            newline_modifier: true,
        });
        type_str(&mut prompt, "line two");
        assert_eq!(prompt.staged(), "line one\nline two");
    }

    #[test]
    fn paste_appends_verbatim() {
        let mut prompt = PromptInput::new();
        type_str(&mut prompt, "echo ");
        assert_eq!(
            prompt.key(Key::Paste("a b\tc".into())),
            PromptAction::Edited
        );
        assert_eq!(prompt.staged(), "echo a b\tc");
        assert_eq!(prompt.key(Key::Paste(String::new())), PromptAction::Unchanged);
    }

    #[test]
    fn arrows_browse_history() {
        let mut prompt = PromptInput::new();
        prompt.history_mut().append("ls -la");
        prompt.history_mut().append("pwd");

        assert_eq!(prompt.key(Key::Up), PromptAction::Edited);
        assert_eq!(prompt.staged(), "pwd");
        prompt.key(Key::Up);
        assert_eq!(prompt.key(Key::Up), PromptAction::Unchanged);
        assert_eq!(prompt.staged(), "ls -la");
        prompt.key(Key::Down);
        assert_eq!(prompt.key(Key::Down), PromptAction::Edited);
        assert_eq!(prompt.staged(), "");
        assert_eq!(prompt.key(Key::Down), PromptAction::Unchanged);
    }

    #[test]
    fn typing_wins_over_browsing() {
        let mut prompt = PromptInput::new();
        prompt.history_mut().append("git status");
        prompt.key(Key::Up);
        type_str(&mut prompt, " -s");
        assert_eq!(prompt.staged(), "git status -s");
    }
}
