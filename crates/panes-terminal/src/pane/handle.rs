use tokio::sync::mpsc;

use panes_common::SessionKey;
use panes_config::TerminalTheme;

use super::PaneEvent;
use crate::prompt::Key;
use crate::size::ContainerSize;

/// Posts events into a pane's inbox from outside its event loop.
///
/// Every method returns `false` once the pane is gone.
#[derive(Debug, Clone)]
pub struct PaneHandle {
    tx: mpsc::UnboundedSender<PaneEvent>,
}

impl PaneHandle {
    pub(super) fn new(tx: mpsc::UnboundedSender<PaneEvent>) -> Self {
        Self { tx }
    }

    pub fn post(&self, event: PaneEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn submit(&self, line: impl Into<String>) -> bool {
        self.post(PaneEvent::Submit(line.into()))
    }

    pub fn key(&self, key: Key) -> bool {
        self.post(PaneEvent::Key(key))
    }

    /// Raw keystrokes, routed through the surface's input handlers.
    pub fn raw_input(&self, data: impl Into<String>) -> bool {
        self.post(PaneEvent::RawInput(data.into()))
    }

    pub fn switch_session(&self, key: SessionKey) -> bool {
        self.post(PaneEvent::Switch(key))
    }

    pub fn reconnect(&self) -> bool {
        self.post(PaneEvent::Reconnect)
    }

    pub fn resize(&self, container: ContainerSize) -> bool {
        self.post(PaneEvent::Resize(container))
    }

    pub fn restyle(&self, theme: TerminalTheme) -> bool {
        self.post(PaneEvent::Restyle(theme))
    }

    pub fn teardown(&self) -> bool {
        self.post(PaneEvent::Teardown)
    }
}
