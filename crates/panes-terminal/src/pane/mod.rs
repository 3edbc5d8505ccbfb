//! Pane controller: one session stream, one terminal surface, one history.
//!
//! State machine:
//!
//! ```text
//! Idle -> Connecting -> Ready -> Closing -> Closed
//!              |          |
//!              |          +-- switch_session --> Connecting
//!              +----------+-- error / remote close --> Failed
//!
//! Failed -- reconnect / switch_session --> Connecting
//! ```
//!
//! Each pane is a single-threaded event loop. Transport events and raw
//! keystrokes arrive in the pane's inbox tagged with the [`Generation`] they
//! were produced under; anything tagged with an older generation is dropped
//! before it can touch the current surface.
//!
//! Keystrokes captured by the surface's input handler are queued on the
//! pane itself and sent within the same dispatch step, so they keep their
//! place relative to submissions and teardown queued after them.

mod handle;


pub use handle::PaneHandle;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use panes_common::{SessionError, SessionKey};
use panes_config::TerminalTheme;

use crate::history::InputHistory;
use crate::prompt::{Key, PromptAction, PromptInput};
use crate::size::ContainerSize;
use crate::stream::{
    ConnectionState, Connector, Delivery, DeliverySink, Dispatch, Generation, SessionStream,
};
use crate::surface::{RenderBackend, SurfaceOptions, TerminalSurface};

/// Builds the render backend for each new surface.
pub type BackendFactory = Box<dyn FnMut() -> Box<dyn RenderBackend> + Send>;

/// Line terminator appended to every submitted line.
pub const LINE_TERMINATOR: &str = "\n\r";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    Idle,
    Connecting,
    Ready,
    /// The connection failed or the backend closed it. The pane stays
    /// mounted but inert until torn down or switched.
    Failed,
    Closing,
    Closed,
}

/// Everything a pane reacts to.
#[derive(Debug)]
pub enum PaneEvent {
    Stream(Delivery),
    /// Raw keystrokes captured by the surface of `generation`.
    Input { generation: Generation, data: String },
    /// Raw keystrokes for the current surface's input path.
    RawInput(String),
    Submit(String),
    Key(Key),
    Switch(SessionKey),
    Reconnect,
    Resize(ContainerSize),
    Restyle(TerminalTheme),
    Teardown,
}

/// Input captured by surface handlers, waiting to be sent.
type CapturedInput = Arc<Mutex<VecDeque<(Generation, String)>>>;

/// Outcome of a line submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Echoed, recorded and handed to the transport.
    Sent,
    /// Echoed and recorded, but the stream was not open.
    NotConnected,
    Empty,
}

pub struct PaneController {
    key: SessionKey,
    state: PaneState,
    connector: Arc<dyn Connector>,
    options: SurfaceOptions,
    make_backend: BackendFactory,
    generation: Generation,
    stream: Option<SessionStream>,
    surface: Option<TerminalSurface>,
    prompt: PromptInput,
    captured: CapturedInput,
    inbox_tx: mpsc::UnboundedSender<PaneEvent>,
    inbox_rx: mpsc::UnboundedReceiver<PaneEvent>,
}

impl PaneController {
    pub fn new(
        key: SessionKey,
        connector: Arc<dyn Connector>,
        options: SurfaceOptions,
        make_backend: BackendFactory,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            key,
            state: PaneState::Idle,
            connector,
            options,
            make_backend,
            generation: Generation::default(),
            stream: None,
            surface: None,
            prompt: PromptInput::new(),
            captured: CapturedInput::default(),
            inbox_tx,
            inbox_rx,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn state(&self) -> PaneState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn surface(&self) -> Option<&TerminalSurface> {
        self.surface.as_ref()
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.stream.as_ref().map(SessionStream::state)
    }

    pub fn staged(&self) -> &str {
        self.prompt.staged()
    }

    pub fn history(&self) -> &InputHistory {
        self.prompt.history()
    }

    pub fn is_closed(&self) -> bool {
        self.state == PaneState::Closed
    }

    /// A sender for posting events into this pane's inbox from elsewhere.
    pub fn handle(&self) -> PaneHandle {
        PaneHandle::new(self.inbox_tx.clone())
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Idle -> Connecting. No-op in any other state.
    pub fn mount(&mut self) {
        if self.state == PaneState::Idle {
            self.connect();
        }
    }

    /// Build a fresh surface and stream under the next generation.
    fn connect(&mut self) {
        self.generation = self.generation.next();
        let generation = self.generation;

        let surface = TerminalSurface::new(self.options.clone(), (self.make_backend)());
        let captured = self.captured.clone();
        surface.on_input(move |data| {
            captured
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push_back((generation, data.to_string()));
        });

        let inbox = self.inbox_tx.clone();
        let sink = DeliverySink::new(generation, move |delivery| {
            let _ = inbox.send(PaneEvent::Stream(delivery));
        });
        let mut stream = SessionStream::open(self.connector.as_ref(), self.key.clone(), sink);
        let target = surface.clone();
        stream.on_data(move |text| target.write(text));

        tracing::info!(session = %self.key, %generation, "pane connecting");
        self.surface = Some(surface);
        self.stream = Some(stream);
        self.state = PaneState::Connecting;
    }

    /// Close the stream and dispose the surface together.
    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
        if let Some(surface) = self.surface.take() {
            surface.dispose();
        }
    }

    /// Replace the session with one keyed by `key`.
    ///
    /// The old stream and surface are released before the new ones exist.
    /// Switching to the current key is a no-op; switching a torn-down pane is
    /// an error.
    pub fn switch_session(&mut self, key: SessionKey) -> Result<(), SessionError> {
        match self.state {
            PaneState::Closing | PaneState::Closed => return Err(SessionError::Closed),
            _ if key == self.key => return Ok(()),
            _ => {}
        }

        tracing::info!(from = %self.key, to = %key, "pane switching session");
        self.release();
        self.key = key;
        if self.state != PaneState::Idle {
            self.connect();
        }
        Ok(())
    }

    /// Re-open the current session under a new generation, e.g. after a
    /// failure. Returns `false` if the pane is idle or torn down.
    pub fn reconnect(&mut self) -> bool {
        if matches!(
            self.state,
            PaneState::Idle | PaneState::Closing | PaneState::Closed
        ) {
            return false;
        }
        tracing::info!(session = %self.key, "pane reconnecting");
        self.release();
        self.connect();
        true
    }

    /// Close the stream and dispose the surface. Only the first call has an
    /// effect; returns whether this call tore the pane down.
    pub fn teardown(&mut self) -> bool {
        if matches!(self.state, PaneState::Closing | PaneState::Closed) {
            return false;
        }
        self.state = PaneState::Closing;
        self.release();
        self.state = PaneState::Closed;
        tracing::info!(session = %self.key, "pane closed");
        true
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    pub fn handle_event(&mut self, event: PaneEvent) {
        if self.state == PaneState::Closed {
            tracing::trace!(session = %self.key, ?event, "event for closed pane dropped");
            return;
        }
        // Input fed to the surface from outside the loop goes first.
        self.flush_captured();

        match event {
            PaneEvent::Stream(delivery) => self.on_delivery(delivery),
            PaneEvent::Input { generation, data } => self.send_input(generation, &data),
            PaneEvent::RawInput(data) => {
                if let Some(surface) = &self.surface {
                    surface.input(&data);
                }
                self.flush_captured();
            }
            PaneEvent::Submit(line) => {
                self.submit(&line);
            }
            PaneEvent::Key(key) => {
                self.key_press(key);
            }
            PaneEvent::Switch(key) => {
                if let Err(e) = self.switch_session(key) {
                    tracing::debug!(session = %self.key, error = %e, "session switch refused");
                }
            }
            PaneEvent::Reconnect => {
                self.reconnect();
            }
            PaneEvent::Resize(container) => {
                self.resize_container(container);
            }
            PaneEvent::Restyle(theme) => self.restyle(theme),
            PaneEvent::Teardown => {
                self.teardown();
            }
        }
    }

    /// Send everything the surface handlers captured, in capture order.
    fn flush_captured(&mut self) {
        let pending: Vec<_> = self
            .captured
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for (generation, data) in pending {
            self.send_input(generation, &data);
        }
    }

    fn send_input(&mut self, generation: Generation, data: &str) {
        if generation != self.generation {
            tracing::trace!(session = %self.key, %generation, "stale input dropped");
            return;
        }
        if let Some(stream) = self.stream.as_mut() {
            stream.send(data);
        }
    }

    fn on_delivery(&mut self, delivery: Delivery) {
        let Some(stream) = self.stream.as_mut() else {
            tracing::trace!(session = %self.key, "delivery with no stream dropped");
            return;
        };

        match stream.dispatch(delivery) {
            Dispatch::Opened => {
                self.state = PaneState::Ready;
                tracing::info!(session = %self.key, generation = %self.generation, "pane ready");
            }
            Dispatch::Errored(message) => {
                tracing::warn!(session = %self.key, error = %message, "pane connection failed");
                self.diagnostic(&format!("[connection error: {message}]"));
                self.state = PaneState::Failed;
            }
            Dispatch::Closed => {
                tracing::info!(session = %self.key, "backend closed the session");
                self.diagnostic("[session closed]");
                self.state = PaneState::Failed;
            }
            Dispatch::Delivered | Dispatch::Stale | Dispatch::Ignored => {}
        }
    }

    fn diagnostic(&self, line: &str) {
        if let Some(surface) = &self.surface {
            surface.write_line(line);
        }
    }

    // =========================================================================
    // PROMPT
    // =========================================================================

    /// Submit one line: echo it locally, record it, then send it.
    ///
    /// The echo is written before the send is issued.
    pub fn submit(&mut self, line: &str) -> Submission {
        if line.is_empty() {
            return Submission::Empty;
        }
        let Some(surface) = &self.surface else {
            tracing::debug!(session = %self.key, "submission with no surface dropped");
            return Submission::NotConnected;
        };

        surface.write_line(&format!("> {line}"));
        self.prompt.history_mut().append(line);

        let sent = self
            .stream
            .as_mut()
            .is_some_and(|stream| stream.send(&format!("{line}{LINE_TERMINATOR}")));
        if sent {
            Submission::Sent
        } else {
            Submission::NotConnected
        }
    }

    /// Feed one prompt key. Enter on a non-empty line submits it.
    pub fn key_press(&mut self, key: Key) -> PromptAction {
        let action = self.prompt.key(key);
        if let PromptAction::Submit(line) = &action {
            self.submit(line);
        }
        action
    }

    // =========================================================================
    // GEOMETRY AND THEME
    // =========================================================================

    pub fn resize_container(&mut self, container: ContainerSize) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.observe_container(container))
    }

    /// Re-color the current surface. Surfaces built later use `theme` too.
    pub fn restyle(&mut self, theme: TerminalTheme) {
        if let Some(surface) = &self.surface {
            surface.restyle(theme.clone());
        }
        self.options.theme = theme;
    }

    // =========================================================================
    // EVENT LOOP
    // =========================================================================

    /// Handle everything already queued, without waiting. Returns how many
    /// events were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next inbox event.
    pub async fn next_event(&mut self) -> Option<PaneEvent> {
        self.inbox_rx.recv().await
    }

    /// Mount if needed, then handle events until the pane is closed.
    pub async fn run(&mut self) {
        self.mount();
        while !self.is_closed() {
            match self.inbox_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }
}

impl Drop for PaneController {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PaneController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneController")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}
