//! Session stream: one transport connection to a backend session.
//!
//! A [`Connector`] establishes the transport asynchronously and reports
//! through a [`DeliverySink`]; the owning pane feeds those deliveries back
//! into [`SessionStream::dispatch`] on its own event loop. The stream never
//! retries. Reconnecting means opening a new stream under a new
//! [`Generation`].

mod memory;
mod types;
mod ws;


pub use memory::MemoryConnector;
pub use types::{ConnectionState, Delivery, DeliverySink, Generation, StreamEvent};
pub use ws::WsConnector;

use panes_common::{SessionError, SessionKey};

// =============================================================================
// TRANSPORT SEAM
// =============================================================================

/// Establishes transports to backend sessions.
pub trait Connector: Send + Sync {
    /// Start connecting to the session addressed by `key`.
    ///
    /// Must not block. Completion or failure is reported later through
    /// `sink`; so is every inbound chunk, in arrival order.
    fn connect(&self, key: &SessionKey, sink: DeliverySink) -> Box<dyn TransportLink>;
}

/// The outbound half of an established (or establishing) transport.
pub trait TransportLink: Send {
    fn send(&mut self, text: String) -> Result<(), SessionError>;

    /// Ask the transport to shut down. Further events may still be posted to
    /// the sink; they are discarded by generation.
    fn close(&mut self);
}

// =============================================================================
// SESSION STREAM
// =============================================================================

/// Result of feeding one [`Delivery`] to a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Opened,
    /// Data was handed to the data handler.
    Delivered,
    Errored(String),
    /// The remote end closed the connection.
    Closed,
    /// The delivery belongs to a superseded stream.
    Stale,
    /// Current generation, but nothing to do in the stream's state.
    Ignored,
}

type DataHandler = Box<dyn FnMut(&str) + Send>;

pub struct SessionStream {
    key: SessionKey,
    generation: Generation,
    state: ConnectionState,
    link: Option<Box<dyn TransportLink>>,
    on_data: Option<DataHandler>,
}

impl SessionStream {
    /// Start a stream to `key`. Events come back through `sink`, tagged with
    /// its generation.
    pub fn open(connector: &dyn Connector, key: SessionKey, sink: DeliverySink) -> Self {
        let generation = sink.generation();
        tracing::debug!(session = %key, %generation, "opening session stream");
        let link = connector.connect(&key, sink);
        Self {
            key,
            generation,
            state: ConnectionState::Connecting,
            link: Some(link),
            on_data: None,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Register the inbound-data handler. Replaces any previous one.
    pub fn on_data(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.on_data = Some(Box::new(handler));
    }

    /// Queue `text` on the transport. A no-op unless the stream is open;
    /// returns whether the text was handed to the transport.
    pub fn send(&mut self, text: &str) -> bool {
        if self.state != ConnectionState::Open {
            tracing::debug!(session = %self.key, state = %self.state, "send on inactive stream dropped");
            return false;
        }
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        match link.send(text.to_string()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(session = %self.key, error = %e, "transport refused send");
                false
            }
        }
    }

    /// Close the stream. Only the first call has an effect; returns whether
    /// this call closed it.
    pub fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Closed;
        self.on_data = None;
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        tracing::debug!(session = %self.key, generation = %self.generation, "session stream closed");
        true
    }

    /// Apply one transport event.
    pub fn dispatch(&mut self, delivery: Delivery) -> Dispatch {
        if delivery.generation != self.generation {
            tracing::trace!(
                session = %self.key,
                current = %self.generation,
                stale = %delivery.generation,
                "stale delivery discarded"
            );
            return Dispatch::Stale;
        }

        match (self.state, delivery.event) {
            (ConnectionState::Connecting, StreamEvent::Opened) => {
                self.state = ConnectionState::Open;
                Dispatch::Opened
            }
            (ConnectionState::Open, StreamEvent::Data(text)) => {
                if let Some(handler) = self.on_data.as_mut() {
                    handler(&text);
                }
                Dispatch::Delivered
            }
            (ConnectionState::Connecting | ConnectionState::Open, StreamEvent::Error(message)) => {
                self.state = ConnectionState::Errored;
                if let Some(mut link) = self.link.take() {
                    link.close();
                }
                Dispatch::Errored(message)
            }
            (ConnectionState::Connecting | ConnectionState::Open, StreamEvent::Closed) => {
                self.state = ConnectionState::Closed;
                self.on_data = None;
                self.link = None;
                Dispatch::Closed
            }
            (state, event) => {
                tracing::trace!(session = %self.key, %state, ?event, "delivery ignored");
                Dispatch::Ignored
            }
        }
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
        }
    }
}

impl std::fmt::Debug for SessionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStream")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("state", &self.state)
            .finish()
    }
}
