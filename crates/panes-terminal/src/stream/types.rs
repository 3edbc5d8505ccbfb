//! Value types shared by the session stream and its transports.

use std::fmt;
use std::sync::Arc;

/// Lifecycle of one session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Identity token of one stream construction within a pane.
///
/// Every new stream gets the next generation; deliveries carry the
/// generation they were produced under and are discarded when it is no
/// longer current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Opened,
    Data(String),
    Error(String),
    /// The remote end closed the connection.
    Closed,
}

/// A [`StreamEvent`] tagged with the generation of the stream it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub generation: Generation,
    pub event: StreamEvent,
}

/// Where a transport posts its events.
///
/// Cloneable and callable from any thread; the pane's inbox sits behind it.
#[derive(Clone)]
pub struct DeliverySink {
    generation: Generation,
    deliver: Arc<dyn Fn(Delivery) + Send + Sync>,
}

impl DeliverySink {
    pub fn new(generation: Generation, deliver: impl Fn(Delivery) + Send + Sync + 'static) -> Self {
        Self {
            generation,
            deliver: Arc::new(deliver),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn post(&self, event: StreamEvent) {
        (self.deliver)(Delivery {
            generation: self.generation,
            event,
        });
    }

    pub fn opened(&self) {
        self.post(StreamEvent::Opened);
    }

    pub fn data(&self, text: impl Into<String>) {
        self.post(StreamEvent::Data(text.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(StreamEvent::Error(message.into()));
    }

    pub fn closed(&self) {
        self.post(StreamEvent::Closed);
    }
}

impl fmt::Debug for DeliverySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliverySink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
