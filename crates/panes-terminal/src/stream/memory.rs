//! In-process transport for driving panes without a backend.
//!
//! Every `connect` call is recorded as a numbered connection. The holder of
//! the connector plays the backend: it opens, feeds, fails or hangs up any
//! connection, and inspects what the pane sent.

use std::sync::{Arc, Mutex, MutexGuard};

use panes_common::{SessionError, SessionKey};

use super::{Connector, DeliverySink, TransportLink};

type SendHook = Arc<dyn Fn(usize, &str) + Send + Sync>;

struct Connection {
    key: SessionKey,
    sink: DeliverySink,
    sent: Vec<String>,
    close_calls: usize,
}

#[derive(Default)]
struct Inner {
    connections: Vec<Connection>,
    refuse: bool,
    send_hook: Option<SendHook>,
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sink(&self, index: usize) -> Option<DeliverySink> {
        self.lock().connections.get(index).map(|c| c.sink.clone())
    }

    /// Number of `connect` calls so far.
    pub fn connections(&self) -> usize {
        self.lock().connections.len()
    }

    pub fn key(&self, index: usize) -> Option<SessionKey> {
        self.lock().connections.get(index).map(|c| c.key.clone())
    }

    /// Fail every subsequent connection attempt immediately.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse = refuse;
    }

    /// Called with the connection index and text on every accepted send,
    /// after it has been recorded.
    pub fn set_send_hook(&self, hook: impl Fn(usize, &str) + Send + Sync + 'static) {
        self.lock().send_hook = Some(Arc::new(hook));
    }

    // -- playing the backend ------------------------------------------------

    /// Report connection `index` as established.
    pub fn open(&self, index: usize) {
        if let Some(sink) = self.sink(index) {
            sink.opened();
        }
    }

    /// Deliver an inbound chunk on connection `index`.
    pub fn push(&self, index: usize, text: &str) {
        if let Some(sink) = self.sink(index) {
            sink.data(text);
        }
    }

    pub fn fail(&self, index: usize, message: &str) {
        if let Some(sink) = self.sink(index) {
            sink.error(message);
        }
    }

    /// Close connection `index` from the remote end.
    pub fn hang_up(&self, index: usize) {
        if let Some(sink) = self.sink(index) {
            sink.closed();
        }
    }

    // -- inspection ---------------------------------------------------------

    /// Everything the pane sent on connection `index`, in order.
    pub fn sent(&self, index: usize) -> Vec<String> {
        self.lock()
            .connections
            .get(index)
            .map(|c| c.sent.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.close_calls(index) > 0
    }

    /// How many times the pane asked connection `index` to close.
    pub fn close_calls(&self, index: usize) -> usize {
        self.lock()
            .connections
            .get(index)
            .map(|c| c.close_calls)
            .unwrap_or(0)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, key: &SessionKey, sink: DeliverySink) -> Box<dyn TransportLink> {
        let (index, refuse) = {
            let mut inner = self.lock();
            inner.connections.push(Connection {
                key: key.clone(),
                sink: sink.clone(),
                sent: Vec::new(),
                close_calls: 0,
            });
            (inner.connections.len() - 1, inner.refuse)
        };

        if refuse {
            sink.error("connection refused");
        }

        Box::new(MemoryLink {
            connector: self.clone(),
            index,
        })
    }
}

struct MemoryLink {
    connector: MemoryConnector,
    index: usize,
}

impl TransportLink for MemoryLink {
    fn send(&mut self, text: String) -> Result<(), SessionError> {
        let hook = {
            let mut inner = self.connector.lock();
            let hook = inner.send_hook.clone();
            let connection = inner
                .connections
                .get_mut(self.index)
                .ok_or_else(|| SessionError::UnknownSession(format!("connection {}", self.index)))?;
            if connection.close_calls > 0 {
                return Err(SessionError::Closed);
            }
            connection.sent.push(text.clone());
            hook
        };
        // Unlocked, so the hook may inspect the connector.
        if let Some(hook) = hook {
            hook(self.index, &text);
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(connection) = self.connector.lock().connections.get_mut(self.index) {
            connection.close_calls += 1;
        }
    }
}
