//! WebSocket transport to the backend's `/ws-shell/{key}` endpoint.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use panes_common::{SessionError, SessionKey};

use super::{Connector, DeliverySink, TransportLink};

/// Connects panes to a backend over WebSocket, one connection per stream.
///
/// Needs a running tokio runtime; without one the stream errors right away.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    /// `base_url` is the backend origin, e.g. `ws://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The endpoint for one session.
    pub fn endpoint(&self, key: &SessionKey) -> String {
        format!("{}/ws-shell/{}", self.base_url.trim_end_matches('/'), key)
    }
}

impl Connector for WsConnector {
    fn connect(&self, key: &SessionKey, sink: DeliverySink) -> Box<dyn TransportLink> {
        let (tx, rx) = mpsc::unbounded_channel();
        let url = self.endpoint(key);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_connection(url, sink, rx));
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "no async runtime for websocket transport");
                sink.error(format!("cannot connect to {url}: no async runtime"));
            }
        }

        Box::new(WsLink { tx })
    }
}

enum Outbound {
    Text(String),
    Close,
}

struct WsLink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl TransportLink for WsLink {
    fn send(&mut self, text: String) -> Result<(), SessionError> {
        self.tx
            .send(Outbound::Text(text))
            .map_err(|_| SessionError::Closed)
    }

    fn close(&mut self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Drive one connection: connect, then forward in both directions until
/// either side closes.
async fn run_connection(url: String, events: DeliverySink, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    tracing::info!(url = %url, generation = %events.generation(), "connecting session transport");

    let ws = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((ws, _)) => ws,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "session transport connect failed");
                events.error(format!("cannot connect to {url}: {e}"));
                return;
            }
        },
        // Closed (or dropped) before the handshake finished.
        _ = rx.recv() => {
            tracing::debug!(url = %url, "session transport abandoned while connecting");
            return;
        }
    };

    events.opened();
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::warn!(url = %url, error = %e, "session transport send failed");
                        events.error(format!("send failed: {e}"));
                        return;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.close().await;
                    tracing::debug!(url = %url, "session transport closed locally");
                    return;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => events.data(text.as_str()),
                Some(Ok(Message::Binary(data))) => {
                    events.data(String::from_utf8_lossy(&data).into_owned());
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(url = %url, "session transport closed by backend");
                    events.closed();
                    return;
                }
                Some(Err(e)) => {
                    tracing::warn!(url = %url, error = %e, "session transport error");
                    events.error(format!("connection lost: {e}"));
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
