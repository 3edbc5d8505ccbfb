//! Per-connection handler: route by handshake path, then serve the shell or
//! agent session behind it.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::Instrument;

use panes_common::{connection_id, SessionKey};
use panes_config::schema::AgentsConfig;

use crate::agent::serve_agent;
use crate::agent_store::AgentStore;
use crate::pty::PtyOutput;
use crate::shell::ShellStore;

pub type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
pub type WsSource = SplitStream<WebSocketStream<TcpStream>>;

// =============================================================================
// CONTEXT
// =============================================================================

/// Everything a connection needs, cloned into each connection task.
#[derive(Clone)]
pub struct ServerContext {
    pub shells: ShellStore,
    pub agents: Arc<AgentsConfig>,
    pub agent_processes: AgentStore,
    pub allowed_agents: Arc<[String]>,
    pub http: reqwest::Client,
}

// =============================================================================
// ROUTING
// =============================================================================

/// What a handshake path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Shell(SessionKey),
    Agent(String),
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        if let Some(key) = path.strip_prefix("/ws-shell/") {
            return match SessionKey::new(key) {
                Ok(key) => Route::Shell(key),
                Err(_) => Route::NotFound,
            };
        }
        if let Some(agent) = path.strip_prefix("/ws/") {
            if !agent.is_empty() && !agent.contains('/') {
                return Route::Agent(agent.to_string());
            }
        }
        Route::NotFound
    }
}

fn not_found() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("no such endpoint".into()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// A close frame with a reason.
pub fn close_frame(code: CloseCode, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}

// =============================================================================
// CONNECTION
// =============================================================================

/// Handle a single TCP connection: WebSocket handshake, then the session.
/// Log lines from the connection carry a fresh `conn` id.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: ServerContext,
    shutdown: watch::Receiver<bool>,
) {
    let span = tracing::info_span!("conn", id = %connection_id());
    route_connection(stream, addr, ctx, shutdown)
        .instrument(span)
        .await
}

async fn route_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: ServerContext,
    shutdown: watch::Receiver<bool>,
) {
    let mut route = Route::NotFound;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        route = Route::parse(request.uri().path());
        if route == Route::NotFound {
            tracing::info!(peer = %addr, path = %request.uri().path(), "rejecting unknown path");
            Err(not_found())
        } else {
            Ok(response)
        }
    };

    let ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(peer = %addr, error = %e, "WS handshake failed");
            return;
        }
    };

    match route {
        Route::Shell(key) => serve_shell(ws, addr, key, &ctx.shells, shutdown).await,
        Route::Agent(name) => serve_agent(ws, addr, name, &ctx, shutdown).await,
        Route::NotFound => {}
    }
}

// =============================================================================
// SHELL SESSIONS
// =============================================================================

async fn serve_shell(
    mut ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    key: SessionKey,
    store: &ShellStore,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attachment = match store.attach(&key).await {
        Ok(attachment) => attachment,
        Err(e) => {
            tracing::warn!(session = %key, error = %e, "failed to start shell");
            let _ = ws
                .send(close_frame(CloseCode::Error, "failed to start shell"))
                .await;
            return;
        }
    };

    tracing::info!(
        peer = %addr,
        session = %key,
        attached = attachment.session().attached(),
        "shell connection attached"
    );

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            output = attachment.output.recv() => match output {
                Ok(PtyOutput::Data(text)) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(PtyOutput::Exited) | Err(RecvError::Closed) => {
                    let _ = sink.send(close_frame(CloseCode::Normal, "shell exited")).await;
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session = %key, skipped, "slow connection skipped shell output");
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = attachment.session().write_input(text.as_bytes()) {
                        tracing::warn!(session = %key, error = %e, "shell write failed");
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    if let Err(e) = attachment.session().write_input(&data) {
                        tracing::warn!(session = %key, error = %e, "shell write failed");
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(peer = %addr, error = %e, "WS error");
                    break;
                }
                _ => {}
            },

            _ = shutdown.changed() => {
                let _ = sink.send(close_frame(CloseCode::Away, "server shutting down")).await;
                break;
            }
        }
    }

    tracing::info!(peer = %addr, session = %key, "shell connection closed");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use panes_config::schema::ShellConfig;
    use tokio::net::TcpListener;
    use tokio_tungstenite::connect_async;

    #[test]
    fn shell_route_parses_key() {
        assert_eq!(
            Route::parse("/ws-shell/pm"),
            Route::Shell(SessionKey::new("pm").unwrap())
        );
    }

    #[test]
    fn agent_route_parses_name() {
        assert_eq!(Route::parse("/ws/frontend"), Route::Agent("frontend".into()));
    }

    #[test]
    fn other_paths_are_not_found() {
        assert_eq!(Route::parse("/"), Route::NotFound);
        assert_eq!(Route::parse("/ws/"), Route::NotFound);
        assert_eq!(Route::parse("/ws/a/b"), Route::NotFound);
        assert_eq!(Route::parse("/ws-shell/"), Route::NotFound);
        assert_eq!(Route::parse("/execute"), Route::NotFound);
    }

    /// Start a listener serving `ctx` and return its base URL.
    async fn serve(ctx: ServerContext) -> (String, watch::Sender<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                tokio::spawn(handle_connection(
                    stream,
                    peer,
                    ctx.clone(),
                    shutdown_rx.clone(),
                ));
            }
        });
        (format!("ws://{addr}"), shutdown_tx)
    }

    fn context() -> ServerContext {
        let shell = ShellConfig {
            program: "/bin/sh".into(),
            banner: "CONN_BANNER".into(),
            bootstrap: Vec::new(),
            ..Default::default()
        };
        ServerContext {
            shells: ShellStore::new(shell, 256),
            agents: Arc::new(AgentsConfig::default()),
            agent_processes: AgentStore::new(AgentsConfig::default().command, 16),
            allowed_agents: vec!["pm".to_string()].into(),
            http: reqwest::Client::new(),
        }
    }

    type ClientWs = WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

    async fn next_text(ws: &mut ClientWs, marker: &str) -> String {
        let mut seen = String::new();
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(3);
        while !seen.contains(marker) {
            match tokio::time::timeout_at(deadline, ws.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => seen.push_str(text.as_str()),
                Ok(Some(Ok(_))) => {}
                _ => break,
            }
        }
        seen
    }

    #[tokio::test]
    async fn unknown_path_is_rejected_at_handshake() {
        let (base, _shutdown) = serve(context()).await;
        assert!(connect_async(format!("{base}/nowhere")).await.is_err());
    }

    #[tokio::test]
    async fn unknown_agent_is_closed_with_policy() {
        let (base, _shutdown) = serve(context()).await;
        let (mut ws, _) = connect_async(format!("{base}/ws/intruder")).await.unwrap();
        match ws.next().await {
            Some(Ok(Message::Close(Some(frame)))) => assert_eq!(frame.code, CloseCode::Policy),
            other => panic!("expected policy close, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_echoes_typed_command() {
        let ctx = context();
        let shells = ctx.shells.clone();
        let (base, _shutdown) = serve(ctx).await;
        let (mut ws, _) = connect_async(format!("{base}/ws-shell/pm")).await.unwrap();

        let banner = next_text(&mut ws, "CONN_BANNER").await;
        assert!(banner.contains("CONN_BANNER"), "got: {banner}");

        ws.send(Message::Text("echo WS_SHELL_MARKER\n".into())).await.unwrap();
        let output = next_text(&mut ws, "WS_SHELL_MARKER").await;
        assert!(output.contains("WS_SHELL_MARKER"), "got: {output}");

        drop(ws);
        shells.kill_all().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_closes_shell_connections() {
        let ctx = context();
        let shells = ctx.shells.clone();
        let (base, shutdown) = serve(ctx).await;
        let (mut ws, _) = connect_async(format!("{base}/ws-shell/qa")).await.unwrap();
        next_text(&mut ws, "CONN_BANNER").await;

        shutdown.send(true).unwrap();
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(3);
        let mut code = None;
        while code.is_none() {
            match tokio::time::timeout_at(deadline, ws.next()).await {
                Ok(Some(Ok(Message::Close(Some(frame))))) => code = Some(frame.code),
                Ok(Some(Ok(_))) => {}
                _ => break,
            }
        }
        assert_eq!(code, Some(CloseCode::Away));
        shells.kill_all().await;
    }
}
