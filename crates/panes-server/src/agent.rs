//! Line-oriented agent sessions on `/ws/{agent}`.
//!
//! Local agents are long-lived child processes shared by every connection
//! to the same name: their output lines stream back, each received message
//! is one stdin line. Remote agents get one `POST /execute` per message.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use panes_common::{ExecuteReply, ExecuteRequest};
use panes_config::schema::{AgentMode, AgentsConfig};

use crate::agent_store::{AgentOutput, AgentStore};
use crate::connection::{close_frame, ServerContext, WsSink, WsSource};

/// Serve one agent connection until either side closes.
pub async fn serve_agent(
    mut ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    name: String,
    ctx: &ServerContext,
    shutdown: watch::Receiver<bool>,
) {
    if !ctx.allowed_agents.iter().any(|allowed| *allowed == name) {
        tracing::info!(peer = %addr, agent = %name, "rejecting unknown agent");
        let _ = ws.send(close_frame(CloseCode::Policy, "unknown agent")).await;
        return;
    }

    tracing::info!(peer = %addr, agent = %name, mode = ?ctx.agents.mode, "agent connection opened");
    let (sink, stream) = ws.split();

    match ctx.agents.mode {
        AgentMode::Local => serve_local(sink, stream, &name, &ctx.agent_processes, shutdown).await,
        AgentMode::Remote => {
            serve_remote(sink, stream, &name, &ctx.agents, &ctx.http, shutdown).await
        }
    }

    tracing::info!(peer = %addr, agent = %name, "agent connection closed");
}

// =============================================================================
// LOCAL PROCESSES
// =============================================================================

async fn serve_local(
    mut sink: WsSink,
    mut stream: WsSource,
    name: &str,
    store: &AgentStore,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attachment = match store.attach(name).await {
        Ok(attachment) => attachment,
        Err(e) => {
            tracing::warn!(agent = %name, error = %e, "failed to start agent");
            let _ = sink.send(close_frame(CloseCode::Error, "agent unavailable")).await;
            return;
        }
    };
    tracing::info!(agent = %name, pid = ?attachment.process().pid(), "attached to agent process");

    for line in attachment.take_replay() {
        if sink.send(Message::Text(terminal_line(&line).into())).await.is_err() {
            return;
        }
    }
    if attachment.finished() {
        let _ = sink.send(close_frame(CloseCode::Normal, "agent exited")).await;
        return;
    }

    loop {
        tokio::select! {
            output = attachment.output.recv() => match output {
                Ok(AgentOutput::Line(line)) => {
                    if sink.send(Message::Text(terminal_line(&line).into())).await.is_err() {
                        break;
                    }
                }
                Ok(AgentOutput::Exited) | Err(RecvError::Closed) => {
                    let _ = sink.send(close_frame(CloseCode::Normal, "agent exited")).await;
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(agent = %name, skipped, "agent connection lagged, skipping output");
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let line = strip_line_ending(text.as_str());
                    if let Err(e) = attachment.process().send_line(line).await {
                        tracing::warn!(agent = %name, error = %e, "agent stdin write failed");
                        let _ = sink.send(close_frame(CloseCode::Error, "agent unavailable")).await;
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(agent = %name, error = %e, "WS error");
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
}

// =============================================================================
// REMOTE AGENTS
// =============================================================================

async fn serve_remote(
    mut sink: WsSink,
    mut stream: WsSource,
    name: &str,
    agents: &AgentsConfig,
    http: &reqwest::Client,
    mut shutdown: watch::Receiver<bool>,
) {
    let Some(base_url) = agents.remote_urls.get(name) else {
        tracing::warn!(agent = %name, "no remote URL configured");
        let _ = sink.send(close_frame(CloseCode::Policy, "unknown agent")).await;
        return;
    };
    let api_key = api_key_for(agents, name);

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let request = ExecuteRequest {
                        input: strip_line_ending(text.as_str()).to_string(),
                        api_key: api_key.clone(),
                    };
                    let reply = execute_remote(http, base_url, &request).await;
                    if let Err(e) = &reply {
                        tracing::warn!(agent = %name, url = %base_url, error = %e, "remote agent call failed");
                    }
                    let rendered = render_reply(reply.map_err(|e| e.to_string()));
                    if sink.send(Message::Text(rendered.into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(agent = %name, error = %e, "WS error");
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
}

/// POST one prompt to `{base_url}/execute`.
pub async fn execute_remote(
    http: &reqwest::Client,
    base_url: &str,
    request: &ExecuteRequest,
) -> Result<ExecuteReply, reqwest::Error> {
    let url = format!("{}/execute", base_url.trim_end_matches('/'));
    http.post(url).json(request).send().await?.json().await
}

/// The credential for `name`, read from the environment variable mapped to
/// it in `[agents.api_key_env]`.
fn api_key_for(agents: &AgentsConfig, name: &str) -> Option<String> {
    let var = agents.api_key_env.get(name)?;
    std::env::var(var).ok().filter(|key| !key.is_empty())
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

fn strip_line_ending(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

fn terminal_line(line: &str) -> String {
    format!("{line}\r\n")
}

/// Render an `/execute` reply for a terminal: CRLF line endings, errors as a
/// bracketed diagnostic line.
fn render_reply(reply: Result<ExecuteReply, String>) -> String {
    match reply {
        Ok(ExecuteReply {
            output: Some(output),
            ..
        }) => {
            let mut text = output.replace("\r\n", "\n").replace('\n', "\r\n");
            if !text.ends_with("\r\n") {
                text.push_str("\r\n");
            }
            text
        }
        Ok(ExecuteReply {
            error: Some(message),
            ..
        })
        | Err(message) => format!("[agent error: {message}]\r\n"),
        Ok(_) => "\r\n".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
