//! `POST /execute`: run the agent CLI once per prompt and return its output.

use std::process::Stdio;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use panes_common::{ExecuteReply, ExecuteRequest, PanesError, ServiceStatus, SessionError};
use panes_config::schema::ExecuteConfig;

const HEALTH_STATUS: &str = "Agent service is running";

/// Build the sidecar's router.
pub fn router(config: ExecuteConfig) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/execute", post(execute))
        .with_state(Arc::new(config))
}

async fn health() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: HEALTH_STATUS.into(),
    })
}

async fn execute(
    State(config): State<Arc<ExecuteConfig>>,
    Json(request): Json<ExecuteRequest>,
) -> (StatusCode, Json<ExecuteReply>) {
    let api_key = resolve_api_key(&config, request.api_key.as_deref());
    if config.require_api_key && api_key.is_none() {
        tracing::info!("rejecting request without API key");
        return (
            StatusCode::BAD_REQUEST,
            Json(ExecuteReply::error("No API key")),
        );
    }

    match run_agent(&config, &request.input, api_key.as_deref()).await {
        Ok(output) => (StatusCode::OK, Json(ExecuteReply::output(output))),
        Err(e) => {
            tracing::warn!(program = %config.program, error = %e, "agent run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExecuteReply::error(e.to_string())),
            )
        }
    }
}

/// The request's credential, falling back to the sidecar's environment.
fn resolve_api_key(config: &ExecuteConfig, from_request: Option<&str>) -> Option<String> {
    from_request
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(&config.api_key_env).ok())
        .filter(|key| !key.is_empty())
}

/// Spawn the agent, feed it `prompt` plus a newline, and collect stdout
/// followed by stderr once it exits.
pub async fn run_agent(
    config: &ExecuteConfig,
    prompt: &str,
    api_key: Option<&str>,
) -> Result<String, PanesError> {
    let mut cmd = Command::new(&config.program);
    cmd.args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(key) = api_key {
        cmd.env(&config.api_key_env, key);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| SessionError::Spawn(format!("{}: {e}", config.program)))?;

    // Feed stdin while the output pipes are drained, so a large prompt
    // cannot stall against an agent that writes before it reads.
    let stdin = child.stdin.take();
    let input = format!("{prompt}\n");
    let feed = async move {
        if let Some(mut stdin) = stdin {
            // An agent that exits without reading its input is not an error.
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                tracing::debug!(error = %e, "agent closed stdin early");
            }
        }
    };

    let ((), output) = tokio::join!(feed, child.wait_with_output());
    let output = output?;
    tracing::debug!(status = %output.status, "agent exited");

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text.trim().to_string())
}
