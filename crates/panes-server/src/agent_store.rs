//! Local agent processes: one long-lived child per agent name, shared by
//! every connection to `/ws/{agent}`.
//!
//! Output lines are kept in a bounded backlog and published on a broadcast
//! channel. A connection that attaches later first replays the backlog, so
//! the startup banner and earlier replies survive a reconnect.

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{broadcast, Mutex as AsyncMutex, RwLock};

use panes_common::{PanesError, SessionError};

/// Environment variable naming the agent a local process serves.
const AGENT_NAME_ENV: &str = "PANES_AGENT";

/// Events published by an agent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput {
    /// One line of stdout or stderr, without its line ending.
    Line(String),
    /// Both output pipes closed.
    Exited,
}

struct Backlog {
    lines: VecDeque<String>,
    exited: bool,
}

// =============================================================================
// PROCESS
// =============================================================================

pub struct AgentProcess {
    name: String,
    pid: Option<u32>,
    stdin: AsyncMutex<ChildStdin>,
    child: AsyncMutex<Child>,
    output: broadcast::Sender<AgentOutput>,
    backlog: Mutex<Backlog>,
    capacity: usize,
}

impl AgentProcess {
    fn spawn(name: &str, command: &[String], capacity: usize) -> Result<Arc<Self>, PanesError> {
        let Some((program, args)) = command.split_first() else {
            return Err(SessionError::Spawn("no agent command configured".into()).into());
        };

        let mut child = Command::new(program)
            .args(args)
            .env(AGENT_NAME_ENV, name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Spawn(format!("{program}: {e}")))?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(SessionError::Spawn(format!("{program}: pipes unavailable")).into());
        };

        let (output, _) = broadcast::channel(capacity);
        let process = Arc::new(Self {
            name: name.to_string(),
            pid: child.id(),
            stdin: AsyncMutex::new(stdin),
            child: AsyncMutex::new(child),
            output,
            backlog: Mutex::new(Backlog {
                lines: VecDeque::new(),
                exited: false,
            }),
            capacity,
        });
        tokio::spawn(pump_output(process.clone(), stdout, stderr));

        tracing::info!(agent = %name, pid = ?process.pid, "agent process started");
        Ok(process)
    }

    fn backlog(&self) -> MutexGuard<'_, Backlog> {
        self.backlog.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_finished(&self) -> bool {
        self.backlog().exited
    }

    /// Write `text` plus a newline to the agent's stdin.
    pub async fn send_line(&self, text: &str) -> Result<(), PanesError> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(format!("{text}\n").as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    // Backlog and broadcast change under one lock, so an attaching
    // connection sees every line exactly once.
    fn publish(&self, line: String) {
        let mut backlog = self.backlog();
        if backlog.lines.len() == self.capacity {
            backlog.lines.pop_front();
        }
        backlog.lines.push_back(line.clone());
        let _ = self.output.send(AgentOutput::Line(line));
    }

    fn finish(&self) {
        let mut backlog = self.backlog();
        backlog.exited = true;
        let _ = self.output.send(AgentOutput::Exited);
        tracing::info!(agent = %self.name, pid = ?self.pid, "agent process output closed");
    }

    fn attach(self: &Arc<Self>) -> AgentAttachment {
        let backlog = self.backlog();
        AgentAttachment {
            process: self.clone(),
            replay: backlog.lines.iter().cloned().collect(),
            finished: backlog.exited,
            output: self.output.subscribe(),
        }
    }

    async fn kill(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            tracing::debug!(agent = %self.name, error = %e, "agent kill error (may already be dead)");
        }
    }
}

impl std::fmt::Debug for AgentProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentProcess")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .finish()
    }
}

/// Read both pipes until each is closed. Stderr is drained even after
/// stdout ends.
async fn pump_output(process: Arc<AgentProcess>, stdout: ChildStdout, stderr: ChildStderr) {
    let mut stdout = BufReader::new(stdout).lines();
    let mut stderr = BufReader::new(stderr).lines();
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout.next_line(), if stdout_open => match line {
                Ok(Some(line)) => process.publish(line),
                Ok(None) => stdout_open = false,
                Err(e) => {
                    tracing::warn!(agent = %process.name, error = %e, "agent stdout read failed");
                    stdout_open = false;
                }
            },

            line = stderr.next_line(), if stderr_open => match line {
                Ok(Some(line)) => process.publish(line),
                Ok(None) => stderr_open = false,
                Err(e) => {
                    tracing::warn!(agent = %process.name, error = %e, "agent stderr read failed");
                    stderr_open = false;
                }
            },
        }
    }

    process.finish();
}

/// One connection's view of an agent process.
pub struct AgentAttachment {
    process: Arc<AgentProcess>,
    replay: Vec<String>,
    finished: bool,
    pub output: broadcast::Receiver<AgentOutput>,
}

impl std::fmt::Debug for AgentAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAttachment")
            .field("replay", &self.replay)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl AgentAttachment {
    pub fn process(&self) -> &AgentProcess {
        &self.process
    }

    /// Lines published before this attachment existed. Empty after the
    /// first call.
    pub fn take_replay(&mut self) -> Vec<String> {
        std::mem::take(&mut self.replay)
    }

    /// The process had already exited when this attachment was made.
    pub fn finished(&self) -> bool {
        self.finished
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Thread-safe map of agent processes by name.
#[derive(Clone)]
pub struct AgentStore {
    processes: Arc<RwLock<HashMap<String, Arc<AgentProcess>>>>,
    command: Arc<[String]>,
    capacity: usize,
}

impl AgentStore {
    /// `capacity` bounds both the replay backlog and the output backlog of
    /// a slow connection.
    pub fn new(command: Vec<String>, capacity: usize) -> Self {
        Self {
            processes: Arc::new(RwLock::new(HashMap::new())),
            command: command.into(),
            capacity: capacity.max(1),
        }
    }

    /// Attach to the process for `name`, spawning it if there is none or
    /// the previous one has exited.
    pub async fn attach(&self, name: &str) -> Result<AgentAttachment, PanesError> {
        let mut map = self.processes.write().await;

        if let Some(existing) = map.get(name) {
            if !existing.is_finished() {
                tracing::debug!(agent = %name, pid = ?existing.pid(), "re-attaching to agent");
                return Ok(existing.attach());
            }
            tracing::info!(agent = %name, "agent exited, replacing");
            map.remove(name);
        }

        let process = AgentProcess::spawn(name, &self.command, self.capacity)?;
        let attachment = process.attach();
        map.insert(name.to_string(), process);
        Ok(attachment)
    }

    /// Start a process for every name that has none. Returns how many
    /// started; failures are logged.
    pub async fn start_all(&self, names: &[String]) -> usize {
        let mut map = self.processes.write().await;
        let mut started = 0;
        for name in names {
            if map.get(name).is_some_and(|process| !process.is_finished()) {
                continue;
            }
            match AgentProcess::spawn(name, &self.command, self.capacity) {
                Ok(process) => {
                    map.insert(name.clone(), process);
                    started += 1;
                }
                Err(e) => tracing::warn!(agent = %name, error = %e, "failed to start agent"),
            }
        }
        started
    }

    /// Kill every agent process. Used during graceful shutdown.
    pub async fn kill_all(&self) {
        let processes: Vec<_> = self.processes.write().await.drain().collect();
        let count = processes.len();
        for (_, process) in processes {
            process.kill().await;
        }
        tracing::info!(count, "all agent processes killed");
    }

    /// Number of tracked processes.
    pub async fn count(&self) -> usize {
        self.processes.read().await.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    use std::time::Duration;

    fn echo_command() -> Vec<String> {
        vec![
            "sh".into(),
            "-c".into(),
            "echo \"pid $$\"; while IFS= read -r line; do echo \"ECHO: $line\"; done".into(),
        ]
    }

    async fn read_until(attachment: &mut AgentAttachment, marker: &str) -> Vec<String> {
        let mut seen = attachment.take_replay();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        while !seen.iter().any(|line| line.contains(marker)) {
            match tokio::time::timeout_at(deadline, attachment.output.recv()).await {
                Ok(Ok(AgentOutput::Line(line))) => seen.push(line),
                Ok(Ok(AgentOutput::Exited)) | Ok(Err(_)) | Err(_) => break,
            }
        }
        seen
    }

    #[tokio::test]
    async fn reattach_shares_the_process_and_replays_output() {
        let store = AgentStore::new(echo_command(), 64);

        let mut first = store.attach("pm").await.unwrap();
        let pid = first.process().pid();
        first.process().send_line("first").await.unwrap();
        let seen = read_until(&mut first, "ECHO: first").await;
        assert!(seen.contains(&"ECHO: first".to_string()), "got: {seen:?}");
        drop(first);

        let mut second = store.attach("pm").await.unwrap();
        assert_eq!(second.process().pid(), pid);
        assert_eq!(store.count().await, 1);

        let replay = second.take_replay();
        assert_eq!(replay.iter().filter(|line| line.starts_with("pid ")).count(), 1);
        assert!(replay.contains(&"ECHO: first".to_string()), "got: {replay:?}");

        second.process().send_line("second").await.unwrap();
        let seen = read_until(&mut second, "ECHO: second").await;
        assert!(seen.contains(&"ECHO: second".to_string()), "got: {seen:?}");

        store.kill_all().await;
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn stderr_after_stdout_closes_is_kept() {
        let command = vec![
            "sh".into(),
            "-c".into(),
            "exec 1>&-; sleep 0.1; echo LATE_STDERR >&2".into(),
        ];
        let store = AgentStore::new(command, 16);
        let mut attachment = store.attach("pm").await.unwrap();

        let seen = read_until(&mut attachment, "LATE_STDERR").await;
        assert!(seen.contains(&"LATE_STDERR".to_string()), "got: {seen:?}");
    }

    #[tokio::test]
    async fn exited_process_is_replaced() {
        let command = vec!["sh".into(), "-c".into(), "echo bye".into()];
        let store = AgentStore::new(command, 16);

        let mut first = store.attach("pm").await.unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        loop {
            match tokio::time::timeout_at(deadline, first.output.recv()).await {
                Ok(Ok(AgentOutput::Exited)) => break,
                Ok(Ok(_)) => {}
                other => panic!("agent never exited: {other:?}"),
            }
        }
        assert!(first.process().is_finished());

        let second = store.attach("pm").await.unwrap();
        assert!(!std::ptr::eq(first.process(), second.process()));
        assert!(!second.process().is_finished());
    }

    #[tokio::test]
    async fn start_all_skips_running_agents() {
        let store = AgentStore::new(echo_command(), 16);
        let names = vec!["pm".to_string(), "frontend".to_string()];

        assert_eq!(store.start_all(&names).await, 2);
        assert_eq!(store.start_all(&names).await, 0);
        assert_eq!(store.count().await, 2);

        store.kill_all().await;
    }

    #[tokio::test]
    async fn missing_command_is_a_spawn_error() {
        let store = AgentStore::new(Vec::new(), 16);
        let err = store.attach("pm").await.unwrap_err();
        assert!(matches!(err, PanesError::Session(SessionError::Spawn(_))));
    }
}
