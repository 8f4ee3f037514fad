//! Process adapters for abstracting process management
//!
//! The supervisor talks to child processes through the [`ProcessAdapter`] and
//! [`SpawnedApp`] traits so the lifecycle engine can be exercised in tests
//! with mock processes. The real implementation is [`UnixProcessAdapter`],
//! backed by the process-group plumbing in `crate::process::unix`.

use crate::{process, CoreError, Result};
use async_trait::async_trait;
use schema::{AppEvent, AppExit, AppSpec};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Spawns managed app processes according to their spec
#[async_trait]
pub trait ProcessAdapter: Send + Sync {
    /// Spawn a new process for `spec`, piped and group-isolated
    async fn spawn(&self, spec: &AppSpec) -> Result<Box<dyn SpawnedApp>>;
}

/// Cheap handle for requesting termination of a spawned process
///
/// Held inside the record's `Running` state so `stop` can signal without
/// owning the process; the process itself is owned by the exit observer.
/// Implementations must tolerate an already-exited target as a no-op.
pub trait StopSignal: Send + Sync {
    /// Send the termination signal (group-wide where supported)
    fn terminate(&self) -> Result<()>;
}

/// A live spawned process, owned by the exit observer once started
#[async_trait]
pub trait SpawnedApp: Send {
    /// Process ID of the group leader
    fn pid(&self) -> u32;

    /// Block until the process exits and return its exit info
    async fn wait(&mut self) -> Result<AppExit>;

    /// Take the stdout read end, if piped and not already taken
    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// Take the stderr read end, if piped and not already taken
    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// A stop handle usable after the process has been handed to the
    /// exit observer
    fn stop_signal(&self) -> Box<dyn StopSignal>;
}

/// Unix process adapter spawning real process groups
#[cfg(unix)]
#[derive(Copy, Clone, Debug, Default)]
pub struct UnixProcessAdapter;

#[cfg(unix)]
impl UnixProcessAdapter {
    /// Create a new Unix process adapter
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessAdapter for UnixProcessAdapter {
    async fn spawn(&self, spec: &AppSpec) -> Result<Box<dyn SpawnedApp>> {
        let (command, args) = spec.effective_command();
        debug!("Spawning Unix process: {} {:?}", command, args);

        let child = process::unix::spawn(&command, &args, spec.effective_working_dir())?;
        Ok(Box::new(UnixSpawnedApp { child }))
    }
}

#[cfg(unix)]
struct UnixSpawnedApp {
    child: process::unix::ChildProcess,
}

#[cfg(unix)]
struct UnixStopSignal {
    pid: u32,
}

#[cfg(unix)]
impl StopSignal for UnixStopSignal {
    fn terminate(&self) -> Result<()> {
        process::unix::terminate_group_or_child(self.pid)
    }
}

#[cfg(unix)]
#[async_trait]
impl SpawnedApp for UnixSpawnedApp {
    fn pid(&self) -> u32 {
        self.child.pid()
    }

    async fn wait(&mut self) -> Result<AppExit> {
        let exit_status = self.child.wait().await?;

        let (exit_code, signal) = match exit_status.code() {
            Some(code) => (Some(code), None),
            None => {
                // No code on Unix means the process was killed by a signal
                use std::os::unix::process::ExitStatusExt;
                (None, exit_status.signal())
            }
        };

        Ok(AppExit {
            pid: self.pid(),
            exit_code,
            signal,
            timestamp: AppEvent::current_timestamp(),
        })
    }

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.child
            .take_stdout()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.child
            .take_stderr()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    fn stop_signal(&self) -> Box<dyn StopSignal> {
        Box::new(UnixStopSignal { pid: self.pid() })
    }
}

/// Behavior script for one mock process
#[derive(Debug, Clone)]
pub struct MockInstruction {
    /// How long until the process "exits" on its own
    pub exit_delay: std::time::Duration,
    /// Exit code for a natural exit
    pub exit_code: Option<i32>,
    /// Lines the process "writes" to stdout before idling
    pub stdout_lines: Vec<String>,
    /// Lines the process "writes" to stderr before idling
    pub stderr_lines: Vec<String>,
    /// Fail the spawn itself instead of producing a process
    pub fail_spawn: bool,
}

impl Default for MockInstruction {
    fn default() -> Self {
        // A long-lived dev server that keeps running until stopped
        Self {
            exit_delay: std::time::Duration::from_secs(60),
            exit_code: Some(0),
            stdout_lines: vec![],
            stderr_lines: vec![],
            fail_spawn: false,
        }
    }
}

impl MockInstruction {
    /// A process that exits on its own after `delay` with `code`
    pub fn exits_with(code: i32, delay: std::time::Duration) -> Self {
        Self {
            exit_delay: delay,
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// A spawn that fails outright
    pub fn spawn_failure() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }
}

/// Mock process adapter for lifecycle tests
#[derive(Clone)]
pub struct MockProcessAdapter {
    instructions: Arc<Mutex<Vec<MockInstruction>>>,
    spawn_count: Arc<AtomicU32>,
    stop_flags: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    next_pid: Arc<AtomicU32>,
}

impl MockProcessAdapter {
    /// Create a new mock adapter; spawns follow queued instructions, or the
    /// default long-lived instruction when the queue is empty
    pub fn new() -> Self {
        Self {
            instructions: Arc::new(Mutex::new(vec![])),
            spawn_count: Arc::new(AtomicU32::new(0)),
            stop_flags: Arc::new(Mutex::new(vec![])),
            next_pid: Arc::new(AtomicU32::new(10_000)),
        }
    }

    /// Queue an instruction for the next spawn
    pub async fn push_instruction(&self, instruction: MockInstruction) {
        self.instructions.lock().await.push(instruction);
    }

    /// How many spawns succeeded so far
    pub fn spawn_count(&self) -> u32 {
        self.spawn_count.load(Ordering::SeqCst)
    }

    /// Stop flags of every spawned process, in spawn order; a set flag means
    /// the process received a termination signal
    pub async fn terminated_flags(&self) -> Vec<bool> {
        self.stop_flags
            .lock()
            .await
            .iter()
            .map(|f| f.load(Ordering::SeqCst))
            .collect()
    }
}

impl Default for MockProcessAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessAdapter for MockProcessAdapter {
    async fn spawn(&self, spec: &AppSpec) -> Result<Box<dyn SpawnedApp>> {
        let instruction = {
            let mut queue = self.instructions.lock().await;
            if queue.is_empty() {
                MockInstruction::default()
            } else {
                queue.remove(0)
            }
        };
        debug!(
            "Spawning mock process for '{}': {:?}",
            spec.name, instruction
        );

        if instruction.fail_spawn {
            return Err(CoreError::ProcessSpawn(format!(
                "Failed to spawn '{}': mock spawn failure",
                spec.effective_command().0
            )));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.spawn_count.fetch_add(1, Ordering::SeqCst);

        let stopped = Arc::new(AtomicBool::new(false));
        self.stop_flags.lock().await.push(stopped.clone());

        Ok(Box::new(MockSpawnedApp {
            pid,
            instruction: instruction.clone(),
            stopped,
            stop_notify: Arc::new(Notify::new()),
            stdout: Some(script_reader(&instruction.stdout_lines)),
            stderr: Some(script_reader(&instruction.stderr_lines)),
        }))
    }
}

fn script_reader(lines: &[String]) -> Box<dyn AsyncRead + Send + Unpin> {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    Box::new(std::io::Cursor::new(bytes))
}

struct MockSpawnedApp {
    pid: u32,
    instruction: MockInstruction,
    stopped: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    stdout: Option<Box<dyn AsyncRead + Send + Unpin>>,
    stderr: Option<Box<dyn AsyncRead + Send + Unpin>>,
}

struct MockStopSignal {
    stopped: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl StopSignal for MockStopSignal {
    fn terminate(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        self.stop_notify.notify_one();
        Ok(())
    }
}

#[async_trait]
impl SpawnedApp for MockSpawnedApp {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn wait(&mut self) -> Result<AppExit> {
        let natural_exit = tokio::time::sleep(self.instruction.exit_delay);
        tokio::pin!(natural_exit);

        let (exit_code, signal) = if self.stopped.load(Ordering::SeqCst) {
            (None, Some(15))
        } else {
            tokio::select! {
                _ = self.stop_notify.notified() => (None, Some(15)),
                _ = &mut natural_exit => (self.instruction.exit_code, None),
            }
        };

        Ok(AppExit {
            pid: self.pid,
            exit_code,
            signal,
            timestamp: AppEvent::current_timestamp(),
        })
    }

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.stdout.take()
    }

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.stderr.take()
    }

    fn stop_signal(&self) -> Box<dyn StopSignal> {
        Box::new(MockStopSignal {
            stopped: self.stopped.clone(),
            stop_notify: self.stop_notify.clone(),
        })
    }
}
