//! App lifecycle supervisor
//!
//! The [`Supervisor`] drives every record in the registry through the
//! two-state lifecycle:
//!
//! ```text
//! Idle -> Running -> Idle   (re-entrant)
//! ```
//!
//! `start` performs the Idle -> Running transition under the record's state
//! lock. The Running -> Idle transition has exactly one writer: the exit
//! observer task spawned alongside the process. `stop` only signals the
//! child's process group and never touches the state itself; the observer
//! notices the resulting exit and performs the authoritative transition,
//! whether the exit was signaled or natural.
//!
//! Per running app there are three concurrent tasks: two stream-capture
//! readers and the exit observer. They never communicate with each other and
//! only write into the record through its own locks.

use crate::capture::spawn_capture;
use crate::logs::LogLine;
use crate::registry::{AppRecord, Registry, RunState};
use crate::Result;
use schema::{AppEvent, AppStatus, LogStream, Telemetry};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod adapters;


pub use adapters::{
    MockInstruction, MockProcessAdapter, ProcessAdapter, SpawnedApp, StopSignal,
};
#[cfg(unix)]
pub use adapters::UnixProcessAdapter;

/// Grace interval between stop and start during a restart, letting the OS
/// reap the old process group before the new one is spawned
pub const RESTART_GRACE: Duration = Duration::from_millis(500);

/// Capacity of the state-change event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The process supervision engine
///
/// Cheap to clone; clones share the registry, adapter, and event channel.
#[derive(Clone)]
pub struct Supervisor {
    registry: Arc<Registry>,
    adapter: Arc<dyn ProcessAdapter>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl Supervisor {
    /// Create a supervisor over a populated registry
    pub fn new(registry: Arc<Registry>, adapter: Arc<dyn ProcessAdapter>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registry,
            adapter,
            event_tx,
        }
    }

    /// The registry this supervisor operates on
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Subscribe to state-change notifications. Delivery is best-effort;
    /// a slow subscriber lags, it never blocks supervision.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Start the named app
    ///
    /// Silent no-op when the name is unknown or the app is already running.
    /// Spawn failures are surfaced to the caller and recorded as an error
    /// line on the record; the record stays idle and may be retried.
    pub async fn start(&self, name: &str) -> Result<()> {
        let Some(record) = self.registry.get(name) else {
            debug!("start: unknown app '{}'", name);
            return Ok(());
        };

        let mut state = record.state().lock().await;
        if state.is_running() {
            debug!("start: app '{}' already running", name);
            return Ok(());
        }

        let mut process = match self.adapter.spawn(record.spec()).await {
            Ok(process) => process,
            Err(e) => {
                warn!("Failed to start '{}': {}", name, e);
                record
                    .append_log(LogLine::now(
                        LogStream::Stderr,
                        format!("Failed to start {}: {}", name, e),
                    ))
                    .await;
                return Err(e);
            }
        };

        let pid = process.pid();
        let started_at = SystemTime::now();
        let stdout = process.take_stdout();
        let stderr = process.take_stderr();

        *state = RunState::Running {
            pid,
            started_at,
            signal: process.stop_signal(),
        };
        drop(state);

        info!("Started '{}' (pid {})", name, pid);
        record
            .append_log(LogLine::now(
                LogStream::Stdout,
                format!("Started {} (pid {})", name, pid),
            ))
            .await;
        record
            .append_log(LogLine::now(
                LogStream::Stdout,
                format!("Command: {}", record.spec().command_display()),
            ))
            .await;

        let (command, args) = record.spec().effective_command();
        let _ = self.event_tx.send(AppEvent::Started {
            app: name.to_string(),
            pid,
            command,
            args,
            timestamp: AppEvent::current_timestamp(),
        });

        if let Some(reader) = stdout {
            spawn_capture(reader, LogStream::Stdout, record.clone());
        }
        if let Some(reader) = stderr {
            spawn_capture(reader, LogStream::Stderr, record.clone());
        }

        self.spawn_exit_observer(record, process);
        Ok(())
    }

    /// The exit observer owns the spawned process and performs the one
    /// authorized Running -> Idle transition once the OS confirms exit.
    fn spawn_exit_observer(&self, record: Arc<AppRecord>, mut process: Box<dyn SpawnedApp>) {
        let event_tx = self.event_tx.clone();
        let observed_pid = process.pid();

        tokio::spawn(async move {
            let exit = process.wait().await;

            let mut state = record.state().lock().await;
            // Only the run that spawned this observer may clear the state
            if state.pid() == Some(observed_pid) {
                *state = RunState::Idle;
            }
            drop(state);

            match exit {
                Ok(exit) => {
                    info!(
                        "App '{}' (pid {}) {}",
                        record.name(),
                        observed_pid,
                        exit.describe()
                    );
                    let stream = if exit.is_success() {
                        LogStream::Stdout
                    } else {
                        LogStream::Stderr
                    };
                    record
                        .append_log(LogLine::now(stream, format!("Process {}", exit.describe())))
                        .await;
                    let _ = event_tx.send(AppEvent::Exited {
                        app: record.name().to_string(),
                        exit,
                    });
                }
                Err(e) => {
                    warn!("Error waiting for '{}' to exit: {}", record.name(), e);
                    record
                        .append_log(LogLine::now(
                            LogStream::Stderr,
                            format!("Process wait error: {}", e),
                        ))
                        .await;
                }
            }
        });
    }

    /// Stop the named app by signaling its process group
    ///
    /// Fire-and-forget: the call never waits for the child to die, and
    /// signal delivery failures are swallowed. Silent no-op when the name
    /// is unknown or the app is not running.
    pub async fn stop(&self, name: &str) {
        let Some(record) = self.registry.get(name) else {
            debug!("stop: unknown app '{}'", name);
            return;
        };
        self.stop_record(&record).await;
    }

    async fn stop_record(&self, record: &Arc<AppRecord>) {
        let state = record.state().lock().await;
        let RunState::Running { pid, signal, .. } = &*state else {
            debug!("stop: app '{}' not running", record.name());
            return;
        };

        info!("Stopping '{}' (pid {})", record.name(), pid);
        if let Err(e) = signal.terminate() {
            // The end state we want (not running) will still be reached or
            // the user retries; do not surface this.
            warn!("Failed to signal '{}': {}", record.name(), e);
        }
        let pid = *pid;
        drop(state);

        record
            .append_log(LogLine::now(
                LogStream::Stdout,
                format!("Stopping {} (pid {})", record.name(), pid),
            ))
            .await;
    }

    /// Restart the named app: stop if running, wait a short grace interval
    /// for the OS to reap the old group, then start
    ///
    /// A composition, not a primitive: other callers may observe the record
    /// idle in between, and the start half is subject to the same no-op and
    /// error rules as a plain `start`.
    pub async fn restart(&self, name: &str) -> Result<()> {
        let was_running = self
            .status(name)
            .await
            .map(|s| s.running)
            .unwrap_or(false);

        if was_running {
            self.stop(name).await;
            tokio::time::sleep(RESTART_GRACE).await;
        }
        self.start(name).await
    }

    /// Best-effort stop of every running app; does not wait for any exit
    pub async fn stop_all(&self) {
        info!("Stopping all running apps");
        for record in self.registry.records() {
            self.stop_record(record).await;
        }
    }

    /// Clear the named app's log history; no-op on unknown names
    pub async fn clear_logs(&self, name: &str) {
        if let Some(record) = self.registry.get(name) {
            record.clear_logs().await;
        }
    }

    /// Last `max` log lines of the named app; empty for unknown names
    pub async fn snapshot_logs(&self, name: &str, max: usize) -> Vec<LogLine> {
        match self.registry.get(name) {
            Some(record) => record.snapshot_logs(max).await,
            None => Vec::new(),
        }
    }

    /// Status snapshot of the named app; `None` for unknown names
    pub async fn status(&self, name: &str) -> Option<AppStatus> {
        match self.registry.get(name) {
            Some(record) => Some(record.status().await),
            None => None,
        }
    }

    /// Attach externally sampled telemetry to the named app record
    pub async fn update_telemetry(&self, name: &str, cpu_percent: f64, memory_bytes: u64) {
        if let Some(record) = self.registry.get(name) {
            record
                .set_telemetry(Telemetry {
                    cpu_percent,
                    memory_bytes,
                })
                .await;
        }
    }

    /// Latest telemetry for the named app; `None` for unknown names
    pub async fn telemetry(&self, name: &str) -> Option<Telemetry> {
        match self.registry.get(name) {
            Some(record) => Some(record.telemetry().await),
            None => None,
        }
    }
}
