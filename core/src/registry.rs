//! Name-keyed registry of supervised app records
//!
//! Discovery builds the [`Registry`] exactly once, before it is shared; the
//! map's shape never changes afterwards, so steady-state lookups need no
//! global lock. All mutable runtime state lives inside each [`AppRecord`]
//! behind fine-grained per-record locks: operations on independent apps never
//! contend with each other.

use crate::logs::{LogHistory, LogLine};
use crate::supervisor::StopSignal;
use schema::{AppSpec, AppStatus, Telemetry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::warn;

/// Lifecycle state of one record
///
/// The tagged representation enforces the at-most-one-live-handle invariant
/// structurally: a record is either idle (no handle at all) or holds exactly
/// one pid, spawn timestamp, and stop signal for the live process group.
pub enum RunState {
    /// No live child process
    Idle,
    /// A spawned child process group is attached
    Running {
        /// PID of the process-group leader
        pid: u32,
        /// Spawn timestamp
        started_at: SystemTime,
        /// Handle used by `stop` to signal the group
        signal: Box<dyn StopSignal>,
    },
}

impl RunState {
    /// Whether a live process is attached
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }

    /// PID of the attached process, if running
    pub fn pid(&self) -> Option<u32> {
        match self {
            RunState::Running { pid, .. } => Some(*pid),
            RunState::Idle => None,
        }
    }
}

impl std::fmt::Debug for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Running {
                pid, started_at, ..
            } => f
                .debug_struct("Running")
                .field("pid", pid)
                .field("started_at", started_at)
                .finish_non_exhaustive(),
        }
    }
}

/// One supervised app: immutable spec plus lock-protected runtime state
pub struct AppRecord {
    spec: AppSpec,
    state: Mutex<RunState>,
    logs: Mutex<LogHistory>,
    telemetry: Mutex<Telemetry>,
}

impl AppRecord {
    fn new(spec: AppSpec) -> Self {
        Self {
            spec,
            state: Mutex::new(RunState::Idle),
            logs: Mutex::new(LogHistory::default()),
            telemetry: Mutex::new(Telemetry::default()),
        }
    }

    /// The immutable definition this record was seeded from
    pub fn spec(&self) -> &AppSpec {
        &self.spec
    }

    /// Registry key
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The record's state lock. Only the supervisor mutates this; the exit
    /// observer is the single writer for the Running -> Idle transition.
    pub(crate) fn state(&self) -> &Mutex<RunState> {
        &self.state
    }

    /// Append a line to this record's bounded history
    pub async fn append_log(&self, line: LogLine) {
        self.logs.lock().await.push(line);
    }

    /// Last `max` lines in arrival order
    pub async fn snapshot_logs(&self, max: usize) -> Vec<LogLine> {
        self.logs.lock().await.snapshot(max)
    }

    /// Reset the history to empty. A line appended concurrently may land
    /// before or after the clear; either outcome is fine, the bound holds.
    pub async fn clear_logs(&self) {
        self.logs.lock().await.clear();
    }

    /// Point-in-time status snapshot
    pub async fn status(&self) -> AppStatus {
        match &*self.state.lock().await {
            RunState::Idle => AppStatus::idle(),
            RunState::Running {
                pid, started_at, ..
            } => AppStatus {
                running: true,
                pid: Some(*pid),
                started_at: Some(*started_at),
            },
        }
    }

    /// Store externally sampled resource usage verbatim
    pub async fn set_telemetry(&self, telemetry: Telemetry) {
        *self.telemetry.lock().await = telemetry;
    }

    /// Latest stored telemetry snapshot
    pub async fn telemetry(&self) -> Telemetry {
        *self.telemetry.lock().await
    }
}

/// The authoritative collection of supervised app records
pub struct Registry {
    apps: HashMap<String, Arc<AppRecord>>,
}

impl Registry {
    /// Build the registry from discovered specs. Later duplicates of a name
    /// are dropped with a warning; keys stay unique.
    pub fn from_specs(specs: Vec<AppSpec>) -> Self {
        let mut apps = HashMap::with_capacity(specs.len());
        for spec in specs {
            if apps.contains_key(&spec.name) {
                warn!("Duplicate app name '{}' ignored", spec.name);
                continue;
            }
            apps.insert(spec.name.clone(), Arc::new(AppRecord::new(spec)));
        }
        Self { apps }
    }

    /// Look up a record by name
    pub fn get(&self, name: &str) -> Option<Arc<AppRecord>> {
        self.apps.get(name).cloned()
    }

    /// All registered names, in no particular order. Display ordering is the
    /// consumer's responsibility.
    pub fn names(&self) -> Vec<String> {
        self.apps.keys().cloned().collect()
    }

    /// Read-only iteration over every record
    pub fn records(&self) -> impl Iterator<Item = &Arc<AppRecord>> {
        self.apps.values()
    }

    /// Number of registered apps
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the registry holds no apps
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::LogStream;
    use std::path::PathBuf;

    fn mk_spec(name: &str) -> AppSpec {
        AppSpec {
            name: name.to_string(),
            path: PathBuf::from(format!("/ws/apps/{}", name)),
            command: None,
            args: vec![],
            working_dir: None,
        }
    }

    #[test]
    fn from_specs_keys_by_name_and_drops_duplicates() {
        let registry =
            Registry::from_specs(vec![mk_spec("bot"), mk_spec("dashboard"), mk_spec("bot")]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("bot").is_some());
        assert!(registry.get("dashboard").is_some());
        assert!(registry.get("missing").is_none());

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["bot", "dashboard"]);
    }

    #[tokio::test]
    async fn new_record_is_idle_with_empty_history() {
        let registry = Registry::from_specs(vec![mk_spec("bot")]);
        let record = registry.get("bot").unwrap();

        let status = record.status().await;
        assert!(!status.running);
        assert_eq!(status.pid, None);
        assert_eq!(status.started_at, None);
        assert!(record.snapshot_logs(100).await.is_empty());
    }

    #[tokio::test]
    async fn record_logs_append_and_clear() {
        let registry = Registry::from_specs(vec![mk_spec("bot")]);
        let record = registry.get("bot").unwrap();

        record
            .append_log(LogLine::now(LogStream::Stdout, "one"))
            .await;
        record
            .append_log(LogLine::now(LogStream::Stderr, "two"))
            .await;

        let snap = record.snapshot_logs(10).await;
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].content, "one");
        assert_eq!(snap[1].content, "two");

        record.clear_logs().await;
        assert!(record.snapshot_logs(10).await.is_empty());
    }

    #[tokio::test]
    async fn telemetry_is_stored_verbatim() {
        let registry = Registry::from_specs(vec![mk_spec("bot")]);
        let record = registry.get("bot").unwrap();

        assert_eq!(record.telemetry().await, Telemetry::default());
        let sample = Telemetry {
            cpu_percent: 12.5,
            memory_bytes: 256 * 1024 * 1024,
        };
        record.set_telemetry(sample).await;
        assert_eq!(record.telemetry().await, sample);
    }

    #[tokio::test]
    async fn concurrent_append_and_clear_keep_history_consistent() {
        let registry = Registry::from_specs(vec![mk_spec("bot")]);
        let record = registry.get("bot").unwrap();

        let writer = {
            let record = record.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    record
                        .append_log(LogLine::now(LogStream::Stdout, format!("line {}", i)))
                        .await;
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..20 {
            record.clear_logs().await;
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        // Each line landed before or after some clear; what remains is a
        // suffix of the appends with strictly increasing sequence numbers.
        let snap = record.snapshot_logs(1000).await;
        assert!(snap.len() <= 200);
        assert!(snap.windows(2).all(|w| w[0].seq < w[1].seq));
        if let Some(last) = snap.last() {
            assert_eq!(last.content, "line 199");
        }
    }
}
