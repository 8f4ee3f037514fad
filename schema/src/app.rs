//! App specification and runtime status types
//!
//! An [`AppSpec`] is the immutable definition of one supervised development
//! server: where it lives and how to launch it. Specs are created once by
//! discovery and never mutated afterwards. Runtime state lives in the core
//! crate's registry; the snapshot types here ([`AppStatus`], [`Telemetry`])
//! are what the display layer reads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Default invocation when a spec carries no explicit command
pub const DEFAULT_COMMAND: &str = "npm";
/// Arguments for the default package-script invocation
pub const DEFAULT_ARGS: [&str; 2] = ["run", "dev"];

/// Immutable definition of a supervised app
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Unique name, used as the registry key
    pub name: String,
    /// Directory of the app, absolute once discovery has resolved it
    pub path: PathBuf,
    /// Executable to launch; `None` means "use the default dev script"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory override; defaults to `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl AppSpec {
    /// The command and arguments actually launched, falling back to
    /// `npm run dev` when no explicit command was configured.
    pub fn effective_command(&self) -> (String, Vec<String>) {
        match &self.command {
            Some(cmd) => (cmd.clone(), self.args.clone()),
            None => (
                DEFAULT_COMMAND.to_string(),
                DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            ),
        }
    }

    /// The working directory the child is launched in
    pub fn effective_working_dir(&self) -> &Path {
        self.working_dir.as_deref().unwrap_or(&self.path)
    }

    /// Human-readable command line for display and announcement log lines
    pub fn command_display(&self) -> String {
        let (cmd, args) = self.effective_command();
        if args.is_empty() {
            cmd
        } else {
            format!("{} {}", cmd, args.join(" "))
        }
    }
}

/// Which output stream a captured line came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Exit information for a terminated app process
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppExit {
    /// Process ID of the exited process
    pub pid: u32,
    /// Exit code, if the process exited normally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Signal number that terminated the process, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    /// Exit timestamp in RFC3339 format
    pub timestamp: String,
}

impl AppExit {
    /// Whether this was a clean (code 0) exit
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of the outcome for log lines
    pub fn describe(&self) -> String {
        match (self.exit_code, self.signal) {
            (Some(0), _) => "exited normally".to_string(),
            (Some(code), _) => format!("exited with code {}", code),
            (None, Some(sig)) => format!("terminated by signal {}", sig),
            (None, None) => "exited with unknown status".to_string(),
        }
    }
}

/// Point-in-time status snapshot of a supervised app
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    /// Whether a live child process is attached to the record
    pub running: bool,
    /// PID of the process-group leader, valid only while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Spawn timestamp, valid only while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
}

impl AppStatus {
    /// Status value for a record with no live process
    pub fn idle() -> Self {
        Self {
            running: false,
            pid: None,
            started_at: None,
        }
    }
}

/// Externally sampled resource usage, stored verbatim
///
/// The supervisor neither computes nor validates these numbers; they are
/// pushed by an outside sampler and read back by the stats pane.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    /// CPU usage in percent
    pub cpu_percent: f64,
    /// Resident memory in bytes
    pub memory_bytes: u64,
}
