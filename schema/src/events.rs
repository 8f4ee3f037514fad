//! Supervisor event types
//!
//! The supervisor broadcasts an [`AppEvent`] whenever a record transitions
//! between not-running and running. The display layer subscribes for prompt
//! redraws but pulls everything else (logs, status, telemetry) via snapshots,
//! so event delivery is strictly best-effort and never blocks supervision.

use crate::app::AppExit;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// State-change notifications emitted by the supervisor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum AppEvent {
    /// An app process was spawned and the record is now running
    Started {
        /// App name
        app: String,
        /// Process ID of the new process-group leader
        pid: u32,
        /// Command that was executed
        command: String,
        /// Arguments passed to the command
        args: Vec<String>,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// The exit observer confirmed process termination; the record is idle
    Exited {
        /// App name
        app: String,
        /// Exit information
        exit: AppExit,
    },
}

impl AppEvent {
    /// Name of the app this event concerns
    pub fn app(&self) -> &str {
        match self {
            AppEvent::Started { app, .. } => app,
            AppEvent::Exited { app, .. } => app,
        }
    }

    /// Current wall-clock time as an RFC3339 string (second precision)
    pub fn current_timestamp() -> String {
        humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
    }
}
