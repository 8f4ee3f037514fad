//! Core functionality for the devmux project
//!
//! This crate contains the process supervision engine behind the terminal
//! dashboard: workspace discovery, the app registry, bounded log history,
//! output capture, and the supervisor lifecycle state machine. The display
//! layer lives in the `devmux-tui` crate and only talks to the types
//! re-exported here.

pub mod capture;
pub mod config;
pub mod error;
pub mod logs;
#[cfg(unix)]
pub mod process;
pub mod registry;
pub mod supervisor;

// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
pub use logs::{LogHistory, LogLine, DEFAULT_LOG_CAPACITY};
pub use registry::{AppRecord, Registry};
pub use supervisor::{MockInstruction, MockProcessAdapter, ProcessAdapter, Supervisor};
#[cfg(unix)]
pub use supervisor::UnixProcessAdapter;

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }

    /// Initialize tracing with output appended to a file instead of stderr.
    /// Used by the full-screen UI, whose terminal is owned by the dashboard.
    pub fn init_tracing_to_file(level: &str, path: &std::path::Path) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
