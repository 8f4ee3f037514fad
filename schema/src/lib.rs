//! Schema definitions for devmux
//!
//! This crate contains the shared data structures used across the devmux
//! workspace: the app specification produced by discovery, log stream tags,
//! status snapshots consumed by the dashboard, and supervisor events. All
//! types here implement JSON Schema generation for external consumption.

pub mod app;
pub mod events;

pub use app::{AppExit, AppSpec, AppStatus, LogStream, Telemetry};
pub use events::AppEvent;

#[cfg(test)]
mod json_roundtrip_tests;
