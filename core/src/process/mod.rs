//! Platform process management
//!
//! Only Unix is supported: the supervision model relies on process groups so
//! that one signal tears down a dev server together with the watchers and
//! bundlers it forks.

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::{spawn, terminate_group_or_child, ChildProcess};
