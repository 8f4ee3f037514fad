//! Terminal dashboard for the devmux process supervisor
//!
//! Key handling and layout are pure functions over [`TuiApp`]; the runner
//! owns the terminal and is the only place that talks to the supervisor.

pub mod action;
pub mod app;
pub mod error;
pub mod runner;
pub mod ui;

pub use action::*;
pub use app::*;
pub use error::*;
pub use runner::*;
pub use ui::*;
