use clap::Parser;
use devmux_core::supervisor::UnixProcessAdapter;
use devmux_core::{config, Registry, Supervisor};
use devmux_tui::{run_tui, TuiApp, TuiError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "devmux", version, about = "Terminal dashboard for monorepo dev servers")]
struct Cli {
    /// Workspace root to discover apps in
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Manifest file to load instead of <root>/devmux.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dashboard refresh interval in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Append tracing output to this file (the terminal itself is owned by
    /// the dashboard, so there is no tracing without it)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        devmux_core::utils::init_tracing_to_file(&cli.log_level, path)?;
    }

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let specs = match &cli.config {
        Some(path) => config::load_manifest(path, &root)?,
        None => config::discover(&root),
    };

    let registry = Arc::new(Registry::from_specs(specs));
    let supervisor = Supervisor::new(registry.clone(), Arc::new(UnixProcessAdapter::new()));

    let mut app = TuiApp::new(registry.names());
    run_tui(&supervisor, &mut app, Duration::from_millis(cli.tick_ms)).await
}
