use crate::action::UiAction;
use crate::app::{AppView, QueuedAction, TuiApp};
use crate::error::TuiError;
use crate::ui::{render_dashboard, LOG_VIEW_LINES};
use crossterm::event::{self, Event as CEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use devmux_core::Supervisor;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use schema::AppEvent;
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

/// Run the dashboard until the user quits, then stop every app
pub async fn run_tui(
    supervisor: &Supervisor,
    app: &mut TuiApp,
    tick_rate: Duration,
) -> Result<(), TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = run_loop(&mut terminal, supervisor, app, tick_rate).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    supervisor.stop_all().await;
    run_result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    supervisor: &Supervisor,
    app: &mut TuiApp,
    tick_rate: Duration,
) -> Result<(), TuiError> {
    let mut events = supervisor.subscribe();

    while !app.should_quit {
        drain_events(&mut events, app);
        refresh_snapshots(supervisor, app).await;
        terminal.draw(|frame| render_dashboard(frame, app))?;

        if event::poll(tick_rate)? {
            handle_terminal_event(app, event::read()?);
        }

        for queued in app.drain_actions() {
            dispatch_action(supervisor, app, queued).await;
        }
    }
    Ok(())
}

/// Surface pending state-change events in the status line; missing a lagged
/// event is fine because the next snapshot shows the same state anyway
fn drain_events(events: &mut broadcast::Receiver<AppEvent>, app: &mut TuiApp) {
    loop {
        match events.try_recv() {
            Ok(event) => app.status_line = event_status_line(&event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

fn event_status_line(event: &AppEvent) -> String {
    match event {
        AppEvent::Started { app, pid, .. } => format!("{} started (pid {})", app, pid),
        AppEvent::Exited { app, exit } => format!("{} {}", app, exit.describe()),
    }
}

async fn refresh_snapshots(supervisor: &Supervisor, app: &mut TuiApp) {
    let mut views = HashMap::new();
    for name in &app.names {
        let record = match supervisor.registry().get(name) {
            Some(record) => record,
            None => continue,
        };
        let status = record.status().await;
        let telemetry = record.telemetry().await;
        views.insert(
            name.clone(),
            AppView {
                status,
                telemetry,
                command: record.spec().command_display(),
                path: record.spec().path.display().to_string(),
            },
        );
    }

    let logs = match app.selected_app() {
        Some(name) => supervisor.snapshot_logs(name, LOG_VIEW_LINES).await,
        None => Vec::new(),
    };
    app.apply_snapshot(views, logs);
}

async fn dispatch_action(supervisor: &Supervisor, app: &mut TuiApp, queued: QueuedAction) {
    let QueuedAction { action, app: name } = queued;
    match action {
        UiAction::StartApp => {
            if let Err(e) = supervisor.start(&name).await {
                warn!("start {} failed: {}", name, e);
                app.status_line = format!("start {} failed: {}", name, e);
            }
        }
        UiAction::StopApp => supervisor.stop(&name).await,
        UiAction::RestartApp => {
            if let Err(e) = supervisor.restart(&name).await {
                warn!("restart {} failed: {}", name, e);
                app.status_line = format!("restart {} failed: {}", name, e);
            }
        }
        UiAction::ClearLogs => supervisor.clear_logs(&name).await,
    }
}

fn handle_terminal_event(app: &mut TuiApp, event: CEvent) {
    match event {
        CEvent::Key(key) => app.handle_key_event(key),
        CEvent::Resize(_, _) => {}
        _ => {}
    }
}
