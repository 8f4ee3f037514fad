use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use schema::LogStream;
use std::time::{Duration, SystemTime};

use crate::app::{PaneFocus, TuiApp};

// -- Color palette ----------------------------------------------------------

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const RUNNING: Color = Color::Green;
const STOPPED: Color = Color::Red;
const STDERR_FG: Color = Color::Yellow;
const KEY_FG: Color = Color::Yellow;
const SELECTED_BG: Color = Color::Indexed(236);
const BORDER_NORMAL: Color = Color::DarkGray;
const BORDER_FOCUSED: Color = Color::Cyan;

/// Lines of history shown in the logs pane
pub const LOG_VIEW_LINES: usize = 100;

pub fn render_dashboard(frame: &mut Frame, app: &TuiApp) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(1)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(9),
            Constraint::Length(9),
        ])
        .split(columns[0]);

    render_apps(frame, left[0], app);
    render_stats(frame, left[1], app);
    render_info(frame, left[2]);
    render_logs(frame, columns[1], app);
    render_status_line(frame, outer[1], app);
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { BORDER_FOCUSED } else { BORDER_NORMAL };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
}

fn render_apps(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let items: Vec<ListItem> = app
        .names
        .iter()
        .map(|name| {
            let view = app.view_of(name);
            let (symbol, color) = if view.status.running {
                ("●", RUNNING)
            } else {
                ("○", STOPPED)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", symbol), Style::default().fg(color)),
                Span::raw(name.clone()),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if !app.names.is_empty() {
        state.select(Some(app.selected));
    }

    let list = List::new(items)
        .block(pane_block("Apps", app.focus == PaneFocus::Apps))
        .highlight_style(
            Style::default()
                .bg(SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_logs(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let title = match app.selected_app() {
        Some(name) => format!("Logs: {}", name),
        None => "Logs".to_string(),
    };
    let block = pane_block(&title, app.focus == PaneFocus::Logs);
    let inner_height = area.height.saturating_sub(2) as usize;

    // Window of the most recent lines, shifted up by the scroll offset
    let total = app.logs.len();
    let end = total.saturating_sub(app.log_scroll);
    let start = end.saturating_sub(inner_height);
    let lines: Vec<Line> = app.logs[start..end]
        .iter()
        .map(|line| {
            let style = match line.stream {
                LogStream::Stderr => Style::default().fg(STDERR_FG),
                LogStream::Stdout => Style::default(),
            };
            Line::from(Span::styled(line.content.clone(), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stats(frame: &mut Frame, area: Rect, app: &TuiApp) {
    let mut lines = Vec::new();
    if let Some(name) = app.selected_app() {
        let view = app.view_of(name);
        let state_span = if view.status.running {
            Span::styled("running", Style::default().fg(RUNNING))
        } else {
            Span::styled("stopped", Style::default().fg(STOPPED))
        };
        lines.push(Line::from(vec![Span::raw("State:  "), state_span]));
        lines.push(Line::from(format!(
            "PID:    {}",
            view.status
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string())
        )));
        lines.push(Line::from(format!(
            "Uptime: {}",
            uptime_display(view.status.started_at)
        )));
        lines.push(Line::from(format!(
            "CPU:    {:.1}%",
            view.telemetry.cpu_percent
        )));
        lines.push(Line::from(format!(
            "Memory: {}",
            format_memory(view.telemetry.memory_bytes)
        )));
        lines.push(Line::from(format!("Cmd:    {}", view.command)));
        lines.push(Line::from(Span::styled(
            format!("Path:   {}", view.path),
            Style::default().fg(DIM),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "no app selected",
            Style::default().fg(DIM),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(pane_block("Stats", false)),
        area,
    );
}

fn render_info(frame: &mut Frame, area: Rect) {
    let bindings = [
        ("s", "start"),
        ("x", "stop"),
        ("R", "restart"),
        ("c", "clear logs"),
        ("j/k", "select"),
        ("Tab", "focus logs"),
        ("q", "quit"),
    ];
    let lines: Vec<Line> = bindings
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("{:<4}", key), Style::default().fg(KEY_FG)),
                Span::styled(desc.to_string(), Style::default().fg(DIM)),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(pane_block("Keys", false)),
        area,
    );
}

fn render_status_line(frame: &mut Frame, area: Rect, app: &TuiApp) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            app.status_line.clone(),
            Style::default().fg(DIM),
        )),
        area,
    );
}

fn uptime_display(started_at: Option<SystemTime>) -> String {
    match started_at.and_then(|t| t.elapsed().ok()) {
        Some(elapsed) => format_duration(elapsed),
        None => "-".to_string(),
    }
}

/// Compact duration rendering for the stats pane: "1h 2m 3s"
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn format_memory(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes == 0 {
        "-".to_string()
    } else if bytes < MIB {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    }
}
