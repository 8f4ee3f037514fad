use crossterm::event::KeyEvent;
use schema::{AppStatus, Telemetry};
use std::collections::{HashMap, VecDeque};

use crate::action::{action_label, map_key_to_command, UiAction, UiCommand};
use devmux_core::LogLine;

/// Which pane keyboard navigation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneFocus {
    Apps,
    Logs,
}

/// Per-app snapshot refreshed every tick
#[derive(Debug, Clone)]
pub struct AppView {
    pub status: AppStatus,
    pub telemetry: Telemetry,
    pub command: String,
    pub path: String,
}

impl Default for AppView {
    fn default() -> Self {
        Self {
            status: AppStatus::idle(),
            telemetry: Telemetry::default(),
            command: String::new(),
            path: String::new(),
        }
    }
}

/// A lifecycle operation queued by a key press, drained by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedAction {
    pub action: UiAction,
    pub app: String,
}

/// Dashboard state: pure key handling and snapshot storage, no IO
#[derive(Debug, Clone)]
pub struct TuiApp {
    pub names: Vec<String>,
    pub selected: usize,
    pub focus: PaneFocus,
    pub views: HashMap<String, AppView>,
    pub logs: Vec<LogLine>,
    pub log_scroll: usize,
    pub status_line: String,
    pub action_queue: VecDeque<QueuedAction>,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        let status_line = if names.is_empty() {
            "no apps discovered".to_string()
        } else {
            format!("{} app(s) discovered", names.len())
        };
        Self {
            names,
            selected: 0,
            focus: PaneFocus::Apps,
            views: HashMap::new(),
            logs: Vec::new(),
            log_scroll: 0,
            status_line,
            action_queue: VecDeque::new(),
            should_quit: false,
        }
    }

    pub fn selected_app(&self) -> Option<&str> {
        self.names.get(self.selected).map(|s| s.as_str())
    }

    pub fn view_of(&self, name: &str) -> AppView {
        self.views.get(name).cloned().unwrap_or_default()
    }

    /// Store this tick's snapshots; clamps log scroll to the new history
    pub fn apply_snapshot(
        &mut self,
        views: HashMap<String, AppView>,
        selected_logs: Vec<LogLine>,
    ) {
        self.views = views;
        self.log_scroll = self.log_scroll.min(selected_logs.len().saturating_sub(1));
        self.logs = selected_logs;
    }

    pub fn push_action(&mut self, action: UiAction) {
        let Some(app) = self.selected_app() else {
            self.status_line = "no app selected".to_string();
            return;
        };
        let app = app.to_string();
        self.status_line = format!("{} {}", action_label(action), app);
        self.action_queue.push_back(QueuedAction { action, app });
    }

    pub fn drain_actions(&mut self) -> Vec<QueuedAction> {
        self.action_queue.drain(..).collect()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let Some(command) = map_key_to_command(key) else {
            return;
        };

        match command {
            UiCommand::Quit => self.should_quit = true,
            UiCommand::Dispatch(action) => self.push_action(action),
            UiCommand::ToggleFocus => {
                self.focus = match self.focus {
                    PaneFocus::Apps => PaneFocus::Logs,
                    PaneFocus::Logs => PaneFocus::Apps,
                };
            }
            UiCommand::SelectNext => match self.focus {
                PaneFocus::Apps => self.select_next(),
                PaneFocus::Logs => self.log_scroll = self.log_scroll.saturating_sub(1),
            },
            UiCommand::SelectPrevious => match self.focus {
                PaneFocus::Apps => self.select_previous(),
                PaneFocus::Logs => {
                    let max = self.logs.len().saturating_sub(1);
                    self.log_scroll = (self.log_scroll + 1).min(max);
                }
            },
        }
    }

    fn select_next(&mut self) {
        if !self.names.is_empty() && self.selected + 1 < self.names.len() {
            self.selected += 1;
            self.log_scroll = 0;
        }
    }

    fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.log_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app() -> TuiApp {
        TuiApp::new(vec![
            "dashboard".to_string(),
            "bot".to_string(),
            "docs".to_string(),
        ])
    }

    fn press(app: &mut TuiApp, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn names_are_sorted_on_construction() {
        assert_eq!(app().names, vec!["bot", "dashboard", "docs"]);
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut app = app();
        assert_eq!(app.selected_app(), Some("bot"));

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_app(), Some("docs"));

        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected_app(), Some("dashboard"));
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected_app(), Some("bot"));
    }

    #[test]
    fn lifecycle_keys_queue_actions_for_selected_app() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('x'));

        let actions = app.drain_actions();
        assert_eq!(
            actions,
            vec![
                QueuedAction {
                    action: UiAction::StartApp,
                    app: "bot".to_string()
                },
                QueuedAction {
                    action: UiAction::StopApp,
                    app: "dashboard".to_string()
                },
            ]
        );
        assert!(app.drain_actions().is_empty());
    }

    #[test]
    fn quit_key_sets_flag() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn empty_dashboard_queues_nothing() {
        let mut app = TuiApp::new(vec![]);
        press(&mut app, KeyCode::Char('s'));
        assert!(app.drain_actions().is_empty());
        assert_eq!(app.status_line, "no app selected");
    }

    #[test]
    fn tab_moves_focus_to_logs_and_jk_scrolls() {
        let mut app = app();
        app.logs = (0..5)
            .map(|i| LogLine::now(schema::LogStream::Stdout, format!("line {}", i)))
            .collect();

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, PaneFocus::Logs);

        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.log_scroll, 2);
        // Selection did not move while logs are focused
        assert_eq!(app.selected_app(), Some("bot"));

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.log_scroll, 1);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, PaneFocus::Apps);
    }

    #[test]
    fn snapshot_clamps_log_scroll() {
        let mut app = app();
        app.log_scroll = 10;
        app.apply_snapshot(
            HashMap::new(),
            vec![LogLine::now(schema::LogStream::Stdout, "only".to_string())],
        );
        assert_eq!(app.log_scroll, 0);
    }
}
