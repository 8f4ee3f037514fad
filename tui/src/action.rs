use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// An operation dispatched against the selected app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiAction {
    StartApp,
    StopApp,
    RestartApp,
    ClearLogs,
}

/// Everything a key press can mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiCommand {
    Dispatch(UiAction),
    SelectNext,
    SelectPrevious,
    ToggleFocus,
    Quit,
}

pub fn map_key_to_command(key: KeyEvent) -> Option<UiCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiCommand::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Down | KeyCode::Char('j') => Some(UiCommand::SelectNext),
        KeyCode::Up | KeyCode::Char('k') => Some(UiCommand::SelectPrevious),
        KeyCode::Tab | KeyCode::BackTab => Some(UiCommand::ToggleFocus),
        KeyCode::Char('s') => Some(UiCommand::Dispatch(UiAction::StartApp)),
        KeyCode::Char('x') => Some(UiCommand::Dispatch(UiAction::StopApp)),
        KeyCode::Char('R') => Some(UiCommand::Dispatch(UiAction::RestartApp)),
        KeyCode::Char('c') => Some(UiCommand::Dispatch(UiAction::ClearLogs)),
        _ => None,
    }
}

pub fn action_label(action: UiAction) -> &'static str {
    match action {
        UiAction::StartApp => "start",
        UiAction::StopApp => "stop",
        UiAction::RestartApp => "restart",
        UiAction::ClearLogs => "clear logs",
    }
}

#[cfg(test)]
mod tests {
    use super::{action_label, map_key_to_command, UiAction, UiCommand};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    #[test]
    fn maps_navigation_keys() {
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)),
            Some(UiCommand::SelectNext)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)),
            Some(UiCommand::SelectPrevious)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)),
            Some(UiCommand::ToggleFocus)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(UiCommand::ToggleFocus)
        );
    }

    #[test]
    fn maps_lifecycle_keys() {
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE)),
            Some(UiCommand::Dispatch(UiAction::StartApp))
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(UiCommand::Dispatch(UiAction::StopApp))
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(
                KeyCode::Char('R'),
                KeyModifiers::SHIFT
            )),
            Some(UiCommand::Dispatch(UiAction::RestartApp))
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(UiCommand::Dispatch(UiAction::ClearLogs))
        );
    }

    #[test]
    fn maps_quit_keys() {
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(UiCommand::Quit)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Some(UiCommand::Quit)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            )),
            Some(UiCommand::Quit)
        );
    }

    #[test]
    fn ignores_release_events_and_unmapped_keys() {
        let mut release = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key_to_command(release), None);

        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn action_labels_are_stable() {
        assert_eq!(action_label(UiAction::StartApp), "start");
        assert_eq!(action_label(UiAction::ClearLogs), "clear logs");
    }
}
