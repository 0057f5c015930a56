use std::time::Duration;
use tracing::trace;

use crate::domain::{DashboardConfig, Message, SurveyError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DashboardConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, _model: &Model) -> Result<Option<Message>, SurveyError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => self.handle_key(key),
                Event::Resize(width, height) => {
                    Some(Message::Resize(width as usize, height as usize))
                }
                _ => None,
            });
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Tab, _) => Some(Message::FocusNext),
            (KeyCode::BackTab, _) => Some(Message::FocusPrevious),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Char(' '), _) | (KeyCode::Enter, _) => Some(Message::ToggleOption),
            (KeyCode::Char('c'), _) => Some(Message::ClearSelection),
            (KeyCode::Char('x'), _) => Some(Message::ClearAllSelections),
            (KeyCode::Char('v'), _) => Some(Message::CycleTableView),
            (KeyCode::PageUp, _) => Some(Message::ScrollUp),
            (KeyCode::PageDown, _) => Some(Message::ScrollDown),
            (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(Message::ScrollBeginning),
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(Message::ScrollEnd),
            (KeyCode::Char('d'), _) => Some(Message::Download),
            (KeyCode::Char('e'), _) => Some(Message::DownloadAll),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(code: KeyCode) -> Option<Message> {
        Controller::new(&DashboardConfig::default()).handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn maps_filter_keys() {
        assert_eq!(press(KeyCode::Tab), Some(Message::FocusNext));
        assert_eq!(press(KeyCode::Char(' ')), Some(Message::ToggleOption));
        assert_eq!(press(KeyCode::Enter), Some(Message::ToggleOption));
        assert_eq!(press(KeyCode::Char('j')), Some(Message::MoveDown));
        assert_eq!(press(KeyCode::Char('x')), Some(Message::ClearAllSelections));
    }

    #[test]
    fn ctrl_c_quits_but_c_clears() {
        let controller = Controller::new(&DashboardConfig::default());
        assert_eq!(
            controller.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Message::Quit)
        );
        assert_eq!(press(KeyCode::Char('c')), Some(Message::ClearSelection));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(press(KeyCode::F(5)), None);
    }
}
