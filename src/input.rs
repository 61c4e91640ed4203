//! Terminal input: the blocking reader task and the key → action table.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOG_PAGE: isize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Picker,
    DelayEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    TogglePlay,
    StepForward,
    StepBack,
    FirstStep,
    LastStep,
    DelayUp,
    DelayDown,
    BeginDelayEdit,
    OpenPicker,
    /// Leaves the picker or the delay editor without applying anything.
    Cancel,
    Type(char),
    Backspace,
    Up,
    Down,
    Confirm,
    /// Scrolls the log back (positive) or toward the newest line (negative).
    ScrollLog(isize),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(Action::TogglePlay),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::StepForward),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::StepBack),
            KeyCode::Home => Some(Action::FirstStep),
            KeyCode::End => Some(Action::LastStep),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::DelayUp),
            KeyCode::Char('-') => Some(Action::DelayDown),
            KeyCode::Char('d') => Some(Action::BeginDelayEdit),
            KeyCode::Char('f') | KeyCode::Enter => Some(Action::OpenPicker),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollLog(1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollLog(-1)),
            KeyCode::PageUp => Some(Action::ScrollLog(LOG_PAGE)),
            KeyCode::PageDown => Some(Action::ScrollLog(-LOG_PAGE)),
            _ => None,
        },
        InputMode::Picker => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Up => Some(Action::Up),
            KeyCode::Down => Some(Action::Down),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) => Some(Action::Type(c)),
            _ => None,
        },
        InputMode::DelayEdit => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::Confirm),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) if c.is_ascii_digit() => Some(Action::Type(c)),
            _ => None,
        },
    }
}

/// Forwards terminal events to the event loop until the receiver is dropped.
pub fn spawn_reader(tx: UnboundedSender<io::Result<Event>>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {
                    if tx.send(event::read()).is_err() {
                        break;
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    let _ = tx.send(Err(err));
                    break;
                }
            }
        }
        tracing::debug!("input reader stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn normal_mode_bindings() {
        let cases = [
            (KeyCode::Char(' '), Action::TogglePlay),
            (KeyCode::Char('p'), Action::TogglePlay),
            (KeyCode::Right, Action::StepForward),
            (KeyCode::Left, Action::StepBack),
            (KeyCode::Home, Action::FirstStep),
            (KeyCode::End, Action::LastStep),
            (KeyCode::Char('+'), Action::DelayUp),
            (KeyCode::Char('-'), Action::DelayDown),
            (KeyCode::Char('d'), Action::BeginDelayEdit),
            (KeyCode::Char('f'), Action::OpenPicker),
            (KeyCode::Char('q'), Action::Quit),
            (KeyCode::Up, Action::ScrollLog(1)),
            (KeyCode::PageDown, Action::ScrollLog(-LOG_PAGE)),
        ];
        for (code, action) in cases {
            assert_eq!(map_key(InputMode::Normal, key(code)), Some(action), "{code:?}");
        }
        assert_eq!(map_key(InputMode::Normal, key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn picker_treats_letters_as_query_text() {
        assert_eq!(
            map_key(InputMode::Picker, key(KeyCode::Char('q'))),
            Some(Action::Type('q'))
        );
        assert_eq!(
            map_key(InputMode::Picker, key(KeyCode::Esc)),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn delay_editor_accepts_digits_only() {
        assert_eq!(
            map_key(InputMode::DelayEdit, key(KeyCode::Char('7'))),
            Some(Action::Type('7'))
        );
        assert_eq!(map_key(InputMode::DelayEdit, key(KeyCode::Char('x'))), None);
        assert_eq!(
            map_key(InputMode::DelayEdit, key(KeyCode::Enter)),
            Some(Action::Confirm)
        );
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [InputMode::Normal, InputMode::Picker, InputMode::DelayEdit] {
            assert_eq!(map_key(mode, ctrl_c), Some(Action::Quit));
        }
    }
}
