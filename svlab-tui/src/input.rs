//! Keyboard input dispatch.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Apply a key event to the app.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Windows reports both press and release.
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('d') => app.toggle_view(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => app.select_next_path(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => app.select_prev_path(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::View;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_and_esc_quit() {
        let mut app = App::new("SPY");
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);

        let mut app = App::new("SPY");
        handle_key(&mut app, press(KeyCode::Esc));
        assert!(!app.running);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = App::new("SPY");
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
    }

    #[test]
    fn tab_switches_view() {
        let mut app = App::new("SPY");
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.view, View::Diagnostics);
        handle_key(&mut app, press(KeyCode::Char('d')));
        assert_eq!(app.view, View::Report);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new("SPY");
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key(&mut app, key);
        assert!(app.running);
    }

    #[test]
    fn arrows_without_report_do_nothing() {
        let mut app = App::new("SPY");
        handle_key(&mut app, press(KeyCode::Right));
        handle_key(&mut app, press(KeyCode::Left));
        assert_eq!(app.selected_path, None);
    }
}
