use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::action::{Action, Direction};
use crate::app::App;
use crate::data::TimeWindow;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Filter input edits text directly instead of producing actions
    if app.filter_active && !app.show_help && app.logs.is_none() {
        handle_filter_input(app, key);
        return;
    }

    if let Some(action) = key_action(app, key) {
        app.dispatch(action);
    }
}

/// Map a key press to an action for the current UI state.
pub fn key_action(app: &App, key: KeyEvent) -> Option<Action> {
    // If help is shown, any key closes it
    if app.show_help {
        return Some(Action::CloseOverlay);
    }

    if app.logs.is_some() {
        return match key.code {
            KeyCode::Esc
            | KeyCode::Enter
            | KeyCode::Backspace
            | KeyCode::Char('q')
            | KeyCode::Char('L') => Some(Action::CloseOverlay),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollLogs(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollLogs(1)),
            KeyCode::PageUp => Some(Action::ScrollLogs(-10)),
            KeyCode::PageDown => Some(Action::ScrollLogs(10)),
            _ => None,
        };
    }

    let selected = app.selected_key();

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),

        // Grid navigation
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Move(Direction::Left)),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Move(Direction::Right)),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Move(Direction::Down)),
        KeyCode::Home | KeyCode::Char('g') => Some(Action::SelectFirst),
        KeyCode::End | KeyCode::Char('G') => Some(Action::SelectLast),

        // Window selection for the selected card
        KeyCode::Char(c @ '1'..='6') => {
            let index = c.to_digit(10)? as usize - 1;
            Some(Action::SetWindow {
                key: selected?,
                window: TimeWindow::ALL[index],
            })
        }
        KeyCode::Char(']') | KeyCode::Tab => Some(Action::CycleWindow {
            key: selected?,
            forward: true,
        }),
        KeyCode::Char('[') | KeyCode::BackTab => Some(Action::CycleWindow {
            key: selected?,
            forward: false,
        }),

        KeyCode::Enter | KeyCode::Char('L') => Some(Action::OpenLogs { key: selected? }),

        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Char('c') if !app.filter_text.is_empty() => Some(Action::ClearFilter),
        KeyCode::Char('e') => Some(Action::Export),
        KeyCode::Esc => Some(Action::CloseOverlay),

        _ => None,
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => app.dispatch(Action::CloseOverlay),

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dispatch(Action::ClearFilter);
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => app.filter_push(c),

        _ => {}
    }
}

/// Handle mouse events
///
/// Clicks are resolved against the hit regions recorded by the last render,
/// so every card's window buttons and logs label route through the same
/// dispatcher.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if let Some(action) = mouse_action(app, mouse) {
        app.dispatch(action);
    }
}

/// Map a mouse event to an action.
pub fn mouse_action(app: &App, mouse: MouseEvent) -> Option<Action> {
    match mouse.kind {
        MouseEventKind::ScrollUp if app.logs.is_some() => Some(Action::ScrollLogs(-3)),
        MouseEventKind::ScrollDown if app.logs.is_some() => Some(Action::ScrollLogs(3)),
        MouseEventKind::ScrollUp => Some(Action::Move(Direction::Up)),
        MouseEventKind::ScrollDown => Some(Action::Move(Direction::Down)),

        MouseEventKind::Down(MouseButton::Left) => hit_test(app, mouse.column, mouse.row),

        // Right-click closes whatever is open
        MouseEventKind::Down(MouseButton::Right) => Some(Action::CloseOverlay),

        _ => None,
    }
}

/// Find the action under a screen position. Later regions are drawn on top,
/// so they win.
pub fn hit_test(app: &App, column: u16, row: u16) -> Option<Action> {
    if app.show_help {
        return Some(Action::CloseOverlay);
    }
    app.hit_regions
        .iter()
        .rev()
        .find(|(area, _)| {
            column >= area.x
                && column < area.x.saturating_add(area.width)
                && row >= area.y
                && row < area.y.saturating_add(area.height)
        })
        .map(|(_, action)| action.clone())
}
