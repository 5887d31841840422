//! Event handling for the timeline TUI

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use timeline_core::Stage;

use crate::app::{App, InputMode};
use crate::ui::Overlay;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    if app.session.stage() == Stage::Celebration {
        // Click anywhere to continue.
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            app.session.dismiss_celebration();
            return EventResult::NeedsRedraw;
        }
        return EventResult::Continue;
    }
    if app.session.presentation().is_recap_playing() || app.has_overlay() {
        return EventResult::Continue;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // Handle overlay keys first
    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    // Full-screen stages take every key
    if app.session.stage() == Stage::Celebration {
        app.session.dismiss_celebration();
        return EventResult::NeedsRedraw;
    }
    if app.session.presentation().is_recap_playing() {
        return handle_recap_key(app, key);
    }

    // Route based on input mode
    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Insert => handle_insert_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

/// Handle keys while the recap is playing
fn handle_recap_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('s') | KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => {
            app.session.skip_recap();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('q') => EventResult::Quit,
        _ => EventResult::Continue,
    }
}

/// Handle keys in NORMAL mode (vim-style navigation and hotkeys)
fn handle_normal_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        // Writing
        KeyCode::Char('i') | KeyCode::Enter => {
            app.begin_editing();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('p') => {
            app.enter_command_with("photo ");
            EventResult::NeedsRedraw
        }
        KeyCode::Char('x') => {
            app.remove_photo();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(':') => {
            app.enter_command_mode();
            EventResult::NeedsRedraw
        }

        // Help
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }

        // Quit
        KeyCode::Char('q') => EventResult::Quit,

        // Navigation
        KeyCode::Char('u') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = app.half_page();
            if key.code == KeyCode::Char('u') {
                app.scroll_up(half);
            } else {
                app.scroll_down(half);
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up(1);
            EventResult::NeedsRedraw
        }
        KeyCode::PageDown => {
            app.scroll_down(app.viewport_height().max(1));
            EventResult::NeedsRedraw
        }
        KeyCode::PageUp => {
            app.scroll_up(app.viewport_height().max(1));
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.scroll_to_top();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.scroll_to_bottom();
            EventResult::NeedsRedraw
        }
        KeyCode::Tab => {
            app.focus_next();
            EventResult::NeedsRedraw
        }
        KeyCode::BackTab => {
            app.focus_prev();
            EventResult::NeedsRedraw
        }

        // Journey
        KeyCode::Char('s') => {
            app.session.skip_recap();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('R') => {
            app.session.request_restart();
            EventResult::NeedsRedraw
        }

        _ => handle_stage_hotkeys(app, key),
    }
}

/// Handle stage-specific hotkeys (in normal mode)
fn handle_stage_hotkeys(app: &mut App, key: KeyEvent) -> EventResult {
    match (app.session.stage(), key.code) {
        (Stage::Proposal, KeyCode::Char('c')) => {
            app.session.continue_journey();
            EventResult::NeedsRedraw
        }
        (Stage::Export, KeyCode::Char(c @ '1'..='5')) => {
            if let Some(option) = c.to_digit(10) {
                app.export_option(option);
            }
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys in INSERT mode (writing a story)
fn handle_insert_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.finish_editing();
            EventResult::NeedsRedraw
        }
        KeyCode::Tab => {
            app.finish_editing();
            app.focus_next();
            app.begin_editing();
            EventResult::NeedsRedraw
        }
        KeyCode::Left => {
            app.cursor_left();
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Home => {
            app.cursor_home();
            EventResult::NeedsRedraw
        }
        KeyCode::End => {
            app.cursor_end();
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Delete => {
            app.delete();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys in COMMAND mode (: commands)
fn handle_command_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            let command = app.input_buffer().to_string();
            app.enter_normal_mode();

            if command.len() > 1 {
                app.process_command(&command);
            }

            if app.should_quit {
                EventResult::Quit
            } else {
                EventResult::NeedsRedraw
            }
        }
        KeyCode::Left => {
            if app.cursor_position() > 1 {
                app.cursor_left();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            if app.cursor_position() > 1 {
                app.backspace();
            } else {
                // Backspace on just ":" exits command mode
                app.enter_normal_mode();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle key when overlay is open
fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    let overlay = app.overlay().cloned();
    match overlay {
        Some(Overlay::ConfirmRestart) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.close_overlay();
                app.session.confirm_restart();
                EventResult::NeedsRedraw
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                app.close_overlay();
                app.session.decline_restart();
                EventResult::NeedsRedraw
            }
            _ => EventResult::Continue,
        },
        Some(Overlay::Notice(_)) => match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q') => {
                app.close_overlay();
                EventResult::NeedsRedraw
            }
            _ => EventResult::Continue,
        },
        _ => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                app.close_overlay();
                EventResult::NeedsRedraw
            }
            _ => EventResult::Continue,
        },
    }
}
