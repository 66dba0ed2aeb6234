use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use companion_core::Submission;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Rows moved per mouse wheel notch.
const WHEEL_STEP: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(width, height) => {
            tracing::trace!(width, height, "terminal resized");
        }
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::PageUp => app.scroll.scroll_up(app.scroll.page()),
        KeyCode::PageDown => app.scroll.scroll_down(app.scroll.page()),
        _ => match app.input_mode {
            InputMode::Normal => handle_normal_mode(app, key),
            InputMode::Editing => handle_editing_mode(app, key),
        },
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.scroll.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll.scroll_down(app.scroll.page());
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll.scroll_up(app.scroll.page());
        }
        KeyCode::Char('g') | KeyCode::Home => app.scroll.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll.scroll_to_bottom(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if app.submit_input() == Submission::Ignored {
                tracing::trace!(pending = app.session.is_pending(), "submission ignored");
            }
        }
        KeyCode::Up => app.scroll.scroll_up(1),
        KeyCode::Down => app.scroll.scroll_down(1),
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.session.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let input = app.session.input_mut();
            if app.input_cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.session.input().chars().count();
        }
        KeyCode::Char(c) => {
            let input = app.session.input_mut();
            let byte_pos = char_to_byte_index(input, app.input_cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .is_some_and(|r| point_in_rect(mouse.column, mouse.row, r));
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll.scroll_up(WHEEL_STEP),
        _ => {}
    }
}
