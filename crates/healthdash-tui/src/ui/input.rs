//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes and controller
//! actions.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use healthdash_core::view::Tab;

use crate::app::{can_add_query_char, App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                Ok(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                Ok(false)
            }
            _ => Ok(false),
        },
        AppState::PickingMember => {
            handle_picker_input(app, key);
            Ok(false)
        }
        AppState::Quitting => Ok(true),
        AppState::Normal if app.current_tab == Tab::AiChat => Ok(handle_ai_chat_input(app, key)),
        AppState::Normal => Ok(handle_normal_input(app, key)),
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('m') => open_member_picker(app),
        KeyCode::Char('r') => app.retry_current(),
        KeyCode::Char(c @ '1'..='8') => {
            let index = c as usize - '1' as usize;
            if let Some(tab) = Tab::from_index(index) {
                app.select_tab(tab);
            }
        }
        KeyCode::Tab | KeyCode::Right => app.select_tab(app.current_tab.next()),
        KeyCode::BackTab | KeyCode::Left => app.select_tab(app.current_tab.prev()),
        KeyCode::Up | KeyCode::Char('k') => {
            app.content_scroll = app.content_scroll.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.content_scroll = app.content_scroll.saturating_add(1);
        }
        KeyCode::PageUp => {
            app.content_scroll = app.content_scroll.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.content_scroll = app.content_scroll.saturating_add(PAGE_SCROLL_SIZE);
        }
        KeyCode::Home => app.content_scroll = 0,
        _ => {}
    }
    false
}

/// The AI tab owns the keyboard: printable keys go to the input line.
fn handle_ai_chat_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab => app.select_tab(app.current_tab.next()),
        KeyCode::BackTab => app.select_tab(app.current_tab.prev()),
        KeyCode::Esc => {
            if app.query_input.is_empty() {
                app.select_tab(Tab::Profile);
            } else {
                app.query_input.clear();
            }
        }
        KeyCode::Enter => {
            if app.query_pending {
                app.status_message = Some("Waiting for the previous answer...".to_string());
            } else {
                app.submit_query();
            }
        }
        KeyCode::Backspace => {
            app.query_input.pop();
        }
        KeyCode::Up => app.content_scroll = app.content_scroll.saturating_sub(1),
        KeyCode::Down => app.content_scroll = app.content_scroll.saturating_add(1),
        KeyCode::Char(c) => {
            if can_add_query_char(app.query_input.chars().count(), c) {
                app.query_input.push(c);
            }
        }
        _ => {}
    }
    false
}

fn open_member_picker(app: &mut App) {
    if app.members.is_empty() {
        app.load_members();
    }
    app.state = AppState::PickingMember;
}

fn handle_picker_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            if app.member.is_some() {
                app.state = AppState::Normal;
            } else {
                app.state = AppState::ConfirmingQuit;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.member_selection = app.member_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.member_selection + 1 < app.members.len() {
                app.member_selection += 1;
            }
        }
        KeyCode::Char('r') => app.load_members(),
        KeyCode::Enter => {
            if let Some(summary) = app.members.get(app.member_selection) {
                let member = summary.member_id();
                app.state = AppState::Normal;
                app.focus_member(member);
            }
        }
        _ => {}
    }
}
