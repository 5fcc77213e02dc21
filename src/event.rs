//! Gesture translation: terminal input events become navigation, menu,
//! dialog, and editor actions. Modal layers own the keyboard in order:
//! dialog, then context menu, then the focused panel.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{App, PanelFocus};
use crate::async_task::Task;
use crate::editor::Cursor;
use crate::service::FileService;

pub mod dialog;
pub mod file_open;
pub mod menu;
pub mod navigator;

pub type EventResult = crate::error::Result<bool>; // true if UI needs update

pub fn handle_event(
    event: Event,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match event {
        Event::Key(key) => handle_key(key, app, service, task_sender),
        Event::Mouse(mouse) => navigator::handle_mouse(mouse, app, service, task_sender),
        Event::Resize(_, _) => Ok(true),
        _ => Ok(false),
    }
}

fn handle_key(
    key: KeyEvent,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    // Ctrl+C always quits, whatever is on screen.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(false);
    }

    // Modal layers first.
    if app.dialog.is_open() {
        return dialog::handle_dialog_key(key, app, task_sender);
    }
    if app.menu.is_open() {
        return menu::handle_menu_key(key, app, service, task_sender);
    }

    // Global keybindings.
    match key.code {
        KeyCode::Char(c) if c == app.config.keybindings.quit => {
            app.should_quit = true;
            return Ok(false);
        }
        KeyCode::Tab => {
            cycle_focus(app);
            return Ok(true);
        }
        _ => {}
    }

    // Panel-specific keybindings.
    match app.focus {
        PanelFocus::Tree => navigator::handle_tree_key(key, app, service, task_sender),
        PanelFocus::Editor => handle_editor_key(key, app),
        PanelFocus::Results => handle_results_key(key, app, service),
    }
}

fn cycle_focus(app: &mut App) {
    app.focus = match app.focus {
        PanelFocus::Tree if app.editor.current.is_some() => PanelFocus::Editor,
        PanelFocus::Tree if !app.search_results.is_empty() => PanelFocus::Results,
        PanelFocus::Tree => PanelFocus::Tree,
        PanelFocus::Editor if !app.search_results.is_empty() => PanelFocus::Results,
        PanelFocus::Editor => PanelFocus::Tree,
        PanelFocus::Results => PanelFocus::Tree,
    };
}

fn handle_editor_key(key: KeyEvent, app: &mut App) -> EventResult {
    match key.code {
        KeyCode::Up => app.editor.move_cursor(-1, 0),
        KeyCode::Down => app.editor.move_cursor(1, 0),
        KeyCode::Left => app.editor.move_cursor(0, -1),
        KeyCode::Right => app.editor.move_cursor(0, 1),
        KeyCode::PageUp => {
            let page = app.editor.viewport_height as isize;
            app.editor.move_cursor(-page, 0);
        }
        KeyCode::PageDown => {
            let page = app.editor.viewport_height as isize;
            app.editor.move_cursor(page, 0);
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.editor.close_current_tab();
            if app.editor.current.is_none() {
                app.focus = PanelFocus::Tree;
            }
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.editor.next_tab();
        }
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.editor.previous_tab();
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn handle_results_key(key: KeyEvent, app: &mut App, service: &dyn FileService) -> EventResult {
    let flat_len: usize = app
        .search_results
        .iter()
        .map(|batch| batch.matches.len())
        .sum();

    match key.code {
        KeyCode::Up => {
            app.results_cursor = app.results_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if flat_len > 0 {
                app.results_cursor = (app.results_cursor + 1).min(flat_len - 1);
            }
        }
        KeyCode::Enter => {
            // Jump to the match: open the file with the cursor on the
            // matched line.
            let hit = app
                .search_results
                .iter()
                .flat_map(|batch| batch.matches.iter())
                .nth(app.results_cursor)
                .cloned();
            if let Some(hit) = hit {
                let path = std::path::PathBuf::from(&hit.path);
                let cursor = Cursor::new(hit.line.saturating_sub(1), 0);
                file_open::open_file_and_report(app, service, &path, Some(cursor));
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}
