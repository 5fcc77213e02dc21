//! Tree panel gestures: keyboard navigation, mouse selection, double-click
//! open, right-click context menus.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::App;
use crate::async_task::Task;
use crate::dialog::Dialog;
use crate::event::{file_open, EventResult};
use crate::service::FileService;

const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

pub fn handle_tree_key(
    key: KeyEvent,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    let keys = app.config.keybindings.clone();
    match key.code {
        KeyCode::Up => {
            app.navigate_tree_up();
        }
        KeyCode::Down => {
            app.navigate_tree_down();
        }
        KeyCode::Left => {
            if let Some(path) = app.tree.current_selection.clone() {
                app.tree.collapse_node(&path);
                app.ensure_selection_visible();
            }
        }
        KeyCode::Right => {
            if let Some(path) = app.tree.current_selection.clone() {
                app.tree.expand_node(&path);
                app.ensure_selection_visible();
            }
        }
        KeyCode::Enter => {
            activate_selection(app, service);
        }
        KeyCode::Delete => {
            remove_current(app);
        }
        KeyCode::Char(c) if c == keys.goto_top => {
            app.navigate_tree_to_first();
        }
        KeyCode::Char(c) if c == keys.goto_bottom => {
            app.navigate_tree_to_last();
        }
        KeyCode::Char(c) if c == keys.context_menu => {
            open_menu_at_selection(app);
        }
        KeyCode::Char(c) if c == keys.search => {
            open_search_for_selection(app);
        }
        KeyCode::Char(c) if c == keys.refresh => {
            refresh_current(app, task_sender);
        }
        KeyCode::Char(c) if c == keys.export => {
            export_current(app, task_sender);
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn handle_mouse(
    mouse: MouseEvent,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    // A click anywhere dismisses an open context menu first.
    if app.menu.is_open() {
        if let MouseEventKind::Down(_) = mouse.kind {
            app.menu.hide();
        }
    }
    if app.dialog.is_open() {
        return Ok(false);
    }
    let _ = task_sender;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(path) = node_at(app, mouse.row) else {
                return Ok(false);
            };
            let now = Instant::now();
            let is_double = matches!(
                &app.last_click,
                Some((at, last)) if *last == path && now.duration_since(*at) <= DOUBLE_CLICK_WINDOW
            );
            app.last_click = Some((now, path.clone()));

            app.set_current_node(&path);
            if is_double {
                // Double-click: files open; directory expansion is the tree
                // widget's own behavior, not a file-open.
                match app.tree.find_node(&path).map(|node| node.is_dir()) {
                    Some(true) => {
                        app.tree.toggle_node(&path);
                    }
                    Some(false) => {
                        file_open::open_file_and_report(app, service, &path, None);
                    }
                    None => {}
                }
                app.last_click = None;
            }
            Ok(true)
        }
        MouseEventKind::Down(MouseButton::Right) => {
            let Some(path) = node_at(app, mouse.row) else {
                return Ok(false);
            };
            app.set_current_node(&path);
            if let Some(node) = app.tree.find_node(&path) {
                app.menu.open_for(node, (mouse.column, mouse.row));
            }
            Ok(true)
        }
        MouseEventKind::ScrollUp => {
            app.tree_scroll_offset = app.tree_scroll_offset.saturating_sub(1);
            Ok(true)
        }
        MouseEventKind::ScrollDown => {
            let count = app.tree.visible_nodes().len();
            if app.tree_scroll_offset + 1 < count {
                app.tree_scroll_offset += 1;
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Map a screen row to the tree node rendered there.
fn node_at(app: &App, row: u16) -> Option<PathBuf> {
    let area = app.tree_area?;
    if row < area.y || row >= area.y + area.height {
        return None;
    }
    let index = (row - area.y) as usize + app.tree_scroll_offset;
    app.tree
        .visible_nodes()
        .get(index)
        .map(|node| node.path.clone())
}

/// Enter on the selection: directories toggle (widget behavior), files
/// open.
fn activate_selection(app: &mut App, service: &dyn FileService) {
    let Some(path) = app.tree.current_selection.clone() else {
        return;
    };
    app.current_node = Some(path.clone());
    match app.tree.find_node(&path).map(|node| node.is_dir()) {
        Some(true) => {
            app.tree.toggle_node(&path);
            app.ensure_selection_visible();
        }
        Some(false) => file_open::open_file_and_report(app, service, &path, None),
        None => {}
    }
}

/// Direct (non-menu) remove gesture: the capability flag is the
/// precondition; a non-removable target silently short-circuits because no
/// menu item vouched for the action.
fn remove_current(app: &mut App) {
    let Some(node) = app.current_tree_node() else {
        return;
    };
    if !node.removable {
        return;
    }
    let target = node.path.clone();
    app.menu.hide();
    app.dialog = Dialog::ConfirmRemove { target };
}

fn open_menu_at_selection(app: &mut App) {
    let Some(path) = app.tree.current_selection.clone() else {
        return;
    };
    app.current_node = Some(path.clone());
    let anchor = selection_anchor(app);
    if let Some(node) = app.tree.find_node(&path) {
        app.menu.open_for(node, anchor);
    }
}

/// Anchor a keyboard-opened menu next to the selected row.
fn selection_anchor(app: &App) -> (u16, u16) {
    let Some(area) = app.tree_area else {
        return (0, 0);
    };
    let row = app
        .tree
        .current_selection
        .as_ref()
        .and_then(|selected| {
            app.tree
                .visible_nodes()
                .iter()
                .position(|n| &n.path == selected)
        })
        .map(|index| index.saturating_sub(app.tree_scroll_offset))
        .unwrap_or(0);
    (area.x + 2, area.y + row as u16)
}

fn open_search_for_selection(app: &mut App) {
    let Some(dir) = nearest_directory(app) else {
        app.status_message = "Select something to search under".to_string();
        return;
    };
    app.menu.hide();
    app.dialog = Dialog::Search(crate::dialog::SearchDialog::open(dir));
}

fn refresh_current(app: &mut App, task_sender: &mpsc::Sender<Task>) {
    app.menu.hide();
    // With nothing loaded (or nothing selected) fall back to a full reload;
    // this is also the retry path when the initial listing failed.
    let task = match app.current_node.clone().or(app.tree.current_selection.clone()) {
        Some(path) => app.refresh_task_for(&path),
        None => Task::LoadTree,
    };
    app.is_loading = true;
    crate::app::send_task(app, task_sender, task);
}

fn export_current(app: &mut App, task_sender: &mpsc::Sender<Task>) {
    let Some(path) = app.current_node.clone().or(app.tree.current_selection.clone()) else {
        return;
    };
    app.menu.hide();
    app.status_message = format!("Exporting {}...", path.display());
    crate::app::send_task(
        app,
        task_sender,
        Task::ExportArchive {
            path: path.to_string_lossy().to_string(),
        },
    );
}

/// The directory a scoped operation applies to: the node itself when it is
/// a directory, its parent otherwise.
fn nearest_directory(app: &App) -> Option<PathBuf> {
    let path = app
        .current_node
        .clone()
        .or(app.tree.current_selection.clone())?;
    match app.tree.find_node(&path) {
        Some(node) if node.is_dir() => Some(path),
        Some(_) => path.parent().map(|p| p.to_path_buf()),
        None => None,
    }
}
