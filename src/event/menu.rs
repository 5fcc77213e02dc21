//! Context-menu keyboard handling and action dispatch.
//!
//! Every mutating operation follows the same protocol: the menu item (or
//! capability flag) vouches for the action, the menus are hidden, then a
//! dialog collects input or the request is issued directly.

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::app::{send_task, App};
use crate::async_task::Task;
use crate::dialog::{Dialog, PromptDialog, PromptKind, SearchDialog};
use crate::event::{file_open, EventResult};
use crate::menu::MenuAction;
use crate::service::FileService;

pub fn handle_menu_key(
    key: KeyEvent,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.menu.hide();
            Ok(true)
        }
        KeyCode::Up => {
            if let Some(menu) = app.menu.as_open_mut() {
                menu.select_previous();
            }
            Ok(true)
        }
        KeyCode::Down => {
            if let Some(menu) = app.menu.as_open_mut() {
                menu.select_next();
            }
            Ok(true)
        }
        KeyCode::Enter => {
            let Some(menu) = app.menu.as_open() else {
                return Ok(false);
            };
            let target = menu.target.clone();
            match menu.activate() {
                Some(action) => {
                    app.menu.hide();
                    dispatch_action(action, target, app, service, task_sender);
                    Ok(true)
                }
                // Disabled item: silent short-circuit, menu stays up.
                None => Ok(false),
            }
        }
        _ => Ok(false),
    }
}

pub fn dispatch_action(
    action: MenuAction,
    target: PathBuf,
    app: &mut App,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) {
    match action {
        MenuAction::Open => {
            file_open::open_file_and_report(app, service, &target, None);
        }
        MenuAction::NewFile => {
            app.dialog = Dialog::Prompt(PromptDialog::new(PromptKind::NewFile { parent: target }));
        }
        MenuAction::NewDir => {
            app.dialog = Dialog::Prompt(PromptDialog::new(PromptKind::NewDir { parent: target }));
        }
        MenuAction::Rename => {
            app.dialog = Dialog::Prompt(PromptDialog::rename(&target));
        }
        MenuAction::Remove => {
            app.dialog = Dialog::ConfirmRemove { target };
        }
        MenuAction::Export => {
            app.status_message = format!("Exporting {}...", target.display());
            send_task(
                app,
                task_sender,
                Task::ExportArchive {
                    path: target.to_string_lossy().to_string(),
                },
            );
        }
        MenuAction::Import => {
            app.dialog = Dialog::Prompt(PromptDialog::new(PromptKind::Import { dir: target }));
        }
        MenuAction::Refresh => {
            send_task(
                app,
                task_sender,
                Task::RefreshNode {
                    path: target.to_string_lossy().to_string(),
                    generation: app.refresh_generation,
                },
            );
        }
        MenuAction::Search => {
            app.dialog = Dialog::Search(SearchDialog::open(target));
        }
    }
}

/// The parent a post-mutation refresh should target, as the server knows
/// the tree. Root-level entries fall back to a full reload.
pub fn parent_for_refresh(app: &App, path: &Path) -> String {
    path.parent()
        .filter(|parent| app.tree.find_node(parent).is_some())
        .map(|parent| parent.to_string_lossy().to_string())
        .unwrap_or_default()
}
