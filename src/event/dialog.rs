//! Keyboard handling for the modal dialogs.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::app::{send_task, App};
use crate::async_task::Task;
use crate::dialog::{Dialog, PromptKind};
use crate::event::{menu, EventResult};
use crate::protocol::NodeKind;

pub fn handle_dialog_key(
    key: KeyEvent,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match &mut app.dialog {
        Dialog::None => Ok(false),

        Dialog::Alert { .. } => match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                app.dialog.close();
                Ok(true)
            }
            _ => Ok(false),
        },

        Dialog::ConfirmRemove { target } => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                let target = target.clone();
                app.dialog.close();
                let parent = menu::parent_for_refresh(app, &target);
                send_task(
                    app,
                    task_sender,
                    Task::RemoveEntry {
                        path: target.to_string_lossy().to_string(),
                        parent,
                        generation: app.refresh_generation,
                    },
                );
                Ok(true)
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                app.dialog.close();
                Ok(true)
            }
            _ => Ok(false),
        },

        Dialog::Prompt(prompt) => match key.code {
            KeyCode::Esc => {
                app.dialog.close();
                Ok(true)
            }
            KeyCode::Char(c) => {
                prompt.push_char(c);
                Ok(true)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(true)
            }
            KeyCode::Enter => {
                let input = prompt.input.trim().to_string();
                if input.is_empty() {
                    // Nothing to confirm with; the prompt stays open.
                    return Ok(false);
                }
                let kind = prompt.kind.clone();
                app.dialog.close();
                confirm_prompt(kind, input, app, task_sender);
                Ok(true)
            }
            _ => Ok(false),
        },

        Dialog::Search(search) => match key.code {
            KeyCode::Esc => {
                app.dialog.close();
                Ok(true)
            }
            KeyCode::Tab => {
                search.toggle_field();
                Ok(true)
            }
            KeyCode::Char(c) => {
                search.push_char(c);
                Ok(true)
            }
            KeyCode::Backspace => {
                search.backspace();
                Ok(true)
            }
            // Enter in either field acts like the confirm button: unless
            // confirm is currently disabled.
            KeyCode::Enter => {
                if !search.confirm_enabled || search.in_flight {
                    return Ok(false);
                }
                search.in_flight = true;
                let task = Task::SearchText {
                    dir: search.dir.to_string_lossy().to_string(),
                    text: search.text.clone(),
                    extension: search.extension.clone(),
                };
                // The dialog stays open; the search result decides whether
                // it closes.
                send_task(app, task_sender, task);
                Ok(true)
            }
            _ => Ok(false),
        },
    }
}

fn confirm_prompt(kind: PromptKind, input: String, app: &mut App, task_sender: &mpsc::Sender<Task>) {
    match kind {
        PromptKind::NewFile { parent } => {
            let path = parent.join(&input);
            send_task(
                app,
                task_sender,
                Task::CreateEntry {
                    path: path.to_string_lossy().to_string(),
                    kind: NodeKind::File,
                    parent: parent.to_string_lossy().to_string(),
                    generation: app.refresh_generation,
                },
            );
        }
        PromptKind::NewDir { parent } => {
            let path = parent.join(&input);
            send_task(
                app,
                task_sender,
                Task::CreateEntry {
                    path: path.to_string_lossy().to_string(),
                    kind: NodeKind::Directory,
                    parent: parent.to_string_lossy().to_string(),
                    generation: app.refresh_generation,
                },
            );
        }
        PromptKind::Rename { target } => {
            let new_path = match target.parent() {
                Some(parent) => parent.join(&input),
                None => PathBuf::from(&input),
            };
            if new_path == target {
                return;
            }
            let parent = menu::parent_for_refresh(app, &target);
            send_task(
                app,
                task_sender,
                Task::RenameEntry {
                    path: target.to_string_lossy().to_string(),
                    new_path: new_path.to_string_lossy().to_string(),
                    parent,
                    generation: app.refresh_generation,
                },
            );
        }
        PromptKind::Import { dir } => {
            let files: Vec<PathBuf> = input.split_whitespace().map(PathBuf::from).collect();
            if files.is_empty() {
                return;
            }
            app.status_message = format!("Uploading {} file(s)...", files.len());
            send_task(
                app,
                task_sender,
                Task::UploadFiles {
                    dir: dir.to_string_lossy().to_string(),
                    files,
                    generation: app.refresh_generation,
                },
            );
        }
    }
}
