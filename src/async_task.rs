//! Background worker for the non-blocking remote operations.
//!
//! Listing, refresh, export, upload, search, and the dialog-backed
//! mutations all run here so the interface never stalls on them. Each task
//! wraps its blocking HTTP call in `spawn_blocking`. Results that target a
//! tree location carry the path and the refresh generation they were issued
//! under, so stale completions can be dropped instead of applied.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TreeNavError};
use crate::protocol::{FoundMatch, NodeKind, NodePayload};
use crate::service::FileService;

#[derive(Debug, Clone)]
pub enum Task {
    LoadTree,
    RefreshNode {
        path: String,
        generation: u64,
    },
    ExportArchive {
        path: String,
    },
    UploadFiles {
        dir: String,
        files: Vec<PathBuf>,
        generation: u64,
    },
    SearchText {
        dir: String,
        text: String,
        extension: String,
    },
    CreateEntry {
        path: String,
        kind: NodeKind,
        parent: String,
        generation: u64,
    },
    RemoveEntry {
        path: String,
        parent: String,
        generation: u64,
    },
    RenameEntry {
        path: String,
        new_path: String,
        parent: String,
        generation: u64,
    },
}

#[derive(Debug, Clone)]
pub enum TaskResult {
    TreeLoaded {
        nodes: Vec<NodePayload>,
    },
    NodeRefreshed {
        path: String,
        children: Vec<NodePayload>,
        generation: u64,
    },
    ArchiveReady {
        path: String,
        saved_to: PathBuf,
    },
    UploadFinished {
        dir: String,
        generation: u64,
    },
    SearchCompleted {
        query: String,
        founds: Vec<FoundMatch>,
    },
    /// Search failures keep the search dialog open instead of raising the
    /// shared alert, so they get their own variant.
    SearchFailed {
        message: String,
    },
    EntryCreated {
        path: String,
        parent: String,
        generation: u64,
    },
    EntryRemoved {
        path: String,
        parent: String,
        generation: u64,
    },
    EntryRenamed {
        path: String,
        new_path: String,
        parent: String,
        generation: u64,
    },
    Error {
        message: String,
    },
}

pub async fn run_worker(
    service: Arc<dyn FileService>,
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    shutdown: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = shutdown.cancelled() => break,
            task = task_receiver.recv() => match task {
                Some(task) => task,
                // Main thread dropped the sender, exit worker
                None => break,
            },
        };

        log::debug!("worker: executing {:?}", std::mem::discriminant(&task));
        let result = execute(service.clone(), task).await;

        if result_sender.send(result).await.is_err() {
            break;
        }
    }
}

async fn execute(service: Arc<dyn FileService>, task: Task) -> TaskResult {
    match task {
        Task::LoadTree => match run_blocking(move || service.list_tree()).await {
            Ok(nodes) => TaskResult::TreeLoaded { nodes },
            Err(e) => error_result(e),
        },
        Task::RefreshNode { path, generation } => {
            let target = path.clone();
            match run_blocking(move || service.refresh(&target)).await {
                Ok(children) => TaskResult::NodeRefreshed {
                    path,
                    children,
                    generation,
                },
                Err(e) => error_result(e),
            }
        }
        Task::ExportArchive { path } => {
            let target = path.clone();
            let outcome = run_blocking(move || {
                service.create_archive(&target)?;
                service.download_archive(&target)
            })
            .await;
            match outcome {
                Ok(saved_to) => TaskResult::ArchiveReady { path, saved_to },
                Err(e) => error_result(e),
            }
        }
        Task::UploadFiles {
            dir,
            files,
            generation,
        } => {
            let target = dir.clone();
            match run_blocking(move || service.upload(&target, &files)).await {
                Ok(()) => TaskResult::UploadFinished { dir, generation },
                Err(e) => error_result(e),
            }
        }
        Task::SearchText {
            dir,
            text,
            extension,
        } => {
            let query = text.clone();
            match run_blocking(move || service.search_text(&dir, &text, &extension)).await {
                Ok(founds) => TaskResult::SearchCompleted { query, founds },
                Err(e) => TaskResult::SearchFailed {
                    message: e.alert_text(),
                },
            }
        }
        Task::CreateEntry {
            path,
            kind,
            parent,
            generation,
        } => {
            let target = path.clone();
            match run_blocking(move || service.create_entry(&target, kind)).await {
                Ok(()) => TaskResult::EntryCreated {
                    path,
                    parent,
                    generation,
                },
                Err(e) => error_result(e),
            }
        }
        Task::RemoveEntry {
            path,
            parent,
            generation,
        } => {
            let target = path.clone();
            match run_blocking(move || service.remove_entry(&target)).await {
                Ok(()) => TaskResult::EntryRemoved {
                    path,
                    parent,
                    generation,
                },
                Err(e) => error_result(e),
            }
        }
        Task::RenameEntry {
            path,
            new_path,
            parent,
            generation,
        } => {
            let from = path.clone();
            let to = new_path.clone();
            match run_blocking(move || service.rename_entry(&from, &to)).await {
                Ok(()) => TaskResult::EntryRenamed {
                    path,
                    new_path,
                    parent,
                    generation,
                },
                Err(e) => error_result(e),
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(TreeNavError::Generic(format!("worker task failed: {}", e))),
    }
}

fn error_result(e: TreeNavError) -> TaskResult {
    TaskResult::Error {
        message: e.alert_text(),
    }
}
