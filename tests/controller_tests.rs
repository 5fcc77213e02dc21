//! Controller-level tests driven through a mocked file service: the
//! open-file protocol, the export and search round trips, and the
//! stale-result policy for background completions.

use assert_matches::assert_matches;
use mockall::mock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use treenav::app::{handle_task_result, App, PanelFocus};
use treenav::async_task::{run_worker, Task, TaskResult};
use treenav::config::Config;
use treenav::dialog::{Dialog, SearchDialog};
use treenav::editor::Cursor;
use treenav::error::{Result, TreeNavError};
use treenav::event::file_open::{open_file, open_file_and_report, OpenOutcome};
use treenav::protocol::{FileContent, FoundMatch, NodeKind, NodePayload};
use treenav::service::FileService;
use treenav::tree::FileTree;

mock! {
    pub Service {}

    impl FileService for Service {
        fn list_tree(&self) -> Result<Vec<NodePayload>>;
        fn refresh(&self, path: &str) -> Result<Vec<NodePayload>>;
        fn read_file(&self, path: &str) -> Result<FileContent>;
        fn create_archive(&self, path: &str) -> Result<()>;
        fn download_archive(&self, path: &str) -> Result<PathBuf>;
        fn upload(&self, dir: &str, files: &[PathBuf]) -> Result<()>;
        fn search_text(&self, dir: &str, text: &str, extension: &str) -> Result<Vec<FoundMatch>>;
        fn create_entry(&self, path: &str, kind: NodeKind) -> Result<()>;
        fn remove_entry(&self, path: &str) -> Result<()>;
        fn rename_entry(&self, path: &str, new_path: &str) -> Result<()>;
    }
}

fn file(name: &str, path: &str) -> NodePayload {
    NodePayload {
        name: name.to_string(),
        path: path.to_string(),
        kind: NodeKind::File,
        removable: true,
        creatable: true,
        children: Vec::new(),
    }
}

fn dir(name: &str, path: &str, children: Vec<NodePayload>) -> NodePayload {
    NodePayload {
        name: name.to_string(),
        path: path.to_string(),
        kind: NodeKind::Directory,
        removable: true,
        creatable: true,
        children,
    }
}

/// An app with a small workspace already loaded:
/// /proj/{src/{main.go, util.go}, README.md}
fn test_app() -> App {
    let mut app = App::new(Config::default());
    app.tree = FileTree::from_payloads(vec![dir(
        "proj",
        "/proj",
        vec![
            dir(
                "src",
                "/proj/src",
                vec![
                    file("main.go", "/proj/src/main.go"),
                    file("util.go", "/proj/src/util.go"),
                ],
            ),
            file("README.md", "/proj/README.md"),
        ],
    )]);
    app.refresh_generation = 1;
    app
}

fn go_content(path: &str) -> FileContent {
    FileContent {
        path: path.to_string(),
        mode: "go".to_string(),
        content: "package main\n\nfunc main() {}\n".to_string(),
    }
}

fn task_channel() -> (mpsc::Sender<Task>, mpsc::Receiver<Task>) {
    mpsc::channel(32)
}

// Open-file protocol

#[test]
fn first_open_issues_exactly_one_content_request() {
    let mut app = test_app();
    let mut service = MockService::new();
    service
        .expect_read_file()
        .withf(|path| path == "/proj/src/main.go")
        .times(1)
        .returning(|path| Ok(go_content(path)));

    let outcome = open_file(&mut app, &service, Path::new("/proj/src/main.go"), None).unwrap();
    assert_eq!(outcome, OpenOutcome::Opened);
    assert_eq!(app.editor.tabs.len(), 1);
    assert_eq!(app.focus, PanelFocus::Editor);
    assert_eq!(app.editor.cursor_readout().as_deref(), Some("1:1"));

    // Opening again finds the tab; the mock would reject a second request.
    let outcome = open_file(&mut app, &service, Path::new("/proj/src/main.go"), None).unwrap();
    assert_eq!(outcome, OpenOutcome::AlreadyOpen);
    assert_eq!(app.editor.tabs.len(), 1);
}

#[test]
fn opening_an_already_open_file_never_issues_a_request() {
    let mut app = test_app();
    app.editor
        .open_tab(Path::new("/proj/src/main.go"), "package main\n", None);

    // No expectations configured: any call on the service would panic.
    let service = MockService::new();
    let outcome = open_file(
        &mut app,
        &service,
        Path::new("/proj/src/main.go"),
        Some(Cursor::new(0, 3)),
    )
    .unwrap();

    assert_eq!(outcome, OpenOutcome::AlreadyOpen);
    assert_eq!(app.editor.cursor_readout().as_deref(), Some("1:4"));
    assert_eq!(app.focus, PanelFocus::Editor);
}

#[test]
fn already_open_files_apply_the_supplied_cursor_and_center_it() {
    let mut app = test_app();
    app.editor.viewport_height = 10;
    let content: String = (0..100).map(|i| format!("line {}\n", i)).collect();
    app.editor
        .open_tab(Path::new("/proj/src/main.go"), &content, None);

    let service = MockService::new();
    open_file(
        &mut app,
        &service,
        Path::new("/proj/src/main.go"),
        Some(Cursor::new(50, 0)),
    )
    .unwrap();

    let tab = app.editor.current_tab().unwrap();
    assert_eq!(tab.cursor.line, 50);
    // Scrolled so the cursor sits half a viewport down.
    assert_eq!(tab.scroll_top, 45);
}

#[test]
fn image_files_never_create_an_editor_tab() {
    let mut app = test_app();
    let mut service = MockService::new();
    service.expect_read_file().times(1).returning(|path| {
        Ok(FileContent {
            path: path.to_string(),
            mode: "img".to_string(),
            content: String::new(),
        })
    });

    let outcome = open_file(&mut app, &service, Path::new("/proj/README.md"), None).unwrap();
    assert_eq!(
        outcome,
        OpenOutcome::OpenedExternally("/proj/README.md".to_string())
    );
    assert!(app.editor.tabs.is_empty());
}

#[test]
fn directories_are_not_opened_as_editors() {
    let mut app = test_app();
    // No expectations: a directory open must not reach the service.
    let service = MockService::new();

    let outcome = open_file(&mut app, &service, Path::new("/proj/src"), None).unwrap();
    assert_eq!(outcome, OpenOutcome::DirectoryIgnored);
    assert!(app.editor.tabs.is_empty());
}

#[test]
fn a_server_refusal_surfaces_the_message_and_stops() {
    let mut app = test_app();
    let mut service = MockService::new();
    service
        .expect_read_file()
        .times(1)
        .returning(|_| Err(TreeNavError::Server("file is locked".to_string())));

    open_file_and_report(&mut app, &service, Path::new("/proj/src/main.go"), None);

    assert_matches!(&app.dialog, Dialog::Alert { message } if message == "file is locked");
    assert!(app.editor.tabs.is_empty());
}

// Export

#[tokio::test]
async fn export_creates_the_archive_then_downloads_it() {
    let mut service = MockService::new();
    service
        .expect_create_archive()
        .withf(|path| path == "/proj")
        .times(1)
        .returning(|_| Ok(()));
    service
        .expect_download_archive()
        .withf(|path| path == "/proj")
        .times(1)
        .returning(|_| Ok(PathBuf::from("/downloads/proj.zip")));

    let result = run_one_task(service, Task::ExportArchive { path: "/proj".to_string() }).await;
    assert_matches!(
        result,
        TaskResult::ArchiveReady { path, saved_to }
            if path == "/proj" && saved_to == PathBuf::from("/downloads/proj.zip")
    );
}

#[tokio::test]
async fn a_declined_export_downloads_nothing_and_alerts() {
    let mut service = MockService::new();
    service
        .expect_create_archive()
        .times(1)
        .returning(|_| Err(TreeNavError::Server("workspace too large".to_string())));
    // No download_archive expectation: a download attempt would panic.

    let result = run_one_task(service, Task::ExportArchive { path: "/proj".to_string() }).await;
    assert_matches!(&result, TaskResult::Error { message } if message == "workspace too large");

    // The failure lands in the shared alert dialog.
    let mut app = test_app();
    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(&mut app, result, &MockService::new(), &task_sender);
    assert_matches!(&app.dialog, Dialog::Alert { message } if message == "workspace too large");
}

// Search

#[tokio::test]
async fn search_success_closes_the_dialog_and_tags_the_results() {
    let mut service = MockService::new();
    service
        .expect_search_text()
        .withf(|dir, text, extension| dir == "/proj" && text == "foo" && extension == "go")
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![FoundMatch {
                path: "/proj/src/main.go".to_string(),
                line: 3,
                snippet: "foo()".to_string(),
            }])
        });

    let result = run_one_task(
        service,
        Task::SearchText {
            dir: "/proj".to_string(),
            text: "foo".to_string(),
            extension: "go".to_string(),
        },
    )
    .await;

    let mut app = test_app();
    let mut dialog = SearchDialog::open(PathBuf::from("/proj"));
    dialog.push_char('f');
    dialog.in_flight = true;
    app.dialog = Dialog::Search(dialog);

    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(&mut app, result, &MockService::new(), &task_sender);

    assert_matches!(app.dialog, Dialog::None);
    assert_eq!(app.search_results.len(), 1);
    assert_eq!(app.search_results[0].query, "foo");
    assert_eq!(app.search_results[0].matches.len(), 1);
    assert_eq!(app.focus, PanelFocus::Results);
}

#[tokio::test]
async fn search_failure_leaves_the_dialog_open() {
    let mut service = MockService::new();
    service
        .expect_search_text()
        .times(1)
        .returning(|_, _, _| Err(TreeNavError::Server("index not ready".to_string())));

    let result = run_one_task(
        service,
        Task::SearchText {
            dir: "/proj".to_string(),
            text: "foo".to_string(),
            extension: String::new(),
        },
    )
    .await;
    assert_matches!(&result, TaskResult::SearchFailed { .. });

    let mut app = test_app();
    let mut dialog = SearchDialog::open(PathBuf::from("/proj"));
    dialog.push_char('f');
    dialog.in_flight = true;
    app.dialog = Dialog::Search(dialog);

    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(&mut app, result, &MockService::new(), &task_sender);

    // Still open, ready for a retry.
    assert_matches!(&app.dialog, Dialog::Search(search) if !search.in_flight);
    assert!(app.search_results.is_empty());
}

// Stale background results

#[test]
fn a_refresh_from_an_earlier_generation_is_dropped() {
    let mut app = test_app();
    app.refresh_generation = 5;

    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(
        &mut app,
        TaskResult::NodeRefreshed {
            path: "/proj".to_string(),
            children: vec![file("late.go", "/proj/late.go")],
            generation: 4,
        },
        &MockService::new(),
        &task_sender,
    );

    assert!(app.tree.find_node(Path::new("/proj/late.go")).is_none());
    assert!(app.tree.find_node(Path::new("/proj/README.md")).is_some());
}

#[test]
fn a_refresh_for_a_vanished_node_is_dropped() {
    let mut app = test_app();

    let (task_sender, _task_receiver) = task_channel();
    let generation = app.refresh_generation;
    handle_task_result(
        &mut app,
        TaskResult::NodeRefreshed {
            path: "/gone".to_string(),
            children: vec![file("x.go", "/gone/x.go")],
            generation,
        },
        &MockService::new(),
        &task_sender,
    );

    assert!(app.tree.find_node(Path::new("/gone/x.go")).is_none());
}

#[test]
fn a_current_refresh_replaces_the_subtree_in_place() {
    let mut app = test_app();
    app.tree.expand_node(Path::new("/proj"));

    let (task_sender, _task_receiver) = task_channel();
    let generation = app.refresh_generation;
    handle_task_result(
        &mut app,
        TaskResult::NodeRefreshed {
            path: "/proj".to_string(),
            children: vec![file("fresh.go", "/proj/fresh.go")],
            generation,
        },
        &MockService::new(),
        &task_sender,
    );

    assert!(app.tree.find_node(Path::new("/proj/fresh.go")).is_some());
    assert!(app.tree.find_node(Path::new("/proj/README.md")).is_none());
}

// Server-side mutations

#[test]
fn removing_a_directory_closes_its_tabs_and_refreshes_the_parent() {
    let mut app = test_app();
    app.editor
        .open_tab(Path::new("/proj/src/main.go"), "package main\n", None);
    app.editor
        .open_tab(Path::new("/proj/README.md"), "# proj\n", None);

    let (task_sender, mut task_receiver) = task_channel();
    let generation = app.refresh_generation;
    handle_task_result(
        &mut app,
        TaskResult::EntryRemoved {
            path: "/proj/src".to_string(),
            parent: "/proj".to_string(),
            generation,
        },
        &MockService::new(),
        &task_sender,
    );

    assert_eq!(app.editor.open_paths(), vec![PathBuf::from("/proj/README.md")]);
    assert_matches!(
        task_receiver.try_recv(),
        Ok(Task::RefreshNode { path, .. }) if path == "/proj"
    );
}

#[test]
fn renaming_retargets_open_tabs() {
    let mut app = test_app();
    app.editor
        .open_tab(Path::new("/proj/src/main.go"), "package main\n", None);

    let (task_sender, mut task_receiver) = task_channel();
    let generation = app.refresh_generation;
    handle_task_result(
        &mut app,
        TaskResult::EntryRenamed {
            path: "/proj/src".to_string(),
            new_path: "/proj/lib".to_string(),
            parent: "/proj".to_string(),
            generation,
        },
        &MockService::new(),
        &task_sender,
    );

    assert_eq!(
        app.editor.open_paths(),
        vec![PathBuf::from("/proj/lib/main.go")]
    );
    assert_matches!(task_receiver.try_recv(), Ok(Task::RefreshNode { .. }));
}

// Initial load and session restore

#[test]
fn a_fresh_tree_load_restores_the_saved_session() {
    let mut app = App::new(Config::default());
    app.pending_restore = Some(treenav::session::SessionState {
        expanded: vec![PathBuf::from("/proj"), PathBuf::from("/proj/src")],
        open_files: vec![PathBuf::from("/proj/src/main.go")],
        current_file: Some(PathBuf::from("/proj/src/main.go")),
    });

    let mut service = MockService::new();
    service
        .expect_read_file()
        .withf(|path| path == "/proj/src/main.go")
        .times(1)
        .returning(|path| Ok(go_content(path)));

    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(
        &mut app,
        TaskResult::TreeLoaded {
            nodes: vec![dir(
                "proj",
                "/proj",
                vec![dir(
                    "src",
                    "/proj/src",
                    vec![file("main.go", "/proj/src/main.go")],
                )],
            )],
        },
        &service,
        &task_sender,
    );

    // Re-expanded and re-opened through the normal open-file path.
    assert!(app.tree.find_node(Path::new("/proj")).unwrap().is_expanded);
    assert!(app.tree.find_node(Path::new("/proj/src")).unwrap().is_expanded);
    assert_eq!(
        app.editor.open_paths(),
        vec![PathBuf::from("/proj/src/main.go")]
    );
    assert_eq!(
        app.tree.current_selection,
        Some(PathBuf::from("/proj/src/main.go"))
    );
}

#[test]
fn restore_skips_files_the_server_no_longer_has() {
    let mut app = App::new(Config::default());
    app.pending_restore = Some(treenav::session::SessionState {
        expanded: vec![],
        open_files: vec![
            PathBuf::from("/proj/gone.go"),
            PathBuf::from("/proj/kept.go"),
        ],
        current_file: None,
    });

    let mut service = MockService::new();
    service
        .expect_read_file()
        .withf(|path| path == "/proj/gone.go")
        .times(1)
        .returning(|_| Err(TreeNavError::Server("no such file".to_string())));
    service
        .expect_read_file()
        .withf(|path| path == "/proj/kept.go")
        .times(1)
        .returning(|path| Ok(go_content(path)));

    let (task_sender, _task_receiver) = task_channel();
    handle_task_result(
        &mut app,
        TaskResult::TreeLoaded {
            nodes: vec![dir("proj", "/proj", vec![file("kept.go", "/proj/kept.go")])],
        },
        &service,
        &task_sender,
    );

    assert_eq!(app.editor.open_paths(), vec![PathBuf::from("/proj/kept.go")]);
}

// Worker plumbing

async fn run_one_task(service: MockService, task: Task) -> TaskResult {
    let (task_sender, task_receiver) = mpsc::channel::<Task>(4);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(4);
    let shutdown = CancellationToken::new();

    let worker = tokio::spawn(run_worker(
        Arc::new(service),
        task_receiver,
        result_sender,
        shutdown.clone(),
    ));

    task_sender.send(task).await.unwrap();
    let result = result_receiver.recv().await.expect("worker result");

    shutdown.cancel();
    let _ = worker.await;
    result
}

#[tokio::test]
async fn worker_stops_on_shutdown() {
    let (task_sender, task_receiver) = mpsc::channel::<Task>(4);
    let (result_sender, _result_receiver) = mpsc::channel::<TaskResult>(4);
    let shutdown = CancellationToken::new();

    let worker = tokio::spawn(run_worker(
        Arc::new(MockService::new()),
        task_receiver,
        result_sender,
        shutdown.clone(),
    ));

    shutdown.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(1), worker)
        .await
        .expect("worker exits promptly")
        .unwrap();
    drop(task_sender);
}
