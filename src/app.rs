use ratatui::layout::Rect;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

use crate::async_task::{Task, TaskResult};
use crate::config::Config;
use crate::dialog::Dialog;
use crate::editor::EditorSession;
use crate::menu::MenuState;
use crate::protocol::FoundMatch;
use crate::service::FileService;
use crate::session::{self, SessionState};
use crate::tree::{FileTree, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Tree,
    Editor,
    Results,
}

/// One batch of search matches, tagged with the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub matches: Vec<FoundMatch>,
}

/// Controller-owned view state. Everything the handlers mutate lives here,
/// not in process-wide globals, so the controller can be driven in tests
/// without a terminal.
pub struct App {
    pub config: Config,
    pub tree: FileTree,
    pub focus: PanelFocus,
    pub should_quit: bool,

    /// The last clicked/right-clicked node.
    pub current_node: Option<PathBuf>,
    pub menu: MenuState,
    pub dialog: Dialog,
    pub editor: EditorSession,

    pub search_results: Vec<SearchResults>,
    pub results_cursor: usize,

    pub status_message: String,
    pub is_loading: bool,
    /// Bumped on every full tree load; worker results from an earlier
    /// generation are stale and get dropped.
    pub refresh_generation: u64,

    pub pending_restore: Option<SessionState>,
    pub session_file: Option<PathBuf>,

    // Tree viewport state, kept current by the renderer.
    pub tree_scroll_offset: usize,
    pub tree_viewport_height: usize,
    pub tree_area: Option<Rect>,

    pub last_click: Option<(Instant, PathBuf)>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tree: FileTree::new(),
            focus: PanelFocus::Tree,
            should_quit: false,

            current_node: None,
            menu: MenuState::default(),
            dialog: Dialog::default(),
            editor: EditorSession::new(),

            search_results: Vec::new(),
            results_cursor: 0,

            status_message: "Connecting...".to_string(),
            is_loading: false,
            refresh_generation: 0,

            pending_restore: None,
            session_file: None,

            tree_scroll_offset: 0,
            tree_viewport_height: 18,
            tree_area: None,

            last_click: None,
        }
    }

    /// Single-click semantics: remember the node, mark it selected, move
    /// focus to the tree.
    pub fn set_current_node(&mut self, path: &Path) {
        if self.tree.select_node(path) {
            self.current_node = Some(path.to_path_buf());
            self.focus = PanelFocus::Tree;
        }
    }

    pub fn current_tree_node(&self) -> Option<&TreeNode> {
        self.current_node
            .as_deref()
            .and_then(|path| self.tree.find_node(path))
    }

    pub fn navigate_tree_down(&mut self) -> bool {
        let moved = self.tree.navigate_down();
        if moved {
            self.sync_current_to_selection();
        }
        moved
    }

    pub fn navigate_tree_up(&mut self) -> bool {
        let moved = self.tree.navigate_up();
        if moved {
            self.sync_current_to_selection();
        }
        moved
    }

    pub fn navigate_tree_to_first(&mut self) -> bool {
        let moved = self.tree.navigate_to_first();
        if moved {
            self.sync_current_to_selection();
        }
        moved
    }

    pub fn navigate_tree_to_last(&mut self) -> bool {
        let moved = self.tree.navigate_to_last();
        if moved {
            self.sync_current_to_selection();
        }
        moved
    }

    fn sync_current_to_selection(&mut self) {
        self.current_node = self.tree.current_selection.clone();
        self.ensure_selection_visible();
    }

    /// Scroll the tree viewport so the selected row stays on screen.
    pub fn ensure_selection_visible(&mut self) {
        let Some(selected) = self.tree.current_selection.clone() else {
            return;
        };
        let visible = self.tree.visible_nodes();
        let Some(index) = visible.iter().position(|n| n.path == selected) else {
            return;
        };
        if index < self.tree_scroll_offset {
            self.tree_scroll_offset = index;
        } else if self.tree_viewport_height > 0
            && index >= self.tree_scroll_offset + self.tree_viewport_height
        {
            self.tree_scroll_offset = index + 1 - self.tree_viewport_height;
        }
    }

    /// The refresh target for a node: the node itself when it is a
    /// directory, otherwise its parent. Falls back to a full reload when
    /// the parent is not part of the tree (root-level entries).
    pub fn refresh_task_for(&self, path: &Path) -> Task {
        let dir = match self.tree.find_node(path) {
            Some(node) if node.is_dir() => Some(path.to_path_buf()),
            _ => path
                .parent()
                .filter(|parent| self.tree.find_node(parent).is_some())
                .map(|parent| parent.to_path_buf()),
        };
        match dir {
            Some(dir) => Task::RefreshNode {
                path: dir.to_string_lossy().to_string(),
                generation: self.refresh_generation,
            },
            None => Task::LoadTree,
        }
    }
}

/// Queue a task for the background worker; a full channel is surfaced in
/// the status bar instead of blocking the interface.
pub fn send_task(app: &mut App, task_sender: &mpsc::Sender<Task>, task: Task) {
    if let Err(e) = task_sender.try_send(task) {
        log::error!("failed to queue background task: {}", e);
        app.status_message = format!("Busy, try again: {}", e);
    }
}

/// After a server-side mutation, re-fetch the affected directory: or the
/// whole tree when the mutation happened at the root level.
fn refresh_after_mutation(
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
    parent: String,
    generation: u64,
) {
    let task = if parent.is_empty() {
        Task::LoadTree
    } else {
        Task::RefreshNode {
            path: parent,
            generation,
        }
    };
    send_task(app, task_sender, task);
}

/// Apply one worker result to the controller state.
///
/// Results that target a tree location are dropped when their generation
/// predates the latest full load or when the target no longer exists -
/// a late completion must not resurrect state the user has navigated away
/// from.
pub fn handle_task_result(
    app: &mut App,
    result: TaskResult,
    service: &dyn FileService,
    task_sender: &mpsc::Sender<Task>,
) {
    app.is_loading = false;

    match result {
        TaskResult::TreeLoaded { nodes } => {
            app.tree = FileTree::from_payloads(nodes);
            app.refresh_generation += 1;
            app.tree_scroll_offset = 0;
            app.navigate_tree_to_first();
            app.status_message = "Workspace loaded".to_string();

            if let Some(state) = app.pending_restore.take() {
                session::restore(app, service, &state);
            }
        }
        TaskResult::NodeRefreshed {
            path,
            children,
            generation,
        } => {
            if generation != app.refresh_generation {
                log::info!("dropping stale refresh for {} (generation {})", path, generation);
                return;
            }
            let target = PathBuf::from(&path);
            if !app.tree.replace_children(&target, children) {
                log::info!("dropping refresh for vanished node {}", path);
                return;
            }
            app.ensure_selection_visible();
            app.status_message = format!("Refreshed {}", path);
        }
        TaskResult::ArchiveReady { path, saved_to } => {
            app.status_message = format!("Archive of {} saved to {}", path, saved_to.display());
        }
        TaskResult::UploadFinished { dir, generation } => {
            if generation != app.refresh_generation {
                log::info!("dropping stale upload completion for {}", dir);
                return;
            }
            app.status_message = format!("Upload into {} finished", dir);
            refresh_after_mutation(app, task_sender, dir, generation);
        }
        TaskResult::SearchCompleted { query, founds } => {
            if let Dialog::Search(_) = app.dialog {
                app.dialog.close();
            }
            app.status_message = format!("{} matches for \"{}\"", founds.len(), query);
            app.search_results.push(SearchResults {
                query,
                matches: founds,
            });
            app.results_cursor = 0;
            app.focus = PanelFocus::Results;
        }
        TaskResult::SearchFailed { message } => {
            // The dialog stays open; the failure lands in the status bar so
            // the user can adjust the query and retry.
            if let Dialog::Search(search) = &mut app.dialog {
                search.in_flight = false;
            }
            app.status_message = format!("Search failed: {}", message);
        }
        TaskResult::EntryCreated {
            path,
            parent,
            generation,
        } => {
            if generation != app.refresh_generation {
                return;
            }
            app.status_message = format!("Created {}", path);
            refresh_after_mutation(app, task_sender, parent, generation);
        }
        TaskResult::EntryRemoved {
            path,
            parent,
            generation,
        } => {
            if generation != app.refresh_generation {
                return;
            }
            let removed = PathBuf::from(&path);
            let closed = app.editor.close_tabs_under(&removed);
            if closed > 0 {
                log::debug!("closed {} editor tab(s) under removed {}", closed, path);
            }
            app.status_message = format!("Removed {}", path);
            refresh_after_mutation(app, task_sender, parent, generation);
        }
        TaskResult::EntryRenamed {
            path,
            new_path,
            parent,
            generation,
        } => {
            if generation != app.refresh_generation {
                return;
            }
            app.editor
                .retarget(Path::new(&path), Path::new(&new_path));
            app.status_message = format!("Renamed {} to {}", path, new_path);
            refresh_after_mutation(app, task_sender, parent, generation);
        }
        TaskResult::Error { message } => {
            // The shared alert: every failed remote call ends up here.
            app.dialog = Dialog::alert(message);
        }
    }
}
