//! Session persistence: which directories were expanded and which files
//! were open, restored after the initial listing succeeds.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::App;
use crate::error::Result;
use crate::event::file_open;
use crate::service::FileService;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub expanded: Vec<PathBuf>,
    #[serde(default)]
    pub open_files: Vec<PathBuf>,
    #[serde(default)]
    pub current_file: Option<PathBuf>,
}

impl SessionState {
    pub fn capture(app: &App) -> Self {
        Self {
            expanded: app.tree.expanded_paths(),
            open_files: app.editor.open_paths(),
            current_file: app.editor.current_tab().map(|tab| tab.path.clone()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("treenav").join("session.json"))
    }

    /// Load a previous session; corrupt or missing files are ignored with a
    /// log line rather than failing startup.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("no session state at {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("ignoring unreadable session state {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Re-apply a saved session to a freshly loaded tree: expand the remembered
/// directories, then re-open files through the normal open-file protocol.
/// Individual failures (a file deleted on the server since last run) are
/// logged and skipped.
pub fn restore(app: &mut App, service: &dyn FileService, state: &SessionState) {
    for path in &state.expanded {
        app.tree.expand_node(path);
    }

    for path in &state.open_files {
        if let Err(e) = file_open::open_file(app, service, path, None) {
            log::warn!("could not reopen {}: {}", path.display(), e);
        }
    }

    if let Some(current) = &state.current_file {
        if let Some(index) = app.editor.find_tab(current) {
            app.editor.focus_tab(index, None);
        }
        app.set_current_node(current);
    }
    app.ensure_selection_visible();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("session.json");

        let state = SessionState {
            expanded: vec![PathBuf::from("/proj"), PathBuf::from("/proj/src")],
            open_files: vec![PathBuf::from("/proj/src/main.go")],
            current_file: Some(PathBuf::from("/proj/src/main.go")),
        };
        state.save(&file).unwrap();

        assert_eq!(SessionState::load(&file), Some(state));
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(SessionState::load(&dir.path().join("absent.json")), None);
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("session.json");
        fs::write(&file, "{ not json").unwrap();
        assert_eq!(SessionState::load(&file), None);
    }
}
