//! The open-file protocol.
//!
//! Two terminal states: a file is either already open in a tab, or it gets
//! opened by fetching its content. The content fetch is deliberately
//! blocking: the tab must exist before the calling handler returns: and
//! runs on the HTTP client's request timeout, so it cannot hang the
//! interface indefinitely or complete after the handler has moved on.

use std::path::Path;

use crate::app::{App, PanelFocus};
use crate::editor::Cursor;
use crate::error::Result;
use crate::service::FileService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A tab was already bound to this path; it was focused, no request
    /// issued.
    AlreadyOpen,
    /// Content was fetched and a new tab created.
    Opened,
    /// The server classified the content as an image; it is handed off
    /// instead of opening an editor. Carries the server path.
    OpenedExternally(String),
    /// Directories are not opened as editors.
    DirectoryIgnored,
}

pub fn open_file(
    app: &mut App,
    service: &dyn FileService,
    path: &Path,
    cursor: Option<Cursor>,
) -> Result<OpenOutcome> {
    app.current_node = Some(path.to_path_buf());
    app.tree.select_node(path);

    // Already open: bring the tab forward, no request.
    if let Some(index) = app.editor.find_tab(path) {
        app.editor.focus_tab(index, cursor);
        app.focus = PanelFocus::Editor;
        return Ok(OpenOutcome::AlreadyOpen);
    }

    if let Some(node) = app.tree.find_node(path) {
        if node.is_dir() {
            return Ok(OpenOutcome::DirectoryIgnored);
        }
    }

    // Not yet open: fetch content, blocking until the server answers.
    let content = service.read_file(path.to_string_lossy().as_ref())?;

    if content.is_image() {
        return Ok(OpenOutcome::OpenedExternally(content.path));
    }

    app.editor.open_tab(path, &content.content, cursor);
    app.focus = PanelFocus::Editor;
    Ok(OpenOutcome::Opened)
}

/// `open_file` with the shared failure policy applied: server refusals and
/// transport errors surface through the alert dialog; image handoffs land
/// in the status bar.
pub fn open_file_and_report(
    app: &mut App,
    service: &dyn FileService,
    path: &Path,
    cursor: Option<Cursor>,
) {
    match open_file(app, service, path, cursor) {
        Ok(OpenOutcome::OpenedExternally(server_path)) => {
            app.status_message = format!("Image opened externally: {}", server_path);
        }
        Ok(OpenOutcome::AlreadyOpen) | Ok(OpenOutcome::Opened) => {
            if let Some(readout) = app.editor.cursor_readout() {
                app.status_message = readout;
            }
        }
        Ok(OpenOutcome::DirectoryIgnored) => {}
        Err(e) => {
            app.dialog = crate::dialog::Dialog::alert(e.alert_text());
        }
    }
}
