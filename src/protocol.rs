//! Wire types for the workspace file service.
//!
//! Every response is wrapped in the `{succ, msg, ...}` envelope convention;
//! `succ = false` always aborts the calling operation and surfaces `msg`.

use serde::{Deserialize, Serialize};

/// Base request body: every call carries at least a `path`, built fresh per
/// call.
#[derive(Debug, Clone, Serialize)]
pub struct PathRequest {
    pub path: String,
}

impl PathRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Request body for `/file/search/text`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub dir: String,
    pub text: String,
    pub extension: String,
}

/// Request body for `/file/new`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest {
    pub path: String,
    pub kind: NodeKind,
}

/// Request body for `/file/rename`.
#[derive(Debug, Clone, Serialize)]
pub struct RenameRequest {
    pub path: String,
    pub new_path: String,
}

/// The bare `{succ, msg}` envelope, used by operations with no extra payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub succ: bool,
    #[serde(default)]
    pub msg: String,
}

/// Whether a node is a file or a directory.
///
/// An explicit discriminant set by the server, never inferred from
/// presentation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One file-system entry as the server describes it. Directories carry their
/// children inline; the initial `/files` listing returns the whole forest.
#[derive(Debug, Clone, Deserialize)]
pub struct NodePayload {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    /// Server-computed permission: whether remove/rename are allowed here
    /// (workspace roots and protected directories are not removable).
    #[serde(default = "default_capability")]
    pub removable: bool,
    /// Server-computed permission: whether children may be created here.
    #[serde(default = "default_capability")]
    pub creatable: bool,
    #[serde(default)]
    pub children: Vec<NodePayload>,
}

fn default_capability() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootPayload {
    #[serde(default)]
    pub children: Vec<NodePayload>,
}

/// Response to `POST /files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub succ: bool,
    #[serde(default)]
    pub msg: String,
    pub root: Option<RootPayload>,
}

/// Response to `POST /file/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub succ: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub children: Vec<NodePayload>,
}

/// Response to `POST /file`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileResponse {
    pub succ: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Successfully fetched file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub mode: String,
    pub content: String,
}

impl FileContent {
    /// The server classifies image files so the client can hand them off
    /// instead of opening an editor.
    pub fn is_image(&self) -> bool {
        self.mode == "img"
    }
}

impl From<FileResponse> for FileContent {
    fn from(resp: FileResponse) -> Self {
        Self {
            path: resp.path,
            mode: resp.mode,
            content: resp.content,
        }
    }
}

/// One match from `/file/search/text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundMatch {
    pub path: String,
    pub line: usize,
    #[serde(default)]
    pub snippet: String,
}

/// Response to `POST /file/search/text`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub succ: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub founds: Vec<FoundMatch>,
}
