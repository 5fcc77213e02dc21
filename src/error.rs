use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeNavError>;

#[derive(Debug, Error)]
pub enum TreeNavError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The remote service answered with `succ = false`; carries the server's
    /// `msg` verbatim.
    #[error("{0}")]
    Server(String),
    #[error("Error: {0}")]
    Generic(String),
}

impl TreeNavError {
    /// True for failures the server itself reported, as opposed to
    /// transport-level trouble.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, TreeNavError::Server(_))
    }

    /// The text to surface in the alert dialog: the server's own message
    /// when it declined, a connectivity line otherwise.
    pub fn alert_text(&self) -> String {
        match self {
            TreeNavError::Server(msg) => msg.clone(),
            other => format!("Connection problem: {}", other),
        }
    }
}

impl From<String> for TreeNavError {
    fn from(error: String) -> Self {
        TreeNavError::Generic(error)
    }
}

impl From<&str> for TreeNavError {
    fn from(error: &str) -> Self {
        TreeNavError::Generic(error.to_string())
    }
}
