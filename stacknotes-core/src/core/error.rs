//! Error types for the Stacknotes editor core.

use thiserror::Error;

/// All errors that can occur within the Stacknotes editor core.
///
/// Most editor operations are infallible (parsing falls back to
/// the default document, commands in the wrong context are no-ops). These
/// variants surface only at the host-facing edges: command dispatch by name,
/// configuration parsing and transaction validation.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Input could not be parsed or produced as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document position does not resolve inside the current tree.
    #[error("Invalid position: {0}")]
    InvalidPosition(usize),

    /// A node violates the content rule or attribute schema of its type.
    #[error("Content violation in '{node_type}': {detail}")]
    ContentViolation { node_type: String, detail: String },

    /// A command name was requested that is not in the command registry.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A command was dispatched with arguments it cannot use.
    #[error("Invalid argument for '{command}': {detail}")]
    InvalidArgument { command: String, detail: String },

    /// The editor configuration is out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias that pins the error type to [`EditorError`].
pub type Result<T> = std::result::Result<T, EditorError>;

impl EditorError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Json(e) => format!("Data format error: {e}"),
            Self::InvalidPosition(_) => "The cursor is no longer inside the page".to_string(),
            Self::ContentViolation { node_type, .. } => {
                format!("That change would break the '{node_type}' block")
            }
            Self::UnknownCommand(name) => format!("Unknown command: {name}"),
            Self::InvalidArgument { command, .. } => format!("Could not run '{command}'"),
            Self::InvalidConfig(msg) => msg.clone(),
        }
    }
}
