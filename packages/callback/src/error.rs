//! Error types for the callback layer.
//!
//! Two kinds of failure exist at this level: a remote command that replied
//! with an error (delivered through the completion handler), and a call that
//! failed synchronously before anything was sent.

/// An error reply from the remote side, as delivered to a completion handler.
///
/// The message is the full reply text (`ERR wrong number of arguments ...`);
/// `code` is its leading upper-case word.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommandError {
    /// Leading error word, e.g. `ERR` or `WRONGTYPE`.
    pub code: String,
    /// Full error text.
    pub message: String,
    /// Upper-cased name of the command that failed, when known.
    pub command: Option<String>,
}

impl CommandError {
    /// Build an error reply for `command` from its full message text.
    pub fn new(command: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let code = message
            .split_whitespace()
            .next()
            .filter(|word| word.chars().all(|c| c.is_ascii_uppercase()))
            .unwrap_or("ERR")
            .to_string();
        Self {
            code,
            message,
            command: Some(command.to_ascii_uppercase()),
        }
    }

    /// The command's completion handler was dropped without ever being called.
    pub fn aborted(command: &str) -> Self {
        Self {
            code: "ABORT".to_string(),
            message: format!("{}: connection closed before reply", command),
            command: Some(command.to_ascii_uppercase()),
        }
    }
}

/// A synchronous failure when reading or invoking a property.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("property '{name}' is not a function")]
    NotAFunction { name: String },

    #[error("no property named '{name}'")]
    MissingProperty { name: String },

    #[error("invalid argument to '{function}': {message}")]
    InvalidArgument { function: String, message: String },

    #[error("expected {expected} from call, got {actual}")]
    UnexpectedOutput {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{message}")]
    Other { message: String },
}
