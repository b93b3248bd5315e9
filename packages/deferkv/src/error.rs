//! Error types for wrapping.

/// What `wrap` accepts, for error messages.
const EXPECTED_TARGET: &str = "the client library, a client, or a transaction builder";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument \"{argument}\": expected {expected}, got {actual}")]
    ArgumentType {
        argument: &'static str,
        expected: &'static str,
        actual: String,
    },
}

impl Error {
    /// The `wrap` target had the wrong runtime type.
    pub(crate) fn invalid_target(actual: impl Into<String>) -> Self {
        Error::ArgumentType {
            argument: "target",
            expected: EXPECTED_TARGET,
            actual: actual.into(),
        }
    }
}
