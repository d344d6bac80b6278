use thiserror::Error;

/// Top-level error type shared by every charge-keeper crate.
///
/// The `Display` output of each variant is the human-readable message the
/// presentation layer shows to the user.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// CLI text is empty or lacks a required field.
    #[error("Failed to parse CLI output: {0}")]
    Parse(String),

    /// A threshold or config value lies outside its allowed range/set.
    #[error("{0}")]
    Validation(String),

    /// The external tool is missing, timed out, or exited non-zero.
    #[error("{0}")]
    ExternalTool(String),

    /// The config file could not be written.
    #[error("Failed to save configuration: {0}")]
    Persistence(String),

    #[error("Manager not initialized")]
    NotInitialized,

    /// Prefixes another error with the operation that produced it.
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<KeeperError>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl KeeperError {
    /// Wrap `self` with a short description of the failed operation.
    pub fn context(self, context: &'static str) -> Self {
        Self::Context {
            context,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Context` wrappers.
    pub fn root(&self) -> &KeeperError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = KeeperError> = std::result::Result<T, E>;

/// Uniform result of every external-tool invocation and every mutating
/// manager operation: `Ok` carries the payload, `Err` the failure message.
pub type CliResult<T = ()> = Result<T>;
