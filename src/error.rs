use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for hdiag
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for hdiag
pub type Result<T> = std::result::Result<T, DiagError>;

impl DiagError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DiagError::Config(msg.into())
    }

    pub fn transport<S: Into<String>>(msg: S) -> Self {
        DiagError::Transport(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DiagError::Other(msg.into())
    }
}

/// Failure while collecting a raw reading from the host.
///
/// The `Display` text becomes the `Failed(reason)` of a reading, so it is
/// kept short and free of formatting.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("timeout")]
    Timeout,

    #[error("{program} exited with status {code}{}", message_suffix(.message))]
    NonZeroExit {
        program: String,
        code: i32,
        /// What the tool printed about the failure, possibly empty
        message: String,
    },

    #[error("unparsable output: {0}")]
    Parse(String),
}

fn message_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {}", message)
    }
}

/// Failure while writing a report to its destination.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot write {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Serialization(String),
}
