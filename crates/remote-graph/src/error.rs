//! Error types for remote-graph.
//!
//! Every failure on either side of the wire maps to one [`RemoteError`]
//! variant. On the host, errors are flattened to their display text and sent
//! back inside a failure envelope; the client re-raises that text verbatim as
//! [`RemoteError::OperationFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for remote-graph.
#[derive(Debug, Error)]
pub enum RemoteError {
    // Transport errors
    #[error("Transport error talking to {addr}: {message}")]
    Transport { addr: String, message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // Registry errors
    #[error("({type_identity}, {instance_id}) is not exposed.")]
    NotExposed {
        type_identity: String,
        instance_id: String,
    },

    #[error("Duplicated instanceId [{instance_id}] for type {type_identity}")]
    DuplicateRegistration {
        type_identity: String,
        instance_id: String,
    },

    #[error("Another process already hosts remote targets on this machine (lock: {lock_path:?})")]
    AlreadyHostedElsewhere { lock_path: PathBuf },

    // Resolution errors
    #[error("Member '{member}' not found on type [{container}]")]
    MemberNotFound { member: String, container: String },

    #[error("Member '{member}' on type [{container}] is a value and cannot be navigated")]
    NotAnObject { member: String, container: String },

    #[error("Member '{member}' on type [{container}] is an object and has no string form")]
    NotAValue { member: String, container: String },

    #[error("Property '{member}' on type [{container}] is read-only")]
    ReadOnly { member: String, container: String },

    #[error("Type [{type_name}] has no capability table")]
    UnknownType { type_name: String },

    // Decode errors
    #[error("Method '{method}({params})' not found on type [{container}]")]
    MethodNotFound {
        method: String,
        params: String,
        container: String,
    },

    #[error("No constructor of [{type_name}] accepts ({params})")]
    ConstructionFailed { type_name: String, params: String },

    #[error("Type [{type_name}] is not supported by the codec")]
    NotSupported { type_name: String },

    #[error("Cannot parse '{text}' as [{type_name}]: {message}")]
    Parse {
        type_name: String,
        text: String,
        message: String,
    },

    #[error("Type mismatch: expected [{expected}], got [{actual}]")]
    TypeMismatch { expected: String, actual: String },

    // Client-side path compilation
    #[error("Unsupported expression type: {node}")]
    Unsupported { node: String },

    /// Failure envelope received from the host.
    #[error("Operation failed. Detail: {0}")]
    OperationFailed(String),

    // Environment errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for remote-graph operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        RemoteError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl RemoteError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RemoteError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a parse error for a literal that failed to convert.
    pub fn parse(type_name: impl Into<String>, text: &str, message: impl ToString) -> Self {
        RemoteError::Parse {
            type_name: type_name.into(),
            text: text.to_string(),
            message: message.to_string(),
        }
    }

    /// True for errors raised before any envelope existed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport { .. } | RemoteError::Timeout(_)
        )
    }
}
