use thiserror::Error;

/// Failure reported by an execution backend.
///
/// The rendered message is what the error classifier sees, so variants keep
/// the raw backend text intact.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{0}")]
    Failed(String),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {code:?}: {stderr}")]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("unsupported target: {0}")]
    Unsupported(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the operator prompt.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("operator input closed")]
    Closed,

    #[error("no operator decision within {0}ms")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a context store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
