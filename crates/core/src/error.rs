use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The debugging endpoint did not respond. Recoverable; drives the state
    /// machine back to `Down`.
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// Opening a protocol session against a target failed.
    #[error("Connect error: {0}")]
    Connect(String),

    /// In-page evaluation failed; the session is treated as lost.
    #[error("Eval error: {0}")]
    Eval(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
