/// Core error type.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs retryable).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// Primary-key collision on insert. Retryable: regenerate and re-insert.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// Rejection override exceeds the allowed length.
    #[error("override text too long: {len} chars (max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
