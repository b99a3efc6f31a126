/// Shared error type used across all relay crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The provider answered with a non-success HTTP status.
    #[error("provider {provider}: HTTP {status} - {body}")]
    ProviderStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The provider answered, but not in a shape we understand.
    #[error("decode: {0}")]
    Decode(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
