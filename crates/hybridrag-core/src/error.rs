use thiserror::Error;

/// A convenience `Result` alias using [`RagError`].
pub type RagResult<T> = Result<T, RagError>;

/// Error type shared by every crate of the retrieval engine.
///
/// An empty result set is not an error: searches over an empty store, or
/// searches where nothing clears the similarity threshold, return an empty
/// list.
#[derive(Error, Debug)]
pub enum RagError {
    /// Input rejected at an API boundary before any state was touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding backend reported that it is not ready.
    #[error("Embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The embedding backend was reachable but failed or misbehaved.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A chunking strategy could not segment a document.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Configuration could not be read or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// A TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RagError {
    /// Shorthand for [`RagError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error means the embedding backend could not be used at all.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}
