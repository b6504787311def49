//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Path already has a publisher
    #[error("path already has a publisher: {0}")]
    AlreadyPublishing(String),

    /// Path has no publisher
    #[error("path not found: {0}")]
    PathNotFound(String),
}
