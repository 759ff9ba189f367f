//! Error types for interface acquisition

/// Error type for interface factory operations
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    /// Factory function returned null for the requested interface
    #[error("Factory returned null for: {0}")]
    NullPointer(String),

    /// No factory is known for the module
    #[error("No interface factory for module: {0}")]
    NoFactory(String),

    /// Invalid interface version string (not null-terminated)
    #[error("Invalid version string: {0}")]
    InvalidVersionString(String),
}
