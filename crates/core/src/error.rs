//! Resolution errors
//!
//! Everything below `Sdk` reports a miss as `None`. The composed lookups on
//! [`crate::Sdk`] turn that into a [`ResolveError`] naming the missing piece,
//! so an overlay can decide whether the miss is fatal to it.

use thiserror::Error;

use crate::config::ConfigError;
use crate::gamedata::GamedataError;

/// A lookup that came back empty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Module not loaded: {0}")]
    ModuleNotLoaded(String),

    #[error("No signature for the current platform: {0}")]
    SignatureMissing(String),

    #[error("Signature {name} not found in {module}")]
    SignatureNotFound { name: String, module: String },

    #[error("Export {symbol} not found in {module}")]
    ExportNotFound { module: String, symbol: String },

    #[error("Offset not found: {structure}.{field}")]
    OffsetNotFound { structure: String, field: String },

    #[error("Property table not found: {0}")]
    TableNotFound(String),

    #[error("Field {path} not found in {table}")]
    FieldNotFound { table: String, path: String },

    #[error("Client class list unavailable")]
    ClassListUnavailable,

    #[error("Interface unavailable: {0}")]
    Interface(String),

    #[error("Index {index} out of range for {field}")]
    IndexOutOfRange { field: String, index: usize },

    #[error("Null pointer while resolving {0}")]
    NullPointer(String),
}

impl ResolveError {
    /// True for the "not on this host version" family
    ///
    /// `NullPointer` and `IndexOutOfRange` are usage problems, not misses.
    pub fn is_not_found(&self) -> bool {
        !matches!(
            self,
            ResolveError::NullPointer(_) | ResolveError::IndexOutOfRange { .. }
        )
    }
}

impl From<srcsdk_engine::InterfaceError> for ResolveError {
    fn from(err: srcsdk_engine::InterfaceError) -> Self {
        ResolveError::Interface(err.to_string())
    }
}

/// Failure to build an attached [`crate::Sdk`]
#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gamedata(#[from] GamedataError),

    #[error("An Sdk is already installed for this process")]
    AlreadyInstalled,

    #[error("No Sdk is installed for this process")]
    NotInstalled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        assert!(ResolveError::TableNotFound("DT_BasePlayer".into()).is_not_found());
        assert!(ResolveError::ClassListUnavailable.is_not_found());
        assert!(!ResolveError::NullPointer("PlayerResource".into()).is_not_found());
    }

    #[test]
    fn test_messages_name_the_missing_piece() {
        let err = ResolveError::OffsetNotFound {
            structure: "Player".into(),
            field: "Score".into(),
        };
        assert_eq!(err.to_string(), "Offset not found: Player.Score");

        let err: ResolveError =
            srcsdk_engine::InterfaceError::NullPointer("VClient018 from client".into()).into();
        assert!(err.to_string().contains("VClient018"));
    }
}
