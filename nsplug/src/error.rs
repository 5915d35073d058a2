// Error handling for the plugin framework

use crate::encoding::{ConversionError, Shape};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while invoking a callable key.
#[derive(Debug, Error)]
pub enum CallError {
    /// The namespace is callable but has no function for this key.
    #[error("function call unsupported")]
    Unsupported,

    #[error("expected {expected} arguments, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("error converting argument {index} to {shape}: {source}")]
    Argument {
        index: usize,
        shape: Shape,
        #[source]
        source: ConversionError,
    },

    /// The function itself returned an error.
    #[error("{0}")]
    Failed(anyhow::Error),
}

/// Errors raised while flattening a result for the boundary.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// A `Mappable::map` call failed.
    #[error("{0}")]
    Map(anyhow::Error),

    #[error("namespace does not implement Mappable and cannot be returned as a value")]
    NotMappable,
}

/// Reasons a receiver cannot be sent back as the updated context.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error("receiver is no longer an object")]
    NotObject,

    #[error("receiver is now nil")]
    Nil,
}

/// Top-level framework error.
///
/// Configuration errors are fatal to a plugin instance; everything else is
/// scoped to the request that raised it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid plugin implementation: root must provide a Namespace or a NamespaceCreator")]
    InvalidRoot,

    #[error("error configuring plugin: {0}")]
    Configure(anyhow::Error),

    #[error("error closing plugin: {0}")]
    Close(anyhow::Error),

    #[error("error converting config: {0}")]
    ConfigConversion(#[source] ConversionError),

    #[error("invalid engine configuration: {0}")]
    EngineConfig(String),

    #[error("error retrieving key {path:?}: {cause}")]
    Get { path: String, cause: anyhow::Error },

    #[error("error calling function {path:?}: {source}")]
    Call {
        path: String,
        #[source]
        source: CallError,
    },

    #[error("key {path:?} doesn't support function calls")]
    NotCallable { path: String },

    #[error("attempting to call function {path:?} on undefined receiver")]
    UndefinedReceiver { path: String },

    #[error("error instantiating namespace: {0}")]
    Instantiate(anyhow::Error),

    #[error("request context present but plugin does not support Constructible")]
    ContextUnsupported,

    #[error("error retrieving key {path:?}: {source}")]
    Flatten {
        path: String,
        #[source]
        source: FlattenError,
    },

    #[error("error marshaling receiver after retrieving key {path:?}: {source}")]
    Receiver {
        path: String,
        #[source]
        source: ReceiverError,
    },

    #[error("unknown instance ID given: {0}")]
    UnknownInstance(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that make the whole plugin instance unusable.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidRoot
                | Error::Configure(_)
                | Error::ConfigConversion(_)
                | Error::EngineConfig(_)
        )
    }
}
