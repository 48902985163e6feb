/*!
Error taxonomy for the listener core
*/

/// Boxed error used by the composition root and I/O helpers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced synchronously to facade callers
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("resource enumeration failed: {0}")]
    ResourceEnumeration(String),

    #[error("method not implemented: {0}")]
    NotImplemented(String),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FacadeError {
    /// Stable wire code reported back over the command channel
    pub fn code(&self) -> &'static str {
        match self {
            FacadeError::InvalidArgument(_) => "INVALID_ARGUMENT",
            FacadeError::ResourceEnumeration(_) => "RESOURCE_ENUMERATION_FAILURE",
            FacadeError::NotImplemented(_) => "NOT_IMPLEMENTED",
            FacadeError::Serialization(_) => "SERIALIZATION_FAILURE",
        }
    }
}

/// A raw event could not be turned into a record. The event is dropped.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum NormalizationError {
    #[error("raw event is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("raw event has an empty source identifier")]
    EmptySource,
}

/// Source-name lookup failed. Callers degrade to the raw source id.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown source `{0}`")]
    UnknownSource(String),

    #[error("source cache unavailable: {0}")]
    CacheUnavailable(String),
}

/// The installed subscriber sink rejected a payload
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscriber sink `{0}` is closed")]
    Closed(String),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Installed-application enumeration failed on the platform side
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    #[error("failed to read application directory {path}: {source}")]
    ReadDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("enumeration worker stopped before answering")]
    WorkerGone,
}

impl From<EnumerationError> for FacadeError {
    fn from(e: EnumerationError) -> Self {
        FacadeError::ResourceEnumeration(e.to_string())
    }
}
