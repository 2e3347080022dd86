//! Error types shared by every module of the crate.

/// Crate-level error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A caller broke a checkable precondition (bad distance, bad threshold, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An influence map carried no usable evidence, so no distribution exists.
    #[error("No evidence: the influence map has zero total influence")]
    NoEvidence,

    #[error("Config error: {0}")]
    Config(#[from] confy::ConfyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
