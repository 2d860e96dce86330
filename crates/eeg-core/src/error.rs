use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure. Fatal at startup.
    #[error("Configuration invalide : {0}")]
    Configuration(String),

    /// The sample source cannot supply a frame any more.
    #[error("Source indisponible : {0}")]
    SourceUnavailable(String),
}

impl CoreError {
    /// Shorthand used by the validation code.
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
