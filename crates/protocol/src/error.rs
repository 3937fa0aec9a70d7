use std::error::Error as StdError;

/// Crate-wide result type for protocol and client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the messaging client boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A JID string could not be parsed.
    #[error("invalid JID {jid:?}: {reason}")]
    InvalidJid { jid: String, reason: String },

    /// The client has no live connection to the WhatsApp session.
    #[error("messaging client is not connected")]
    NotConnected,

    /// The remote side rejected or failed an operation.
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// Wrapped source error from an external dependency.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_jid(jid: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidJid {
            jid: jid.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
