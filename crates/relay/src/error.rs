/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The messaging client failed (download, upload or send).
    #[error(transparent)]
    Client(#[from] wabridge_protocol::Error),

    #[error("invalid recipient {input:?}: {reason}")]
    InvalidRecipient { input: String, reason: String },

    /// Outbound media could not be fetched or read.
    #[error("{context}: {source}")]
    Fetch {
        context: &'static str,
        #[source]
        source: wabridge_media::Error,
    },

    #[error("{context}: {source}")]
    Upload {
        context: &'static str,
        #[source]
        source: wabridge_protocol::Error,
    },

    /// Webhook delivery failed before a usable body was returned.
    #[error("relay failed: {message}")]
    Relay { message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_recipient(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidRecipient {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn relay(message: impl std::fmt::Display) -> Self {
        Self::Relay {
            message: message.to_string(),
        }
    }
}
