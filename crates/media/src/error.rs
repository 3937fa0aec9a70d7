#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a usable response.
    #[error("GET {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: unexpected status {status}")]
    Status { url: String, status: u16 },

    /// Headers arrived but the body could not be read.
    #[error("reading body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// True when the failure happened after a successful response head.
    pub fn is_body_error(&self) -> bool {
        matches!(self, Self::Body { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
