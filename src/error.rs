/// Every way a door service request can end other than a plain 200.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot request {url:?}: {reason}")]
    UnsupportedUrl { url: String, reason: &'static str },
    #[error("door service answered {code} {reason}")]
    Status {
        code: u16,
        reason: String,
        body: String,
    },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl RequestError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
