use compass_core::CompassError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {url}")]
    Api { status: u16, url: String },

    #[error("Invalid session cookie: {0}")]
    InvalidCookie(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<ClientError> for CompassError {
    fn from(err: ClientError) -> Self {
        CompassError::Network(Box::new(err))
    }
}
