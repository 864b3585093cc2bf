use rivven_core::CompressionError;
use rivven_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("Protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Compression(inner) => Error::Compression(inner),
            other => Error::Protocol(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
