use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("write rejected: {0}")]
    WriteError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("collection not found: {0}")]
    NoSuchCollection(String),

    #[error("config error: {0}")]
    Config(String),
}

// For an embedded store the backing file is the connection: losing it at any
// point surfaces as the store being unavailable.
impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<bincode::error::EncodeError> for DbError {
    fn from(e: bincode::error::EncodeError) -> Self {
        Self::WriteError(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for DbError {
    fn from(e: bincode::error::DecodeError) -> Self {
        Self::Decode(e.to_string())
    }
}
