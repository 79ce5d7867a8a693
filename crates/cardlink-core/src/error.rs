use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Endpoint errors
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
