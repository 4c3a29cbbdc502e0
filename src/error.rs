use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Image of {0} bytes does not fit in a 32-bit length header")]
    ImageTooLarge(usize),

    #[error("Failed to receive acknowledgement, got {received:?}")]
    HandshakeFailed { received: Option<u8> },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;
