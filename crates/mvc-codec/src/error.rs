use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;
