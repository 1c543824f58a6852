use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdxError {
    #[error("invalid index magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("index integrity violation: {0}")]
    Integrity(String),

    #[error("unexpected end of index stream")]
    UnexpectedEof,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IdxResult<T> = Result<T, IdxError>;
