use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed status line: {0:?}")]
    MalformedLine(String),

    #[error("protocol violation: {0}")]
    Violation(&'static str),

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("invalid packet length prefix: {0:?}")]
    InvalidLength(String),

    #[error("packet payload too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
