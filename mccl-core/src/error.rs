//! 链路错误定义

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// 无效的帧格式
    InvalidFrameFormat(String),
    /// 长度错误
    LengthError(String),
    /// 校验错误
    ChecksumError(String),
    /// 未知命令字节
    UnknownCommand(u8),
    /// 载荷错误
    PayloadError(String),
    /// 传输层错误
    TransportError(String),
    /// 其他错误
    Other(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::InvalidFrameFormat(msg) => write!(f, "Invalid frame format: {msg}"),
            LinkError::LengthError(msg) => write!(f, "Length error: {msg}"),
            LinkError::ChecksumError(msg) => write!(f, "Checksum error: {msg}"),
            LinkError::UnknownCommand(byte) => write!(f, "Unknown command byte: 0x{byte:02X}"),
            LinkError::PayloadError(msg) => write!(f, "Payload error: {msg}"),
            LinkError::TransportError(msg) => write!(f, "Transport error: {msg}"),
            LinkError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<String> for LinkError {
    fn from(s: String) -> Self {
        LinkError::Other(s)
    }
}

impl From<&str> for LinkError {
    fn from(s: &str) -> Self {
        LinkError::Other(s.to_string())
    }
}
