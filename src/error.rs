//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the thermostat communication library.
/// 恒温器通信库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// A received notification started with an opcode this library does not know.
    /// 收到的通知以本库不认识的操作码开头。
    #[error("unexpected message opcode: {0:#04x}")]
    UnexpectedMessage(u8),

    /// A received notification was shorter than its opcode requires.
    /// 收到的通知比其操作码要求的更短。
    #[error("message of {got} bytes is too short, expected at least {expected}")]
    TruncatedMessage {
        /// The minimum length the opcode requires.
        /// 操作码要求的最小长度。
        expected: usize,
        /// The actual length received.
        /// 实际收到的长度。
        got: usize,
    },

    /// A received status notification carried an invalid marker byte.
    /// 收到的状态通知携带了无效的标记字节。
    #[error("unexpected status marker byte: {0:#04x}")]
    UnexpectedStatusMarker(u8),

    /// A decoded timestamp did not form a valid calendar date or time.
    /// 解码出的时间戳不是有效的日历日期或时间。
    #[error("invalid date or time in received message")]
    InvalidDateTime,

    /// The device session has shut down and can no longer accept events.
    /// 设备会话已关闭，不能再接受事件。
    #[error("device session is closed")]
    SessionClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::UnexpectedMessage(_) => ErrorKind::InvalidData.into(),
            Error::TruncatedMessage { .. } => ErrorKind::UnexpectedEof.into(),
            Error::UnexpectedStatusMarker(_) => ErrorKind::InvalidData.into(),
            Error::InvalidDateTime => ErrorKind::InvalidData.into(),
            Error::SessionClosed => ErrorKind::BrokenPipe.into(),
        }
    }
}
