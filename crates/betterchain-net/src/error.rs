//! 网络缓冲层的错误域。
//!
//! # 设计要点（Why）
//! - 缓冲链只有两类失败：调用方给出与游标不一致的长度（`InvalidArgument`，属于调用方缺陷），
//!   以及新块分配失败（`AllocationFailure`，对所属连接是致命错误）；
//! - 分帧与接收在其之上叠加各自的失败路径，通过 `#[from]` 保留完整的错误链；
//! - 每个错误都提供稳定的 `code()`，与日志字段、指标标签保持一致。

use core::fmt;
use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// 触发错误的缓冲操作。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BufferOperation {
    New,
    AdvanceWrite,
    AdvanceRead,
    Grow,
    Peek,
}

impl BufferOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            BufferOperation::New => "message_buffer::new",
            BufferOperation::AdvanceWrite => "advance_write_ptr",
            BufferOperation::AdvanceRead => "advance_read_ptr",
            BufferOperation::Grow => "grow",
            BufferOperation::Peek => "peek",
        }
    }
}

impl fmt::Display for BufferOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INVALID_ARGUMENT_CODE: &str = "betterchain.net.buffer.invalid_argument";
const ALLOCATION_FAILURE_CODE: &str = "betterchain.net.buffer.allocation_failure";

/// `MessageBuffer` 的错误类型。
///
/// # 契约说明（What）
/// - 返回 `InvalidArgument` 时缓冲状态保持不变，调用方应视为自身缺陷而非重试；
/// - 返回 `AllocationFailure` 时同样不会留下“半增长”的链，但所属连接应当关闭。
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("{operation}: requested {requested} bytes but only {available} are available")]
    InvalidArgument {
        operation: BufferOperation,
        requested: usize,
        available: usize,
    },
    #[error("{operation}: failed to allocate a {requested}-byte block")]
    AllocationFailure {
        operation: BufferOperation,
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

impl BufferError {
    pub(crate) fn invalid(operation: BufferOperation, requested: usize, available: usize) -> Self {
        BufferError::InvalidArgument {
            operation,
            requested,
            available,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BufferError::InvalidArgument { .. } => INVALID_ARGUMENT_CODE,
            BufferError::AllocationFailure { .. } => ALLOCATION_FAILURE_CODE,
        }
    }

    pub fn operation(&self) -> BufferOperation {
        match self {
            BufferError::InvalidArgument { operation, .. }
            | BufferError::AllocationFailure { operation, .. } => *operation,
        }
    }
}

/// 长度前缀分帧的错误类型。
#[derive(Debug, Error)]
pub enum FrameError {
    /// 报文头声明的长度为 0 或超过上限；连接应当被丢弃。
    #[error("frame declares {length} payload bytes, allowed range is 1..={max}")]
    InvalidLength { length: u32, max: u32 },
    /// 待编码的负载超过上限。
    #[error("payload of {length} bytes exceeds the frame limit of {max}")]
    PayloadTooLarge { length: usize, max: u32 },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl FrameError {
    pub fn code(&self) -> &'static str {
        match self {
            FrameError::InvalidLength { .. } => "betterchain.net.frame.invalid_length",
            FrameError::PayloadTooLarge { .. } => "betterchain.net.frame.payload_too_large",
            FrameError::Buffer(err) => err.code(),
        }
    }
}

/// 一次接收或取帧循环的错误类型。
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// 对端有序关闭；`buffered` 为关闭时仍未消费的字节数。
    #[error("peer closed the connection with {buffered} unread bytes buffered")]
    Closed { buffered: usize },
    #[error("socket receive failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl ReceiveError {
    pub fn code(&self) -> &'static str {
        match self {
            ReceiveError::Closed { .. } => "betterchain.net.receive.closed",
            ReceiveError::Io(_) => "betterchain.net.receive.io",
            ReceiveError::Buffer(err) => err.code(),
            ReceiveError::Frame(err) => err.code(),
        }
    }
}

/// 缓冲配置加载失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse net buffer configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid net buffer configuration `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) => "betterchain.net.config.parse",
            ConfigError::Invalid { .. } => "betterchain.net.config.invalid",
        }
    }
}
