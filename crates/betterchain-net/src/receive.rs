//! 基于 Tokio `TcpStream` 的接收步骤。
//!
//! # 教案式说明
//! - **意图 (Why)**：演示并固化上游驱动与缓冲链之间的交接顺序：取描述符 → 分散读 → 按实收字节推进写游标；
//! - **逻辑 (How)**：等待套接字可读后调用 `try_read_vectored`，`WouldBlock`/`Interrupted` 时回到等待；
//! - **契约 (What)**：只有真正收到的字节才会提交；future 在完成前被丢弃（取消）时缓冲保持原样；
//! - **注意事项 (Trade-offs)**：连接建立、握手与重连仍属于传输层，本模块只负责单条连接上的读路径。

use std::io;

use bytes::Bytes;
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::config::NetBufferConfig;
use crate::error::{BufferError, ReceiveError};
use crate::framing::{FrameOutcome, LengthPrefixedFramer};
use crate::message_buffer::MessageBuffer;

/// 执行一次接收，返回写入缓冲的字节数。
///
/// 对端有序关闭时返回 [`ReceiveError::Closed`]，其中携带仍未消费的字节数。
pub async fn receive_into(
    stream: &TcpStream,
    buffer: &mut MessageBuffer,
) -> Result<usize, ReceiveError> {
    loop {
        stream.readable().await?;
        let attempt = {
            let mut slices = buffer.io_slices();
            stream.try_read_vectored(&mut slices)
        };
        match attempt {
            Ok(0) => {
                return Err(ReceiveError::Closed {
                    buffered: buffer.bytes_to_read(),
                });
            }
            Ok(received) => {
                buffer.advance_write_ptr(received)?;
                trace!(
                    received,
                    bytes_to_read = buffer.bytes_to_read(),
                    "received bytes into message buffer"
                );
                return Ok(received);
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(err) => return Err(ReceiveError::Io(err)),
        }
    }
}

/// 单条连接上的取消息循环：缓冲链 + 分帧器 + 套接字。
///
/// # 契约说明（What）
/// - `next_message` 返回 `Ok(Some(payload))` 表示取到一条完整消息；
/// - 对端在帧边界处关闭返回 `Ok(None)`，在半帧处关闭返回 [`ReceiveError::Closed`]；
/// - 任一错误之后连接都不应继续使用。
#[derive(Debug)]
pub struct MessageReader {
    stream: TcpStream,
    buffer: MessageBuffer,
    framer: LengthPrefixedFramer,
}

impl MessageReader {
    pub fn new(stream: TcpStream, buffer: MessageBuffer, framer: LengthPrefixedFramer) -> Self {
        Self {
            stream,
            buffer,
            framer,
        }
    }

    pub fn from_config(stream: TcpStream, config: &NetBufferConfig) -> Result<Self, BufferError> {
        Ok(Self::new(
            stream,
            MessageBuffer::from_config(config)?,
            LengthPrefixedFramer::from_config(config),
        ))
    }

    pub fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }

    pub fn into_parts(self) -> (TcpStream, MessageBuffer) {
        (self.stream, self.buffer)
    }

    pub async fn next_message(&mut self) -> Result<Option<Bytes>, ReceiveError> {
        loop {
            if let FrameOutcome::Complete(payload) = self.framer.decode(&mut self.buffer)? {
                return Ok(Some(payload));
            }
            match receive_into(&self.stream, &mut self.buffer).await {
                Ok(_) => {}
                Err(ReceiveError::Closed { buffered: 0 }) => {
                    debug!("peer closed connection on a frame boundary");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
