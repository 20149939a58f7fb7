//! 长度前缀分帧：4 字节小端长度头 + 负载。
//!
//! 只处理字节层面的边界识别，负载的类型化反序列化由上层消息模块负责。

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::config::NetBufferConfig;
use crate::error::FrameError;
use crate::message_buffer::MessageBuffer;

/// 报文头长度。
pub const MESSAGE_HEADER_SIZE: usize = 4;

/// 一次取帧尝试的结果。
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameOutcome {
    /// 完整负载，报文头与负载均已从缓冲中消费。
    Complete(Bytes),
    /// 数据不足；`missing` 为凑齐当前帧（或报文头）还需接收的字节数。
    Incomplete { missing: usize },
}

/// 长度前缀分帧器。
///
/// # 设计动机（Why）
/// - 读路径需要先窥视报文头、确认整帧到齐后再一次性消费，避免半帧被提前移出缓冲；
/// - 声明长度超过剩余可写空间时，应在返回等待前扩容，使下一次分散读能一次收完整帧。
///
/// # 行为概览（How）
/// 1. 可读字节不足 4 时返回 `Incomplete`，不消费任何数据；
/// 2. 以 [`MessageBuffer::peek`] 读取报文头，长度为 0 或超过上限返回 [`FrameError::InvalidLength`]；
/// 3. 整帧到齐时先推进报文头，再以 [`MessageBuffer::read_bytes`] 取出负载；
/// 4. 否则计算缺口，若 `bytes_to_write()` 容纳不下则调用 [`MessageBuffer::add_space`] 补足。
///
/// # 契约说明（What）
/// - 返回 `InvalidLength` 后缓冲保持原样，但连接已无法重新同步，调用方应关闭连接；
/// - 分帧器本身无状态，可在多个连接间共享。
#[derive(Clone, Debug)]
pub struct LengthPrefixedFramer {
    max_message_length: u32,
}

impl LengthPrefixedFramer {
    pub fn new(max_message_length: u32) -> Self {
        Self { max_message_length }
    }

    pub fn from_config(config: &NetBufferConfig) -> Self {
        Self::new(config.max_message_length)
    }

    pub fn max_message_length(&self) -> u32 {
        self.max_message_length
    }

    /// 尝试从缓冲中取出下一帧。
    pub fn decode(&self, buffer: &mut MessageBuffer) -> Result<FrameOutcome, FrameError> {
        let available = buffer.bytes_to_read();
        if available < MESSAGE_HEADER_SIZE {
            return Ok(FrameOutcome::Incomplete {
                missing: MESSAGE_HEADER_SIZE - available,
            });
        }

        let mut header = [0u8; MESSAGE_HEADER_SIZE];
        buffer.peek(&mut header, buffer.read_index())?;
        let length = u32::from_le_bytes(header);
        if length == 0 || length > self.max_message_length {
            warn!(
                length,
                max = self.max_message_length,
                "peer declared an invalid message length"
            );
            return Err(FrameError::InvalidLength {
                length,
                max: self.max_message_length,
            });
        }

        let frame_len = MESSAGE_HEADER_SIZE + length as usize;
        if available >= frame_len {
            buffer.advance_read_ptr(MESSAGE_HEADER_SIZE)?;
            let payload = buffer.read_bytes(length as usize)?;
            debug!(length, remaining = buffer.bytes_to_read(), "decoded frame");
            return Ok(FrameOutcome::Complete(payload));
        }

        let missing = frame_len - available;
        let writable = buffer.bytes_to_write();
        if writable < missing {
            buffer.add_space(missing - writable)?;
        }
        Ok(FrameOutcome::Incomplete { missing })
    }

    /// 为负载加上长度头，供发送路径与测试使用。
    pub fn encode(&self, payload: &[u8]) -> Result<Bytes, FrameError> {
        if payload.is_empty() {
            return Err(FrameError::InvalidLength {
                length: 0,
                max: self.max_message_length,
            });
        }
        let length = u32::try_from(payload.len())
            .ok()
            .filter(|length| *length <= self.max_message_length)
            .ok_or(FrameError::PayloadTooLarge {
                length: payload.len(),
                max: self.max_message_length,
            })?;
        let mut frame = BytesMut::with_capacity(MESSAGE_HEADER_SIZE + payload.len());
        frame.put_u32_le(length);
        frame.put_slice(payload);
        Ok(frame.freeze())
    }
}

impl Default for LengthPrefixedFramer {
    fn default() -> Self {
        Self::from_config(&NetBufferConfig::default())
    }
}
