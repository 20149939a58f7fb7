#![deny(unsafe_code)]

//! `betterchain-net` 提供点对点消息层读路径下的接收缓冲。
//!
//! # 模块定位（Why）
//! - 每条对等连接持有一个 [`MessageBuffer`]：网络字节经分散读直接落入固定容量的块链，
//!   消息层在其上窥视长度头、确认整帧后再消费，全程不为增长或收缩复制字节；
//! - 缓冲随连接创建、随连接销毁，读空后自动收缩回单块，内存占用不会随消息轮次累积。
//!
//! # 设计概要（How）
//! - [`message_buffer`]：块链、读写游标、可写描述符与跨块窥视/读取；
//! - [`framing`]：4 字节小端长度前缀的取帧逻辑，负责在数据不足时预留空间；
//! - [`receive`]（`runtime-tokio` 特性）：基于 Tokio `TcpStream` 的单次接收与取消息循环；
//! - [`config`]：块大小与消息上限的 TOML 配置；
//! - [`error`]：各层错误及其稳定错误码。
//!
//! # 并发约束（What）
//! - 单个缓冲只由所属连接的 I/O 任务串行访问，所有修改都需要 `&mut self`，内部不加锁；
//! - 不同连接的缓冲互不共享存储，可以在任意多个任务中并行使用。

pub mod config;
pub mod error;
pub mod framing;
pub mod message_buffer;
#[cfg(feature = "runtime-tokio")]
pub mod receive;

pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MESSAGE_LENGTH, NetBufferConfig};
pub use error::{BufferError, BufferOperation, ConfigError, FrameError, ReceiveError};
pub use framing::{FrameOutcome, LengthPrefixedFramer, MESSAGE_HEADER_SIZE};
pub use message_buffer::{BufferIndex, MessageBuffer, WriteDescriptors};
#[cfg(feature = "runtime-tokio")]
pub use receive::{MessageReader, receive_into};
