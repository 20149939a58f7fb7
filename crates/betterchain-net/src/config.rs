//! 接收缓冲与分帧的配置。
//!
//! # 配置来源（How）
//! - 节点配置文件中的 `[net.buffer]` 段落以 TOML 表达，经 `serde` 映射到 [`NetBufferConfig`]；
//! - 缺省字段回落到 [`Default`]，未知字段直接报错，避免拼写错误被静默忽略；
//! - 解析后统一经 [`NetBufferConfig::validate`] 校验。

use betterchain_chain::config::DEFAULT_MAX_BLOCK_SIZE;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// 每个连接的待处理消息缓冲的默认块大小（1 MiB）。
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// 单条消息负载的默认上限：两倍最大区块，留出区块消息的封装开销。
pub const DEFAULT_MAX_MESSAGE_LENGTH: u32 = 2 * DEFAULT_MAX_BLOCK_SIZE;

/// 接收缓冲配置。
///
/// - `chunk_size`：缓冲链中每个块的容量，连接存续期间不变；
/// - `max_message_length`：长度前缀允许声明的最大负载字节数。
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetBufferConfig {
    pub chunk_size: usize,
    pub max_message_length: u32,
}

impl Default for NetBufferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

impl NetBufferConfig {
    /// 解析 TOML 文本并校验。
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            warn!(field = "chunk_size", "rejecting net buffer configuration");
            return Err(ConfigError::Invalid {
                field: "chunk_size",
                reason: "must be greater than zero",
            });
        }
        if self.max_message_length == 0 {
            warn!(field = "max_message_length", "rejecting net buffer configuration");
            return Err(ConfigError::Invalid {
                field: "max_message_length",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = NetBufferConfig::from_toml_str("").expect("空文档应使用默认值");
        assert_eq!(config, NetBufferConfig::default());
        assert_eq!(config.max_message_length, 2 * 1024 * 1024);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config =
            NetBufferConfig::from_toml_str("chunk_size = 4096\n").expect("部分覆盖应成功");
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.max_message_length, DEFAULT_MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn unknown_fields_and_zero_values_are_rejected() {
        let err = NetBufferConfig::from_toml_str("chunk_sise = 1\n").expect_err("未知字段应报错");
        assert_eq!(err.code(), "betterchain.net.config.parse");

        let err = NetBufferConfig::from_toml_str("chunk_size = 0\n").expect_err("0 块大小应报错");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "chunk_size",
                ..
            }
        ));
    }
}
