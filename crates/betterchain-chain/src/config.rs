//! 链级调优常量。
//!
//! # 契约说明（What）
//! - 本模块只承载数值，不附带行为；修改任一常量都会改变共识参数，需要全网同步升级；
//! - 百分比统一采用分母为 [`PERCENT_100`] 的定点数，换算使用 [`percent`]。

use core::ops::{Div, Mul};
use core::time::Duration;

use crate::name::AccountName;

/// 区块日志目录的默认名称。
pub const DEFAULT_BLOCK_LOG_DIR: &str = "block_log";
/// 共享内存目录的默认名称。
pub const DEFAULT_SHARED_MEMORY_DIR: &str = "shared_mem";
/// 共享内存文件的默认大小（1 GiB）。
pub const DEFAULT_SHARED_MEMORY_SIZE: u64 = 1024 * 1024 * 1024;
/// 每轮出块的生产者数量。
pub const PRODUCER_COUNT: u32 = 21;

pub const SYSTEM_ACCOUNT_NAME: AccountName = AccountName::from_literal("betterchain");
pub const NOBODY_ACCOUNT_NAME: AccountName = AccountName::from_literal("nobody");
pub const ANYBODY_ACCOUNT_NAME: AccountName = AccountName::from_literal("anybody");
pub const PRODUCERS_ACCOUNT_NAME: AccountName = AccountName::from_literal("producers");
/// 超过 13 个字符的部分按历史编码规则截断。
pub const BETTERCHAIN_AUTH_SCOPE: AccountName = AccountName::from_literal("betterchain.auth");
pub const BETTERCHAIN_ALL_SCOPE: AccountName = AccountName::from_literal("betterchain.all");

pub const ACTIVE_NAME: AccountName = AccountName::from_literal("active");
pub const OWNER_NAME: AccountName = AccountName::from_literal("owner");

/// 代币数量的底层整数类型。
pub type ShareType = i64;

/// 代币精度：小数点后 4 位。
pub const TOKEN_PRECISION: u32 = 4;
/// 一个完整代币对应的底层单位数量。
pub const TOKEN_UNIT: ShareType = 10_000;
/// 初始发行量 `1000000000.0000`。
pub const INITIAL_TOKEN_SUPPLY: ShareType = 1_000_000_000 * TOKEN_UNIT;

pub const BLOCK_INTERVAL_MS: u32 = 500;
pub const BLOCK_INTERVAL_US: u32 = BLOCK_INTERVAL_MS * 1000;
pub const BLOCK_INTERVAL: Duration = Duration::from_millis(BLOCK_INTERVAL_MS as u64);
/// 区块时间戳纪元：2000-01-01T00:00:00Z，单位毫秒。
pub const BLOCK_TIMESTAMP_EPOCH_MS: u64 = 946_684_800_000;
/// 每笔交易的最低带宽开销（签名等），单位字节。
pub const FIXED_BANDWIDTH_OVERHEAD_PER_TRANSACTION: u32 = 100;

pub const PERCENT_100: u16 = 10_000;
pub const PERCENT_1: u16 = 100;

pub const REQUIRED_PRODUCER_PARTICIPATION: u32 = 33 * PERCENT_1 as u32;

pub const BANDWIDTH_AVERAGE_WINDOW_MS: u32 = 24 * 60 * 60 * 1000;
pub const COMPUTE_AVERAGE_WINDOW_MS: u32 = 24 * 60 * 60 * 1000;
pub const BLOCKSIZE_AVERAGE_WINDOW_MS: u32 = 60 * 1000;

/// 500ms 出块、200 字节交易时约可承载 10,000 TPS 的突发。
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 1024 * 1024;
/// 目标 1000 TPS 突发。
pub const DEFAULT_TARGET_BLOCK_SIZE: u32 = DEFAULT_MAX_BLOCK_SIZE / 10;
pub const DEFAULT_TARGET_BLOCK_ACTS_PER_SCOPE: u32 = 1000;
pub const DEFAULT_MAX_BLOCK_ACTS_PER_SCOPE: u32 = DEFAULT_TARGET_BLOCK_ACTS_PER_SCOPE * 10;

pub const DEFAULT_TARGET_BLOCK_ACTS: u32 = 2000;
pub const DEFAULT_MAX_BLOCK_ACTS: u32 = DEFAULT_TARGET_BLOCK_ACTS * 100;
pub const SETCODE_ACT_USAGE: u32 = 100;

pub const DEFAULT_MAX_STORAGE_SIZE: u64 = 10 * 1024;
/// 交易最长有效期，单位秒。
pub const DEFAULT_MAX_TRX_LIFETIME: u32 = 60 * 60;
pub const DEFAULT_MAX_AUTH_DEPTH: u16 = 6;
/// 交易最长执行时间，单位微秒。
pub const DEFAULT_MAX_TRX_RUNTIME: u32 = 10 * 1000;
pub const DEFAULT_MAX_INLINE_DEPTH: u16 = 4;
pub const DEFAULT_MAX_INLINE_ACTION_SIZE: u32 = 4 * 1024;
pub const DEFAULT_MAX_GEN_TRX_SIZE: u32 = 64 * 1024;
/// 单个 action 可生成的交易数量上限。
pub const DEFAULT_MAX_GEN_TRX_COUNT: u32 = 16;
pub const PRODUCERS_AUTHORITY_THRESHOLD: u32 = 14;
pub const RATE_LIMITING_PRECISION: u32 = 1000 * 1000;

pub const DEFAULT_ELECTED_PAY: ShareType = 100;
pub const DEFAULT_MIN_BETTERCHAIN_BALANCE: ShareType = 100;

pub const MAX_RECURSION_DEPTH: u16 = 6;

/// 单个生产者连续出块的数量。
pub const PRODUCER_REPETITIONS: u32 = 6;

/// 每轮区块数：保证所有生产者都能出完各自的连续区块。
pub const BLOCKS_PER_ROUND: u32 = PRODUCER_COUNT * PRODUCER_REPETITIONS;

pub const IRREVERSIBLE_THRESHOLD_PERCENT: u32 = 70 * PERCENT_1 as u32;
pub const MAX_PRODUCER_VOTES: u32 = 30;

pub const STAKED_BALANCE_COOLDOWN: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// 按定点百分比缩放数值：`value * percentage / PERCENT_100`。
///
/// 先乘后除，调用方需自行保证乘积不溢出。
pub fn percent<T>(value: T, percentage: u16) -> T
where
    T: Mul<Output = T> + Div<Output = T> + From<u16>,
{
    value * T::from(percentage) / T::from(PERCENT_100)
}
