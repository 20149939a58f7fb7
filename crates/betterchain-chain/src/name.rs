//! 账户名编码。
//!
//! # 设计背景（Why）
//! - 链上账户、权限名与作用域均以 64 位整数存储，比较与哈希都退化为整数运算；
//! - 字符集限定为 `.`、`1`–`5`、`a`–`z` 共 32 个符号，每个字符占 5 bit，
//!   前 12 个字符共 60 bit，第 13 个字符只剩 4 bit，因此仅允许 `.`、`1`–`5`、`a`–`j`。
//!
//! # 使用方式（How）
//! - 常量场景使用 [`name`] 这一 `const fn`，对应合约侧的 `N(...)` 写法：非法字符按 `.` 处理、
//!   超出 13 个字符的部分被截断；
//! - 运行期输入（配置、RPC）应走 [`AccountName::from_str`](core::str::FromStr)，它会严格校验并返回 [`NameError`]。

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const MAX_NAME_LEN: usize = 13;

/// 将单个 ASCII 字符映射为 5 bit 符号；非法字符返回 0（即 `.`）。
const fn char_to_symbol(c: u8) -> u64 {
    match c {
        b'a'..=b'z' => (c - b'a') as u64 + 6,
        b'1'..=b'5' => (c - b'1') as u64 + 1,
        _ => 0,
    }
}

/// 编译期账户名编码，结果与合约侧 `N(...)` 一致。
///
/// 不做校验：非法字符映射为 `.`，第 13 个之后的字符被忽略。
pub const fn name(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut value = 0u64;
    let mut i = 0;
    while i < MAX_NAME_LEN {
        let mut c = if i < bytes.len() {
            char_to_symbol(bytes[i])
        } else {
            0
        };
        if i < MAX_NAME_LEN - 1 {
            c &= 0x1f;
            c <<= 64 - 5 * (i + 1);
        } else {
            c &= 0x0f;
        }
        value |= c;
        i += 1;
    }
    value
}

/// 账户名解析失败的原因。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum NameError {
    /// 名称超过 13 个字符。
    #[error("account name `{name}` is {len} characters long, at most 13 are allowed")]
    TooLong { name: String, len: usize },
    /// 出现字符集之外的字符。
    #[error("account name `{name}` contains invalid character {ch:?} at position {position}")]
    InvalidCharacter {
        name: String,
        ch: char,
        position: usize,
    },
    /// 第 13 个字符只有 4 bit 可用。
    #[error("account name `{name}` has 13th character {ch:?}, only `.`, `1`-`5`, `a`-`j` fit")]
    InvalidThirteenthCharacter { name: String, ch: char },
}

impl NameError {
    /// 稳定错误码，供日志与指标聚合。
    pub fn code(&self) -> &'static str {
        match self {
            NameError::TooLong { .. } => "betterchain.chain.name.too_long",
            NameError::InvalidCharacter { .. } => "betterchain.chain.name.invalid_character",
            NameError::InvalidThirteenthCharacter { .. } => {
                "betterchain.chain.name.invalid_thirteenth_character"
            }
        }
    }
}

/// 64 位编码的账户名。
///
/// # 契约说明（What）
/// - 排序按底层整数进行，与存储层的有序索引一致；
/// - `Display` 输出会去掉尾部的 `.`，因此 `"abc."` 与 `"abc"` 编码相同。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(u64);

impl AccountName {
    /// 直接由编码值构造。
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// 以 [`name`] 的宽松规则编码字面量，供常量定义使用。
    pub const fn from_literal(s: &str) -> Self {
        Self(name(s))
    }

    /// 返回底层编码值。
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// 是否为空名（全部为 `.`）。
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<AccountName> for u64 {
    fn from(value: AccountName) -> Self {
        value.0
    }
}

impl FromStr for AccountName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len > MAX_NAME_LEN {
            return Err(NameError::TooLong {
                name: s.to_owned(),
                len,
            });
        }
        for (position, ch) in s.chars().enumerate() {
            let valid = matches!(ch, '.' | '1'..='5' | 'a'..='z');
            if !valid {
                return Err(NameError::InvalidCharacter {
                    name: s.to_owned(),
                    ch,
                    position,
                });
            }
            if position == MAX_NAME_LEN - 1 && char_to_symbol(ch as u8) > 0x0f {
                return Err(NameError::InvalidThirteenthCharacter {
                    name: s.to_owned(),
                    ch,
                });
            }
        }
        Ok(Self(name(s)))
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = out
            .iter()
            .rposition(|byte| *byte != b'.')
            .map_or(0, |pos| pos + 1);
        // CHARMAP 全部为 ASCII。
        let text = core::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?;
        f.write_str(text)
    }
}
