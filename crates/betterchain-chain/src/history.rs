//! 账户交易历史索引。
//!
//! # 设计背景（Why）
//! - 历史插件需要回答“某账户参与过哪些交易”，数据由外部有序多索引存储库持久化；
//! - 存储库对本模块的唯一要求是“持久键值索引 + 组合键查询”，因此这里只定义记录结构、
//!   [`AccountHistoryIndex`] 契约，以及一个基于 `BTreeMap` 的内存实现。
//!
//! # 索引布局（How）
//! - 主索引：`id` 有序唯一；
//! - 二级索引：`(account, transaction_id)` 组合键有序唯一，支持按账户做范围扫描。

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::name::AccountName;

/// 历史记录的主键。
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HistoryId(u64);

impl HistoryId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 32 字节交易摘要（SHA-256）。
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    /// 组合键范围扫描的下界。
    pub const MIN: TransactionId = TransactionId([0x00; 32]);
    /// 组合键范围扫描的上界。
    pub const MAX: TransactionId = TransactionId([0xFF; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// 对打包后的交易字节计算摘要得到交易 ID。
    pub fn digest(packed_transaction: &[u8]) -> Self {
        let digest = Sha256::digest(packed_transaction);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// 一条账户与交易的关联记录。
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountTransactionHistory {
    pub id: HistoryId,
    pub name: AccountName,
    pub transaction_id: TransactionId,
}

/// 历史索引的错误域。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum HistoryError {
    /// 组合键 `(account, transaction_id)` 已存在。
    #[error("account `{name}` already indexes transaction {transaction_id} as record {existing}")]
    Duplicate {
        name: AccountName,
        transaction_id: TransactionId,
        existing: HistoryId,
    },
    /// 主键空间耗尽。
    #[error("history id space exhausted")]
    IdExhausted,
}

impl HistoryError {
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::Duplicate { .. } => "betterchain.chain.history.duplicate",
            HistoryError::IdExhausted => "betterchain.chain.history.id_exhausted",
        }
    }
}

/// 账户交易历史索引契约。
///
/// # 契约说明（What）
/// - `insert`：分配新主键并写入两条索引；组合键冲突时返回 [`HistoryError::Duplicate`]，索引保持不变；
/// - `get`：按主键查询；
/// - `find`：按组合键 `(name, transaction_id)` 精确查询；
/// - `for_account`：按交易 ID 升序返回某账户的全部记录；
/// - `remove`：按主键删除并同步清理二级索引。
///
/// # 实现要求
/// - 两条索引必须原子一致：任何调用返回后，主索引中的每条记录都能经组合键找回，反之亦然。
pub trait AccountHistoryIndex {
    fn insert(
        &mut self,
        name: AccountName,
        transaction_id: TransactionId,
    ) -> Result<HistoryId, HistoryError>;

    fn get(&self, id: HistoryId) -> Option<&AccountTransactionHistory>;

    fn find(
        &self,
        name: AccountName,
        transaction_id: TransactionId,
    ) -> Option<&AccountTransactionHistory>;

    fn for_account<'a>(
        &'a self,
        name: AccountName,
    ) -> Box<dyn Iterator<Item = &'a AccountTransactionHistory> + 'a>;

    fn remove(&mut self, id: HistoryId) -> Option<AccountTransactionHistory>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 基于两棵 `BTreeMap` 的内存索引实现，不负责持久化。
///
/// 主键从 0 起单调分配，直到 `u64::MAX` 也被分配后才返回 [`HistoryError::IdExhausted`]；
/// 删除的主键不会复用。
#[derive(Debug)]
pub struct InMemoryHistoryIndex {
    by_id: BTreeMap<HistoryId, AccountTransactionHistory>,
    by_account_trx: BTreeMap<(AccountName, TransactionId), HistoryId>,
    /// 下一个可分配的主键；`None` 表示主键空间已用尽。
    next_id: Option<u64>,
}

impl Default for InMemoryHistoryIndex {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_account_trx: BTreeMap::new(),
            next_id: Some(0),
        }
    }
}

impl InMemoryHistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountHistoryIndex for InMemoryHistoryIndex {
    fn insert(
        &mut self,
        name: AccountName,
        transaction_id: TransactionId,
    ) -> Result<HistoryId, HistoryError> {
        if let Some(existing) = self.by_account_trx.get(&(name, transaction_id)) {
            debug!(
                account = %name,
                transaction = %transaction_id,
                existing = existing.get(),
                "duplicate account history record rejected"
            );
            return Err(HistoryError::Duplicate {
                name,
                transaction_id,
                existing: *existing,
            });
        }
        let raw = self.next_id.ok_or(HistoryError::IdExhausted)?;
        let id = HistoryId(raw);
        self.next_id = raw.checked_add(1);
        self.by_account_trx.insert((name, transaction_id), id);
        self.by_id.insert(
            id,
            AccountTransactionHistory {
                id,
                name,
                transaction_id,
            },
        );
        Ok(id)
    }

    fn get(&self, id: HistoryId) -> Option<&AccountTransactionHistory> {
        self.by_id.get(&id)
    }

    fn find(
        &self,
        name: AccountName,
        transaction_id: TransactionId,
    ) -> Option<&AccountTransactionHistory> {
        self.by_account_trx
            .get(&(name, transaction_id))
            .and_then(|id| self.by_id.get(id))
    }

    fn for_account<'a>(
        &'a self,
        name: AccountName,
    ) -> Box<dyn Iterator<Item = &'a AccountTransactionHistory> + 'a> {
        Box::new(
            self.by_account_trx
                .range((name, TransactionId::MIN)..=(name, TransactionId::MAX))
                .filter_map(move |(_, id)| self.by_id.get(id)),
        )
    }

    fn remove(&mut self, id: HistoryId) -> Option<AccountTransactionHistory> {
        let record = self.by_id.remove(&id)?;
        self.by_account_trx
            .remove(&(record.name, record.transaction_id));
        Some(record)
    }

    fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_id_is_issued_before_exhaustion() {
        let mut index = InMemoryHistoryIndex {
            next_id: Some(u64::MAX - 1),
            ..InMemoryHistoryIndex::default()
        };
        let account = AccountName::from_literal("alice");

        let first = index
            .insert(account, TransactionId::from_bytes([1; 32]))
            .expect("倒数第二个主键应可分配");
        assert_eq!(first, HistoryId::new(u64::MAX - 1));
        let last = index
            .insert(account, TransactionId::from_bytes([2; 32]))
            .expect("u64::MAX 本身也应可分配");
        assert_eq!(last, HistoryId::new(u64::MAX));

        let err = index
            .insert(account, TransactionId::from_bytes([3; 32]))
            .expect_err("主键用尽后应报错");
        assert_eq!(err, HistoryError::IdExhausted);
        assert_eq!(err.code(), "betterchain.chain.history.id_exhausted");
        assert_eq!(index.len(), 2, "失败的插入不得写入任何索引");
        assert!(index.find(account, TransactionId::from_bytes([3; 32])).is_none());
    }
}
