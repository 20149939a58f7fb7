#![deny(unsafe_code)]

//! `betterchain-chain` 汇集节点的链级常量与账户交易历史索引契约。
//!
//! # 模块定位（Why）
//! - 网络层、出块调度与插件都需要读取同一份链级调优常量（出块间隔、区块上限、百分比定点数等），
//!   集中在本 crate 中避免各处重复定义导致漂移；
//! - 账户交易历史索引由外部有序多索引存储库落盘，本 crate 只描述其记录结构与查询契约，
//!   并提供一个内存实现供嵌入与测试使用。
//!
//! # 结构概要（How）
//! - [`config`]：纯数据常量与 [`config::percent`] 定点百分比换算；
//! - [`name`]：账户名的 base-32 编码（[`AccountName`]），含编译期 [`name::name`] 函数；
//! - [`history`]：[`AccountHistoryIndex`] trait 与 [`InMemoryHistoryIndex`] 实现。
//!
//! # 契约说明（What）
//! - 常量只承载数值，不附带任何行为；
//! - 历史索引的主键与组合键 `(account, transaction_id)` 均为有序唯一。

pub mod config;
pub mod history;
pub mod name;

pub use history::{
    AccountHistoryIndex, AccountTransactionHistory, HistoryError, HistoryId, InMemoryHistoryIndex,
    TransactionId,
};
pub use name::{AccountName, NameError};
