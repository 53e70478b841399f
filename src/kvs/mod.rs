//! 后端能力接口（KVS）
//!
//! 存储引擎只依赖后端的两个原语：
//! - `transact_write`：全有或全无的多项条件写入（本引擎内至多 3 项）；
//! - `query`：按 `(aid, seq_nr)` 二级索引的等值/范围查询，序号升序。
//!
//! 本模块定义与后端无关的请求描述符与条目模型；具体传输（网络、重试、
//! 鉴权）由 `KvsClient` 的实现方负责。`memory` 子模块提供带真实条件
//! 语义的参考后端，用于测试与本地开发。
//!
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// 条件检查失败时后端上报的取消码
pub const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

/// 条目属性值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// 字符串
    S(String),
    /// 整数
    N(i64),
    /// 字节负载
    B(Vec<u8>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttrValue::N(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::B(b) => Some(b),
            _ => None,
        }
    }
}

/// 条目：属性名到属性值的映射
pub type KvsItem = HashMap<String, AttrValue>;

/// 条件化单项插入
#[derive(Debug, Clone)]
pub struct PutItem {
    pub table: String,
    pub item: KvsItem,
    /// 为真时仅当主键 `(pkey, skey)` 不存在才写入
    pub if_absent: bool,
}

/// 条件化单项更新
///
/// 仅当存储中条目的 `version` 等于 `expected_version` 时，
/// 把 `set` 中的属性写入 `key` 指向的条目；条目不存在视为条件失败。
#[derive(Debug, Clone)]
pub struct UpdateItem {
    pub table: String,
    pub key: KvsItem,
    pub set: KvsItem,
    pub expected_version: i64,
}

/// 事务中的一项写入
#[derive(Debug, Clone)]
pub enum TransactWriteItem {
    Put(PutItem),
    Update(UpdateItem),
}

/// 排序键条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCondition {
    /// `seq_nr = n`
    Eq(i64),
    /// `seq_nr >= n`
    Gte(i64),
}

/// 二级索引查询：`aid = ...` 且满足排序键条件，结果按 `seq_nr` 升序
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub table: String,
    pub index: String,
    pub aid: String,
    pub seq_nr: SortCondition,
    pub limit: Option<usize>,
}

/// 后端错误
#[derive(Debug, Clone, Error)]
pub enum KvsError {
    /// 事务被取消；`reasons` 为逐项取消码
    /// （条件失败的项为 [`CONDITIONAL_CHECK_FAILED`]，其余为 `None`）
    #[error("transaction canceled: [{}]", reasons.join(", "))]
    TransactionCanceled { reasons: Vec<String> },

    /// 后端不可用（超时、限流、连接失败等）
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    /// 请求形状非法（缺少主键属性等）
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl KvsError {
    /// 是否由条件检查失败导致
    pub fn is_conditional_check_failed(&self) -> bool {
        match self {
            KvsError::TransactionCanceled { reasons } => {
                reasons.iter().any(|r| r == CONDITIONAL_CHECK_FAILED)
            }
            _ => false,
        }
    }
}

/// 后端客户端能力接口
#[async_trait]
pub trait KvsClient: Send + Sync {
    /// 全有或全无地执行一组条件写入；
    /// 任一条件失败时整组回绝并返回 [`KvsError::TransactionCanceled`]
    async fn transact_write(&self, items: Vec<TransactWriteItem>) -> Result<(), KvsError>;

    /// 二级索引查询，结果按 `seq_nr` 升序
    async fn query(&self, request: QueryRequest) -> Result<Vec<KvsItem>, KvsError>;
}
