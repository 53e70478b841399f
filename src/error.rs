//! 事件存储统一错误定义
//!
//! 聚焦参数校验、序列化、乐观锁与后端持久化四类最小必要集合，
//! 便于调用方按类别决定补救策略：`OptimisticLock` 重读后重试，
//! `Persistence` 携带底层原因供诊断，引擎自身不做任何重试。
//!
use crate::kvs::KvsError;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// 编程性误用（如通过 `persist_event` 持久化创建事件），
    /// 在任何 I/O 之前快速失败
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// 负载编解码失败；始终发生在本地，与后端无关
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// 版本条件或唯一性条件竞争失败；
    /// 调用方应重读最新快照、重算后在业务层重试
    #[error("optimistic lock failure: {reason}")]
    OptimisticLock { reason: String },

    /// 其他后端错误（超时、限流、请求非法等），不假定可重试
    #[error("persistence error: {reason}")]
    Persistence {
        reason: String,
        #[source]
        source: Option<KvsError>,
    },
}

/// 统一 Result 类型别名
pub type EventStoreResult<T> = Result<T, EventStoreError>;
