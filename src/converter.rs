//! 转换器（Converter）回调契约
//!
//! 由调用方提供，把反序列化得到的结构化 map 落回具体的事件/聚合类型。
//! 普通闭包即可满足契约（见下方 blanket 实现），也可以为每个聚合类型
//! 实现专门的转换器并在构造存储时注册。
//!
use crate::error::EventStoreResult;
use serde_json::Value;

/// 事件转换器：`payload map -> E`
pub trait EventConverter<E>: Send + Sync {
    fn convert(&self, payload: Value) -> EventStoreResult<E>;
}

impl<E, F> EventConverter<E> for F
where
    F: Fn(Value) -> EventStoreResult<E> + Send + Sync,
{
    fn convert(&self, payload: Value) -> EventStoreResult<E> {
        self(payload)
    }
}

/// 快照转换器：`payload map -> A`
pub trait SnapshotConverter<A>: Send + Sync {
    fn convert(&self, payload: Value) -> EventStoreResult<A>;
}

impl<A, F> SnapshotConverter<A> for F
where
    F: Fn(Value) -> EventStoreResult<A> + Send + Sync,
{
    fn convert(&self, payload: Value) -> EventStoreResult<A> {
        self(payload)
    }
}
