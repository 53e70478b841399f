//! 负载序列化（Serializer）
//!
//! 事件与快照到不透明字节负载的可插拔编解码。引擎对负载内容不做任何
//! 假设：`serialize` 产出字节，`deserialize` 还原为结构化 map
//! （`serde_json::Value`），再交由调用方注入的转换器落到具体领域类型。
//!
use crate::aggregate::Aggregate;
use crate::error::EventStoreResult;
use crate::event::Event;
use serde::Serialize;
use serde_json::Value;

/// 事件序列化接口
pub trait EventSerializer<E>: Send + Sync
where
    E: Event,
{
    fn serialize(&self, event: &E) -> EventStoreResult<Vec<u8>>;

    fn deserialize(&self, payload: &[u8]) -> EventStoreResult<Value>;
}

/// 快照序列化接口
pub trait SnapshotSerializer<A>: Send + Sync
where
    A: Aggregate,
{
    fn serialize(&self, aggregate: &A) -> EventStoreResult<Vec<u8>>;

    fn deserialize(&self, payload: &[u8]) -> EventStoreResult<Value>;
}

/// 默认实现：JSON 编码
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventSerializer;

impl<E> EventSerializer<E> for JsonEventSerializer
where
    E: Event + Serialize,
{
    fn serialize(&self, event: &E) -> EventStoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(event)?)
    }

    fn deserialize(&self, payload: &[u8]) -> EventStoreResult<Value> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// 默认实现：JSON 编码
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotSerializer;

impl<A> SnapshotSerializer<A> for JsonSnapshotSerializer
where
    A: Aggregate + Serialize,
{
    fn serialize(&self, aggregate: &A) -> EventStoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(aggregate)?)
    }

    fn deserialize(&self, payload: &[u8]) -> EventStoreResult<Value> {
        Ok(serde_json::from_slice(payload)?)
    }
}
