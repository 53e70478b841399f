//! 请求构造（RequestBuilder）
//!
//! 纯构造，无 I/O：把事件/快照编为与后端无关的条件写入与查询描述符，
//! 并负责响应条目的解码与写入失败的分类。持久化字段名
//! （`pkey, skey, aid, seq_nr, payload, occurred_at, version, ttl`）
//! 是既有数据格式的一部分，不可更改。
//!
use crate::aggregate::{Aggregate, AggregateId};
use crate::converter::{EventConverter, SnapshotConverter};
use crate::error::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::key_resolver::KeyResolver;
use crate::kvs::{
    AttrValue, KvsError, KvsItem, PutItem, QueryRequest, SortCondition, TransactWriteItem,
    UpdateItem,
};
use crate::options::EventStoreOptions;
use crate::serializer::{EventSerializer, SnapshotSerializer};
use std::sync::Arc;

/// 活动快照固定落在排序位置 0
const LIVE_SNAPSHOT_SEQ_NR: usize = 0;

pub struct RequestBuilder<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    pub(crate) options: EventStoreOptions,
    pub(crate) key_resolver: Arc<dyn KeyResolver<A::Id>>,
    pub(crate) event_serializer: Arc<dyn EventSerializer<E>>,
    pub(crate) snapshot_serializer: Arc<dyn SnapshotSerializer<A>>,
}

impl<A, E> Clone for RequestBuilder<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            key_resolver: Arc::clone(&self.key_resolver),
            event_serializer: Arc::clone(&self.event_serializer),
            snapshot_serializer: Arc::clone(&self.snapshot_serializer),
        }
    }
}

impl<A, E> RequestBuilder<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    pub fn new(
        options: EventStoreOptions,
        key_resolver: Arc<dyn KeyResolver<A::Id>>,
        event_serializer: Arc<dyn EventSerializer<E>>,
        snapshot_serializer: Arc<dyn SnapshotSerializer<A>>,
    ) -> Self {
        Self {
            options,
            key_resolver,
            event_serializer,
            snapshot_serializer,
        }
    }

    /// 日志追加：仅当 `(pkey, skey)` 不存在才插入
    pub fn put_journal(&self, event: &E) -> EventStoreResult<TransactWriteItem> {
        let aggregate_id = event.aggregate_id();
        let pkey = self
            .key_resolver
            .resolve_partition_key(aggregate_id, self.options.shard_count);
        let skey = self
            .key_resolver
            .resolve_sort_key(aggregate_id, event.sequence_number());
        let payload = self.event_serializer.serialize(event)?;
        let item = KvsItem::from([
            ("pkey".to_string(), AttrValue::S(pkey)),
            ("skey".to_string(), AttrValue::S(skey)),
            ("aid".to_string(), AttrValue::S(aggregate_id.as_string())),
            (
                "seq_nr".to_string(),
                AttrValue::N(event.sequence_number() as i64),
            ),
            ("payload".to_string(), AttrValue::B(payload)),
            (
                "occurred_at".to_string(),
                AttrValue::N(event.occurred_at().timestamp_millis()),
            ),
        ]);
        Ok(TransactWriteItem::Put(PutItem {
            table: self.options.journal_table_name.clone(),
            item,
            if_absent: true,
        }))
    }

    /// 快照插入：仅当 `(pkey, skey)` 不存在才插入，版本固定为 1。
    /// `seq_nr = 0` 写入活动快照；其他序号写入历史快照行。
    pub fn put_snapshot(
        &self,
        event: &E,
        seq_nr: usize,
        aggregate: &A,
    ) -> EventStoreResult<TransactWriteItem> {
        let aggregate_id = event.aggregate_id();
        let pkey = self
            .key_resolver
            .resolve_partition_key(aggregate_id, self.options.shard_count);
        let skey = self.key_resolver.resolve_sort_key(aggregate_id, seq_nr);
        let payload = self.snapshot_serializer.serialize(aggregate)?;
        let item = KvsItem::from([
            ("pkey".to_string(), AttrValue::S(pkey)),
            ("skey".to_string(), AttrValue::S(skey)),
            ("aid".to_string(), AttrValue::S(aggregate_id.as_string())),
            ("seq_nr".to_string(), AttrValue::N(seq_nr as i64)),
            ("payload".to_string(), AttrValue::B(payload)),
            ("version".to_string(), AttrValue::N(1)),
            ("ttl".to_string(), AttrValue::N(0)),
        ]);
        Ok(TransactWriteItem::Put(PutItem {
            table: self.options.snapshot_table_name.clone(),
            item,
            if_absent: true,
        }))
    }

    /// 活动快照更新：要求存储中的 `version == expected_version`，
    /// 成功后版本推进为 `expected_version + 1`。
    /// `aggregate` 为 `Some` 时同步重写 `payload`；为 `None` 时仅推进
    /// 版本计数（纯事件持久化，快照负载保持陈旧，但版本令牌仍跟踪
    /// 真实的变更次数）。条目上的 `seq_nr` 始终停留在哨兵位 0，
    /// 保证活动快照可按 `seq_nr = 0` 寻址；真实序号在负载内。
    pub fn update_snapshot(
        &self,
        event: &E,
        expected_version: usize,
        aggregate: Option<&A>,
    ) -> EventStoreResult<TransactWriteItem> {
        let aggregate_id = event.aggregate_id();
        let pkey = self
            .key_resolver
            .resolve_partition_key(aggregate_id, self.options.shard_count);
        let skey = self
            .key_resolver
            .resolve_sort_key(aggregate_id, LIVE_SNAPSHOT_SEQ_NR);
        let key = KvsItem::from([
            ("pkey".to_string(), AttrValue::S(pkey)),
            ("skey".to_string(), AttrValue::S(skey)),
        ]);

        let mut set = KvsItem::from([(
            "version".to_string(),
            AttrValue::N(expected_version as i64 + 1),
        )]);
        if let Some(aggregate) = aggregate {
            let payload = self.snapshot_serializer.serialize(aggregate)?;
            set.insert("payload".to_string(), AttrValue::B(payload));
            set.insert(
                "seq_nr".to_string(),
                AttrValue::N(LIVE_SNAPSHOT_SEQ_NR as i64),
            );
        }

        Ok(TransactWriteItem::Update(UpdateItem {
            table: self.options.snapshot_table_name.clone(),
            key,
            set,
            expected_version: expected_version as i64,
        }))
    }

    /// 活动快照查询：`aid = id, seq_nr = 0`，最多一条
    pub fn get_snapshot_query(&self, aggregate_id: &A::Id) -> QueryRequest {
        QueryRequest {
            table: self.options.snapshot_table_name.clone(),
            index: self.options.snapshot_aid_index_name.clone(),
            aid: aggregate_id.as_string(),
            seq_nr: SortCondition::Eq(LIVE_SNAPSHOT_SEQ_NR as i64),
            limit: Some(1),
        }
    }

    /// 事件范围查询：`aid = id, seq_nr >= since`，序号升序
    pub fn get_events_query(&self, aggregate_id: &A::Id, since_seq_nr: usize) -> QueryRequest {
        QueryRequest {
            table: self.options.journal_table_name.clone(),
            index: self.options.journal_aid_index_name.clone(),
            aid: aggregate_id.as_string(),
            seq_nr: SortCondition::Gte(since_seq_nr as i64),
            limit: None,
        }
    }

    /// 把查询条目解码为事件序列（保持条目顺序）
    pub fn events_from_items(
        &self,
        items: Vec<KvsItem>,
        converter: &dyn EventConverter<E>,
    ) -> EventStoreResult<Vec<E>> {
        items
            .into_iter()
            .map(|item| {
                let payload = item
                    .get("payload")
                    .and_then(AttrValue::as_bytes)
                    .ok_or_else(|| malformed("journal item is missing payload"))?;
                let payload_map = self.event_serializer.deserialize(payload)?;
                converter.convert(payload_map)
            })
            .collect()
    }

    /// 把查询条目解码为聚合快照；存储的 `version` 字段覆盖负载内嵌的版本
    /// （版本号以存储为准，而非负载）
    pub fn snapshot_from_items(
        &self,
        items: Vec<KvsItem>,
        converter: &dyn SnapshotConverter<A>,
    ) -> EventStoreResult<Option<A>> {
        let Some(item) = items.into_iter().next() else {
            return Ok(None);
        };
        let version = item
            .get("version")
            .and_then(AttrValue::as_number)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| malformed("snapshot item is missing version"))?;
        let payload = item
            .get("payload")
            .and_then(AttrValue::as_bytes)
            .ok_or_else(|| malformed("snapshot item is missing payload"))?;
        let payload_map = self.snapshot_serializer.deserialize(payload)?;
        let aggregate = converter.convert(payload_map)?;
        Ok(Some(aggregate.with_version(version)))
    }
}

/// 负载/条目形状异常
fn malformed(reason: &str) -> EventStoreError {
    EventStoreError::Serialization {
        source: <serde_json::Error as serde::de::Error>::custom(reason),
    }
}

/// 写入失败分类：条件检查失败（版本条件或日志唯一性条件）意味着
/// 调用方状态已陈旧，映射为乐观锁失败；其余归入持久化错误并保留原因
pub(crate) fn classify_write_error(
    error: KvsError,
    event_id: &str,
    version: usize,
) -> EventStoreError {
    if error.is_conditional_check_failed() {
        EventStoreError::OptimisticLock {
            reason: format!(
                "while persisting event with id: {event_id}, version: {version}: {error}"
            ),
        }
    } else {
        EventStoreError::Persistence {
            reason: format!(
                "failed to persist event with id: {event_id}, version: {version} and its corresponding snapshot"
            ),
            source: Some(error),
        }
    }
}

pub(crate) fn get_snapshot_error(error: KvsError, aggregate_id: &str) -> EventStoreError {
    EventStoreError::Persistence {
        reason: format!("failed to retrieve the latest snapshot for aggregate: {aggregate_id}"),
        source: Some(error),
    }
}

pub(crate) fn get_events_error(
    error: KvsError,
    aggregate_id: &str,
    since_seq_nr: usize,
) -> EventStoreError {
    EventStoreError::Persistence {
        reason: format!(
            "failed to retrieve events for aggregate: {aggregate_id} since sequence number: {since_seq_nr}"
        ),
        source: Some(error),
    }
}
