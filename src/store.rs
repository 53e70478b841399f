//! 事件存储（EventStore）
//!
//! 公共持久化契约与基于 KVS 后端的事务化实现：
//! - `persist_event`：纯事件持久化（日志追加 + 快照版本推进）；
//! - `persist_event_and_snapshot`：创建路径或事件 + 快照刷新；
//! - `get_latest_snapshot_by_id` / `get_events_by_id_since_seq_nr`：读路径。
//!
//! 每个公共操作至多一次后端往返，引擎不含隐藏重试；单聚合内的写入
//! 由乐观版本条件全序化，两个并发调用者持相同期望版本竞争时，
//! 后端条件写保证恰有一个成功，失败方得到乐观锁错误且不产生任何部分效果。
//!
use crate::aggregate::{Aggregate, AggregateId};
use crate::converter::{EventConverter, SnapshotConverter};
use crate::error::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::key_resolver::{DefaultKeyResolver, KeyResolver};
use crate::kvs::KvsClient;
use crate::options::EventStoreOptions;
use crate::request::{
    RequestBuilder, classify_write_error, get_events_error, get_snapshot_error,
};
use crate::serializer::{
    EventSerializer, JsonEventSerializer, JsonSnapshotSerializer, SnapshotSerializer,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// 事件存储契约
///
/// 单聚合写入历史的状态机：`∅ →(create, v=1) →(update, v=2) → …`；
/// 从 `∅` 出发的唯一合法迁移是创建，其余迁移都要求
/// `expected_version == current_version` 并产出 `current_version + 1`，
/// 失配即本次调用终止（由调用方重读、重算、重试）。
#[async_trait]
pub trait EventStore<A, E>: Send + Sync
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    /// 纯事件持久化；`event.is_created()` 为真时以 `InvalidArgument` 拒绝。
    /// 成功后存储中的版本变为 `version + 1`，快照负载保持不变。
    async fn persist_event(&self, event: &E, version: usize) -> EventStoreResult<()>;

    /// 事件与快照一并持久化。创建事件走插入路径（这是唯一允许
    /// 创建聚合记录的路径，重复创建会失败）；否则以
    /// `aggregate.version()` 为期望版本走更新路径并刷新快照。
    async fn persist_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()>;

    /// 活动快照；不存在时返回 `None`。返回的聚合版本以存储为准。
    async fn get_latest_snapshot_by_id(&self, aggregate_id: &A::Id)
    -> EventStoreResult<Option<A>>;

    /// `seq_nr >= since_seq_nr` 的全部事件，序号升序；无匹配时为空序列
    async fn get_events_by_id_since_seq_nr(
        &self,
        aggregate_id: &A::Id,
        since_seq_nr: usize,
    ) -> EventStoreResult<Vec<E>>;
}

#[async_trait]
impl<A, E, T> EventStore<A, E> for Arc<T>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
    T: EventStore<A, E> + ?Sized,
{
    async fn persist_event(&self, event: &E, version: usize) -> EventStoreResult<()> {
        (**self).persist_event(event, version).await
    }

    async fn persist_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()> {
        (**self).persist_event_and_snapshot(event, aggregate).await
    }

    async fn get_latest_snapshot_by_id(
        &self,
        aggregate_id: &A::Id,
    ) -> EventStoreResult<Option<A>> {
        (**self).get_latest_snapshot_by_id(aggregate_id).await
    }

    async fn get_events_by_id_since_seq_nr(
        &self,
        aggregate_id: &A::Id,
        since_seq_nr: usize,
    ) -> EventStoreResult<Vec<E>> {
        (**self)
            .get_events_by_id_since_seq_nr(aggregate_id, since_seq_nr)
            .await
    }
}

/// 基于 KVS 后端的事务化实现
///
/// 所有 `with_*` 方法消费 `self` 并返回新配置的实例（不可变 builder），
/// 派生实例共享同一个后端客户端句柄；实例实现 `Clone`，
/// 需要保留旧配置时先克隆再派生。
pub struct EventStoreForKvs<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    client: Arc<dyn KvsClient>,
    support: RequestBuilder<A, E>,
    event_converter: Arc<dyn EventConverter<E>>,
    snapshot_converter: Arc<dyn SnapshotConverter<A>>,
}

impl<A, E> Clone for EventStoreForKvs<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            support: self.support.clone(),
            event_converter: Arc::clone(&self.event_converter),
            snapshot_converter: Arc::clone(&self.snapshot_converter),
        }
    }
}

impl<A, E> EventStoreForKvs<A, E>
where
    A: Aggregate + Serialize,
    E: Event<Id = A::Id> + Serialize,
{
    /// 以默认键解析器与 JSON 序列化器装配存储
    pub fn new(
        client: Arc<dyn KvsClient>,
        options: EventStoreOptions,
        event_converter: impl EventConverter<E> + 'static,
        snapshot_converter: impl SnapshotConverter<A> + 'static,
    ) -> Self {
        Self {
            client,
            support: RequestBuilder::new(
                options,
                Arc::new(DefaultKeyResolver),
                Arc::new(JsonEventSerializer),
                Arc::new(JsonSnapshotSerializer),
            ),
            event_converter: Arc::new(event_converter),
            snapshot_converter: Arc::new(snapshot_converter),
        }
    }
}

impl<A, E> EventStoreForKvs<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    #[must_use]
    pub fn with_keep_snapshot(mut self, keep_snapshot: bool) -> Self {
        self.support.options.keep_snapshot = keep_snapshot;
        self
    }

    #[must_use]
    pub fn with_keep_snapshot_count(mut self, keep_snapshot_count: usize) -> Self {
        self.support.options.keep_snapshot_count = keep_snapshot_count;
        self
    }

    #[must_use]
    pub fn with_delete_ttl(mut self, delete_ttl_millis: u64) -> Self {
        self.support.options.delete_ttl_millis = delete_ttl_millis;
        self
    }

    #[must_use]
    pub fn with_key_resolver(mut self, key_resolver: impl KeyResolver<A::Id> + 'static) -> Self {
        self.support.key_resolver = Arc::new(key_resolver);
        self
    }

    #[must_use]
    pub fn with_event_serializer(
        mut self,
        event_serializer: impl EventSerializer<E> + 'static,
    ) -> Self {
        self.support.event_serializer = Arc::new(event_serializer);
        self
    }

    #[must_use]
    pub fn with_snapshot_serializer(
        mut self,
        snapshot_serializer: impl SnapshotSerializer<A> + 'static,
    ) -> Self {
        self.support.snapshot_serializer = Arc::new(snapshot_serializer);
        self
    }

    /// 创建路径：日志插入 + 活动快照插入，都以键缺席为条件
    async fn create_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()> {
        let put_journal = self.support.put_journal(event)?;
        let put_snapshot = self.support.put_snapshot(event, 0, aggregate)?;
        tracing::debug!(
            aggregate_id = %event.aggregate_id().as_string(),
            seq_nr = event.sequence_number(),
            "creating journal and snapshot records"
        );
        self.client
            .transact_write(vec![put_journal, put_snapshot])
            .await
            .map_err(|e| classify_write_error(e, event.id(), aggregate.version()))
    }

    /// 更新路径：日志插入 + 活动快照条件更新；
    /// 开启 keep_snapshot 且刷新快照时，同一事务内追加历史快照行
    async fn update_event_and_snapshot(
        &self,
        event: &E,
        version: usize,
        aggregate: Option<&A>,
    ) -> EventStoreResult<()> {
        let put_journal = self.support.put_journal(event)?;
        let update_snapshot = self.support.update_snapshot(event, version, aggregate)?;
        let mut items = vec![put_journal, update_snapshot];
        if let Some(aggregate) = aggregate
            && self.support.options.keep_snapshot
        {
            items.push(
                self.support
                    .put_snapshot(event, aggregate.sequence_number(), aggregate)?,
            );
        }
        tracing::debug!(
            aggregate_id = %event.aggregate_id().as_string(),
            seq_nr = event.sequence_number(),
            expected_version = version,
            refresh_snapshot = aggregate.is_some(),
            "appending event"
        );
        self.client
            .transact_write(items)
            .await
            .map_err(|e| classify_write_error(e, event.id(), version))
    }
}

#[async_trait]
impl<A, E> EventStore<A, E> for EventStoreForKvs<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
{
    async fn persist_event(&self, event: &E, version: usize) -> EventStoreResult<()> {
        if event.is_created() {
            return Err(EventStoreError::InvalidArgument {
                reason: "event is a created type".to_string(),
            });
        }
        self.update_event_and_snapshot(event, version, None).await
    }

    async fn persist_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()> {
        if event.is_created() {
            self.create_event_and_snapshot(event, aggregate).await
        } else {
            self.update_event_and_snapshot(event, aggregate.version(), Some(aggregate))
                .await
        }
    }

    async fn get_latest_snapshot_by_id(
        &self,
        aggregate_id: &A::Id,
    ) -> EventStoreResult<Option<A>> {
        let request = self.support.get_snapshot_query(aggregate_id);
        let items = self
            .client
            .query(request)
            .await
            .map_err(|e| get_snapshot_error(e, &aggregate_id.as_string()))?;
        self.support
            .snapshot_from_items(items, self.snapshot_converter.as_ref())
    }

    async fn get_events_by_id_since_seq_nr(
        &self,
        aggregate_id: &A::Id,
        since_seq_nr: usize,
    ) -> EventStoreResult<Vec<E>> {
        let request = self.support.get_events_query(aggregate_id, since_seq_nr);
        let items = self
            .client
            .query(request)
            .await
            .map_err(|e| get_events_error(e, &aggregate_id.as_string(), since_seq_nr))?;
        self.support
            .events_from_items(items, self.event_converter.as_ref())
    }
}
