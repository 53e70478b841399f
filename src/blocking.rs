//! 同步外观（BlockingEventStore）
//!
//! 为不运行异步运行时的调用方提供阻塞接口：内部持有一个
//! 单线程 tokio 运行时，把每个调用 `block_on` 到异步实现上，
//! 语义与错误分类与异步接口完全一致。
//!
//! 不要在异步上下文里使用本类型，`block_on` 会阻塞当前线程。
//!
use crate::aggregate::Aggregate;
use crate::error::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::store::EventStore;
use std::marker::PhantomData;
use tokio::runtime::Runtime;

pub struct BlockingEventStore<A, E, S>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
    S: EventStore<A, E>,
{
    inner: S,
    runtime: Runtime,
    _marker: PhantomData<fn() -> (A, E)>,
}

impl<A, E, S> BlockingEventStore<A, E, S>
where
    A: Aggregate,
    E: Event<Id = A::Id>,
    S: EventStore<A, E>,
{
    pub fn new(inner: S) -> EventStoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EventStoreError::Persistence {
                reason: format!("failed to start a blocking runtime: {e}"),
                source: None,
            })?;
        Ok(Self {
            inner,
            runtime,
            _marker: PhantomData,
        })
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn persist_event(&self, event: &E, version: usize) -> EventStoreResult<()> {
        self.runtime
            .block_on(self.inner.persist_event(event, version))
    }

    pub fn persist_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()> {
        self.runtime
            .block_on(self.inner.persist_event_and_snapshot(event, aggregate))
    }

    pub fn get_latest_snapshot_by_id(&self, aggregate_id: &A::Id) -> EventStoreResult<Option<A>> {
        self.runtime
            .block_on(self.inner.get_latest_snapshot_by_id(aggregate_id))
    }

    pub fn get_events_by_id_since_seq_nr(
        &self,
        aggregate_id: &A::Id,
        since_seq_nr: usize,
    ) -> EventStoreResult<Vec<E>> {
        self.runtime.block_on(
            self.inner
                .get_events_by_id_since_seq_nr(aggregate_id, since_seq_nr),
        )
    }
}
