//! 内存事件存储（EventStoreInMemory）
//!
//! 直接保存领域对象（事件与聚合），不经过序列化/键解析/后端请求，
//! 但与 KVS 实现遵守同一套版本与路径约束：重复创建失败、
//! 更新路径要求期望版本与当前版本一致、失败的调用不留任何痕迹。
//! 供测试与原型使用。
//!
use crate::aggregate::{Aggregate, AggregateId};
use crate::error::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::store::EventStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// 创建路径写入的初始版本
const INITIAL_VERSION: usize = 1;

#[derive(Debug)]
struct State<A, E> {
    /// 聚合 ID 字符串到事件历史（追加序）
    events: HashMap<String, Vec<E>>,
    /// 聚合 ID 字符串到最新快照（版本存于聚合自身）
    snapshots: HashMap<String, A>,
}

impl<A, E> Default for State<A, E> {
    fn default() -> Self {
        Self {
            events: HashMap::new(),
            snapshots: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct EventStoreInMemory<A, E> {
    // 单锁覆盖两个 map，保证事件与快照的变更原子可见
    state: Mutex<State<A, E>>,
}

impl<A, E> Default for EventStoreInMemory<A, E> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

impl<A, E> EventStoreInMemory<A, E> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<A, E> EventStore<A, E> for EventStoreInMemory<A, E>
where
    A: Aggregate,
    E: Event<Id = A::Id> + Clone,
{
    async fn persist_event(&self, event: &E, version: usize) -> EventStoreResult<()> {
        if event.is_created() {
            return Err(EventStoreError::InvalidArgument {
                reason: "event is a created type".to_string(),
            });
        }
        let aid = event.aggregate_id().as_string();
        let mut state = self.state.lock().expect("lock poisoned");

        let Some(snapshot) = state.snapshots.get(&aid) else {
            return Err(EventStoreError::OptimisticLock {
                reason: format!("no snapshot exists for aggregate: {aid}"),
            });
        };
        if snapshot.version() != version {
            return Err(EventStoreError::OptimisticLock {
                reason: format!(
                    "version mismatch for aggregate: {aid}, expected: {version}, actual: {}",
                    snapshot.version()
                ),
            });
        }

        let advanced = snapshot.clone().with_version(version + 1);
        state.snapshots.insert(aid.clone(), advanced);
        state.events.entry(aid).or_default().push(event.clone());
        Ok(())
    }

    async fn persist_event_and_snapshot(&self, event: &E, aggregate: &A) -> EventStoreResult<()> {
        let aid = event.aggregate_id().as_string();
        let mut state = self.state.lock().expect("lock poisoned");

        if event.is_created() {
            if state.snapshots.contains_key(&aid) {
                return Err(EventStoreError::OptimisticLock {
                    reason: format!("aggregate already exists: {aid}"),
                });
            }
            state
                .snapshots
                .insert(aid.clone(), aggregate.clone().with_version(INITIAL_VERSION));
        } else {
            let expected = aggregate.version();
            let Some(snapshot) = state.snapshots.get(&aid) else {
                return Err(EventStoreError::OptimisticLock {
                    reason: format!("no snapshot exists for aggregate: {aid}"),
                });
            };
            if snapshot.version() != expected {
                return Err(EventStoreError::OptimisticLock {
                    reason: format!(
                        "version mismatch for aggregate: {aid}, expected: {expected}, actual: {}",
                        snapshot.version()
                    ),
                });
            }
            state
                .snapshots
                .insert(aid.clone(), aggregate.clone().with_version(expected + 1));
        }
        state.events.entry(aid).or_default().push(event.clone());
        Ok(())
    }

    async fn get_latest_snapshot_by_id(
        &self,
        aggregate_id: &A::Id,
    ) -> EventStoreResult<Option<A>> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state.snapshots.get(&aggregate_id.as_string()).cloned())
    }

    async fn get_events_by_id_since_seq_nr(
        &self,
        aggregate_id: &A::Id,
        since_seq_nr: usize,
    ) -> EventStoreResult<Vec<E>> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(state
            .events
            .get(&aggregate_id.as_string())
            .map(|history| {
                history
                    .iter()
                    .filter(|e| e.sequence_number() >= since_seq_nr)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
