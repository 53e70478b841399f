//! 事件存储适配器（event-store-adapter）
//!
//! 面向分片键值后端的事件溯源持久化引擎，提供：
//! - 聚合/事件抽象（`aggregate`、`event`）与可插拔的键解析（`key_resolver`）；
//! - 日志（journal）与快照（snapshot）双表的事务化写入协议（`store`、`request`）；
//! - 乐观锁与错误分类（`error`）；
//! - 同契约的内存参考实现（`memory`）与同步入口（`blocking`）。
//!
//! 本 crate 只依赖后端的两个原语：条件化单项写入与全有或全无的多项条件事务
//! （`kvs::KvsClient`），具体网络传输由上层注入实现；`kvs::memory` 提供用于
//! 测试与本地开发的参考后端。
//!
//! 典型用法：
//! 1. 为应用的聚合与事件实现 `Aggregate`/`AggregateId`/`Event`；
//! 2. 提供 `EventConverter`/`SnapshotConverter`（普通闭包即可）；
//! 3. 以 `EventStoreForKvs::new` 装配存储，通过 `persist_event` /
//!    `persist_event_and_snapshot` 写入，`get_latest_snapshot_by_id` +
//!    `get_events_by_id_since_seq_nr` 读取并重放。
//!
pub mod aggregate;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod converter;
pub mod error;
pub mod event;
pub mod key_resolver;
pub mod kvs;
pub mod memory;
pub mod options;
pub mod request;
pub mod serializer;
pub mod store;
