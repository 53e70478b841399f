//! 领域事件（Event）抽象
//!
use crate::aggregate::AggregateId;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// 领域事件接口
///
/// 事件是只追加的：同一聚合内 `(aggregate_id, sequence_number)` 唯一，
/// 由存储层的条件化写入保证。
pub trait Event: Debug + Send + Sync + 'static {
    type Id: AggregateId;

    /// 事件唯一标识符
    fn id(&self) -> &str;

    /// 事件类型名，用于反序列化路由
    fn type_name(&self) -> &str;

    /// 事件所属的聚合 ID
    fn aggregate_id(&self) -> &Self::Id;

    /// 聚合内事件序号（≥ 1）
    fn sequence_number(&self) -> usize;

    /// 是否为创建聚合的首个事件（序号 1）；
    /// 同一聚合生命周期内至多一个，由存储层而非事件自身保证
    fn is_created(&self) -> bool;

    /// 事件发生时间
    fn occurred_at(&self) -> DateTime<Utc>;
}
