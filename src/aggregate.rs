//! 聚合（Aggregate）与聚合 ID 抽象
//!
//! 约束存储引擎对聚合的最小认知：
//! - `AggregateId` 提供类型名与实例标识，二者共同构成持久化键；
//! - `Aggregate` 暴露领域序号与存储层管理的乐观锁版本号；
//! - 聚合是不可变值对象，`with_version` 返回替换版本后的副本。
//!
use std::fmt::Debug;

/// 聚合 ID 接口
///
/// 相等性由实现方的 `PartialEq` 按 `(type_name, value)` 提供。
pub trait AggregateId: Debug + Clone + PartialEq + Send + Sync + 'static {
    /// 聚合类型名（如 `user-account`）
    fn type_name(&self) -> &str;

    /// 聚合实例标识
    fn value(&self) -> &str;

    /// 字符串形式：`{type_name}-{value}`，用作二级索引键
    fn as_string(&self) -> String {
        format!("{}-{}", self.type_name(), self.value())
    }
}

/// 聚合根接口
pub trait Aggregate: Debug + Clone + Send + Sync + 'static {
    type Id: AggregateId;

    fn id(&self) -> &Self::Id;

    /// 领域事件序号（从 1 起连续递增）
    fn sequence_number(&self) -> usize;

    /// 乐观锁版本号；由存储层在每次成功持久化后加一，
    /// 与 `sequence_number` 相互独立
    fn version(&self) -> usize;

    /// 返回替换版本号后的副本；版本号的推进由存储层决定
    #[must_use]
    fn with_version(self, version: usize) -> Self;
}
