//! 键解析（KeyResolver）
//!
//! 聚合标识到分区键/排序键的纯函数映射。解析必须是确定性的：
//! 存储层不会为已写入的记录重新推导键，更换解析器会使旧数据不可寻址
//! （需自行迁移，引擎不做处理）。
//!
use crate::aggregate::AggregateId;

/// 键解析接口；可替换实现以控制分片分布
pub trait KeyResolver<Id>: Send + Sync
where
    Id: AggregateId,
{
    /// 分区键：决定记录落在后端哪个物理分片
    fn resolve_partition_key(&self, aggregate_id: &Id, shard_count: usize) -> String;

    /// 排序键：聚合内按事件序号唯一寻址
    fn resolve_sort_key(&self, aggregate_id: &Id, sequence_number: usize) -> String;
}

/// 默认实现
///
/// 分区键为 `{type_name}-{crc32(value) % shard_count}`。
/// 分片哈希只覆盖 id 的 value 而不含类型名，不同类型、同 value 的聚合
/// 会落入同一分区桶；排序键仍按类型名区分，保持与既有数据的兼容。
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyResolver;

impl<Id> KeyResolver<Id> for DefaultKeyResolver
where
    Id: AggregateId,
{
    fn resolve_partition_key(&self, aggregate_id: &Id, shard_count: usize) -> String {
        let shard_count = shard_count.max(1) as u32;
        let remainder = crc32fast::hash(aggregate_id.value().as_bytes()) % shard_count;
        format!("{}-{}", aggregate_id.type_name(), remainder)
    }

    fn resolve_sort_key(&self, aggregate_id: &Id, sequence_number: usize) -> String {
        format!(
            "{}-{}-{}",
            aggregate_id.type_name(),
            aggregate_id.value(),
            sequence_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestId {
        value: String,
    }

    impl AggregateId for TestId {
        fn type_name(&self) -> &str {
            "user-account"
        }

        fn value(&self) -> &str {
            &self.value
        }
    }

    #[test]
    fn partition_key_is_deterministic() {
        let id = TestId {
            value: "01H42K4ABWQ5V2XQEP3A48VE0Z".to_string(),
        };
        let resolver = DefaultKeyResolver;
        let first = resolver.resolve_partition_key(&id, 64);
        for _ in 0..10 {
            assert_eq!(resolver.resolve_partition_key(&id, 64), first);
        }
    }

    #[test]
    fn partition_key_uses_crc32_of_value() {
        // crc32("123456789") = 0xCBF43926 = 3421780262, 3421780262 % 64 = 38
        let id = TestId {
            value: "123456789".to_string(),
        };
        let key = DefaultKeyResolver.resolve_partition_key(&id, 64);
        assert_eq!(key, "user-account-38");
    }

    #[test]
    fn sort_key_contains_type_value_and_seq_nr() {
        let id = TestId {
            value: "u-1".to_string(),
        };
        let key = DefaultKeyResolver.resolve_sort_key(&id, 7);
        assert_eq!(key, "user-account-u-1-7");
    }

    #[test]
    fn zero_shard_count_is_clamped() {
        let id = TestId {
            value: "u-1".to_string(),
        };
        let key = DefaultKeyResolver.resolve_partition_key(&id, 0);
        assert_eq!(key, "user-account-0");
    }
}
