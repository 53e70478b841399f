//! 存储配置（EventStoreOptions）
//!
//! 表名/索引名、分片数与快照保留策略。全部字段带默认值，
//! 在构造存储时一次性提供；运行期通过存储的 `with_*` 方法派生新实例，
//! 而非原地修改。
//!
use bon::Builder;

#[derive(Debug, Clone, Builder)]
pub struct EventStoreOptions {
    /// 日志表名
    #[builder(into, default = "journal".to_string())]
    pub journal_table_name: String,

    /// 快照表名
    #[builder(into, default = "snapshot".to_string())]
    pub snapshot_table_name: String,

    /// 日志表的 aid 二级索引名
    #[builder(into, default = "journal-aid-index".to_string())]
    pub journal_aid_index_name: String,

    /// 快照表的 aid 二级索引名
    #[builder(into, default = "snapshot-aid-index".to_string())]
    pub snapshot_aid_index_name: String,

    /// 分区数（正整数）
    #[builder(default = 64)]
    pub shard_count: usize,

    /// 为真时在更新路径上额外保留历史快照
    /// （`seq_nr = aggregate.sequence_number` 的快照行）
    #[builder(default = false)]
    pub keep_snapshot: bool,

    /// 历史快照保留条数；超额清理是预留扩展点，引擎本身不执行清理
    #[builder(default = 0)]
    pub keep_snapshot_count: usize,

    /// 历史快照过期 TTL（毫秒）；同为预留扩展点
    #[builder(default = 1000)]
    pub delete_ttl_millis: u64,
}

impl Default for EventStoreOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_table_layout() {
        let options = EventStoreOptions::default();
        assert_eq!(options.journal_table_name, "journal");
        assert_eq!(options.snapshot_table_name, "snapshot");
        assert_eq!(options.journal_aid_index_name, "journal-aid-index");
        assert_eq!(options.snapshot_aid_index_name, "snapshot-aid-index");
        assert_eq!(options.shard_count, 64);
        assert!(!options.keep_snapshot);
        assert_eq!(options.keep_snapshot_count, 0);
        assert_eq!(options.delete_ttl_millis, 1000);
    }

    #[test]
    fn builder_overrides() {
        let options = EventStoreOptions::builder()
            .journal_table_name("j")
            .snapshot_table_name("s")
            .shard_count(32)
            .keep_snapshot(true)
            .keep_snapshot_count(5)
            .build();
        assert_eq!(options.journal_table_name, "j");
        assert_eq!(options.shard_count, 32);
        assert!(options.keep_snapshot);
        assert_eq!(options.keep_snapshot_count, 5);
    }
}
