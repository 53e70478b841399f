//! 内存参考后端（MemoryKvsClient）
//!
//! 以进程内 map 实现 `KvsClient` 的全部条件语义：条件化插入、
//! 版本条件更新、全有或全无的事务。供测试与本地开发使用，
//! 也是条件语义的可执行说明。
//!
use crate::kvs::{
    AttrValue, CONDITIONAL_CHECK_FAILED, KvsClient, KvsError, KvsItem, QueryRequest,
    SortCondition, TransactWriteItem,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// 表：主键 `(pkey, skey)` 到条目
type Table = HashMap<(String, String), KvsItem>;

#[derive(Debug, Default)]
pub struct MemoryKvsClient {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryKvsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定表中的条目数（测试辅助）
    pub fn item_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .expect("lock poisoned")
            .get(table)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

fn primary_key(item: &KvsItem) -> Result<(String, String), KvsError> {
    let pkey = item
        .get("pkey")
        .and_then(AttrValue::as_str)
        .ok_or_else(|| KvsError::InvalidRequest {
            message: "missing string attribute: pkey".to_string(),
        })?;
    let skey = item
        .get("skey")
        .and_then(AttrValue::as_str)
        .ok_or_else(|| KvsError::InvalidRequest {
            message: "missing string attribute: skey".to_string(),
        })?;
    Ok((pkey.to_string(), skey.to_string()))
}

fn condition_holds(
    tables: &HashMap<String, Table>,
    item: &TransactWriteItem,
) -> Result<bool, KvsError> {
    match item {
        TransactWriteItem::Put(put) => {
            if !put.if_absent {
                return Ok(true);
            }
            let key = primary_key(&put.item)?;
            let occupied = tables
                .get(&put.table)
                .is_some_and(|table| table.contains_key(&key));
            Ok(!occupied)
        }
        TransactWriteItem::Update(update) => {
            let key = primary_key(&update.key)?;
            let stored_version = tables
                .get(&update.table)
                .and_then(|table| table.get(&key))
                .and_then(|stored| stored.get("version"))
                .and_then(AttrValue::as_number);
            Ok(stored_version == Some(update.expected_version))
        }
    }
}

#[async_trait]
impl KvsClient for MemoryKvsClient {
    async fn transact_write(&self, items: Vec<TransactWriteItem>) -> Result<(), KvsError> {
        let mut tables = self.tables.lock().expect("lock poisoned");

        // 先整体校验再应用，保证全有或全无
        let mut reasons = Vec::with_capacity(items.len());
        let mut failed = false;
        for item in &items {
            if condition_holds(&tables, item)? {
                reasons.push("None".to_string());
            } else {
                reasons.push(CONDITIONAL_CHECK_FAILED.to_string());
                failed = true;
            }
        }
        if failed {
            return Err(KvsError::TransactionCanceled { reasons });
        }

        for item in items {
            match item {
                TransactWriteItem::Put(put) => {
                    let key = primary_key(&put.item)?;
                    tables.entry(put.table).or_default().insert(key, put.item);
                }
                TransactWriteItem::Update(update) => {
                    let key = primary_key(&update.key)?;
                    let table = tables.entry(update.table).or_default();
                    if let Some(stored) = table.get_mut(&key) {
                        for (name, value) in update.set {
                            stored.insert(name, value);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<KvsItem>, KvsError> {
        let tables = self.tables.lock().expect("lock poisoned");
        let Some(table) = tables.get(&request.table) else {
            return Ok(Vec::new());
        };

        // 内存实现不落真实索引，直接按属性过滤
        let mut matches: Vec<&KvsItem> = table
            .values()
            .filter(|item| {
                item.get("aid").and_then(AttrValue::as_str) == Some(request.aid.as_str())
            })
            .filter(|item| {
                let Some(seq_nr) = item.get("seq_nr").and_then(AttrValue::as_number) else {
                    return false;
                };
                match request.seq_nr {
                    SortCondition::Eq(n) => seq_nr == n,
                    SortCondition::Gte(n) => seq_nr >= n,
                }
            })
            .collect();
        matches.sort_by_key(|item| item.get("seq_nr").and_then(AttrValue::as_number));

        let limit = request.limit.unwrap_or(matches.len());
        Ok(matches.into_iter().take(limit).cloned().collect())
    }
}
