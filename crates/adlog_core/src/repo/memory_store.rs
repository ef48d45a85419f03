//! In-process record store.

use crate::repo::record_store::{merge_patch, RecordStore, ShapePolicy, StoreResult};
use chrono::{SecondsFormat, Utc};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

/// Record store held in memory, e.g. for tests and local editing.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    records: BTreeMap<String, Value>,
    policy: ShapePolicy,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ShapePolicy) -> Self {
        Self {
            records: BTreeMap::new(),
            policy,
        }
    }

    /// Seeds a raw record, bypassing merge and policy checks.
    pub fn insert(&mut self, id: impl Into<String>, record: Value) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &str) -> StoreResult<Option<Value>> {
        Ok(self.records.get(id).cloned())
    }

    fn set(&mut self, id: &str, patch: &Value) -> StoreResult<()> {
        self.policy.check(patch)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let merged = merge_patch(self.records.get(id).cloned(), patch, &now)?;
        self.records.insert(id.to_string(), Value::Object(merged));
        debug!("event=record_set module=repo status=ok store=memory record_id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRecordStore;
    use crate::repo::record_store::{RecordStore, ShapePolicy, StoreError};
    use serde_json::json;

    #[test]
    fn set_creates_then_merges() {
        let mut store = MemoryRecordStore::new();
        store.set("log-1", &json!({"title": "a"})).unwrap();
        store.set("log-1", &json!({"content_text": "b"})).unwrap();
        let record = store.get("log-1").unwrap().unwrap();
        assert_eq!(record["title"], json!("a"));
        assert_eq!(record["content_text"], json!("b"));
        assert!(record["updated_at"].is_string());
    }

    #[test]
    fn rejected_patch_leaves_record_untouched() {
        let mut store = MemoryRecordStore::with_policy(ShapePolicy::strings_only());
        store.insert("log-1", json!({"content_json": "[]"}));
        let err = store
            .set("log-1", &json!({"content_json": [], "content_text": "x"}))
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert_eq!(store.get("log-1").unwrap(), Some(json!({"content_json": "[]"})));
    }
}
