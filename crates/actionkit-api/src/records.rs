//! Record persistence consumed by the built-in actions.

use parking_lot::RwLock;
use std::collections::HashMap;

use serde_json::{Map, Value};

use actionkit_core::{ActionError, ActionResult, Record, RecordKey};

/// Storage for records, grouped by model.
///
/// Soft deletes set `deleted_at`; trashed records are invisible to
/// [`RecordStore::find`] but visible to [`RecordStore::find_with_trashed`].
pub trait RecordStore: Send + Sync {
    fn find(&self, model: &str, key: &RecordKey) -> Option<Record>;

    fn find_with_trashed(&self, model: &str, key: &RecordKey) -> Option<Record>;

    /// Find many records, skipping missing keys.
    fn find_many(&self, model: &str, keys: &[RecordKey]) -> Vec<Record> {
        keys.iter().filter_map(|key| self.find(model, key)).collect()
    }

    /// Insert a new record and assign its key.
    fn insert(&self, model: &str, attributes: Map<String, Value>) -> ActionResult<Record>;

    /// Soft delete. Returns whether a live record was deleted.
    fn delete(&self, model: &str, key: &RecordKey) -> ActionResult<bool>;

    /// Restore a trashed record. Returns whether a trashed record was restored.
    fn restore(&self, model: &str, key: &RecordKey) -> ActionResult<bool>;

    /// Permanently remove a record, trashed or not.
    fn force_delete(&self, model: &str, key: &RecordKey) -> ActionResult<bool>;

    fn delete_many(&self, model: &str, keys: &[RecordKey]) -> ActionResult<usize> {
        count_where(keys, |key| self.delete(model, key))
    }

    fn restore_many(&self, model: &str, keys: &[RecordKey]) -> ActionResult<usize> {
        count_where(keys, |key| self.restore(model, key))
    }

    fn force_delete_many(&self, model: &str, keys: &[RecordKey]) -> ActionResult<usize> {
        count_where(keys, |key| self.force_delete(model, key))
    }
}

fn count_where<F>(keys: &[RecordKey], mut op: F) -> ActionResult<usize>
where
    F: FnMut(&RecordKey) -> ActionResult<bool>,
{
    let mut count = 0;
    for key in keys {
        if op(key)? {
            count += 1;
        }
    }
    Ok(count)
}

/// Find a live record or fail with `NotFound`.
pub fn find_or_fail(store: &dyn RecordStore, model: &str, key: &RecordKey) -> ActionResult<Record> {
    store
        .find(model, key)
        .ok_or_else(|| ActionError::NotFound(format!("{} {}", model, key)))
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Default)]
struct Table {
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    // Keys submitted by the UI may be strings; compare by display form.
    fn position(&self, key: &RecordKey) -> Option<usize> {
        let wanted = key.to_string();
        self.rows
            .iter()
            .position(|row| row.key().map(|k| k.to_string()) == Some(wanted.clone()))
    }
}

/// In-memory record store with integer keys.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records of a model, trashed included.
    pub fn all(&self, model: &str) -> Vec<Record> {
        self.tables
            .read()
            .get(model)
            .map(|table| table.rows.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, model: &str) -> usize {
        self.tables
            .read()
            .get(model)
            .map(|table| table.rows.iter().filter(|r| !r.is_trashed()).count())
            .unwrap_or(0)
    }

    fn now() -> Value {
        Value::String(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl RecordStore for MemoryRecordStore {
    fn find(&self, model: &str, key: &RecordKey) -> Option<Record> {
        self.find_with_trashed(model, key)
            .filter(|record| !record.is_trashed())
    }

    fn find_with_trashed(&self, model: &str, key: &RecordKey) -> Option<Record> {
        let tables = self.tables.read();
        let table = tables.get(model)?;
        table.position(key).map(|i| table.rows[i].clone())
    }

    fn insert(&self, model: &str, mut attributes: Map<String, Value>) -> ActionResult<Record> {
        let mut tables = self.tables.write();
        let table = tables.entry(model.to_string()).or_default();

        table.next_id += 1;
        let key = match attributes.get("id") {
            Some(Value::Number(n)) => {
                let id = n.as_i64().unwrap_or(table.next_id);
                table.next_id = table.next_id.max(id);
                id
            }
            _ => table.next_id,
        };
        let key = RecordKey::from(key);
        if table.position(&key).is_some() {
            return Err(ActionError::Record(format!(
                "{} with key {} already exists",
                model, key
            )));
        }

        let now = Self::now();
        attributes.insert("id".to_string(), key.as_value().clone());
        attributes
            .entry("created_at".to_string())
            .or_insert_with(|| now.clone());
        attributes.entry("updated_at".to_string()).or_insert(now);

        let record = Record::for_model(model, attributes);
        table.rows.push(record.clone());
        tracing::debug!(model, key = %key, "Inserted record");
        Ok(record)
    }

    fn delete(&self, model: &str, key: &RecordKey) -> ActionResult<bool> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(model) else {
            return Ok(false);
        };
        match table.position(key) {
            Some(i) if !table.rows[i].is_trashed() => {
                table.rows[i].set("deleted_at", Self::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn restore(&self, model: &str, key: &RecordKey) -> ActionResult<bool> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(model) else {
            return Ok(false);
        };
        match table.position(key) {
            Some(i) if table.rows[i].is_trashed() => {
                table.rows[i].set("deleted_at", Value::Null);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn force_delete(&self, model: &str, key: &RecordKey) -> ActionResult<bool> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(model) else {
            return Ok(false);
        };
        match table.position(key) {
            Some(i) => {
                table.rows.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
