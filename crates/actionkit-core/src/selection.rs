//! Record selections for bulk actions.

use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKey};

/// The set of records a bulk action operates on.
///
/// The UI submits keys; when the model is known the keys can be
/// hydrated into full records before the handler runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Raw record keys as submitted.
    Keys(Vec<RecordKey>),
    /// Records hydrated from the store.
    Records(Vec<Record>),
}

impl Selection {
    /// Get the number of selected records.
    pub fn len(&self) -> usize {
        match self {
            Selection::Keys(keys) => keys.len(),
            Selection::Records(records) => records.len(),
        }
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the keys of the selection. Hydrated records without a key are skipped.
    pub fn keys(&self) -> Vec<RecordKey> {
        match self {
            Selection::Keys(keys) => keys.clone(),
            Selection::Records(records) => records.iter().filter_map(Record::key).collect(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Keys(Vec::new())
    }
}

impl From<Vec<RecordKey>> for Selection {
    fn from(keys: Vec<RecordKey>) -> Self {
        Selection::Keys(keys)
    }
}

impl From<Vec<Record>> for Selection {
    fn from(records: Vec<Record>) -> Self {
        Selection::Records(records)
    }
}
