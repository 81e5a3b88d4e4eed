//! In-memory record store.
//!
//! Records live in a map per kind; numeric ids come from a single process-wide
//! counter so they are never reused, even after deletes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::document::Property;
use crate::query::QueryParams;

use super::errors::{StoreError, StoreResult};
use super::{RecordId, RecordKey, RecordStore};

type Records = BTreeMap<RecordId, Vec<Property>>;

pub struct MemoryStore {
    /// kind -> id -> properties
    data: RwLock<HashMap<String, Records>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of records stored under `kind`
    pub fn count(&self, kind: &str) -> StoreResult<usize> {
        let data = self.data.read().map_err(|_| lock_poisoned())?;
        Ok(data.get(kind).map(|r| r.len()).unwrap_or(0))
    }

    fn allocate_id(&self) -> RecordId {
        RecordId::Numeric(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> StoreError {
    StoreError::Backend("Lock poisoned".to_string())
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Vec<Property>> {
        let data = self.data.read().map_err(|_| lock_poisoned())?;

        data.get(&key.kind)
            .and_then(|records| records.get(&key.id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    fn query(
        &self,
        kind: &str,
        query: &QueryParams,
    ) -> StoreResult<Vec<(RecordId, Vec<Property>)>> {
        let data = self.data.read().map_err(|_| lock_poisoned())?;

        let mut results: Vec<(RecordId, Vec<Property>)> = match data.get(kind) {
            Some(records) => records
                .iter()
                .filter(|(_, props)| query.matches(props))
                .map(|(id, props)| (id.clone(), props.clone()))
                .collect(),
            None => Vec::new(),
        };

        // Stable sort keeps key order among ties
        results.sort_by(|(_, a), (_, b)| query.compare(a, b));

        Ok(results)
    }

    fn put(
        &self,
        kind: &str,
        id: Option<RecordId>,
        properties: Vec<Property>,
    ) -> StoreResult<RecordId> {
        let id = match id {
            Some(id) => id,
            None => self.allocate_id(),
        };

        let mut data = self.data.write().map_err(|_| lock_poisoned())?;
        data.entry(kind.to_string())
            .or_default()
            .insert(id.clone(), properties);

        Ok(id)
    }

    fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        let mut data = self.data.write().map_err(|_| lock_poisoned())?;

        data.get_mut(&key.kind)
            .and_then(|records| records.remove(&key.id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }
}
