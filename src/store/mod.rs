//! # Record Storage
//!
//! The store persists records as flat property lists keyed by `(kind, id)`.
//! Document shape is the codec's concern, never the store's.

pub mod errors;
pub mod memory;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::document::Property;
use crate::query::QueryParams;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Record identifier: a positive integer or an opaque name, never both
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Numeric(i64),
    Name(String),
}

impl RecordId {
    /// Interpret a path segment: positive integers are numeric ids
    pub fn parse(segment: &str) -> Self {
        match segment.parse::<i64>() {
            Ok(n) if n > 0 => RecordId::Numeric(n),
            _ => RecordId::Name(segment.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Name(s) => f.write_str(s),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordId::Numeric(n) => serializer.serialize_i64(*n),
            RecordId::Name(s) => serializer.serialize_str(s),
        }
    }
}

/// Full key of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Lower-cased collection name
    pub kind: String,
    pub id: RecordId,
}

impl RecordKey {
    pub fn new(kind: impl Into<String>, id: RecordId) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Storage collaborator
///
/// Implementations must be thread-safe. Every failure is surfaced to the
/// caller as-is; there are no retries.
pub trait RecordStore: Send + Sync {
    /// Fetch a record's properties
    fn get(&self, key: &RecordKey) -> StoreResult<Vec<Property>>;

    /// All records of `kind` matching the query's filters, in the query's order
    fn query(&self, kind: &str, query: &QueryParams)
        -> StoreResult<Vec<(RecordId, Vec<Property>)>>;

    /// Write a record, allocating a numeric id when none is given
    fn put(&self, kind: &str, id: Option<RecordId>, properties: Vec<Property>)
        -> StoreResult<RecordId>;

    /// Remove a record
    fn delete(&self, key: &RecordKey) -> StoreResult<()>;
}
