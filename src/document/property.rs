//! # Properties
//!
//! The flat unit a document is persisted as.

use std::cmp::Ordering;

use super::value::Value;

/// Strings and blobs this long or longer are stored but never indexed
pub const MAX_INDEXED_LEN: usize = 1 << 20;

/// A storable scalar. All numbers are carried as f64.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
    Blob(Vec<u8>),
}

impl Scalar {
    /// Ordering between two scalars of the same type, `None` across types
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Blob(a), Scalar::Blob(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Byte length of string and blob payloads, zero otherwise
    pub fn payload_len(&self) -> usize {
        match self {
            Scalar::String(s) => s.len(),
            Scalar::Blob(b) => b.len(),
            _ => 0,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Float(n),
            Scalar::String(s) => Value::String(s),
            Scalar::Blob(b) => Value::Blob(b),
        }
    }
}

/// One flattened `(path, value, multiple, indexed)` unit
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// `.`-joined sequence of nested keys
    pub path: String,
    pub value: Scalar,
    /// The path belongs to a list-valued field
    pub multiple: bool,
    /// False for oversized strings and blobs
    pub indexed: bool,
}

impl Property {
    pub fn new(path: impl Into<String>, value: Scalar, multiple: bool) -> Self {
        let indexed = value.payload_len() < MAX_INDEXED_LEN;
        Self {
            path: path.into(),
            value,
            multiple,
            indexed,
        }
    }
}
