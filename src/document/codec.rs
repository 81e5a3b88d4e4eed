//! # Document Codec
//!
//! Flattens nested documents into properties and rebuilds documents from them.
//!
//! `flatten` walks the document lazily with an explicit stack, yielding one
//! property per scalar. Nested maps extend the path with `.`, list elements reuse
//! their field's path and are marked `multiple`.
//!
//! `unflatten` splits each path on `.`, creating intermediate maps as needed. A
//! repeated leaf turns into a list; a leaf first seen with `multiple` set starts as
//! a one-element list so single-element lists keep their shape.
//!
//! For documents without dotted keys, empty lists or lists of maps,
//! `unflatten(flatten(d))` equals `d` up to numbers becoming floats.

use std::collections::btree_map;
use std::slice;

use crate::observability::{log_event_with_fields, Event};

use super::property::{Property, Scalar};
use super::value::{Document, Value};

/// Flatten a document into a lazy stream of properties
pub fn flatten(doc: &Document) -> Flatten<'_> {
    Flatten {
        stack: vec![Frame::Map {
            prefix: None,
            entries: doc.iter(),
            multiple: false,
        }],
    }
}

enum Frame<'a> {
    Map {
        prefix: Option<String>,
        entries: btree_map::Iter<'a, String, Value>,
        multiple: bool,
    },
    List {
        path: String,
        items: slice::Iter<'a, Value>,
    },
}

/// Iterator returned by [`flatten`]
pub struct Flatten<'a> {
    stack: Vec<Frame<'a>>,
}

fn join_path(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    }
}

fn to_scalar(path: &str, value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Int(i) => Some(Scalar::Number(*i as f64)),
        Value::Float(f) => Some(Scalar::Number(*f)),
        Value::String(s) => Some(Scalar::String(s.clone())),
        Value::Blob(b) => Some(Scalar::Blob(b.clone())),
        Value::Null | Value::List(_) | Value::Map(_) => {
            log_event_with_fields(
                Event::PropertyDropped,
                &[("path", path), ("kind", value.kind_name())],
            );
            None
        }
    }
}

impl<'a> Iterator for Flatten<'a> {
    type Item = Property;

    fn next(&mut self) -> Option<Property> {
        loop {
            let next: Option<(String, &'a Value, bool)> = match self.stack.last_mut()? {
                Frame::Map {
                    prefix,
                    entries,
                    multiple,
                } => entries
                    .next()
                    .map(|(k, v)| (join_path(prefix.as_deref(), k), v, *multiple)),
                Frame::List { path, items } => items.next().map(|v| (path.clone(), v, true)),
            };

            let Some((path, value, multiple)) = next else {
                self.stack.pop();
                continue;
            };

            match value {
                Value::Map(doc) => self.stack.push(Frame::Map {
                    prefix: Some(path),
                    entries: doc.iter(),
                    multiple,
                }),
                Value::List(items) => self.stack.push(Frame::List {
                    path,
                    items: items.iter(),
                }),
                scalar => {
                    if let Some(value) = to_scalar(&path, scalar) {
                        return Some(Property::new(path, value, multiple));
                    }
                }
            }
        }
    }
}

/// Rebuild a document from a stream of properties
pub fn unflatten<I>(properties: I) -> Document
where
    I: IntoIterator<Item = Property>,
{
    let mut doc = Document::new();

    'properties: for property in properties {
        let mut segments: Vec<&str> = property.path.split('.').collect();
        let leaf = match segments.pop() {
            Some(leaf) => leaf,
            None => continue,
        };

        let mut node = &mut doc;
        for segment in segments {
            node = match descend(node, segment) {
                Some(child) => child,
                None => {
                    log_event_with_fields(
                        Event::PathConflict,
                        &[("path", &property.path), ("segment", segment)],
                    );
                    continue 'properties;
                }
            };
        }

        insert_leaf(node, leaf, property.value.into(), property.multiple);
    }

    doc
}

/// Step into `segment`, creating a map when absent and appending a fresh map
/// when the segment already holds a list
fn descend<'d>(node: &'d mut Document, segment: &str) -> Option<&'d mut Document> {
    let entry = node
        .entry(segment.to_string())
        .or_insert_with(|| Value::Map(Document::new()));

    match entry {
        Value::Map(child) => Some(child),
        Value::List(items) => {
            items.push(Value::Map(Document::new()));
            match items.last_mut() {
                Some(Value::Map(child)) => Some(child),
                _ => None,
            }
        }
        _ => None,
    }
}

fn insert_leaf(node: &mut Document, key: &str, value: Value, multiple: bool) {
    match node.get_mut(key) {
        None => {
            let value = if multiple { Value::List(vec![value]) } else { value };
            node.insert(key, value);
        }
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let previous = std::mem::replace(existing, Value::Null);
            *existing = Value::List(vec![previous, value]);
        }
    }
}
