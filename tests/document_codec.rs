//! Document Codec Tests
//!
//! Properties of the flatten/unflatten pair and the filter grammar:
//! - Round trip for documents without dotted keys
//! - List folding keeps element order
//! - Nested maps become dotted paths
//! - Filter literals are numbers when they parse as floats
//! - Round trip and list order hold for generated documents

use restkind::document::{flatten, unflatten, Document, Property, Scalar};
use restkind::query::{parse_filter, FilterOperator, QueryError, QueryParams};
use proptest::prelude::*;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn doc(value: Value) -> Document {
    Document::from_json(value).unwrap()
}

fn round_trip(value: Value) -> Value {
    let properties: Vec<Property> = flatten(&doc(value)).collect();
    serde_json::to_value(unflatten(properties)).unwrap()
}

/// Every number as a float, so `3` and `3.0` compare equal
fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}

// =============================================================================
// Generators
// =============================================================================

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000i64..1_000_000).prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ]
}

/// A scalar or a non-empty list of scalars
fn arb_field() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_scalar(),
        prop::collection::vec(arb_scalar(), 1..5).prop_map(Value::Array),
    ]
}

/// Non-empty nested objects with undotted keys, no nulls and no lists of containers
fn arb_document() -> impl Strategy<Value = Value> {
    let flat = prop::collection::btree_map("[a-z_]{1,6}", arb_field(), 1..5)
        .prop_map(|m| Value::Object(m.into_iter().collect()));

    flat.prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map("[a-z_]{1,6}", prop_oneof![arb_field(), inner], 1..5)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    })
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_mixed_document() {
    let original = json!({
        "name": "widget",
        "price": 9.5,
        "count": 3,
        "active": false,
        "tags": ["a", "b", "c"],
        "dims": {"w": 1, "h": {"value": 2, "unit": "cm"}},
        "single": ["only"]
    });

    assert_eq!(round_trip(original.clone()), original);
}

#[test]
fn test_list_folding_keeps_order() {
    assert_eq!(round_trip(json!({"a": [1, 2, 3]})), json!({"a": [1, 2, 3]}));
    assert_eq!(round_trip(json!({"a": [3, 1, 2]})), json!({"a": [3, 1, 2]}));
}

#[test]
fn test_integers_come_back_as_floats() {
    let properties: Vec<Property> = flatten(&doc(json!({"n": 7}))).collect();
    assert_eq!(properties[0].value, Scalar::Number(7.0));
}

#[test]
fn test_empty_document() {
    assert_eq!(flatten(&Document::new()).count(), 0);
    assert!(unflatten(Vec::new()).is_empty());
}

// =============================================================================
// Path Tests
// =============================================================================

#[test]
fn test_nested_path_flattens_to_one_property() {
    let properties: Vec<Property> = flatten(&doc(json!({"a": {"b": 1}}))).collect();

    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].path, "a.b");
    assert_eq!(properties[0].value, Scalar::Number(1.0));
    assert!(!properties[0].multiple);
}

#[test]
fn test_dotted_path_unflattens_to_nested_map() {
    let properties = vec![Property::new("a.b", Scalar::Number(1.0), false)];
    assert_eq!(
        serde_json::to_value(unflatten(properties)).unwrap(),
        json!({"a": {"b": 1}})
    );
}

#[test]
fn test_list_elements_are_multiple() {
    let properties: Vec<Property> = flatten(&doc(json!({"a": ["x", "y"], "b": "z"}))).collect();

    let multiple: Vec<_> = properties
        .iter()
        .map(|p| (p.path.as_str(), p.multiple))
        .collect();
    assert_eq!(multiple, vec![("a", true), ("a", true), ("b", false)]);
}

// =============================================================================
// Filter Grammar Tests
// =============================================================================

#[test]
fn test_numeric_filter_literal() {
    let filter = parse_filter("age>=30").unwrap();
    assert_eq!(filter.field, "age");
    assert_eq!(filter.operator, FilterOperator::Gte);
    assert_eq!(filter.value, Scalar::Number(30.0));
}

#[test]
fn test_string_filter_literal() {
    let filter = parse_filter("name=Bob").unwrap();
    assert_eq!(filter.field, "name");
    assert_eq!(filter.operator, FilterOperator::Eq);
    assert_eq!(filter.value, Scalar::String("Bob".to_string()));
}

#[test]
fn test_composite_filters_rejected() {
    for filter in ["a==b AND c==d", "AND(a=1,b=2)", "OR(a=1)"] {
        let result = QueryParams::parse(&[("filter", filter)]);
        assert!(
            matches!(result, Err(QueryError::CompositeUnsupported(_))),
            "{} should be rejected",
            filter
        );
    }
}

#[test]
fn test_filters_apply_to_flattened_documents() {
    let query = QueryParams::parse(&[("filter", "dims.w<2"), ("filter", "tags=b")]).unwrap();

    let matching: Vec<Property> =
        flatten(&doc(json!({"dims": {"w": 1}, "tags": ["a", "b"]}))).collect();
    let other: Vec<Property> =
        flatten(&doc(json!({"dims": {"w": 1}, "tags": ["c"]}))).collect();

    assert!(query.matches(&matching));
    assert!(!query.matches(&other));
}

// =============================================================================
// Generated Documents
// =============================================================================

proptest! {
    #[test]
    fn test_generated_documents_round_trip(original in arb_document()) {
        prop_assert_eq!(normalize(round_trip(original.clone())), normalize(original));
    }

    #[test]
    fn test_generated_lists_keep_order(items in prop::collection::vec(arb_scalar(), 1..8)) {
        let original = json!({"items": items});
        let rebuilt = normalize(round_trip(original.clone()));
        prop_assert_eq!(&rebuilt["items"], &normalize(original)["items"]);
    }
}
