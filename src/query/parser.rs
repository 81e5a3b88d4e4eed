//! # Query Parameter Parser
//!
//! Turns the `filter` and `order` query-string parameters of a list request into
//! structured predicates and sort keys.
//!
//! - `filter=<field><op><value>` (repeatable, implicit AND), op one of
//!   `!= == = <= >= < >`; the value is a number when it parses as f64
//! - `order=<field>` ascending, `order=-<field>` descending (repeatable)
//! - `params=...` and AND/OR composites are rejected

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::{Property, Scalar};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{QueryError, QueryResult};
use super::filter::{FilterExpr, FilterOperator, OrderBy};

static FILTER_RE: OnceLock<Regex> = OnceLock::new();
static COMPOSITE_RE: OnceLock<Regex> = OnceLock::new();
static INFIX_COMPOSITE_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_RE: OnceLock<Regex> = OnceLock::new();

fn filter_re() -> &'static Regex {
    FILTER_RE.get_or_init(|| {
        Regex::new(r"^([\w\-.]+)(!=|==|=|<=|>=|<|>)(.+)$").expect("filter grammar")
    })
}

fn composite_re() -> &'static Regex {
    COMPOSITE_RE.get_or_init(|| Regex::new(r"^(AND|OR)\((.*)\)$").expect("composite grammar"))
}

/// `a==b AND c==d` style: a keyword followed by another comparison
fn infix_composite_re() -> &'static Regex {
    INFIX_COMPOSITE_RE.get_or_init(|| {
        Regex::new(r"\s(AND|OR)\s+[\w\-.]+(!=|==|=|<=|>=|<|>)").expect("infix composite grammar")
    })
}

fn field_re() -> &'static Regex {
    FIELD_RE.get_or_init(|| Regex::new(r"^[\w\-.]+$").expect("field grammar"))
}

/// Parsed list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Predicates, all of which must hold
    pub filters: Vec<FilterExpr>,

    /// Sort keys, most significant first
    pub order: Vec<OrderBy>,
}

impl QueryParams {
    /// Parse query-string pairs, preserving the order repeated keys were given in
    pub fn parse<K, V>(pairs: &[(K, V)]) -> QueryResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if pairs.iter().any(|(k, _)| k.as_ref() == "params") {
            return Err(QueryError::ParamsUnsupported);
        }

        let mut result = QueryParams::default();

        for (key, value) in pairs {
            match key.as_ref() {
                "filter" => result.filters.push(parse_filter(value.as_ref())?),
                "order" => result.order.push(parse_order(value.as_ref())?),
                // `callback` is applied by the HTTP layer; other keys are ignored
                _ => {}
            }
        }

        Ok(result)
    }

    /// Check if a record satisfies every filter
    pub fn matches(&self, properties: &[Property]) -> bool {
        self.filters.iter().all(|f| f.matches(properties))
    }

    /// Compare two records by the sort keys in order
    pub fn compare(&self, a: &[Property], b: &[Property]) -> Ordering {
        for order in &self.order {
            let cmp = order.compare(a, b);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

/// Parse one `filter` parameter
pub fn parse_filter(filter: &str) -> QueryResult<FilterExpr> {
    if composite_re().is_match(filter) || infix_composite_re().is_match(filter) {
        return Err(QueryError::CompositeUnsupported(filter.to_string()));
    }

    let caps = filter_re()
        .captures(filter)
        .ok_or_else(|| QueryError::InvalidFilter(filter.to_string()))?;

    let field = &caps[1];
    let operator: FilterOperator = caps[2]
        .parse()
        .map_err(|_| QueryError::InvalidFilter(filter.to_string()))?;
    let value = parse_filter_value(&caps[3]);

    log_event_with_fields(
        Event::FilterAdded,
        &[("field", field), ("op", operator.as_str()), ("value", &caps[3])],
    );

    Ok(FilterExpr::new(field, operator, value))
}

/// Number when the literal parses as f64, string otherwise
fn parse_filter_value(value: &str) -> Scalar {
    match value.parse::<f64>() {
        Ok(n) => Scalar::Number(n),
        Err(_) => Scalar::String(value.to_string()),
    }
}

/// Parse one `order` parameter
pub fn parse_order(order: &str) -> QueryResult<OrderBy> {
    let (field, ascending) = match order.strip_prefix('-') {
        Some(field) => (field, false),
        None => (order, true),
    };

    if !field_re().is_match(field) {
        return Err(QueryError::InvalidOrder(order.to_string()));
    }

    Ok(OrderBy {
        field: field.to_string(),
        ascending,
    })
}
