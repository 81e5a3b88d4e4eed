//! # Filter Predicates
//!
//! Predicates evaluated against a record's properties, with the semantics of a
//! property-indexed store: a predicate on a multi-valued path holds when any of
//! its values satisfies it, and unindexed properties are invisible.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::document::{Property, Scalar};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOperator {
    /// Operator symbol, `==` is always written as `=`
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Neq => "!=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
        }
    }

    fn holds(&self, stored: &Scalar, operand: &Scalar) -> bool {
        match self {
            FilterOperator::Eq => stored.compare(operand) == Some(Ordering::Equal),
            FilterOperator::Neq => stored.compare(operand) != Some(Ordering::Equal),
            FilterOperator::Lt => stored.compare(operand) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                stored.compare(operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Gt => stored.compare(operand) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                stored.compare(operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(FilterOperator::Eq),
            "!=" => Ok(FilterOperator::Neq),
            "<" => Ok(FilterOperator::Lt),
            "<=" => Ok(FilterOperator::Lte),
            ">" => Ok(FilterOperator::Gt),
            ">=" => Ok(FilterOperator::Gte),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field op value` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Property path
    pub field: String,

    pub operator: FilterOperator,

    /// Number when the literal parses as f64, string otherwise
    pub value: Scalar,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Scalar) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Scalar) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Check whether a record's properties satisfy this filter
    pub fn matches(&self, properties: &[Property]) -> bool {
        properties
            .iter()
            .filter(|p| p.indexed && p.path == self.field)
            .any(|p| self.operator.holds(&p.value, &self.value))
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    /// Compare two records on this key
    ///
    /// Ascending order looks at the smallest value of the path, descending at the
    /// largest. Records without the path sort last in both directions.
    pub fn compare(&self, a: &[Property], b: &[Property]) -> Ordering {
        match (self.sort_value(a), self.sort_value(b)) {
            (Some(x), Some(y)) => {
                let cmp = sort_cmp(x, y);
                if self.ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn sort_value<'p>(&self, properties: &'p [Property]) -> Option<&'p Scalar> {
        let values = properties
            .iter()
            .filter(|p| p.indexed && p.path == self.field)
            .map(|p| &p.value);

        if self.ascending {
            values.min_by(|x, y| sort_cmp(x, y))
        } else {
            values.max_by(|x, y| sort_cmp(x, y))
        }
    }
}

fn type_rank(value: &Scalar) -> u8 {
    match value {
        Scalar::Bool(_) => 0,
        Scalar::Number(_) => 1,
        Scalar::String(_) => 2,
        Scalar::Blob(_) => 3,
    }
}

/// Total order for sorting: by type first, then by value
fn sort_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => x.total_cmp(y),
        _ => a
            .compare(b)
            .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}
