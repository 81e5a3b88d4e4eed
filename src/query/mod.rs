//! # List Queries
//!
//! Filter predicates and sort keys parsed from the query string of a list request.

pub mod errors;
pub mod filter;
pub mod parser;

pub use errors::{QueryError, QueryResult};
pub use filter::{FilterExpr, FilterOperator, OrderBy};
pub use parser::{parse_filter, parse_order, QueryParams};
