//! restkind - a schema-less REST front end over a property-based document store
//!
//! Requests against `/api/<kind>[/<id>]` are mapped onto create/read/update/delete
//! operations of arbitrary nested JSON documents. Documents are flattened into
//! multi-valued properties before they reach the store and rebuilt on the way out.

pub mod cli;
pub mod config;
pub mod document;
pub mod http_server;
pub mod identity;
pub mod observability;
pub mod query;
pub mod rest;
pub mod store;
