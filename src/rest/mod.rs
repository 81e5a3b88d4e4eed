//! # REST Front End
//!
//! Maps `/api/<kind>[/<id>]` requests onto the record store. Documents are
//! schema-less JSON objects; the only field the server manages is `owners`,
//! which gates every mutation.
//!
//! # Endpoints
//!
//! - `GET    /api/<kind>?filter=..&order=..` - list
//! - `GET    /api/<kind>/<id>` - fetch
//! - `POST|PUT|PATCH /api/<kind>[/<id>]` - create or overwrite
//! - `DELETE /api/<kind>/<id>` - delete
//!
//! `/api/users/me` is the caller's own user record.

pub mod controller;
pub mod errors;
pub mod path;
pub mod server;

pub use controller::{Reply, ResourceController, ResourceRequest};
pub use errors::{ErrorEnvelope, RestError, RestResult};
pub use path::ResourcePath;
pub use server::RestServer;
