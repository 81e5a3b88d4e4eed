//! # Documents
//!
//! Schema-less nested documents and their flat property representation.

pub mod codec;
pub mod property;
pub mod value;

pub use codec::{flatten, unflatten, Flatten};
pub use property::{Property, Scalar, MAX_INDEXED_LEN};
pub use value::{Document, Value};
