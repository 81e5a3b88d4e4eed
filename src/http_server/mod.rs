//! # HTTP Server Module
//!
//! Binds the REST router to a socket with CORS applied.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/*` - Resource API

pub mod server;

pub use server::HttpServer;
