//! # REST HTTP Server
//!
//! Axum router mounting the resource controller under `/api`.
//!
//! Every outcome, including undecodable query strings and oversized bodies, is
//! written as JSON. A `callback=<name>` query parameter wraps the JSON as
//! `<name>(<json>);` with content type `text/javascript`.

use std::sync::{Arc, OnceLock};

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use regex::Regex;
use serde::Serialize;

use crate::identity::IdentityResolver;
use crate::observability::{log_event_with_fields, Event};
use crate::store::RecordStore;

use super::controller::{Reply, ResourceController, ResourceRequest};
use super::errors::{ErrorEnvelope, RestError, RestResult};

/// Default request body limit, 32 MiB
pub const DEFAULT_BODY_LIMIT: usize = 32 << 20;

const CALLBACK_PARAM: &str = "callback";
const JAVASCRIPT_CONTENT_TYPE: &str = "text/javascript";

static CALLBACK_RE: OnceLock<Regex> = OnceLock::new();

fn callback_re() -> &'static Regex {
    CALLBACK_RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][\w$.]*$").expect("callback grammar"))
}

/// REST server state
pub struct RestServer<S: RecordStore> {
    controller: ResourceController<S>,
    identity: Arc<dyn IdentityResolver>,
    http_error_status: bool,
    body_limit: usize,
}

impl<S: RecordStore + 'static> RestServer<S> {
    pub fn new(store: Arc<S>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            controller: ResourceController::new(store),
            identity,
            http_error_status: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Send errors with their HTTP status instead of 200
    pub fn with_http_error_status(mut self, enabled: bool) -> Self {
        self.http_error_status = enabled;
        self
    }

    /// Largest accepted request body in bytes
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        let body_limit = self.body_limit;
        let state = Arc::new(self);

        Router::new()
            .route("/health", get(health_handler))
            .route("/api/*rest", any(resource_handler::<S>))
            // `/api`, `/api/` and anything outside `/api` fail path parsing
            .fallback(resource_handler::<S>)
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(state)
    }
}

/// Shared state type
type ServerState<S> = Arc<RestServer<S>>;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response))
}

/// Every request other than `/health`, whatever the method
async fn resource_handler<S: RecordStore + 'static>(
    State(server): State<ServerState<S>>,
    method: Method,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let (callback, result) = match query {
        Err(e) => (None, Err(RestError::InvalidQuery(e.body_text()))),
        Ok(Query(query)) => match callback_param(&query) {
            Err(e) => (None, Err(e)),
            Ok(callback) => {
                let result = read_body(body).and_then(|body| {
                    let request = ResourceRequest {
                        method: method.clone(),
                        path: uri.path().to_string(),
                        query,
                        content_type: headers
                            .get(header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(|s| s.to_string()),
                        body: body.to_vec(),
                        identity: server.identity.current(&headers),
                    };
                    server.controller.handle(&request)
                });
                (callback, result)
            }
        },
    };

    match result {
        Ok(reply) => {
            log_event_with_fields(
                Event::RequestComplete,
                &[("method", method.as_str()), ("path", uri.path()), ("status", "200")],
            );
            render::<Reply>(StatusCode::OK, &reply, callback.as_deref())
        }
        Err(e) => {
            log_event_with_fields(
                Event::RequestFailed,
                &[
                    ("method", method.as_str()),
                    ("path", uri.path()),
                    ("error_type", e.error_type()),
                    ("message", &e.to_string()),
                ],
            );
            match callback {
                None => e.into_response_with(server.http_error_status),
                Some(callback) => {
                    let status = if server.http_error_status {
                        e.status_code()
                    } else {
                        StatusCode::OK
                    };
                    render(status, &ErrorEnvelope::from(&e), Some(&callback))
                }
            }
        }
    }
}

fn read_body(body: Result<Bytes, BytesRejection>) -> RestResult<Bytes> {
    body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RestError::BodyTooLarge(e.body_text())
        } else {
            RestError::InvalidBody(e.body_text())
        }
    })
}

/// The `callback` parameter, if present and a valid identifier
fn callback_param(query: &[(String, String)]) -> RestResult<Option<String>> {
    match query.iter().find(|(k, _)| k == CALLBACK_PARAM) {
        None => Ok(None),
        Some((_, name)) if callback_re().is_match(name) => Ok(Some(name.clone())),
        Some((_, name)) => Err(RestError::InvalidQuery(format!(
            "callback must be an identifier, found '{}'",
            name
        ))),
    }
}

/// JSON, or `callback(<json>);` as JavaScript
fn render<T: Serialize>(status: StatusCode, body: &T, callback: Option<&str>) -> Response {
    let Some(callback) = callback else {
        return (status, Json(body)).into_response();
    };

    match serde_json::to_string(body) {
        Ok(json) => (
            status,
            [(header::CONTENT_TYPE, JAVASCRIPT_CONTENT_TYPE)],
            format!("{}({});", callback, json),
        )
            .into_response(),
        Err(e) => RestError::InvalidBody(e.to_string()).into_response(),
    }
}
