//! # Resource Controller
//!
//! Dispatches `(method, path)` onto the record store:
//!
//! | Method            | no id                  | id                                   |
//! |-------------------|------------------------|--------------------------------------|
//! | GET               | filtered/ordered list  | single record (`users/me` aliasing)  |
//! | POST, PUT, PATCH  | create with a new id   | overwrite, owners only               |
//! | DELETE            | path-format error      | delete, owners only                  |
//!
//! Every write replaces `owners` with the caller's encoded identity.
//!
//! The ownership check and the write that follows are two separate store calls.
//! Two writers racing on the same key can both pass the check; the last write wins.

use std::sync::Arc;

use axum::http::Method;
use serde::{Serialize, Serializer};

use crate::document::{flatten, unflatten, Document, Property, Scalar, Value};
use crate::identity::Identity;
use crate::observability::{log_event_with_fields, Event};
use crate::query::QueryParams;
use crate::store::{RecordId, RecordKey, RecordStore, StoreError};

use super::errors::{RestError, RestResult};
use super::path::ResourcePath;

/// Kind whose record ids are encoded identities
pub const USERS_KIND: &str = "users";

/// Alias for the caller's own `users` record
pub const ME_ALIAS: &str = "me";

/// Field holding the encoded identities allowed to mutate a record
pub const OWNERS_FIELD: &str = "owners";

/// Field carrying the record id in responses and request bodies
pub const ID_FIELD: &str = "Id";

const JSON_CONTENT_TYPE: &str = "application/json";

const DISALLOWED_KEYS: [&str; 2] = ["id", "key"];
const DISALLOWED_PREFIXES: [char; 2] = ['_', '$'];

/// A request as seen by the controller
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub method: Method,
    pub path: String,
    /// Query-string pairs in the order given
    pub query: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub identity: Option<Identity>,
}

impl ResourceRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            content_type: None,
            body: Vec::new(),
            identity: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// A request carrying a JSON body
    pub fn with_json(method: Method, path: impl Into<String>, body: &serde_json::Value) -> Self {
        Self {
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            body: body.to_string().into_bytes(),
            ..Self::new(method, path)
        }
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn identity(mut self, identity: Option<Identity>) -> Self {
        self.identity = identity;
        self
    }
}

/// A successful response body
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Single(Document),
    List(Vec<Document>),
}

impl Reply {
    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Reply::List(docs) => Some(docs),
            Reply::Single(_) => None,
        }
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reply::Single(doc) => doc.serialize(serializer),
            Reply::List(docs) => docs.serialize(serializer),
        }
    }
}

/// The REST dispatch state machine over a record store
pub struct ResourceController<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> ResourceController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Dispatch a request
    pub fn handle(&self, request: &ResourceRequest) -> RestResult<Reply> {
        let path = ResourcePath::parse(&request.path)?;
        let identity = request.identity.as_ref();

        match request.method {
            Method::GET => match path.id.as_deref() {
                None => self.list(&path.kind, &request.query),
                Some(id) => self.get(&path.kind, id, identity),
            },
            Method::POST | Method::PUT | Method::PATCH => {
                let identity = identity.ok_or(RestError::LoginRequired)?;
                let body = parse_body(request.content_type.as_deref(), &request.body)?;
                self.write(&path.kind, path.id.as_deref(), body, identity)
            }
            Method::DELETE => {
                let identity = identity.ok_or(RestError::LoginRequired)?;
                let id = path
                    .id
                    .as_deref()
                    .ok_or_else(|| RestError::PathFormat("Must provide an id.".to_string()))?;
                self.delete(&path.kind, id, identity)
            }
            Method::OPTIONS => Ok(Reply::Single(Document::new())),
            ref other => Err(RestError::MethodNotAllowed(other.to_string())),
        }
    }

    /// Run a list query over `kind`
    pub fn list(&self, kind: &str, query: &[(String, String)]) -> RestResult<Reply> {
        let query = QueryParams::parse(query)?;
        let records = self.store.query(kind, &query)?;

        let docs = records
            .into_iter()
            .map(|(id, properties)| with_id(unflatten(properties), &id))
            .collect();

        Ok(Reply::List(docs))
    }

    /// Fetch a single record
    pub fn get(&self, kind: &str, id: &str, identity: Option<&Identity>) -> RestResult<Reply> {
        let id = resolve_alias(kind, id, identity)?;
        let key = RecordKey::new(kind, RecordId::parse(&id));

        match self.store.get(&key) {
            Ok(properties) => Ok(Reply::Single(with_id(unflatten(properties), &key.id))),
            Err(StoreError::NotFound(key)) => match identity {
                Some(identity) if kind == USERS_KIND && id == identity.encoded() => {
                    Ok(Reply::Single(synthesize_user(identity)))
                }
                _ => Err(RestError::NotFound(key)),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite a record as `identity`
    pub fn write(
        &self,
        kind: &str,
        url_id: Option<&str>,
        mut body: Document,
        identity: &Identity,
    ) -> RestResult<Reply> {
        let url_id = url_id
            .map(|id| resolve_alias(kind, id, Some(identity)))
            .transpose()?;
        let body_id = take_body_id(&mut body)?;

        let id = match (url_id, body_id) {
            (Some(url), Some(body)) if RecordId::parse(&url) != RecordId::parse(&body) => {
                return Err(RestError::IdMismatch { url, body });
            }
            (Some(url), _) => Some(url),
            (None, Some(body)) => Some(body),
            (None, None) if kind == USERS_KIND => Some(identity.encoded().to_string()),
            (None, None) => None,
        };

        strip_disallowed_keys(&mut body);
        body.insert(
            OWNERS_FIELD,
            Value::List(vec![Value::String(identity.encoded().to_string())]),
        );

        let id = match id {
            Some(id) => {
                let key = RecordKey::new(kind, RecordId::parse(&id));
                self.authorize(&key, identity)?;
                Some(key.id)
            }
            None => None,
        };

        let properties: Vec<Property> = flatten(&body).collect();
        let id = self.store.put(kind, id, properties.clone())?;

        Ok(Reply::Single(with_id(unflatten(properties), &id)))
    }

    /// Delete a record as `identity`
    pub fn delete(&self, kind: &str, id: &str, identity: &Identity) -> RestResult<Reply> {
        let id = resolve_alias(kind, id, Some(identity))?;
        let key = RecordKey::new(kind, RecordId::parse(&id));

        self.authorize(&key, identity)?;
        self.store.delete(&key)?;

        Ok(Reply::Single(Document::new()))
    }

    /// Check that `identity` may mutate the record at `key`
    ///
    /// `users` records belong to the identity they are keyed by and may be created
    /// by it. Any other record must exist and list the caller in `owners`.
    fn authorize(&self, key: &RecordKey, identity: &Identity) -> RestResult<()> {
        if key.kind == USERS_KIND {
            return match &key.id {
                RecordId::Name(name) if name == identity.encoded() => Ok(()),
                _ => Err(RestError::NotOwner(key.clone())),
            };
        }

        let properties = self.store.get(key)?;
        let caller = Scalar::String(identity.encoded().to_string());
        let is_owner = properties
            .iter()
            .any(|p| p.path == OWNERS_FIELD && p.value == caller);

        if is_owner {
            Ok(())
        } else {
            Err(RestError::NotOwner(key.clone()))
        }
    }
}

/// Resolve `users/me` to the caller's encoded identity
fn resolve_alias(kind: &str, id: &str, identity: Option<&Identity>) -> RestResult<String> {
    if kind == USERS_KIND && id == ME_ALIAS {
        let identity = identity.ok_or(RestError::LoginRequired)?;
        return Ok(identity.encoded().to_string());
    }
    Ok(id.to_string())
}

fn with_id(mut doc: Document, id: &RecordId) -> Document {
    let value = match id {
        RecordId::Numeric(n) => Value::Int(*n),
        RecordId::Name(s) => Value::String(s.clone()),
    };
    doc.insert(ID_FIELD, value);
    doc
}

/// Minimal `users` record for a caller who never stored one
fn synthesize_user(identity: &Identity) -> Document {
    let mut doc = Document::new();
    doc.insert(ID_FIELD, identity.encoded());
    let email = match identity.email() {
        Some(email) => Value::from(email),
        None => Value::Null,
    };
    doc.insert("email", email);
    doc
}

/// Decode a JSON object body; an empty body is an empty document
fn parse_body(content_type: Option<&str>, body: &[u8]) -> RestResult<Document> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime != JSON_CONTENT_TYPE {
        return Err(RestError::ContentType(mime));
    }

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Document::new());
    }

    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| RestError::InvalidBody(e.to_string()))?;

    Document::from_json(json)
        .ok_or_else(|| RestError::InvalidBody("body must be a JSON object".to_string()))
}

/// Remove and return the body's `Id`
fn take_body_id(body: &mut Document) -> RestResult<Option<String>> {
    match body.remove(ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
        Some(Value::Int(n)) => Ok(Some(n.to_string())),
        Some(Value::Float(f)) if f.fract() == 0.0 => Ok(Some((f as i64).to_string())),
        Some(other) => Err(RestError::InvalidBody(format!(
            "{} must be a string or an integer, found {}",
            ID_FIELD,
            other.kind_name()
        ))),
    }
}

/// Drop keys callers may not set: `id`, `key`, and `_`/`$` prefixed names
fn strip_disallowed_keys(body: &mut Document) {
    body.retain(|key, _| {
        let disallowed = DISALLOWED_KEYS.contains(&key)
            || key.starts_with(DISALLOWED_PREFIXES.as_slice());
        if disallowed {
            log_event_with_fields(Event::DisallowedKey, &[("key", key)]);
        }
        !disallowed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn controller() -> ResourceController<MemoryStore> {
        ResourceController::new(Arc::new(MemoryStore::new()))
    }

    fn caller(id: &str) -> Identity {
        Identity::new(id, Some(format!("{}@example.com", id))).unwrap()
    }

    fn to_json(reply: &Reply) -> serde_json::Value {
        serde_json::to_value(reply).unwrap()
    }

    fn post(
        controller: &ResourceController<MemoryStore>,
        path: &str,
        body: serde_json::Value,
        who: &Identity,
    ) -> RestResult<Reply> {
        let request = ResourceRequest::with_json(Method::POST, path, &body).identity(Some(who.clone()));
        controller.handle(&request)
    }

    #[test]
    fn test_create_injects_owners_and_id() {
        let controller = controller();
        let alice = caller("12345");

        let reply = post(&controller, "/api/widgets", json!({"name": "x"}), &alice).unwrap();
        assert_eq!(
            to_json(&reply),
            json!({"name": "x", "owners": ["dhf"], "Id": 1})
        );
    }

    #[test]
    fn test_client_owners_are_replaced() {
        let controller = controller();
        let alice = caller("12345");

        let reply = post(
            &controller,
            "/api/widgets",
            json!({"name": "x", "owners": ["zzz", "yyy"]}),
            &alice,
        )
        .unwrap();
        assert_eq!(to_json(&reply)["owners"], json!(["dhf"]));
    }

    #[test]
    fn test_write_requires_login() {
        let controller = controller();
        let request = ResourceRequest::with_json(Method::POST, "/api/widgets", &json!({}));
        assert_eq!(controller.handle(&request), Err(RestError::LoginRequired));

        let request = ResourceRequest::delete("/api/widgets/1");
        assert_eq!(controller.handle(&request), Err(RestError::LoginRequired));
    }

    #[test]
    fn test_write_requires_json() {
        let controller = controller();
        let mut request = ResourceRequest::with_json(Method::PUT, "/api/widgets", &json!({}))
            .identity(Some(caller("1")));
        request.content_type = Some("application/x-www-form-urlencoded".to_string());

        assert!(matches!(
            controller.handle(&request),
            Err(RestError::ContentType(_))
        ));
    }

    #[test]
    fn test_json_content_type_with_charset() {
        let controller = controller();
        let mut request = ResourceRequest::with_json(Method::PUT, "/api/widgets", &json!({"a": 1}))
            .identity(Some(caller("1")));
        request.content_type = Some("application/json; charset=utf-8".to_string());

        assert!(controller.handle(&request).is_ok());
    }

    #[test]
    fn test_non_object_body_rejected() {
        let controller = controller();
        let result = post(&controller, "/api/widgets", json!([1, 2]), &caller("1"));
        assert!(matches!(result, Err(RestError::InvalidBody(_))));
    }

    #[test]
    fn test_get_by_id_and_not_found() {
        let controller = controller();
        let alice = caller("12345");
        let created = post(&controller, "/api/widgets", json!({"n": 3}), &alice).unwrap();

        let fetched = controller
            .handle(&ResourceRequest::get("/api/widgets/1"))
            .unwrap();
        assert_eq!(fetched, created);

        let missing = controller.handle(&ResourceRequest::get("/api/widgets/99"));
        assert!(matches!(missing, Err(RestError::NotFound(_))));
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        let controller = controller();
        post(&controller, "/api/Widgets", json!({"n": 1}), &caller("1")).unwrap();

        let reply = controller
            .handle(&ResourceRequest::get("/api/WIDGETS/1"))
            .unwrap();
        assert_eq!(to_json(&reply)["n"], json!(1));
    }

    #[test]
    fn test_overwrite_by_owner() {
        let controller = controller();
        let alice = caller("12345");
        post(&controller, "/api/widgets", json!({"v": 1}), &alice).unwrap();

        let request = ResourceRequest::with_json(Method::PUT, "/api/widgets/1", &json!({"v": 2}))
            .identity(Some(alice));
        let reply = controller.handle(&request).unwrap();
        assert_eq!(to_json(&reply), json!({"v": 2, "owners": ["dhf"], "Id": 1}));
    }

    #[test]
    fn test_overwrite_by_stranger_fails_and_keeps_record() {
        let controller = controller();
        let alice = caller("12345");
        let mallory = caller("999");
        let created = post(&controller, "/api/widgets", json!({"v": 1}), &alice).unwrap();

        let request = ResourceRequest::with_json(Method::PUT, "/api/widgets/1", &json!({"v": 2}))
            .identity(Some(mallory));
        assert!(matches!(
            controller.handle(&request),
            Err(RestError::NotOwner(_))
        ));

        let fetched = controller
            .handle(&ResourceRequest::get("/api/widgets/1"))
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_overwrite_missing_record_is_not_found() {
        let controller = controller();
        let request = ResourceRequest::with_json(Method::PUT, "/api/widgets/7", &json!({}))
            .identity(Some(caller("1")));
        assert!(matches!(
            controller.handle(&request),
            Err(RestError::NotFound(_))
        ));
    }

    #[test]
    fn test_body_id_and_mismatch() {
        let controller = controller();
        let alice = caller("12345");
        post(&controller, "/api/widgets", json!({"v": 1}), &alice).unwrap();

        let reply = post(&controller, "/api/widgets", json!({"Id": 1, "v": 5}), &alice).unwrap();
        assert_eq!(to_json(&reply), json!({"v": 5, "owners": ["dhf"], "Id": 1}));

        let result = post(&controller, "/api/widgets/1", json!({"Id": 2}), &alice);
        assert_eq!(
            result,
            Err(RestError::IdMismatch {
                url: "1".to_string(),
                body: "2".to_string()
            })
        );
    }

    #[test]
    fn test_disallowed_keys_are_stripped() {
        let controller = controller();
        let reply = post(
            &controller,
            "/api/widgets",
            json!({"id": 1, "key": "k", "_private": 1, "$ref": "x", "keep": true}),
            &caller("1"),
        )
        .unwrap();
        assert_eq!(
            to_json(&reply),
            json!({"keep": true, "owners": ["b"], "Id": 1})
        );
    }

    #[test]
    fn test_delete_by_owner_and_stranger() {
        let controller = controller();
        let alice = caller("12345");
        post(&controller, "/api/widgets", json!({"v": 1}), &alice).unwrap();

        let stranger = ResourceRequest::delete("/api/widgets/1").identity(Some(caller("999")));
        assert!(matches!(
            controller.handle(&stranger),
            Err(RestError::NotOwner(_))
        ));

        let owner = ResourceRequest::delete("/api/widgets/1").identity(Some(alice));
        assert_eq!(
            controller.handle(&owner).unwrap(),
            Reply::Single(Document::new())
        );
        assert!(matches!(
            controller.handle(&ResourceRequest::get("/api/widgets/1")),
            Err(RestError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_without_id() {
        let controller = controller();
        let request = ResourceRequest::delete("/api/widgets").identity(Some(caller("1")));
        assert!(matches!(
            controller.handle(&request),
            Err(RestError::PathFormat(_))
        ));
    }

    #[test]
    fn test_anonymous_delete_without_id_needs_login_first() {
        let controller = controller();
        let request = ResourceRequest::delete("/api/widgets");
        assert_eq!(controller.handle(&request), Err(RestError::LoginRequired));
    }

    #[test]
    fn test_list_with_filter_and_order() {
        let controller = controller();
        let alice = caller("1");
        for (name, age) in [("carol", 41), ("alice", 30), ("bob", 25)] {
            post(&controller, "/api/people", json!({"name": name, "age": age}), &alice).unwrap();
        }

        let request = ResourceRequest::get("/api/people")
            .query_param("filter", "age>=30")
            .query_param("order", "-age");
        let reply = controller.handle(&request).unwrap();

        let names: Vec<_> = to_json(&reply)
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("carol"), json!("alice")]);
        assert!(reply.as_list().unwrap().iter().all(|d| d.contains_key(ID_FIELD)));
    }

    #[test]
    fn test_list_rejects_unsupported_queries() {
        let controller = controller();

        let composite = ResourceRequest::get("/api/people").query_param("filter", "OR(a=1,b=2)");
        assert!(matches!(
            controller.handle(&composite),
            Err(RestError::QueryUnsupported(_))
        ));

        let params = ResourceRequest::get("/api/people").query_param("params", "{}");
        assert!(matches!(
            controller.handle(&params),
            Err(RestError::QueryUnsupported(_))
        ));
    }

    #[test]
    fn test_users_me_alias() {
        let controller = controller();
        let alice = caller("12345");

        let put = ResourceRequest::with_json(Method::PUT, "/api/users/me", &json!({"nick": "al"}))
            .identity(Some(alice.clone()));
        controller.handle(&put).unwrap();

        let by_alias = controller
            .handle(&ResourceRequest::get("/api/users/me").identity(Some(alice.clone())))
            .unwrap();
        let by_key = controller
            .handle(&ResourceRequest::get("/api/users/dhf"))
            .unwrap();
        assert_eq!(by_alias, by_key);
        assert_eq!(
            to_json(&by_key),
            json!({"nick": "al", "owners": ["dhf"], "Id": "dhf"})
        );
    }

    #[test]
    fn test_users_me_requires_login() {
        let controller = controller();
        assert_eq!(
            controller.handle(&ResourceRequest::get("/api/users/me")),
            Err(RestError::LoginRequired)
        );
    }

    #[test]
    fn test_users_synthesized_when_missing() {
        let controller = controller();
        let alice = caller("12345");

        let reply = controller
            .handle(&ResourceRequest::get("/api/users/me").identity(Some(alice.clone())))
            .unwrap();
        assert_eq!(
            to_json(&reply),
            json!({"Id": "dhf", "email": "12345@example.com"})
        );

        // Someone else's missing user record is a plain not-found
        let other = controller.handle(&ResourceRequest::get("/api/users/zzz").identity(Some(alice)));
        assert!(matches!(other, Err(RestError::NotFound(_))));
    }

    #[test]
    fn test_users_records_belong_to_their_identity() {
        let controller = controller();
        let request = ResourceRequest::with_json(Method::PUT, "/api/users/dhf", &json!({}))
            .identity(Some(caller("999")));
        assert!(matches!(
            controller.handle(&request),
            Err(RestError::NotOwner(_))
        ));
    }

    #[test]
    fn test_unknown_method() {
        let controller = controller();
        let request = ResourceRequest::new(Method::TRACE, "/api/widgets");
        assert!(matches!(
            controller.handle(&request),
            Err(RestError::MethodNotAllowed(_))
        ));
    }
}
