//! # Resource Paths
//!
//! `/api/<kind>` and `/api/<kind>/<id>`; anything else is a path-format error.

use super::errors::{RestError, RestResult};

/// Parsed `/api/<kind>[/<id>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    /// Lower-cased collection name
    pub kind: String,

    /// Record id segment, `None` when absent or empty
    pub id: Option<String>,
}

impl ResourcePath {
    pub fn parse(path: &str) -> RestResult<Self> {
        let segments: Vec<&str> = path.split('/').collect();

        let id = match segments.len() {
            3 => None,
            4 => Some(segments[3]).filter(|s| !s.is_empty()),
            _ => return Err(unparsable(path)),
        };

        let kind = segments[2];
        if kind.is_empty() || !segments[0].is_empty() || segments[1] != "api" {
            return Err(unparsable(path));
        }

        Ok(Self {
            kind: kind.to_lowercase(),
            id: id.map(|s| s.to_string()),
        })
    }
}

fn unparsable(path: &str) -> RestError {
    RestError::PathFormat(format!("Unparsable url: {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection() {
        let path = ResourcePath::parse("/api/Widgets").unwrap();
        assert_eq!(path.kind, "widgets");
        assert_eq!(path.id, None);
    }

    #[test]
    fn test_parse_trailing_slash() {
        let path = ResourcePath::parse("/api/widgets/").unwrap();
        assert_eq!(path.kind, "widgets");
        assert_eq!(path.id, None);
    }

    #[test]
    fn test_parse_record() {
        let path = ResourcePath::parse("/api/widgets/42").unwrap();
        assert_eq!(path.kind, "widgets");
        assert_eq!(path.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for bad in ["/api", "/api/", "/api/a/b/c", "/api/a/b/", "api/a/b/c", "/v1/a/b"] {
            assert!(
                matches!(ResourcePath::parse(bad), Err(RestError::PathFormat(_))),
                "{}",
                bad
            );
        }
    }
}
