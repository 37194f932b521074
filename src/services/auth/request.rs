use std::collections::HashMap;

use serde_json::Value;

/// Read-only view of the request state the extractor needs.
///
/// Raw bodies and query strings are parsed by the HTTP layer before the
/// strategy runs; implementations only hand out what is already there.
pub trait BearerRequest {
    fn authorization(&self) -> Option<&str>;
    fn body_field(&self, name: &str) -> Option<&str>;
    fn query_field(&self, name: &str) -> Option<&str>;
}

/// How a buffered request body should be decoded into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Form,
    Json,
}

/// Owned `BearerRequest` built by the axum middleware (and by tests).
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    authorization: Option<String>,
    body: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl ParsedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_body_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    pub fn with_query_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Decode a raw `a=1&b=2` query string. Later duplicates win.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        self
    }

    /// Decode a buffered body. Undecodable bodies contribute no fields, and
    /// for JSON only top-level string members are kept.
    pub fn with_body(mut self, format: BodyFormat, bytes: &[u8]) -> Self {
        match format {
            BodyFormat::Form => {
                self.body.extend(
                    url::form_urlencoded::parse(bytes)
                        .map(|(k, v)| (k.into_owned(), v.into_owned())),
                );
            }
            BodyFormat::Json => {
                if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) {
                    self.body.extend(map.into_iter().filter_map(|(k, v)| match v {
                        Value::String(s) => Some((k, s)),
                        _ => None,
                    }));
                }
            }
        }
        self
    }
}

impl BearerRequest for ParsedRequest {
    fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    fn body_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).map(String::as_str)
    }

    fn query_field(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}
