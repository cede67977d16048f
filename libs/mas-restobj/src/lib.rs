#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Remote object representation for Micro Analytic Score responses
//!
//! Every resource the service returns (modules, steps, step results, paged
//! collections) is decoded into a [`RestObj`]: a read-only view over the JSON
//! mapping that keeps every field the server sent, including ones this client
//! does not model.
//!
//! Lookups never fail for unknown keys; they return `None`.
//!
//! ```ignore
//! let module = RestObj::from_value(json!({"id": "scoring", "stepIds": ["score"]}))?;
//! assert_eq!(module.get_str("id"), Some("scoring"));
//! assert!(module.get("missing").is_none());
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while building or converting a [`RestObj`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RestObjError {
    /// The decoded response was valid JSON but not an object
    #[error("expected a JSON object, got {kind}")]
    NotAnObject {
        /// JSON kind that was received (`array`, `string`, ...)
        kind: &'static str,
    },

    /// Conversion into a typed model failed
    #[error("failed to convert remote object: {0}")]
    Convert(#[from] serde_json::Error),
}

/// Immutable view over a JSON object returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestObj(Map<String, Value>);

impl RestObj {
    /// Create an empty object (used for empty 2xx bodies).
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an already-decoded JSON value.
    ///
    /// # Errors
    /// Returns [`RestObjError::NotAnObject`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, RestObjError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RestObjError::NotAnObject {
                kind: json_kind(&other),
            }),
        }
    }

    /// Decode a response body.
    ///
    /// # Errors
    /// Returns an error if the bytes are not JSON or not a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RestObjError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Raw value stored under `key`, or `None` if the server did not send it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Nested object under `key`, copied into its own [`RestObj`].
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<RestObj> {
        self.get(key)
            .and_then(Value::as_object)
            .map(|map| RestObj(map.clone()))
    }

    /// Field names in server order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Hypermedia links advertised by the resource.
    ///
    /// Entries that are not objects or lack `rel`/`href` are skipped.
    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        self.get_array("links")
            .map(|links| {
                links
                    .iter()
                    .filter_map(|l| serde_json::from_value::<Link>(l.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First link with the given relation name.
    #[must_use]
    pub fn link(&self, rel: &str) -> Option<Link> {
        self.links().into_iter().find(|l| l.rel == rel)
    }

    /// Deserialize the whole object into a typed model.
    ///
    /// # Errors
    /// Returns [`RestObjError::Convert`] if the fields do not match `T`.
    pub fn to_model<T: DeserializeOwned>(&self) -> Result<T, RestObjError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }
}

impl TryFrom<Value> for RestObj {
    type Error = RestObjError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for RestObj {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RestObj> for Value {
    fn from(obj: RestObj) -> Self {
        obj.into_value()
    }
}

impl fmt::Display for RestObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_str("name").or_else(|| self.get_str("id")) {
            Some(label) => f.write_str(label),
            None => write!(f, "{}", Value::Object(self.0.clone())),
        }
    }
}

/// Hypermedia link attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn module() -> RestObj {
        RestObj::from_value(json!({
            "id": "unittestmodule",
            "name": "unittestmodule",
            "stepIds": ["step1", "step2"],
            "revision": 3,
            "properties": {"owner": "sasdemo"},
            "links": [
                {"rel": "self", "href": "/microanalyticScore/modules/unittestmodule", "method": "GET"},
                {"rel": "delete", "href": "/microanalyticScore/modules/unittestmodule", "method": "DELETE"},
                {"rel": "broken"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_key_is_absent() {
        let obj = module();
        assert!(obj.get("doesNotExist").is_none());
        assert!(obj.get_str("doesNotExist").is_none());
        assert!(!obj.contains_key("doesNotExist"));
    }

    #[test]
    fn test_typed_accessors() {
        let obj = module();
        assert_eq!(obj.get_str("id"), Some("unittestmodule"));
        assert_eq!(obj.get_i64("revision"), Some(3));
        assert_eq!(obj.get_array("stepIds").map(Vec::len), Some(2));
        assert_eq!(
            obj.get_object("properties").unwrap().get_str("owner"),
            Some("sasdemo")
        );
        // wrong type is absent, not an error
        assert!(obj.get_i64("id").is_none());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = RestObj::from_value(json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, RestObjError::NotAnObject { kind: "array" }));
    }

    #[test]
    fn test_from_slice() {
        let obj = RestObj::from_slice(br#"{"id": "x"}"#).unwrap();
        assert_eq!(obj.get_str("id"), Some("x"));
        assert!(RestObj::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_links_skip_malformed_entries() {
        let obj = module();
        assert_eq!(obj.links().len(), 2);

        let delete = obj.link("delete").unwrap();
        assert_eq!(delete.href, "/microanalyticScore/modules/unittestmodule");
        assert_eq!(delete.method.as_deref(), Some("DELETE"));
        assert!(obj.link("up").is_none());
    }

    #[test]
    fn test_display_prefers_name_then_id() {
        assert_eq!(module().to_string(), "unittestmodule");

        let only_id = RestObj::from_value(json!({"id": "score"})).unwrap();
        assert_eq!(only_id.to_string(), "score");

        let anonymous = RestObj::from_value(json!({"count": 0})).unwrap();
        assert_eq!(anonymous.to_string(), r#"{"count":0}"#);
    }

    #[test]
    fn test_to_model() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Partial {
            id: String,
            step_ids: Vec<String>,
        }

        let partial: Partial = module().to_model().unwrap();
        assert_eq!(partial.id, "unittestmodule");
        assert_eq!(partial.step_ids, vec!["step1", "step2"]);
    }

    #[test]
    fn test_serde_is_transparent() {
        let obj = RestObj::from_value(json!({"id": "a"})).unwrap();
        assert_eq!(serde_json::to_value(&obj).unwrap(), json!({"id": "a"}));
    }
}
