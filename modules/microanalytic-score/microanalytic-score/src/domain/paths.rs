//! Resource paths under the service root.

use serde::Serialize;

/// Whether `value` is shaped like a module identifier: lowercase ASCII
/// letters, digits and `_` only. Such values are tried as an id first;
/// anything else can only be a name.
#[must_use]
pub fn is_module_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Filter expression matching a module name exactly.
#[must_use]
pub fn name_filter(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("eq(name, \"{escaped}\")")
}

#[derive(Serialize)]
struct PageQuery<'a> {
    start: u64,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePaths {
    root: String,
}

impl ServicePaths {
    #[must_use]
    pub fn new(root: &str) -> Self {
        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        };
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn modules(&self) -> String {
        format!("{}/modules", self.root)
    }

    #[must_use]
    pub fn module(&self, module_id: &str) -> String {
        format!("{}/modules/{module_id}", self.root)
    }

    #[must_use]
    pub fn step(&self, module_id: &str, step_id: &str) -> String {
        format!("{}/modules/{module_id}/steps/{step_id}", self.root)
    }

    /// One page of the collection at `collection`.
    ///
    /// # Errors
    /// If the query cannot be encoded.
    pub fn page(
        collection: &str,
        start: u64,
        limit: u32,
        filter: Option<&str>,
    ) -> Result<String, serde_urlencoded::ser::Error> {
        let query = serde_urlencoded::to_string(PageQuery {
            start,
            limit,
            filter,
        })?;
        Ok(format!("{collection}?{query}"))
    }
}
