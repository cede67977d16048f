//! Domain models for modules, steps and step invocations.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use mas_restobj::RestObj;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MasError;

/// Scope applied to new modules unless the caller overrides it
pub const DEFAULT_SCOPE: &str = "public";

/// Language of the program text a module is compiled from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    #[default]
    Python,
    Ds2,
}

impl SourceLanguage {
    /// Media type sent as the module `type`.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Python => "text/x-python",
            Self::Ds2 => "text/vnd.sas.source.ds2",
        }
    }
}

impl FromStr for SourceLanguage {
    type Err = MasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "ds2" => Ok(Self::Ds2),
            other => Err(MasError::invalid_argument(
                "language",
                format!("unrecognized source code language `{other}`"),
            )),
        }
    }
}

/// Request to compile and publish a new module.
///
/// ```ignore
/// let request = CreateModuleRequest::new(source)
///     .with_name("scoring")
///     .with_description("Boston housing model");
/// let created = client.create_module(&request).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateModuleRequest {
    /// Program text; required
    pub source: Option<String>,
    /// Sent as the module `id`
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: SourceLanguage,
    /// Explicit media type; overrides the language default
    pub source_type: Option<String>,
    /// Defaults to [`DEFAULT_SCOPE`]
    pub scope: Option<String>,
    /// Additional payload fields, applied last
    pub extra: Map<String, Value>,
}

impl CreateModuleRequest {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.source_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validate the request and build the creation payload.
    ///
    /// # Errors
    /// [`MasError::InvalidArgument`] if `source` is absent or blank.
    pub fn to_payload(&self) -> Result<Value, MasError> {
        let source = match self.source.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                return Err(MasError::invalid_argument(
                    "source",
                    "the `source` parameter is required",
                ));
            }
        };

        let mut payload = Map::new();
        if let Some(name) = &self.name {
            payload.insert("id".to_owned(), Value::from(name.as_str()));
        }
        let media_type = self
            .source_type
            .as_deref()
            .unwrap_or_else(|| self.language.media_type());
        payload.insert("type".to_owned(), Value::from(media_type));
        if let Some(description) = &self.description {
            payload.insert("description".to_owned(), Value::from(description.as_str()));
        }
        payload.insert("source".to_owned(), Value::from(source));
        payload.insert(
            "scope".to_owned(),
            Value::from(self.scope.as_deref().unwrap_or(DEFAULT_SCOPE)),
        );
        for (key, value) in &self.extra {
            payload.insert(key.clone(), value.clone());
        }

        Ok(Value::Object(payload))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleFields {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    step_ids: Option<Vec<String>>,
}

/// A deployed scoring module.
///
/// Typed view over the module resource; every other field the server sent
/// stays reachable through [`Module::raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scope: Option<String>,
    pub language: Option<String>,
    /// Step identifiers in server order
    pub step_ids: Vec<String>,
    raw: RestObj,
}

impl Module {
    /// # Errors
    /// [`MasError::UnexpectedResponse`] if the object has no string `id` or
    /// its fields have the wrong types.
    pub fn from_rest(obj: RestObj) -> Result<Self, MasError> {
        let fields: ModuleFields = obj
            .to_model()
            .map_err(|e| MasError::unexpected(format!("module {obj}"), e.to_string()))?;

        Ok(Self {
            id: fields.id,
            name: fields.name,
            description: fields.description,
            scope: fields.scope,
            language: fields.language,
            step_ids: fields.step_ids.unwrap_or_default(),
            raw: obj,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &RestObj {
        &self.raw
    }

    /// Name if the server reported one, else the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Declared input or output of a step, as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Array dimensions; 0 for scalars
    #[serde(default)]
    pub dim: u32,
    /// String capacity or array bound; 0 when unused
    #[serde(default)]
    pub size: u32,
}

#[derive(Deserialize)]
struct StepFields {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    inputs: Option<Vec<Parameter>>,
    #[serde(default)]
    outputs: Option<Vec<Parameter>>,
}

/// One callable step of a module.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,
    pub description: Option<String>,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    raw: RestObj,
}

impl Step {
    /// # Errors
    /// [`MasError::InvalidStepMetadata`] if the id is missing or the
    /// parameter lists are malformed.
    pub fn from_rest(obj: RestObj) -> Result<Self, MasError> {
        let fields: StepFields = obj
            .to_model()
            .map_err(|e| MasError::invalid_step(obj.to_string(), e.to_string()))?;

        Ok(Self {
            id: fields.id,
            description: fields.description,
            inputs: fields.inputs.unwrap_or_default(),
            outputs: fields.outputs.unwrap_or_default(),
            raw: obj,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &RestObj {
        &self.raw
    }
}

/// Module argument accepted by client operations: an identifier or name, or
/// a module that has already been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleRef {
    Id(String),
    Resolved(Box<Module>),
}

impl ModuleRef {
    /// Identifier used in paths and messages.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Resolved(module) => &module.id,
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl From<&str> for ModuleRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for ModuleRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<Module> for ModuleRef {
    fn from(module: Module) -> Self {
        Self::Resolved(Box::new(module))
    }
}

impl From<&Module> for ModuleRef {
    fn from(module: &Module) -> Self {
        Self::Resolved(Box::new(module.clone()))
    }
}

/// One named input value on the execution wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInput {
    pub name: String,
    pub value: Value,
}

impl StepInput {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Raw outputs of one step execution, by name, in response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StepResult(IndexMap<String, Value>);

impl StepResult {
    /// Parse the `outputs` array of an execution response.
    ///
    /// String values are trimmed of the padding fixed-width character
    /// outputs carry. A missing `outputs` array yields an empty result.
    ///
    /// # Errors
    /// [`MasError::UnexpectedResponse`] if `outputs` is not an array of
    /// objects with a string `name`.
    pub fn from_response(response: &RestObj) -> Result<Self, MasError> {
        let Some(outputs) = response.get("outputs") else {
            return Ok(Self::default());
        };
        let Some(outputs) = outputs.as_array() else {
            return Err(MasError::unexpected(
                "step execution",
                "`outputs` is not an array",
            ));
        };

        let mut values = IndexMap::with_capacity(outputs.len());
        for output in outputs {
            let Some(name) = output.get("name").and_then(Value::as_str) else {
                return Err(MasError::unexpected(
                    "step execution",
                    format!("output without a name: {output}"),
                ));
            };
            let value = match output.get("value") {
                Some(Value::String(s)) => Value::from(s.trim()),
                Some(v) => v.clone(),
                None => Value::Null,
            };
            values.insert(name.to_owned(), value);
        }
        Ok(Self(values))
    }

    /// Output value by name; exact match first, then case-insensitive.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
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
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for StepResult {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of a bound step call, shaped by the step's declared outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    /// The step declares no outputs
    Unit,
    /// Exactly one declared output
    Single(Value),
    /// Several declared outputs, in declaration order
    Tuple(Vec<Value>),
}

impl StepOutput {
    /// Output values in declaration order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Unit => Vec::new(),
            Self::Single(v) => vec![v],
            Self::Tuple(values) => values,
        }
    }
}
