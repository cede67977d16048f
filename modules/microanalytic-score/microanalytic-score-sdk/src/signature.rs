//! Typed call signatures derived from step metadata.

use std::fmt;

use serde_json::Value;

use crate::error::MasError;
use crate::models::{Parameter, Step, StepOutput, StepResult};

const ARRAY_SUFFIX: &str = "array";

/// Scalar kind of a step parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Decimal,
    Integer,
    BigInt,
    String,
    Binary,
}

impl ParamType {
    /// Server type tag.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    /// Parse a server type tag, case-insensitively.
    ///
    /// The second element is `true` for the `...Array` form.
    #[must_use]
    pub fn parse_tag(tag: &str) -> Option<(Self, bool)> {
        let lower = tag.trim().to_ascii_lowercase();
        let (base, is_array) = match lower.strip_suffix(ARRAY_SUFFIX) {
            Some(base) if !base.is_empty() => (base, true),
            _ => (lower.as_str(), false),
        };
        let kind = match base {
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "bigint" => Self::BigInt,
            "string" => Self::String,
            "binary" => Self::Binary,
            _ => return None,
        };
        Some((kind, is_array))
    }

    fn accepts_scalar(self, value: &Value) -> bool {
        match self {
            Self::Decimal => value.is_number(),
            Self::Integer => value
                .as_i64()
                .is_some_and(|n| i32::try_from(n).is_ok()),
            Self::BigInt => value.is_i64() || value.is_u64(),
            // binary travels base64-encoded
            Self::String | Self::Binary => value.is_string(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Validated form of a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    /// Array dimensions; 0 for scalars
    pub dim: u32,
    pub size: u32,
}

impl ParamSpec {
    /// # Errors
    /// [`MasError::InvalidStepMetadata`] for an empty name or an unknown
    /// type tag.
    pub fn from_parameter(param: &Parameter, step: &str) -> Result<Self, MasError> {
        if param.name.trim().is_empty() {
            return Err(MasError::invalid_step(step, "parameter with an empty name"));
        }
        let Some((kind, tagged_array)) = ParamType::parse_tag(&param.type_tag) else {
            return Err(MasError::invalid_step(
                step,
                format!(
                    "parameter '{}' has unsupported type '{}'",
                    param.name, param.type_tag
                ),
            ));
        };
        // an `...Array` tag without a dimension still takes one
        let dim = if tagged_array { param.dim.max(1) } else { param.dim };

        Ok(Self {
            name: param.name.clone(),
            kind,
            dim,
            size: param.size,
        })
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.dim > 0
    }

    /// Check a candidate argument value. `null` is always accepted.
    ///
    /// # Errors
    /// A human readable reason on mismatch.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() || self.accepts(value, self.dim) {
            Ok(())
        } else {
            Err(format!("expected {}, got {}", self.type_label(), describe(value)))
        }
    }

    fn accepts(&self, value: &Value, depth: u32) -> bool {
        if depth == 0 {
            return self.kind.accepts_scalar(value);
        }
        value.as_array().is_some_and(|items| {
            items
                .iter()
                .all(|item| item.is_null() || self.accepts(item, depth - 1))
        })
    }

    fn type_label(&self) -> String {
        let size = if self.size > 0 && !self.is_array() {
            format!("({})", self.size)
        } else {
            String::new()
        };
        let dims = usize::try_from(self.dim).unwrap_or_default();
        format!("{}{size}{}", self.kind.tag(), "[]".repeat(dims))
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_label())
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "decimal",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Call signature of one step.
///
/// Renders as help text:
///
/// ```text
/// score(age: decimal, rm: decimal) -> (p_price: decimal, _warn_: string(4))
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSignature {
    pub id: String,
    pub description: Option<String>,
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<ParamSpec>,
}

impl StepSignature {
    /// # Errors
    /// [`MasError::InvalidStepMetadata`] if the step id is empty or a
    /// parameter is invalid. Input names are taken as declared, repeats
    /// included.
    pub fn from_step(step: &Step) -> Result<Self, MasError> {
        if step.id.trim().is_empty() {
            return Err(MasError::invalid_step("<unnamed>", "step has an empty id"));
        }

        let inputs = step
            .inputs
            .iter()
            .map(|p| ParamSpec::from_parameter(p, &step.id))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = step
            .outputs
            .iter()
            .map(|p| ParamSpec::from_parameter(p, &step.id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: step.id.clone(),
            description: step.description.clone(),
            inputs,
            outputs,
        })
    }

    /// Index of the input named `name`. An exact match wins, otherwise the
    /// first input matching ignoring case.
    #[must_use]
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name).or_else(|| {
            self.inputs
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(name))
        })
    }

    /// Shape a raw result by the declared outputs.
    ///
    /// Declared outputs missing from the result are `null`.
    #[must_use]
    pub fn shape(&self, result: &StepResult) -> StepOutput {
        let mut values: Vec<Value> = self
            .outputs
            .iter()
            .map(|o| result.get(&o.name).cloned().unwrap_or(Value::Null))
            .collect();
        match values.len() {
            0 => StepOutput::Unit,
            1 => StepOutput::Single(values.remove(0)),
            _ => StepOutput::Tuple(values),
        }
    }
}

impl fmt::Display for StepSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.id)?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{input}")?;
        }
        f.write_str(") -> ")?;
        match self.outputs.as_slice() {
            [] => f.write_str("()"),
            [single] => write!(f, "{single}"),
            many => {
                f.write_str("(")?;
                for (i, output) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{output}")?;
                }
                f.write_str(")")
            }
        }
    }
}
