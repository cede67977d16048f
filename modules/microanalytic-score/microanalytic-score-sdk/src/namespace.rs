//! Bound steps and the per-module step namespace.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::api::StepInvoker;
use crate::error::MasError;
use crate::models::{Module, StepInput, StepOutput, StepResult};
use crate::signature::StepSignature;

/// Arguments for a bound step call: positional values first, then named
/// values matched to inputs ignoring case.
///
/// ```ignore
/// let args = StepArgs::new().arg(0.00632).arg(18.0).named("age", 65.2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepArgs {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl StepArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StepArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            positional: Vec::new(),
            named: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One step bound to its module and signature.
///
/// Calling it validates the arguments locally, then executes through the
/// shared invoker.
#[derive(Clone)]
pub struct BoundStep {
    module_id: String,
    signature: StepSignature,
    invoker: Arc<dyn StepInvoker>,
}

impl fmt::Debug for BoundStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundStep")
            .field("module_id", &self.module_id)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl BoundStep {
    pub fn new(
        module_id: impl Into<String>,
        signature: StepSignature,
        invoker: Arc<dyn StepInvoker>,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            signature,
            invoker,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.signature.id
    }

    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    #[must_use]
    pub fn signature(&self) -> &StepSignature {
        &self.signature
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.signature.inputs.len()
    }

    /// Bind arguments to the declared inputs, in declaration order.
    ///
    /// # Errors
    /// [`MasError::InvalidArgument`] for too many positional values, an
    /// unknown or repeated name, a missing input, or a value of the wrong
    /// type.
    pub fn bind(&self, args: StepArgs) -> Result<Vec<StepInput>, MasError> {
        let inputs = &self.signature.inputs;
        if args.positional.len() > inputs.len() {
            return Err(MasError::invalid_argument(
                self.id(),
                format!(
                    "takes {} arguments but {} positional were given",
                    inputs.len(),
                    args.positional.len()
                ),
            ));
        }

        let mut slots: Vec<Option<Value>> = vec![None; inputs.len()];
        for (slot, value) in slots.iter_mut().zip(args.positional) {
            *slot = Some(value);
        }
        for (name, value) in args.named {
            let Some(index) = self.signature.input_index(&name) else {
                return Err(MasError::invalid_argument(
                    name,
                    format!("step '{}' has no such input", self.id()),
                ));
            };
            if slots[index].is_some() {
                return Err(MasError::invalid_argument(
                    name,
                    "got multiple values for the same input",
                ));
            }
            slots[index] = Some(value);
        }

        let missing: Vec<&str> = inputs
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(spec, _)| spec.name.as_str())
            .collect();
        if let Some(first) = missing.first() {
            return Err(MasError::invalid_argument(
                *first,
                format!("missing required inputs: {}", missing.join(", ")),
            ));
        }

        inputs
            .iter()
            .zip(slots)
            .map(|(spec, slot)| {
                let value = slot.unwrap_or(Value::Null);
                spec.check(&value)
                    .map_err(|reason| MasError::invalid_argument(&spec.name, reason))?;
                Ok(StepInput {
                    name: spec.name.clone(),
                    value,
                })
            })
            .collect()
    }

    /// Bind and execute, returning the raw outputs.
    ///
    /// # Errors
    /// Binding errors before any request, otherwise the invoker's error.
    pub async fn call_raw(&self, args: StepArgs) -> Result<StepResult, MasError> {
        let inputs = self.bind(args)?;
        self.invoker
            .invoke(&self.module_id, self.id(), inputs)
            .await
    }

    /// Bind and execute, shaping outputs by the declared output list.
    ///
    /// # Errors
    /// See [`BoundStep::call_raw`].
    pub async fn call(&self, args: StepArgs) -> Result<StepOutput, MasError> {
        let result = self.call_raw(args).await?;
        Ok(self.signature.shape(&result))
    }
}

impl fmt::Display for BoundStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature)?;
        if let Some(description) = &self.signature.description {
            write!(f, "\n    {description}")?;
        }
        Ok(())
    }
}

/// The bound steps of one module, keyed by step id in server order.
#[derive(Debug, Clone)]
pub struct StepNamespace {
    module: Module,
    steps: IndexMap<String, BoundStep>,
}

impl StepNamespace {
    /// # Errors
    /// [`MasError::InvalidStepMetadata`] if two steps share an id.
    pub fn new(
        module: Module,
        steps: impl IntoIterator<Item = BoundStep>,
    ) -> Result<Self, MasError> {
        let mut by_id = IndexMap::new();
        for step in steps {
            let id = step.id().to_owned();
            if by_id.insert(id.clone(), step).is_some() {
                return Err(MasError::invalid_step(
                    id,
                    format!("duplicate step id in module '{}'", module.id),
                ));
            }
        }
        Ok(Self {
            module,
            steps: by_id,
        })
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoundStep> {
        self.steps.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundStep> {
        self.steps.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Call a step by id.
    ///
    /// # Errors
    /// [`MasError::StepNotFound`] for an unknown id, otherwise as
    /// [`BoundStep::call`].
    pub async fn call(&self, id: &str, args: StepArgs) -> Result<StepOutput, MasError> {
        let Some(step) = self.get(id) else {
            return Err(MasError::StepNotFound {
                module: self.module.id.clone(),
                step: id.to_owned(),
            });
        };
        step.call(args).await
    }
}

impl<'a> IntoIterator for &'a StepNamespace {
    type Item = &'a BoundStep;
    type IntoIter = indexmap::map::Values<'a, String, BoundStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.values()
    }
}

impl fmt::Display for StepNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} steps)", self.module.display_name(), self.steps.len())?;
        for step in self.steps.values() {
            write!(f, "\n  {}", step.signature)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::Step;
    use async_trait::async_trait;
    use mas_restobj::RestObj;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingInvoker {
        calls: Mutex<Vec<(String, String, Vec<StepInput>)>>,
        outputs: Vec<(String, Value)>,
    }

    #[async_trait]
    impl StepInvoker for RecordingInvoker {
        async fn invoke(
            &self,
            module_id: &str,
            step_id: &str,
            inputs: Vec<StepInput>,
        ) -> Result<StepResult, MasError> {
            self.calls
                .lock()
                .push((module_id.to_owned(), step_id.to_owned(), inputs));
            Ok(self.outputs.iter().cloned().collect())
        }
    }

    fn signature(value: Value) -> StepSignature {
        let step = Step::from_rest(RestObj::from_value(value).unwrap()).unwrap();
        StepSignature::from_step(&step).unwrap()
    }

    fn module(id: &str) -> Module {
        Module::from_rest(RestObj::from_value(json!({"id": id})).unwrap()).unwrap()
    }

    fn score_signature() -> StepSignature {
        signature(json!({
            "id": "score",
            "inputs": [
                {"name": "CRIM", "type": "decimal"},
                {"name": "ZN", "type": "decimal"},
                {"name": "label", "type": "string", "size": 8}
            ],
            "outputs": [
                {"name": "P_PRICE", "type": "decimal"},
                {"name": "_warn_", "type": "string", "size": 4}
            ]
        }))
    }

    fn bound(invoker: Arc<RecordingInvoker>) -> BoundStep {
        BoundStep::new("scoring", score_signature(), invoker)
    }

    #[test]
    fn test_bind_positional_named_and_mixed_agree() {
        let step = bound(Arc::default());

        let positional = step
            .bind(StepArgs::new().arg(0.1).arg(18.0).arg("a"))
            .unwrap();
        let named = step
            .bind(
                [("label", json!("a")), ("zn", json!(18.0)), ("crim", json!(0.1))]
                    .into_iter()
                    .collect(),
            )
            .unwrap();
        let mixed = step
            .bind(StepArgs::new().arg(0.1).named("Label", "a").named("ZN", 18.0))
            .unwrap();

        assert_eq!(positional, named);
        assert_eq!(positional, mixed);
        let names: Vec<&str> = positional.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["CRIM", "ZN", "label"]);
    }

    #[test]
    fn test_bind_rejects_bad_arguments() {
        let step = bound(Arc::default());

        let too_many = step
            .bind(StepArgs::new().arg(1).arg(2).arg("a").arg(4))
            .unwrap_err();
        assert!(matches!(too_many, MasError::InvalidArgument { ref field, .. } if field == "score"));

        let unknown = step
            .bind(StepArgs::new().arg(1).arg(2).arg("a").named("bogus", 1))
            .unwrap_err();
        assert!(matches!(unknown, MasError::InvalidArgument { ref field, .. } if field == "bogus"));

        let repeated = step
            .bind(StepArgs::new().arg(1).arg(2).arg("a").named("crim", 1))
            .unwrap_err();
        assert!(matches!(repeated, MasError::InvalidArgument { ref field, .. } if field == "crim"));

        let missing = step.bind(StepArgs::new().arg(1)).unwrap_err();
        match missing {
            MasError::InvalidArgument { field, reason } => {
                assert_eq!(field, "ZN");
                assert!(reason.contains("ZN, label"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mistyped = step
            .bind(StepArgs::new().arg("high").arg(2).arg("a"))
            .unwrap_err();
        assert!(matches!(mistyped, MasError::InvalidArgument { ref field, .. } if field == "CRIM"));
    }

    #[test]
    fn test_bind_accepts_null_for_any_type() {
        let step = bound(Arc::default());
        let inputs = step
            .bind(StepArgs::new().arg(Value::Null).arg(1).arg(Value::Null))
            .unwrap();
        assert_eq!(inputs[0].value, Value::Null);
        assert_eq!(inputs[2].value, Value::Null);
    }

    #[tokio::test]
    async fn test_call_shapes_outputs_and_invokes_once() {
        let invoker = Arc::new(RecordingInvoker {
            outputs: vec![
                ("_warn_".to_owned(), json!("")),
                ("P_PRICE".to_owned(), json!(24.0)),
            ],
            ..RecordingInvoker::default()
        });
        let step = bound(invoker.clone());

        let output = step
            .call(StepArgs::new().arg(0.1).arg(18.0).arg("a"))
            .await
            .unwrap();

        assert_eq!(output, StepOutput::Tuple(vec![json!(24.0), json!("")]));
        let calls = invoker.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "scoring");
        assert_eq!(calls[0].1, "score");
    }

    #[tokio::test]
    async fn test_invalid_call_sends_nothing() {
        let invoker = Arc::new(RecordingInvoker::default());
        let step = bound(invoker.clone());

        assert!(step.call(StepArgs::new()).await.is_err());
        assert!(invoker.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_single_and_unit_outputs() {
        let invoker = Arc::new(RecordingInvoker {
            outputs: vec![("y".to_owned(), json!(3))],
            ..RecordingInvoker::default()
        });
        let single = BoundStep::new(
            "m",
            signature(json!({"id": "predict", "outputs": [{"name": "y", "type": "integer"}]})),
            invoker.clone(),
        );
        let unit = BoundStep::new("m", signature(json!({"id": "post"})), invoker);

        assert_eq!(
            single.call(StepArgs::new()).await.unwrap(),
            StepOutput::Single(json!(3))
        );
        assert_eq!(unit.call(StepArgs::new()).await.unwrap(), StepOutput::Unit);
    }

    #[tokio::test]
    async fn test_namespace_lookup_and_order() {
        let invoker: Arc<RecordingInvoker> = Arc::default();
        let steps = ["step2", "step1"].map(|id| {
            BoundStep::new("m", signature(json!({"id": id})), invoker.clone())
        });
        let namespace = StepNamespace::new(module("m"), steps).unwrap();

        assert_eq!(namespace.len(), 2);
        assert_eq!(namespace.ids().collect::<Vec<_>>(), ["step2", "step1"]);
        assert!(namespace.contains("step1"));
        assert_eq!(namespace.get("step1").unwrap().arity(), 0);
        assert!(namespace.get("step3").is_none());

        let err = namespace.call("step3", StepArgs::new()).await.unwrap_err();
        assert!(matches!(err, MasError::StepNotFound { ref step, .. } if step == "step3"));
        assert_eq!(namespace.call("step1", StepArgs::new()).await.unwrap(), StepOutput::Unit);
    }

    #[test]
    fn test_namespace_rejects_duplicate_ids() {
        let invoker: Arc<RecordingInvoker> = Arc::default();
        let steps = ["score", "score"].map(|id| {
            BoundStep::new("m", signature(json!({"id": id})), invoker.clone())
        });
        let err = StepNamespace::new(module("m"), steps).unwrap_err();
        assert!(matches!(err, MasError::InvalidStepMetadata { ref step, .. } if step == "score"));
    }

    #[test]
    fn test_namespace_display_lists_signatures() {
        let namespace =
            StepNamespace::new(module("scoring"), [bound(Arc::default())]).unwrap();
        let text = namespace.to_string();
        assert!(text.starts_with("scoring (1 steps)"));
        assert!(text.contains(
            "score(CRIM: decimal, ZN: decimal, label: string(8)) -> (P_PRICE: decimal, _warn_: string(4))"
        ));
    }
}
