//! Binding of module steps into typed callables.

use std::sync::Arc;

use async_trait::async_trait;
use mas_http::RestTransport;
use microanalytic_score_sdk::{
    BoundStep, MasError, ModuleRef, StepInput, StepInvoker, StepNamespace, StepResult,
    StepSignature,
};
use serde_json::json;
use tracing::{debug, instrument};

use super::paths::ServicePaths;
use super::service::MicroAnalyticScore;

/// Executes steps over the transport; shared by every step bound from one
/// client.
pub struct RemoteStepInvoker {
    transport: Arc<dyn RestTransport>,
    paths: ServicePaths,
}

impl RemoteStepInvoker {
    #[must_use]
    pub fn new(transport: Arc<dyn RestTransport>, paths: ServicePaths) -> Self {
        Self { transport, paths }
    }
}

#[async_trait]
impl StepInvoker for RemoteStepInvoker {
    #[instrument(skip_all, fields(module = %module_id, step = %step_id, inputs = inputs.len()))]
    async fn invoke(
        &self,
        module_id: &str,
        step_id: &str,
        inputs: Vec<StepInput>,
    ) -> Result<StepResult, MasError> {
        let path = self.paths.step(module_id, step_id);
        let body = json!({ "inputs": inputs });
        let response = self
            .transport
            .post(&path, &body)
            .await
            .map_err(|e| MasError::transport(format!("POST {path}"), e))?;
        let result = StepResult::from_response(&response)?;
        debug!(outputs = result.len(), "step executed");
        Ok(result)
    }
}

impl MicroAnalyticScore {
    /// Fetch every step of the module once and bind it.
    ///
    /// Steps are keyed by the id each fetched step reports, in the order of
    /// the module's `stepIds`.
    pub(crate) async fn bind_steps(&self, module: &ModuleRef) -> Result<StepNamespace, MasError> {
        let module = self.require_module(module).await?;

        let mut bound = Vec::with_capacity(module.step_ids.len());
        for step_id in &module.step_ids {
            let step = self.fetch_step(&module.id, step_id).await?;
            let signature = StepSignature::from_step(&step)?;
            debug!(step = %signature, "step bound");
            bound.push(BoundStep::new(
                module.id.as_str(),
                signature,
                self.invoker.clone(),
            ));
        }

        StepNamespace::new(module, bound)
    }
}
