//! Module lifecycle and step metadata operations.

use std::sync::Arc;

use async_trait::async_trait;
use mas_http::RestTransport;
use mas_restobj::RestObj;
use microanalytic_score_sdk::{
    CreateModuleRequest, MasError, MicroAnalyticScoreClient, Module, ModuleRef, Step, StepInput,
    StepInvoker, StepNamespace, StepResult,
};
use tracing::{debug, info, instrument, warn};

use super::binder::RemoteStepInvoker;
use super::paths::{ServicePaths, is_module_id, name_filter};
use crate::config::MicroAnalyticScoreConfig;

/// Client for the Micro Analytic Score service.
///
/// Holds no state besides the transport handle and configuration; every
/// operation is a fresh sequence of requests.
pub struct MicroAnalyticScore {
    transport: Arc<dyn RestTransport>,
    paths: ServicePaths,
    pub(crate) invoker: Arc<RemoteStepInvoker>,
    page_limit: u32,
}

impl MicroAnalyticScore {
    #[must_use]
    pub fn new(transport: Arc<dyn RestTransport>, config: &MicroAnalyticScoreConfig) -> Self {
        let paths = ServicePaths::new(&config.service_root);
        let invoker = Arc::new(RemoteStepInvoker::new(transport.clone(), paths.clone()));
        Self {
            transport,
            paths,
            invoker,
            page_limit: config.page_limit.max(1),
        }
    }

    async fn get_object(&self, path: &str) -> Result<Option<RestObj>, MasError> {
        self.transport
            .get(path)
            .await
            .map_err(|e| MasError::transport(format!("GET {path}"), e))
    }

    /// All items of the module collection, page by page.
    async fn collect_pages(&self, filter: Option<&str>) -> Result<Vec<RestObj>, MasError> {
        let collection = self.paths.modules();
        let mut items = Vec::new();
        let mut start: u64 = 0;
        let mut previous_first: Option<serde_json::Value> = None;
        loop {
            let path = ServicePaths::page(&collection, start, self.page_limit, filter)
                .map_err(|e| MasError::invalid_argument("filter", e.to_string()))?;
            let Some(page) = self.get_object(&path).await? else {
                break;
            };
            let Some(batch) = page.get_array("items") else {
                return Err(MasError::unexpected(
                    format!("GET {path}"),
                    "page without an `items` array",
                ));
            };
            // a server that ignores `start` keeps serving the first page
            if batch.first().is_some() && batch.first() == previous_first.as_ref() {
                warn!(start, "page repeats the previous one; stopping");
                break;
            }
            previous_first = batch.first().cloned();

            let received = batch.len();
            for item in batch {
                let obj = RestObj::from_value(item.clone())
                    .map_err(|e| MasError::unexpected(format!("GET {path}"), e.to_string()))?;
                items.push(obj);
            }
            debug!(start, received, "page received");

            let received = u64::try_from(received).unwrap_or(u64::MAX);
            start = start.saturating_add(received);
            let done = match page.get_u64("count") {
                Some(count) => start >= count,
                None => received < u64::from(self.page_limit),
            };
            if received == 0 || done {
                break;
            }
        }
        Ok(items)
    }

    /// Resolve a module reference, failing when it does not exist.
    pub(crate) async fn require_module(&self, module: &ModuleRef) -> Result<Module, MasError> {
        self.get_module(module)
            .await?
            .ok_or_else(|| MasError::ModuleNotFound {
                module: module.identifier().to_owned(),
            })
    }

    /// Module id for a reference. Only a resolved module skips the lookup,
    /// since an id-shaped string may still be a module name.
    async fn module_id(&self, module: &ModuleRef) -> Result<String, MasError> {
        match module {
            ModuleRef::Resolved(m) => Ok(m.id.clone()),
            ModuleRef::Id(_) => Ok(self.require_module(module).await?.id),
        }
    }

    pub(crate) async fn fetch_step(&self, module_id: &str, step_id: &str) -> Result<Step, MasError> {
        let path = self.paths.step(module_id, step_id);
        let Some(obj) = self.get_object(&path).await? else {
            return Err(MasError::StepNotFound {
                module: module_id.to_owned(),
                step: step_id.to_owned(),
            });
        };
        Step::from_rest(obj)
    }

    /// Name-filtered listing, keeping the module whose name or id equals
    /// `name`.
    async fn find_by_name(&self, name: &str) -> Result<Option<Module>, MasError> {
        let filter = name_filter(name);
        let candidates = self.list_modules(Some(&filter)).await?;
        Ok(candidates
            .into_iter()
            .find(|m| m.name.as_deref() == Some(name) || m.id == name))
    }
}

#[async_trait]
impl MicroAnalyticScoreClient for MicroAnalyticScore {
    #[instrument(skip_all, fields(filter = filter.unwrap_or_default()))]
    async fn list_modules(&self, filter: Option<&str>) -> Result<Vec<Module>, MasError> {
        self.collect_pages(filter)
            .await?
            .into_iter()
            .map(Module::from_rest)
            .collect()
    }

    #[instrument(skip_all, fields(module = %module))]
    async fn get_module(&self, module: &ModuleRef) -> Result<Option<Module>, MasError> {
        match module {
            ModuleRef::Resolved(m) => Ok(Some(m.as_ref().clone())),
            ModuleRef::Id(id) if is_module_id(id) => {
                match self.get_object(&self.paths.module(id)).await? {
                    Some(obj) => Module::from_rest(obj).map(Some),
                    None => {
                        debug!("no module with id '{id}', trying names");
                        self.find_by_name(id).await
                    }
                }
            }
            ModuleRef::Id(name) => self.find_by_name(name).await,
        }
    }

    #[instrument(skip_all, fields(name = request.name.as_deref().unwrap_or_default()))]
    async fn create_module(&self, request: &CreateModuleRequest) -> Result<RestObj, MasError> {
        let payload = request.to_payload()?;
        let path = self.paths.modules();
        let created = self
            .transport
            .post(&path, &payload)
            .await
            .map_err(|e| MasError::transport(format!("POST {path}"), e))?;
        info!(module = %created, "module created");
        Ok(created)
    }

    #[instrument(skip_all, fields(module = %module))]
    async fn delete_module(&self, module: &ModuleRef) -> Result<(), MasError> {
        let Some(found) = self.get_module(module).await? else {
            info!("Object '{}' not found. Skipping delete.", module.identifier());
            return Ok(());
        };

        let path = found
            .raw()
            .link("delete")
            .map_or_else(|| self.paths.module(&found.id), |link| link.href);
        self.transport
            .delete(&path)
            .await
            .map_err(|e| MasError::transport(format!("DELETE {path}"), e))?;
        info!(module = %found.id, "module deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(module = %module))]
    async fn list_module_steps(&self, module: &ModuleRef) -> Result<Vec<String>, MasError> {
        Ok(self.require_module(module).await?.step_ids)
    }

    #[instrument(skip_all, fields(module = %module, step = %step))]
    async fn get_module_step(&self, module: &ModuleRef, step: &str) -> Result<Step, MasError> {
        let module = self.require_module(module).await?;
        self.fetch_step(&module.id, step).await
    }

    async fn execute_module_step(
        &self,
        module: &ModuleRef,
        step: &str,
        inputs: Vec<StepInput>,
    ) -> Result<StepResult, MasError> {
        let module_id = self.module_id(module).await?;
        self.invoker.invoke(&module_id, step, inputs).await
    }

    #[instrument(skip_all, fields(module = %module))]
    async fn define_steps(&self, module: &ModuleRef) -> Result<StepNamespace, MasError> {
        self.bind_steps(module).await
    }
}
