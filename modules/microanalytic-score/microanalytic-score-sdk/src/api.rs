//! `MicroAnalyticScoreClient` trait definition.
//!
//! The client is the public surface of the microanalytic-score module. Every
//! operation is a thin mapping onto one or two REST calls, except
//! [`MicroAnalyticScoreClient::define_steps`] which turns step metadata into
//! typed, callable bindings.

use async_trait::async_trait;
use mas_restobj::RestObj;

use crate::error::MasError;
use crate::models::{CreateModuleRequest, Module, ModuleRef, Step, StepInput, StepResult};
use crate::namespace::StepNamespace;

/// Public API trait for the Micro Analytic Score service.
///
/// Module arguments accept either an identifier/name or an already resolved
/// [`Module`]. A string that looks like an identifier (lowercase letters,
/// digits and underscores) is fetched directly first, falling back to a
/// name-filtered listing when no such id exists; anything else goes straight
/// to the listing.
///
/// ```ignore
/// let steps = client.define_steps(&"Boston Housing".into()).await?;
/// let price = steps.call("score", StepArgs::new().named("age", 65.2)).await?;
/// ```
#[async_trait]
pub trait MicroAnalyticScoreClient: Send + Sync {
    /// List modules, optionally narrowed by a server-side filter expression
    /// such as `eq(name, "scoring")`. All pages are collected.
    ///
    /// # Errors
    ///
    /// * `Transport` - If a page request fails
    /// * `UnexpectedResponse` - If a page or an item has the wrong shape
    async fn list_modules(&self, filter: Option<&str>) -> Result<Vec<Module>, MasError>;

    /// Resolve a module.
    ///
    /// # Returns
    ///
    /// `None` when no module matches; a resolved [`ModuleRef`] is returned
    /// as is without a request.
    ///
    /// # Errors
    ///
    /// * `Transport` - If the lookup fails for any reason other than 404
    async fn get_module(&self, module: &ModuleRef) -> Result<Option<Module>, MasError>;

    /// Compile and publish a module; returns the created resource.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - If the source is missing; nothing is sent
    /// * `Transport` - If the service rejects the module
    async fn create_module(&self, request: &CreateModuleRequest) -> Result<RestObj, MasError>;

    /// Delete a module. A module that does not exist is logged and skipped.
    ///
    /// # Errors
    ///
    /// * `Transport` - If the lookup or the delete request fails
    async fn delete_module(&self, module: &ModuleRef) -> Result<(), MasError>;

    /// Step identifiers of a module, in the order the server declares them.
    /// A module without steps yields an empty list.
    ///
    /// # Errors
    ///
    /// * `ModuleNotFound` - If the module cannot be resolved
    async fn list_module_steps(&self, module: &ModuleRef) -> Result<Vec<String>, MasError>;

    /// One step of a module.
    ///
    /// # Errors
    ///
    /// * `ModuleNotFound` - If the module cannot be resolved
    /// * `StepNotFound` - If the module has no such step
    async fn get_module_step(&self, module: &ModuleRef, step: &str) -> Result<Step, MasError>;

    /// Execute a step with pre-built inputs; no validation against the step
    /// signature happens here.
    ///
    /// # Errors
    ///
    /// * `ModuleNotFound` - If the module cannot be resolved
    /// * `Transport` - If execution fails on the server
    async fn execute_module_step(
        &self,
        module: &ModuleRef,
        step: &str,
        inputs: Vec<StepInput>,
    ) -> Result<StepResult, MasError>;

    /// Bind every step of a module into a callable [`StepNamespace`].
    ///
    /// Metadata is read once, here; calls on the namespace only execute.
    ///
    /// # Errors
    ///
    /// * `ModuleNotFound` - If the module cannot be resolved
    /// * `InvalidStepMetadata` - If any step cannot be bound
    async fn define_steps(&self, module: &ModuleRef) -> Result<StepNamespace, MasError>;
}

/// Executes a step on behalf of a [`crate::BoundStep`].
#[async_trait]
pub trait StepInvoker: Send + Sync {
    /// # Errors
    ///
    /// Whatever the execution request fails with.
    async fn invoke(
        &self,
        module_id: &str,
        step_id: &str,
        inputs: Vec<StepInput>,
    ) -> Result<StepResult, MasError>;
}
