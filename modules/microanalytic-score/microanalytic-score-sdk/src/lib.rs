//! Microanalytic Score SDK
//!
//! This crate provides the public API of the `microanalytic-score` module:
//! - `MicroAnalyticScoreClient` trait covering module and step operations
//! - `Module`, `Step` and `CreateModuleRequest` models
//! - `StepSignature`, `BoundStep` and `StepNamespace` for calling steps as
//!   typed functions
//! - `MasError` for error handling
//!
//! ## Usage
//!
//! ```ignore
//! use microanalytic_score_sdk::{MicroAnalyticScoreClient, StepArgs, StepOutput};
//!
//! let steps = client.define_steps(&"scoring".into()).await?;
//! for step in &steps {
//!     println!("{}", step.signature());
//! }
//!
//! let output = steps
//!     .call("score", StepArgs::new().named("age", 65.2).named("rm", 6.575))
//!     .await?;
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;
pub mod namespace;
pub mod signature;

pub use api::{MicroAnalyticScoreClient, StepInvoker};
pub use error::MasError;
pub use models::{
    CreateModuleRequest, DEFAULT_SCOPE, Module, ModuleRef, Parameter, SourceLanguage, Step,
    StepInput, StepOutput, StepResult,
};
pub use namespace::{BoundStep, StepArgs, StepNamespace};
pub use signature::{ParamSpec, ParamType, StepSignature};
