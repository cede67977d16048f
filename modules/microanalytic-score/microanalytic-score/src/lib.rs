//! Micro Analytic Score client
//!
//! The public API is defined in `microanalytic-score-sdk` and re-exported
//! here. [`MicroAnalyticScore`] implements it over any
//! [`mas_http::RestTransport`].

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use microanalytic_score_sdk::{
    BoundStep, CreateModuleRequest, MasError, MicroAnalyticScoreClient, Module, ModuleRef,
    SourceLanguage, Step, StepArgs, StepInput, StepNamespace, StepOutput, StepResult,
    StepSignature,
};

pub mod config;
pub use config::MicroAnalyticScoreConfig;

#[doc(hidden)]
pub mod domain;
pub use domain::service::MicroAnalyticScore;
