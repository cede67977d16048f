//! Error types for the microanalytic-score client.

use thiserror::Error;

/// Errors returned by the microanalytic-score client.
///
/// Lookups that may legitimately find nothing (`get_module`) return `Option`
/// instead of [`MasError::ModuleNotFound`]; the not-found variants are raised
/// only where the caller's request cannot be completed without the resource.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MasError {
    /// A required argument was missing or malformed. Raised before any
    /// request is sent.
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The module could not be resolved.
    #[error("module not found: {module}")]
    ModuleNotFound { module: String },

    /// The step does not exist in the module.
    #[error("step '{step}' not found in module '{module}'")]
    StepNotFound { module: String, step: String },

    /// Step metadata could not be turned into a callable signature.
    #[error("invalid metadata for step '{step}': {reason}")]
    InvalidStepMetadata { step: String, reason: String },

    /// The service answered with a body of an unexpected shape.
    #[error("unexpected response for {context}: {reason}")]
    UnexpectedResponse { context: String, reason: String },

    /// Transport failure (network, auth, non-2xx status).
    #[error("{context} failed: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MasError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_step(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStepMetadata {
            step: step.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a transport error, keeping it reachable through `source()`.
    pub fn transport(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: source.into(),
        }
    }
}
