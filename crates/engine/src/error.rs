//! Error taxonomy for wizard operations.
//!
//! Collaborator failures arrive as `anyhow::Error` and are converted into one
//! of these kinds at the point where they are awaited. Nothing here is allowed
//! to escape as a panic or an unhandled failure.

use thiserror::Error;

/// Errors returned by wizard operations.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Could not load record '{record_id}': {message}")]
    SeedLoad { record_id: String, message: String },

    #[error("Wizard has not been started")]
    NotStarted,

    #[error("Wizard is closed")]
    Closed,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Unknown field: {name}")]
    UnknownField { name: String },
}

/// Why a field failed the validation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    Invalid(String),
    /// Options or a lookup for the field are still being resolved.
    Resolving,
}

/// A required field is missing or a present value is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_validation(.label, .reason))]
pub struct ValidationError {
    /// Step declaring the failing field.
    pub step_index: usize,
    /// Field name (form state key).
    pub field: String,
    /// Human-readable field label.
    pub label: String,
    pub reason: ValidationReason,
}

fn describe_validation(label: &str, reason: &ValidationReason) -> String {
    match reason {
        ValidationReason::Missing => format!("{label} is required"),
        ValidationReason::Invalid(message) => format!("{label} {message}"),
        ValidationReason::Resolving => format!("{label} is still loading"),
    }
}

/// The options provider failed for a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not load options for '{field}' from '{provider_key}': {message}")]
pub struct OptionsLoadError {
    pub field: String,
    pub provider_key: String,
    pub message: String,
}

/// The record service rejected the submission. The message is the collaborator's own text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
}

/// The lookup service failed while resolving a natural key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lookup for '{field}' failed: {message}")]
pub struct LookupError {
    pub field: String,
    pub message: String,
}

/// A superseded asynchronous result was dropped. Internal signal only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stale response discarded (generation {generation})")]
pub struct StaleResponseDiscarded {
    pub generation: u64,
}

/// Problems detected while building a wizard from its definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Wizard '{wizard}' declares no steps")]
    NoSteps { wizard: String },

    #[error("Step {step_index} ('{title}') declares no fields")]
    EmptyStep { step_index: usize, title: String },

    #[error("Duplicate field name: '{name}'")]
    DuplicateField { name: String },

    #[error("Field '{field}' cannot depend on itself")]
    SelfDependency { field: String },

    #[error("Field '{field}' depends on unknown field '{parent}'")]
    UnknownDependency { field: String, parent: String },

    #[error("Field '{field}' depends on '{parent}', which is declared after it")]
    ForwardDependency { field: String, parent: String },

    #[error("Lookup field '{field}' targets '{target}', which is not a hidden field")]
    InvalidLookupTarget { field: String, target: String },

    #[error("Field '{field}' declares a lookup but no lookup service was supplied")]
    MissingLookupService { field: String },

    #[error("Field '{field}' has an invalid pattern: {message}")]
    InvalidPattern { field: String, message: String },
}
