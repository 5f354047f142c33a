//! Shared type definitions for the back-office wizard engine.
//!
//! This crate holds the declarative side of a wizard: field descriptors, step
//! definitions, form values, selectable options, and the pure step validation
//! gate. It performs no I/O and has no async surface, so rendering layers can
//! depend on it without pulling in the engine's runtime.

pub mod value;
pub mod wizard;

pub use value::{FieldValue, FormState, OptionItem, OptionValue, options_contain};
pub use wizard::validation::{ValidationOutcome, check_constraints, validate_step};
pub use wizard::{FieldConstraints, FieldDescriptor, FieldKind, LookupBinding, StepDefinition, WizardDefinition};
