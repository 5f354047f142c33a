//! Step-scoped validation gate.
//!
//! The gate is a pure function over a step's declared fields and the current
//! form state. It walks fields in declaration order and stops at the first
//! failure so the reported field is deterministic.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FieldConstraints, FieldDescriptor, StepDefinition};
use crate::value::{FieldValue, FormState};

/// Result of validating a single step.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<'a> {
    /// Every required field is present and every present value satisfies its constraints.
    Complete,
    /// A required field has no value.
    Missing(&'a FieldDescriptor),
    /// A present value violates the field's constraints.
    Invalid { field: &'a FieldDescriptor, message: String },
}

impl ValidationOutcome<'_> {
    pub fn is_complete(&self) -> bool {
        matches!(self, ValidationOutcome::Complete)
    }

    /// The failing field, if any.
    pub fn field(&self) -> Option<&FieldDescriptor> {
        match self {
            ValidationOutcome::Complete => None,
            ValidationOutcome::Missing(field) => Some(*field),
            ValidationOutcome::Invalid { field, .. } => Some(*field),
        }
    }
}

/// Validates the fields declared by `step` against `form_state`.
///
/// Hidden and display fields are never inspected, nor are fields of other steps.
pub fn validate_step<'a>(step: &'a StepDefinition, form_state: &FormState) -> ValidationOutcome<'a> {
    for field in step.fields.iter().filter(|field| field.is_user_editable()) {
        let value = form_state.meaningful(&field.name);
        match value {
            None if field.required => return ValidationOutcome::Missing(field),
            None => continue,
            Some(value) => {
                if let Some(constraints) = &field.constraints
                    && let Err(message) = check_constraints(value, constraints)
                {
                    return ValidationOutcome::Invalid { field, message };
                }
            }
        }
    }
    ValidationOutcome::Complete
}

/// Compiled `pattern` constraints, shared across validations.
static PATTERNS: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn pattern_matches(pattern: &str, text: &str) -> Result<bool, String> {
    let mut patterns = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = patterns.get(pattern) {
        return Ok(regex.is_match(text));
    }
    let regex = Regex::new(pattern).map_err(|error| format!("invalid pattern '{}': {}", pattern, error))?;
    let matched = regex.is_match(text);
    patterns.insert(pattern.to_string(), regex);
    Ok(matched)
}

/// Checks a present value against declarative constraints.
///
/// Length and pattern rules apply to the textual form of the value; `min`/`max`
/// require the value to be numeric.
pub fn check_constraints(value: &FieldValue, constraints: &FieldConstraints) -> Result<(), String> {
    let text = value.as_key();

    if let Some(min_length) = constraints.min_length
        && text.chars().count() < min_length
    {
        return Err(format!("must be at least {} characters", min_length));
    }

    if let Some(max_length) = constraints.max_length
        && text.chars().count() > max_length
    {
        return Err(format!("must be at most {} characters", max_length));
    }

    if let Some(pattern) = &constraints.pattern {
        if !pattern_matches(pattern, &text)? {
            return Err(format!("must match the pattern {}", pattern));
        }
    }

    if constraints.min.is_some() || constraints.max.is_some() {
        let Some(number) = value.as_f64() else {
            return Err("must be a number".to_string());
        };
        if let Some(min) = constraints.min
            && number < min
        {
            return Err(format!("must be at least {}", min));
        }
        if let Some(max) = constraints.max
            && number > max
        {
            return Err(format!("must be at most {}", max));
        }
    }

    Ok(())
}
