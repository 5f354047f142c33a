//! Wizard session state.
//!
//! One [`WizardState`] exists per open wizard. It owns the flat form state
//! shared by every step, the option list of each select field, and the status
//! of each lookup field. Public wizard operations hand out clones of it; only
//! the wizard mutates it.

use indexmap::IndexMap;
use wizard_types::{FormState, OptionItem, OptionValue};

use crate::{lookup::LookupStatus, provider::Record};

/// Entry point the wizard was opened through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WizardMode {
    #[default]
    Create,
    Edit { record_id: String },
}

/// Why a wizard closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Success,
    Cancelled,
}

/// Lifecycle position of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardPhase {
    #[default]
    NotStarted,
    /// The user is filling in `current_step_index`.
    Editing,
    /// The record service call is in flight.
    Submitting,
    Closed(CloseReason),
}

/// Option list of one select field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldOptions {
    /// Never resolved.
    #[default]
    Unloaded,
    /// The parent field is empty; the select is disabled.
    AwaitingParent,
    Loading,
    /// Options fetched for the parent value key recorded in `parent` (`None` for root selects).
    Ready { items: Vec<OptionItem>, parent: Option<String> },
    Failed { message: String },
}

impl FieldOptions {
    pub fn items(&self) -> &[OptionItem] {
        match self {
            FieldOptions::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldOptions::Loading)
    }

    /// Returns true when the options were fetched for exactly this parent key.
    pub fn is_ready_for(&self, parent_key: Option<&str>) -> bool {
        matches!(self, FieldOptions::Ready { parent, .. } if parent.as_deref() == parent_key)
    }
}

/// What a UI renders for a select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// `None` for placeholder, loading and error entries.
    pub value: Option<OptionValue>,
    pub label: String,
    pub disabled: bool,
}

impl SelectOption {
    pub(crate) fn choice(item: &OptionItem) -> Self {
        Self {
            value: Some(item.value.clone()),
            label: item.label.clone(),
            disabled: false,
        }
    }

    pub(crate) fn notice(label: impl Into<String>) -> Self {
        Self {
            value: None,
            label: label.into(),
            disabled: true,
        }
    }
}

/// Result of a successful forward transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved to `step_index`; its options have been resolved.
    Advanced { step_index: usize },
    /// The record service accepted the submission; the wizard is closed.
    Submitted(Record),
    /// A submission was already in flight; nothing happened.
    SubmissionInFlight,
}

/// The mutable session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    pub phase: WizardPhase,
    /// Always within `0..step_count`.
    pub current_step_index: usize,
    /// Values of every field across all steps.
    pub form_state: FormState,
    pub submission_in_flight: bool,
    pub mode: WizardMode,
    pub field_options: IndexMap<String, FieldOptions>,
    pub lookup_status: IndexMap<String, LookupStatus>,
    /// Message of the most recent validation or submission failure.
    pub last_error: Option<String>,
}

impl WizardState {
    /// Asynchronous results may still be applied.
    pub fn accepts_results(&self) -> bool {
        matches!(self.phase, WizardPhase::Editing | WizardPhase::Submitting)
    }

    pub fn options_for(&self, field: &str) -> Option<&FieldOptions> {
        self.field_options.get(field)
    }

    pub fn lookup_status_for(&self, field: &str) -> Option<&LookupStatus> {
        self.lookup_status.get(field)
    }
}
