//! Telemetry collected while a wizard is open.

/// Outcome recorded for a single option resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Options were applied; `retained_value` tells whether the stored value survived re-validation.
    Applied { item_count: usize, retained_value: bool },
    Failed { message: String },
    /// The parent was empty, so the field was reset to its placeholder.
    Placeholder,
    /// A newer request superseded this one.
    Discarded,
}

/// Structured option resolution event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionResolutionEvent {
    pub field: String,
    /// Generation of the load; `None` when no load was issued.
    pub generation: Option<u64>,
    pub outcome: ResolutionOutcome,
}

/// Kind of lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    Started,
    Advanced,
    Retreated,
    /// The validation gate stopped the wizard on `field`.
    Blocked { field: String },
    SubmissionStarted,
    Submitted,
    SubmissionFailed,
    Cancelled,
}

/// Structured step transition event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransitionEvent {
    /// Step index after the transition.
    pub step_index: usize,
    pub kind: TransitionKind,
}

/// Aggregated telemetry of one wizard.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WizardTelemetry {
    option_resolutions: Vec<OptionResolutionEvent>,
    step_transitions: Vec<StepTransitionEvent>,
}

impl WizardTelemetry {
    pub(crate) fn record_resolution(&mut self, field: &str, generation: Option<u64>, outcome: ResolutionOutcome) {
        self.option_resolutions.push(OptionResolutionEvent {
            field: field.to_string(),
            generation,
            outcome,
        });
    }

    pub(crate) fn record_transition(&mut self, step_index: usize, kind: TransitionKind) {
        self.step_transitions.push(StepTransitionEvent { step_index, kind });
    }

    pub fn option_resolution_events(&self) -> &[OptionResolutionEvent] {
        &self.option_resolutions
    }

    pub fn step_transition_events(&self) -> &[StepTransitionEvent] {
        &self.step_transitions
    }

    /// Resolution events recorded for `field`, oldest first.
    pub fn resolutions_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a OptionResolutionEvent> + 'a {
        self.option_resolutions.iter().filter(move |event| event.field == field)
    }
}
