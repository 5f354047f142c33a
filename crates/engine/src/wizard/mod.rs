//! Multi-step wizard state machine.
//!
//! A [`Wizard`] drives step sequencing over a static [`WizardDefinition`] and
//! owns the session state. Every operation takes `&self`: the session lives
//! behind a mutex that is never held across an `.await`, so option loads,
//! lookups and a submission can be in flight at the same time while the
//! generation counters decide which results still apply.
//!
//! Modules:
//! - `state`: session types handed out to callers
//! - `cascade`: dependent option resolution and debounced lookups
//! - `telemetry`: resolution and transition events

mod cascade;
pub mod state;
pub mod telemetry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use wizard_types::{FieldValue, FormState, ValidationOutcome, WizardDefinition, validate_step};

use crate::{
    config::EngineConfig,
    error::{DefinitionError, SubmissionError, ValidationError, ValidationReason, WizardError},
    graph::DependencyGraph,
    loader::OptionLoader,
    lookup::{DebouncedLookup, LookupStatus},
    payload::project_payload,
    provider::{LookupService, OptionsProvider, RecordService},
};

use state::{CloseReason, FieldOptions, SelectOption, Transition, WizardMode, WizardPhase, WizardState};
use telemetry::{TransitionKind, WizardTelemetry};

/// Collaborators injected into a wizard at construction.
#[derive(Clone)]
pub struct WizardCollaborators {
    pub options: Arc<dyn OptionsProvider>,
    pub records: Arc<dyn RecordService>,
    /// Required when any field declares a lookup.
    pub lookup: Option<Arc<dyn LookupService>>,
}

impl WizardCollaborators {
    pub fn new(options: Arc<dyn OptionsProvider>, records: Arc<dyn RecordService>) -> Self {
        Self {
            options,
            records,
            lookup: None,
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn LookupService>) -> Self {
        self.lookup = Some(lookup);
        self
    }
}

#[derive(Debug, Default)]
struct Session {
    state: WizardState,
    telemetry: WizardTelemetry,
}

/// One open wizard.
pub struct Wizard {
    definition: WizardDefinition,
    graph: DependencyGraph,
    config: EngineConfig,
    loader: OptionLoader,
    lookup: Option<DebouncedLookup>,
    records: Arc<dyn RecordService>,
    session: Mutex<Session>,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("identifier", &self.definition.identifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    /// Validates `definition` and binds it to its collaborators.
    ///
    /// The wizard starts in [`WizardPhase::NotStarted`]; call [`Wizard::start`]
    /// or [`Wizard::open_for_edit`] to open it.
    pub fn new(definition: WizardDefinition, collaborators: WizardCollaborators, config: EngineConfig) -> Result<Self, DefinitionError> {
        let graph = DependencyGraph::build(&definition)?;
        if collaborators.lookup.is_none()
            && let Some((_, field)) = definition.fields().find(|(_, field)| field.lookup().is_some())
        {
            return Err(DefinitionError::MissingLookupService { field: field.name.clone() });
        }

        let lookup = collaborators
            .lookup
            .map(|service| DebouncedLookup::new(service, config.lookup_debounce()));
        let session = Session {
            state: fresh_state(&definition, WizardMode::Create, FormState::new()),
            telemetry: WizardTelemetry::default(),
        };

        Ok(Self {
            loader: OptionLoader::new(collaborators.options),
            records: collaborators.records,
            definition,
            graph,
            config,
            lookup,
            session: Mutex::new(session),
        })
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resets the session and its telemetry to `seed` on the first step and
    /// resolves that step's options.
    ///
    /// Seeded select values survive only if the fetched options still contain them.
    pub async fn start(&self, mode: WizardMode, seed: FormState) -> Result<(), WizardError> {
        {
            let mut session = self.session();
            if session.state.submission_in_flight {
                return Err(WizardError::SubmissionInFlight);
            }
            self.invalidate_pending();
            debug!(wizard = %self.definition.identifier, mode = ?mode, seeded_fields = seed.len(), "wizard started");
            session.state = fresh_state(&self.definition, mode, seed);
            session.state.phase = WizardPhase::Editing;
            session.telemetry = WizardTelemetry::default();
            session.telemetry.record_transition(0, TransitionKind::Started);
        }

        self.enter_step(0).await;
        Ok(())
    }

    /// Loads `record_id` through the record service and starts in edit mode with its values.
    pub async fn open_for_edit(&self, record_id: &str) -> Result<(), WizardError> {
        let record = self.records.get_by_id(record_id).await.map_err(|error| {
            warn!(wizard = %self.definition.identifier, record_id = %record_id, %error, "seed record load failed");
            WizardError::SeedLoad {
                record_id: record_id.to_string(),
                message: error.to_string(),
            }
        })?;

        self.start(
            WizardMode::Edit {
                record_id: record_id.to_string(),
            },
            record.values,
        )
        .await
    }

    /// Validates the current step and advances, or submits from the last step.
    pub async fn go_next(&self) -> Result<Transition, WizardError> {
        let next_step = {
            let mut session = self.session();
            match session.state.phase {
                WizardPhase::NotStarted => return Err(WizardError::NotStarted),
                WizardPhase::Closed(_) => return Err(WizardError::Closed),
                WizardPhase::Submitting => return Ok(Transition::SubmissionInFlight),
                WizardPhase::Editing => {}
            }

            let current = session.state.current_step_index;
            if let Some(error) = self.step_failure(current, &session.state.form_state) {
                block_on_validation(&mut session, &error);
                return Err(error.into());
            }

            if current + 1 < self.definition.step_count() {
                let next = current + 1;
                session.state.current_step_index = next;
                session.state.last_error = None;
                session.telemetry.record_transition(next, TransitionKind::Advanced);
                Some(next)
            } else {
                None
            }
        };

        match next_step {
            Some(step_index) => {
                debug!(wizard = %self.definition.identifier, step_index, "advanced to step");
                self.enter_step(step_index).await;
                Ok(Transition::Advanced { step_index })
            }
            None => self.submit_validated().await,
        }
    }

    /// Moves back one step. Neither validates nor clears anything.
    pub fn go_prev(&self) -> Result<usize, WizardError> {
        let mut session = self.session();
        ensure_editing(&session.state)?;
        let current = session.state.current_step_index;
        if current == 0 {
            return Err(WizardError::AtFirstStep);
        }

        let previous = current - 1;
        session.state.current_step_index = previous;
        session.telemetry.record_transition(previous, TransitionKind::Retreated);
        debug!(wizard = %self.definition.identifier, step_index = previous, "returned to step");
        Ok(previous)
    }

    /// Writes a field value and re-resolves every dependent select.
    ///
    /// Setting a lookup field also runs its debounced lookup, so the returned
    /// future completes only after the quiet period (and the lookup, unless a
    /// later keystroke superseded it). Setting a field to its current value
    /// does nothing.
    pub async fn set_field_value(&self, name: &str, value: impl Into<FieldValue>) -> Result<(), WizardError> {
        let value = value.into();
        let Some((_, field)) = self.definition.field(name) else {
            return Err(WizardError::UnknownField { name: name.to_string() });
        };

        let pending_lookup = {
            let mut session = self.session();
            ensure_editing(&session.state)?;
            if session.state.form_state.get(name).cloned().unwrap_or_default() == value {
                return Ok(());
            }

            match &value {
                FieldValue::Null => session.state.form_state.clear(name),
                other => session.state.form_state.insert(name, other.clone()),
            };

            match (field.lookup(), self.lookup.as_ref()) {
                (Some(binding), Some(lookup)) => {
                    session
                        .state
                        .lookup_status
                        .insert(name.to_string(), LookupStatus::Pending);
                    Some((binding, lookup, lookup.begin(name)))
                }
                _ => None,
            }
        };
        debug!(field = %name, dependents = self.graph.direct_dependents(name).len(), "field value changed");

        let lookup_task = async {
            if let Some((binding, lookup, ticket)) = &pending_lookup {
                self.resolve_lookup(binding, lookup, ticket, &value).await;
            }
        };
        tokio::join!(self.cascade_from(name), lookup_task);
        Ok(())
    }

    /// Validates every step and submits the projected form state.
    ///
    /// A call made while a submission is in flight does nothing.
    pub async fn submit(&self) -> Result<Transition, WizardError> {
        {
            let mut session = self.session();
            match session.state.phase {
                WizardPhase::NotStarted => return Err(WizardError::NotStarted),
                WizardPhase::Closed(_) => return Err(WizardError::Closed),
                WizardPhase::Submitting => return Ok(Transition::SubmissionInFlight),
                WizardPhase::Editing => {}
            }

            let failure = (0..self.definition.step_count()).find_map(|index| self.step_failure(index, &session.state.form_state));
            if let Some(error) = failure {
                block_on_validation(&mut session, &error);
                return Err(error.into());
            }
        }

        self.submit_validated().await
    }

    async fn submit_validated(&self) -> Result<Transition, WizardError> {
        let (mode, payload) = {
            let mut session = self.session();
            match session.state.phase {
                WizardPhase::NotStarted => return Err(WizardError::NotStarted),
                WizardPhase::Closed(_) => return Err(WizardError::Closed),
                WizardPhase::Submitting => return Ok(Transition::SubmissionInFlight),
                WizardPhase::Editing => {}
            }
            if let Some(error) = self.unresolved_field(&session.state) {
                block_on_validation(&mut session, &error);
                return Err(error.into());
            }
            session.state.phase = WizardPhase::Submitting;
            session.state.submission_in_flight = true;
            let step_index = session.state.current_step_index;
            session.telemetry.record_transition(step_index, TransitionKind::SubmissionStarted);
            (session.state.mode.clone(), project_payload(&self.definition, &session.state.form_state))
        };
        debug!(wizard = %self.definition.identifier, mode = ?mode, fields = payload.len(), "submission started");

        let result = match &mode {
            WizardMode::Create => self.records.create(payload).await,
            WizardMode::Edit { record_id } => self.records.update(record_id, payload).await,
        };

        let mut session = self.session();
        session.state.submission_in_flight = false;
        let step_index = session.state.current_step_index;
        match result {
            Ok(record) => {
                session.state.phase = WizardPhase::Closed(CloseReason::Success);
                session.state.last_error = None;
                self.invalidate_pending();
                session.telemetry.record_transition(step_index, TransitionKind::Submitted);
                info!(wizard = %self.definition.identifier, record_id = %record.id, "wizard submitted");
                Ok(Transition::Submitted(record))
            }
            Err(error) => {
                let error = SubmissionError {
                    message: error.to_string(),
                };
                session.state.phase = WizardPhase::Editing;
                session.state.last_error = Some(error.message.clone());
                session.telemetry.record_transition(step_index, TransitionKind::SubmissionFailed);
                warn!(wizard = %self.definition.identifier, %error, "wizard submission failed");
                Err(error.into())
            }
        }
    }

    /// Closes the wizard and drops every pending option load and lookup.
    pub fn cancel(&self) -> Result<(), WizardError> {
        let mut session = self.session();
        match session.state.phase {
            WizardPhase::NotStarted => return Err(WizardError::NotStarted),
            WizardPhase::Submitting => return Err(WizardError::SubmissionInFlight),
            WizardPhase::Closed(_) => return Ok(()),
            WizardPhase::Editing => {}
        }

        session.state.phase = WizardPhase::Closed(CloseReason::Cancelled);
        self.invalidate_pending();
        let step_index = session.state.current_step_index;
        session.telemetry.record_transition(step_index, TransitionKind::Cancelled);
        debug!(wizard = %self.definition.identifier, step_index, "wizard cancelled");
        Ok(())
    }

    /// Options a UI should render for the select field `name`.
    ///
    /// Placeholder, loading and error states render as a single disabled entry.
    pub fn select_options(&self, name: &str) -> Result<Vec<SelectOption>, WizardError> {
        let Some((_, field)) = self.definition.field(name).filter(|(_, field)| field.is_select()) else {
            return Err(WizardError::UnknownField { name: name.to_string() });
        };

        let session = self.session();
        let rendered = match session.state.options_for(name).unwrap_or(&FieldOptions::Unloaded) {
            FieldOptions::Unloaded => Vec::new(),
            FieldOptions::AwaitingParent => {
                let parent_label = field
                    .depends_on()
                    .and_then(|parent| self.definition.field(parent))
                    .map(|(_, parent)| parent.display_label())
                    .unwrap_or_default();
                vec![SelectOption::notice(self.config.placeholder_for(parent_label))]
            }
            FieldOptions::Loading => vec![SelectOption::notice(self.config.loading_label.clone())],
            FieldOptions::Failed { .. } => vec![SelectOption::notice(self.config.error_label.clone())],
            FieldOptions::Ready { items, .. } => items.iter().map(SelectOption::choice).collect(),
        };
        Ok(rendered)
    }

    /// Clone of the current session state.
    pub fn snapshot(&self) -> WizardState {
        self.session().state.clone()
    }

    pub fn form_state(&self) -> FormState {
        self.session().state.form_state.clone()
    }

    pub fn phase(&self) -> WizardPhase {
        self.session().state.phase
    }

    pub fn current_step_index(&self) -> usize {
        self.session().state.current_step_index
    }

    pub fn field_options(&self, name: &str) -> Option<FieldOptions> {
        self.session().state.options_for(name).cloned()
    }

    pub fn lookup_status(&self, name: &str) -> Option<LookupStatus> {
        self.session().state.lookup_status_for(name).cloned()
    }

    pub fn telemetry(&self) -> WizardTelemetry {
        self.session().telemetry.clone()
    }

    fn invalidate_pending(&self) {
        self.loader.invalidate_all();
        if let Some(lookup) = &self.lookup {
            lookup.invalidate_all();
        }
    }

    /// First field whose options or lookup are still in flight. Its value has
    /// not been confirmed against the current parent and must not be submitted.
    fn unresolved_field(&self, state: &WizardState) -> Option<ValidationError> {
        let (step_index, field) = self.definition.fields().find(|(_, field)| {
            state.options_for(&field.name).is_some_and(FieldOptions::is_loading)
                || matches!(state.lookup_status_for(&field.name), Some(LookupStatus::Pending))
        })?;
        Some(ValidationError {
            step_index,
            field: field.name.clone(),
            label: field.display_label().to_string(),
            reason: ValidationReason::Resolving,
        })
    }

    fn step_failure(&self, step_index: usize, form_state: &FormState) -> Option<ValidationError> {
        let step = self.definition.step(step_index)?;
        let (field, reason) = match validate_step(step, form_state) {
            ValidationOutcome::Complete => return None,
            ValidationOutcome::Missing(field) => (field, ValidationReason::Missing),
            ValidationOutcome::Invalid { field, message } => (field, ValidationReason::Invalid(message)),
        };
        Some(ValidationError {
            step_index,
            field: field.name.clone(),
            label: field.display_label().to_string(),
            reason,
        })
    }
}

fn ensure_editing(state: &WizardState) -> Result<(), WizardError> {
    match state.phase {
        WizardPhase::Editing => Ok(()),
        WizardPhase::NotStarted => Err(WizardError::NotStarted),
        WizardPhase::Submitting => Err(WizardError::SubmissionInFlight),
        WizardPhase::Closed(_) => Err(WizardError::Closed),
    }
}

fn block_on_validation(session: &mut Session, error: &ValidationError) {
    debug!(field = %error.field, step_index = error.step_index, "validation blocked transition");
    session.state.last_error = Some(error.to_string());
    let step_index = session.state.current_step_index;
    session.telemetry.record_transition(
        step_index,
        TransitionKind::Blocked {
            field: error.field.clone(),
        },
    );
}

fn fresh_state(definition: &WizardDefinition, mode: WizardMode, seed: FormState) -> WizardState {
    let field_options: IndexMap<String, FieldOptions> = definition
        .fields()
        .filter(|(_, field)| field.is_select())
        .map(|(_, field)| (field.name.clone(), FieldOptions::Unloaded))
        .collect();
    let lookup_status: IndexMap<String, LookupStatus> = definition
        .fields()
        .filter(|(_, field)| field.lookup().is_some())
        .map(|(_, field)| (field.name.clone(), LookupStatus::Idle))
        .collect();

    WizardState {
        phase: WizardPhase::NotStarted,
        current_step_index: 0,
        form_state: seed,
        submission_in_flight: false,
        mode,
        field_options,
        lookup_status,
        last_error: None,
    }
}
