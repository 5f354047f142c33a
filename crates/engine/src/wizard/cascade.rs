//! Dependent option resolution.
//!
//! Resolving a select field fetches its options for the parent's current
//! value, keeps the stored value only if the fetched list still contains it,
//! and then resolves the field's own dependents. The stored value is never
//! cleared before the fetch completes. Lookup fields resolve their hidden
//! target the same way once the debounce window has passed.

use futures_util::future::{BoxFuture, FutureExt, join_all};
use tracing::debug;
use wizard_types::{FieldValue, LookupBinding, options_contain};

use super::{
    Wizard,
    state::FieldOptions,
    telemetry::ResolutionOutcome,
};
use crate::{
    generation::GenerationTicket,
    loader::LoadOutcome,
    lookup::{DebouncedLookup, LookupOutcome, LookupStatus},
};

/// What to do with a select field before any request is made.
enum Resolution<'a> {
    /// The wizard is closed or the field is not a select.
    Halt,
    /// The field needs no fetch; its dependents are still visited.
    Settled,
    Fetch(PendingLoad<'a>),
}

struct PendingLoad<'a> {
    ticket: GenerationTicket,
    provider_key: &'a str,
    parent: Option<FieldValue>,
    parent_key: Option<String>,
}

impl Wizard {
    /// Resolves the select fields a step starts from. Fields already loaded for
    /// their current parent value are reused.
    pub(super) async fn enter_step(&self, step_index: usize) {
        let entry_fields = self.graph.step_entry_fields(step_index);
        join_all(entry_fields.into_iter().map(|name| self.resolve_field(name))).await;
    }

    /// Re-resolves every direct dependent of `name`, each in turn cascading further.
    pub(super) async fn cascade_from(&self, name: &str) {
        join_all(
            self.graph
                .direct_dependents(name)
                .iter()
                .map(|child| self.resolve_field(child)),
        )
        .await;
    }

    fn resolve_field<'a>(&'a self, name: &'a str) -> BoxFuture<'a, ()> {
        async move {
            match self.prepare(name) {
                Resolution::Halt => return,
                Resolution::Settled => {}
                Resolution::Fetch(pending) => {
                    let outcome = self
                        .loader
                        .load(&pending.ticket, pending.provider_key, pending.parent.as_ref())
                        .await;
                    if !self.apply(name, &pending, outcome) {
                        return;
                    }
                }
            }
            self.cascade_from(name).await;
        }
        .boxed()
    }

    fn prepare<'a>(&'a self, name: &str) -> Resolution<'a> {
        let Some((_, field)) = self.definition.field(name) else {
            return Resolution::Halt;
        };
        let Some(provider_key) = field.provider_key() else {
            return Resolution::Halt;
        };

        let mut session = self.session();
        if !session.state.accepts_results() {
            return Resolution::Halt;
        }

        let parent = match field.depends_on() {
            None => None,
            Some(parent_name) => match session.state.form_state.meaningful(parent_name) {
                Some(value) => Some(value.clone()),
                None => {
                    self.loader.cancel(name);
                    session
                        .state
                        .field_options
                        .insert(name.to_string(), FieldOptions::AwaitingParent);
                    session.state.form_state.clear(name);
                    session
                        .telemetry
                        .record_resolution(name, None, ResolutionOutcome::Placeholder);
                    debug!(field = %name, parent = %parent_name, "parent empty; options reset to placeholder");
                    return Resolution::Settled;
                }
            },
        };

        let parent_key = parent.as_ref().map(|value| value.as_key().into_owned());
        if session
            .state
            .options_for(name)
            .is_some_and(|options| options.is_ready_for(parent_key.as_deref()))
        {
            return Resolution::Settled;
        }

        let ticket = self.loader.begin(name);
        session
            .state
            .field_options
            .insert(name.to_string(), FieldOptions::Loading);
        Resolution::Fetch(PendingLoad {
            ticket,
            provider_key,
            parent,
            parent_key,
        })
    }

    /// Applies a finished load. Returns true when dependents must be visited.
    fn apply(&self, name: &str, pending: &PendingLoad<'_>, outcome: LoadOutcome) -> bool {
        let mut session = self.session();
        let generation = Some(pending.ticket.generation());

        let parent_now = self
            .graph
            .parent_of(name)
            .and_then(|parent| session.state.form_state.meaningful(parent))
            .map(|value| value.as_key().into_owned());
        let superseded = matches!(outcome, LoadOutcome::Stale(_))
            || !session.state.accepts_results()
            || !self.loader.is_current(&pending.ticket)
            || parent_now != pending.parent_key;
        if superseded {
            session
                .telemetry
                .record_resolution(name, generation, ResolutionOutcome::Discarded);
            debug!(field = %name, generation = pending.ticket.generation(), "stale options discarded");
            return false;
        }

        match outcome {
            LoadOutcome::Loaded(items) => {
                let retained_value = session
                    .state
                    .form_state
                    .meaningful(name)
                    .is_some_and(|value| options_contain(&items, value));
                if !retained_value && session.state.form_state.clear(name).is_some() {
                    debug!(field = %name, "stored value not among fetched options; cleared");
                }
                let item_count = items.len();
                session.state.field_options.insert(
                    name.to_string(),
                    FieldOptions::Ready {
                        items,
                        parent: pending.parent_key.clone(),
                    },
                );
                session.telemetry.record_resolution(
                    name,
                    generation,
                    ResolutionOutcome::Applied {
                        item_count,
                        retained_value,
                    },
                );
            }
            LoadOutcome::Failed(error) => {
                session.state.form_state.clear(name);
                session.state.field_options.insert(
                    name.to_string(),
                    FieldOptions::Failed {
                        message: error.message.clone(),
                    },
                );
                session.telemetry.record_resolution(
                    name,
                    generation,
                    ResolutionOutcome::Failed { message: error.message },
                );
            }
            LoadOutcome::Stale(_) => return false,
        }
        true
    }

    /// Waits out the debounce window for a lookup field and writes its hidden target.
    pub(super) async fn resolve_lookup(&self, binding: &LookupBinding, lookup: &DebouncedLookup, ticket: &GenerationTicket, key: &FieldValue) {
        let outcome = lookup.resolve(ticket, &binding.lookup_key, key).await;

        let target_changed = {
            let mut session = self.session();
            if !session.state.accepts_results() || !lookup.is_current(ticket) {
                return;
            }

            let (status, resolved) = match outcome {
                LookupOutcome::Superseded => return,
                LookupOutcome::Resolved(Some(id)) => (LookupStatus::Found(id.clone()), Some(id)),
                LookupOutcome::Resolved(None) if key.is_blank() => (LookupStatus::Idle, None),
                LookupOutcome::Resolved(None) => (LookupStatus::NotFound, None),
                LookupOutcome::Failed(error) => (LookupStatus::Failed(error), None),
            };
            session
                .state
                .lookup_status
                .insert(ticket.key().to_string(), status);

            let previous = match resolved.clone() {
                Some(id) => session.state.form_state.insert(binding.target.as_str(), id),
                None => session.state.form_state.clear(&binding.target),
            };
            previous.unwrap_or_default() != resolved.unwrap_or_default()
        };

        if target_changed {
            debug!(field = %ticket.key(), target = %binding.target, "lookup target updated");
            self.cascade_from(&binding.target).await;
        }
    }
}
