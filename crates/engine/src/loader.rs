//! Asynchronous option loading with last-request-wins semantics.
//!
//! Each load captures a generation ticket for its field before awaiting the
//! options provider. When the provider answers, the result is only handed back
//! if no newer load for that field was issued in the meantime (and the wizard
//! was not closed); otherwise it is reported as stale and must be dropped.

use std::{fmt, sync::Arc};

use tracing::{debug, warn};
use wizard_types::{FieldValue, OptionItem};

use crate::{
    error::{OptionsLoadError, StaleResponseDiscarded},
    generation::{GenerationRegistry, GenerationTicket},
    provider::OptionsProvider,
};

/// Result of a single option load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The provider answered and the request is still the latest for its field.
    Loaded(Vec<OptionItem>),
    /// The provider failed and the request is still the latest for its field.
    Failed(OptionsLoadError),
    /// A newer request superseded this one; the answer was discarded.
    Stale(StaleResponseDiscarded),
}

/// Per-field option loader backed by an injected [`OptionsProvider`].
pub struct OptionLoader {
    provider: Arc<dyn OptionsProvider>,
    generations: GenerationRegistry,
}

impl fmt::Debug for OptionLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionLoader").finish_non_exhaustive()
    }
}

impl OptionLoader {
    pub fn new(provider: Arc<dyn OptionsProvider>) -> Self {
        Self {
            provider,
            generations: GenerationRegistry::new(),
        }
    }

    /// Starts a new load for `field`, superseding any load already in flight for it.
    pub fn begin(&self, field: &str) -> GenerationTicket {
        self.generations.issue(field)
    }

    /// Supersedes any in-flight load for `field` without starting a new one.
    pub fn cancel(&self, field: &str) {
        self.generations.cancel(field);
    }

    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        self.generations.is_current(ticket)
    }

    /// Drops every in-flight load; used when the wizard closes or restarts.
    pub fn invalidate_all(&self) {
        self.generations.invalidate_all();
    }

    /// Fetches options for the ticket's field.
    pub async fn load(&self, ticket: &GenerationTicket, provider_key: &str, parent: Option<&FieldValue>) -> LoadOutcome {
        debug!(
            field = %ticket.key(),
            provider_key = %provider_key,
            generation = ticket.generation(),
            parent = %parent.map(|value| value.to_string()).unwrap_or_default(),
            "option load started"
        );

        let result = self.provider.get_options(provider_key, parent).await;

        if let Err(stale) = self.generations.ensure_current(ticket) {
            debug!(
                field = %ticket.key(),
                generation = stale.generation,
                "option load superseded; response discarded"
            );
            return LoadOutcome::Stale(stale);
        }

        match result {
            Ok(items) => {
                debug!(
                    field = %ticket.key(),
                    provider_key = %provider_key,
                    item_count = items.len(),
                    "option load completed"
                );
                LoadOutcome::Loaded(items)
            }
            Err(error) => {
                warn!(
                    field = %ticket.key(),
                    provider_key = %provider_key,
                    %error,
                    "option load failed"
                );
                LoadOutcome::Failed(OptionsLoadError {
                    field: ticket.key().to_string(),
                    provider_key: provider_key.to_string(),
                    message: error.to_string(),
                })
            }
        }
    }
}
