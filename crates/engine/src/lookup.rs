//! Debounced natural-key lookups.
//!
//! A lookup text field (for example an identity number) resolves a hidden
//! foreign-key field through the [`LookupService`]. Keystrokes arrive faster
//! than requests should be sent, so each change waits out a quiet period and
//! only the latest change for a field is allowed to issue a request or apply
//! a result.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, warn};
use wizard_types::FieldValue;

use crate::{
    error::LookupError,
    generation::{GenerationRegistry, GenerationTicket},
    provider::LookupService,
};

/// Observable state of a lookup field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupStatus {
    #[default]
    Idle,
    /// Waiting out the debounce window or the service response.
    Pending,
    Found(FieldValue),
    NotFound,
    Failed(LookupError),
}

/// Result of a debounced lookup attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The service answered (or the key was blank); `None` means no match.
    Resolved(Option<FieldValue>),
    Failed(LookupError),
    /// A newer keystroke superseded this attempt; nothing may be applied.
    Superseded,
}

pub struct DebouncedLookup {
    service: Arc<dyn LookupService>,
    generations: GenerationRegistry,
    quiet_period: Duration,
}

impl fmt::Debug for DebouncedLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedLookup")
            .field("quiet_period", &self.quiet_period)
            .finish_non_exhaustive()
    }
}

impl DebouncedLookup {
    pub fn new(service: Arc<dyn LookupService>, quiet_period: Duration) -> Self {
        Self {
            service,
            generations: GenerationRegistry::new(),
            quiet_period,
        }
    }

    /// Registers a keystroke for `field`, superseding any pending lookup for it.
    pub fn begin(&self, field: &str) -> GenerationTicket {
        self.generations.issue(field)
    }

    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        self.generations.is_current(ticket)
    }

    pub fn invalidate_all(&self) {
        self.generations.invalidate_all();
    }

    /// Waits out the quiet period and, if still current, queries the service.
    ///
    /// A blank key resolves to no match immediately without a request.
    pub async fn resolve(&self, ticket: &GenerationTicket, lookup_key: &str, key: &FieldValue) -> LookupOutcome {
        if key.is_blank() {
            return if self.is_current(ticket) {
                LookupOutcome::Resolved(None)
            } else {
                LookupOutcome::Superseded
            };
        }

        tokio::time::sleep(self.quiet_period).await;
        if !self.is_current(ticket) {
            debug!(field = %ticket.key(), generation = ticket.generation(), "lookup coalesced into a newer keystroke");
            return LookupOutcome::Superseded;
        }

        let key_text = key.as_key().into_owned();
        debug!(field = %ticket.key(), lookup_key = %lookup_key, "lookup request sent");
        let result = self.service.find_id_by_key(lookup_key, &key_text).await;

        if !self.is_current(ticket) {
            debug!(field = %ticket.key(), generation = ticket.generation(), "lookup superseded; response discarded");
            return LookupOutcome::Superseded;
        }

        match result {
            Ok(found) => {
                debug!(field = %ticket.key(), lookup_key = %lookup_key, found = found.is_some(), "lookup completed");
                LookupOutcome::Resolved(found)
            }
            Err(error) => {
                warn!(field = %ticket.key(), lookup_key = %lookup_key, %error, "lookup failed");
                LookupOutcome::Failed(LookupError {
                    field: ticket.key().to_string(),
                    message: error.to_string(),
                })
            }
        }
    }
}
