//! Per-key generation counters used to discard superseded async results.
//!
//! Every request captures a [`GenerationTicket`] when it is issued. Issuing a
//! newer ticket for the same key, or invalidating everything when a wizard
//! closes, makes older tickets stale; their results must then be dropped.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::error::StaleResponseDiscarded;

/// Proof that a request was the latest one for its key at issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    key: String,
    generation: u64,
}

impl GenerationTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Counters {
    next: u64,
    current: HashMap<String, u64>,
}

/// Thread-safe registry of the current generation per key.
///
/// Generations come from a single monotonically increasing counter, so a ticket
/// issued before [`GenerationRegistry::invalidate_all`] can never match a later one.
#[derive(Debug, Default)]
pub struct GenerationRegistry {
    counters: Mutex<Counters>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a new ticket for `key`, superseding any outstanding one.
    pub fn issue(&self, key: &str) -> GenerationTicket {
        let mut counters = self.counters();
        counters.next = counters.next.saturating_add(1);
        let generation = counters.next;
        counters.current.insert(key.to_string(), generation);
        GenerationTicket {
            key: key.to_string(),
            generation,
        }
    }

    /// Supersedes any outstanding ticket for `key` without issuing a new one.
    pub fn cancel(&self, key: &str) {
        self.counters().current.remove(key);
    }

    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        self.counters().current.get(&ticket.key) == Some(&ticket.generation)
    }

    /// Returns `Err` when the ticket has been superseded.
    pub fn ensure_current(&self, ticket: &GenerationTicket) -> Result<(), StaleResponseDiscarded> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(StaleResponseDiscarded {
                generation: ticket.generation,
            })
        }
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate_all(&self) {
        self.counters().current.clear();
    }
}
