//! Collaborator capabilities consumed by the wizard engine.
//!
//! The engine never talks to a backend directly. Options, record persistence,
//! and natural-key lookups are injected as trait objects when a wizard is
//! built, so the surrounding CRUD layer decides how they are served.
//!
//! Modules:
//! - `null`: provider returning no options, for disabled scenarios
//! - `fixed`: in-memory provider keyed by provider key and parent value

mod fixed;
mod null;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wizard_types::{FieldValue, FormState, OptionItem};

pub use fixed::StaticOptionsProvider;
pub use null::NullOptionsProvider;

/// Resolves the selectable choices for a select field.
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    /// Fetches options for `provider_key`, scoped by the parent field's value when the field has one.
    async fn get_options(&self, provider_key: &str, parent: Option<&FieldValue>) -> Result<Vec<OptionItem>>;
}

/// Persists the wizard's final form state and loads seed values for edit mode.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Record>;
    async fn create(&self, payload: FormState) -> Result<Record>;
    async fn update(&self, id: &str, payload: FormState) -> Result<Record>;
}

/// Resolves a human-entered natural key (such as an identity number) into a record identifier.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Returns `Ok(None)` when no record matches `key`.
    async fn find_id_by_key(&self, lookup_key: &str, key: &str) -> Result<Option<FieldValue>>;
}

/// A persisted record as returned by the record service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub values: FormState,
}

impl Record {
    pub fn new(id: impl Into<String>, values: FormState) -> Self {
        Self { id: id.into(), values }
    }
}
