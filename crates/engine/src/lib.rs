//! # Wizard Engine
//!
//! Dependent-field cascades and multi-step wizards for back-office forms.
//!
//! A [`Wizard`] walks the user through the steps of a [`WizardDefinition`],
//! gating each forward transition on the step's required fields. Select
//! fields may depend on an earlier field; changing a parent re-fetches the
//! options of every descendant, keeping a stored value only while the new
//! option list still contains it. Option loads and natural-key lookups are
//! asynchronous and guarded by per-field generation counters so superseded
//! responses are dropped instead of applied.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use wizard_engine::{EngineConfig, Wizard, WizardCollaborators, WizardMode, catalog, provider::StaticOptionsProvider};
//! use wizard_types::{FormState, OptionItem};
//! # use wizard_engine::provider::{Record, RecordService};
//! # struct Records;
//! # #[async_trait::async_trait]
//! # impl RecordService for Records {
//! #     async fn get_by_id(&self, id: &str) -> anyhow::Result<Record> { Ok(Record::new(id, FormState::new())) }
//! #     async fn create(&self, payload: FormState) -> anyhow::Result<Record> { Ok(Record::new("1", payload)) }
//! #     async fn update(&self, id: &str, payload: FormState) -> anyhow::Result<Record> { Ok(Record::new(id, payload)) }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let options = StaticOptionsProvider::new()
//!     .with_options("departamentos", vec![OptionItem::new("LP", "La Paz")])
//!     .with_children("municipios", "LP", vec![OptionItem::new("M1", "El Alto")]);
//! let collaborators = WizardCollaborators::new(Arc::new(options), Arc::new(Records));
//! let wizard = Wizard::new(catalog::address_wizard(), collaborators, EngineConfig::default())?;
//!
//! wizard.start(WizardMode::Create, FormState::new()).await?;
//! wizard.set_field_value("departamento", "LP").await?;
//! assert_eq!(wizard.select_options("municipio")?[0].label, "El Alto");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`graph`**: dependency DAG built and checked once per definition
//! - **`loader`**: option fetches with last-request-wins semantics
//! - **`lookup`**: debounced natural-key lookups
//! - **`wizard`**: the state machine, cascade resolver and telemetry
//! - **`provider`**: collaborator traits and in-memory providers
//! - **`payload`**: form state to submission payload projection
//! - **`catalog`**: the built-in address and order wizards

pub mod catalog;
pub mod config;
pub mod error;
pub mod generation;
pub mod graph;
pub mod loader;
pub mod lookup;
pub mod payload;
pub mod provider;
pub mod wizard;

pub use config::EngineConfig;
pub use error::{
    DefinitionError, LookupError, OptionsLoadError, StaleResponseDiscarded, SubmissionError, ValidationError, ValidationReason,
    WizardError,
};
pub use lookup::LookupStatus;
pub use payload::project_payload;
pub use provider::{LookupService, NullOptionsProvider, OptionsProvider, Record, RecordService, StaticOptionsProvider};
pub use wizard::{
    Wizard, WizardCollaborators,
    state::{CloseReason, FieldOptions, SelectOption, Transition, WizardMode, WizardPhase, WizardState},
    telemetry::{OptionResolutionEvent, ResolutionOutcome, StepTransitionEvent, TransitionKind, WizardTelemetry},
};
pub use wizard_types::{FieldValue, FormState, OptionItem, OptionValue, WizardDefinition};
