#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use wizard_engine::{
    EngineConfig, FieldValue, FormState, LookupService, OptionItem, OptionsProvider, Record, RecordService, Wizard,
    WizardCollaborators, WizardDefinition,
};

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(20);

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Options provider with per-parent latency and failures that records every call.
#[derive(Default)]
pub struct ScriptedOptions {
    table: HashMap<(String, String), Vec<OptionItem>>,
    latency: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider_key: &str, parent: Option<&str>, items: &[(&str, &str)]) -> Self {
        let items = items.iter().map(|(value, label)| OptionItem::new(*value, *label)).collect();
        self.table
            .insert((provider_key.to_string(), parent.unwrap_or_default().to_string()), items);
        self
    }

    /// Delays answers for requests scoped by `parent`.
    pub fn slow_for(mut self, parent: &str, latency: Duration) -> Self {
        self.latency.insert(parent.to_string(), latency);
        self
    }

    pub fn fail_for(mut self, parent: &str) -> Self {
        self.failing.insert(parent.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, provider_key: &str) -> usize {
        self.calls().iter().filter(|(key, _)| key == provider_key).count()
    }
}

#[async_trait]
impl OptionsProvider for ScriptedOptions {
    async fn get_options(&self, provider_key: &str, parent: Option<&FieldValue>) -> Result<Vec<OptionItem>> {
        let parent_key = parent.map(|value| value.as_key().into_owned());
        self.calls
            .lock()
            .expect("calls lock")
            .push((provider_key.to_string(), parent_key.clone()));

        let parent_key = parent_key.unwrap_or_default();
        let latency = self.latency.get(&parent_key).copied().unwrap_or(DEFAULT_LATENCY);
        tokio::time::sleep(latency).await;

        if self.failing.contains(&parent_key) {
            bail!("options backend unavailable");
        }
        Ok(self
            .table
            .get(&(provider_key.to_string(), parent_key))
            .cloned()
            .unwrap_or_default())
    }
}

/// Geography used across scenarios. `D1` deliberately lacks `M5`.
pub fn geography() -> ScriptedOptions {
    ScriptedOptions::new()
        .with("departamentos", None, &[("LP", "La Paz"), ("CO", "Cochabamba"), ("D1", "Oruro")])
        .with("municipios", Some("LP"), &[("M1", "El Alto"), ("M2", "Viacha")])
        .with("municipios", Some("CO"), &[("M3", "Sacaba"), ("M4", "Quillacollo")])
        .with("municipios", Some("D1"), &[("M1", "El Alto"), ("M2", "Viacha")])
        .with("zonas", Some("M1"), &[("Z1", "Ciudad Satélite"), ("Z2", "Villa Adela")])
        .with("categorias", None, &[("C1", "Bebidas"), ("C2", "Snacks")])
        .with("productos", Some("C1"), &[("P1", "Agua 2L"), ("P2", "Jugo 1L")])
}

/// Record service with configurable latency and scripted failures.
#[derive(Default)]
pub struct RecordingRecords {
    latency: Duration,
    remaining_failures: AtomicUsize,
    seeds: HashMap<String, FormState>,
    created: Mutex<Vec<FormState>>,
    updated: Mutex<Vec<(String, FormState)>>,
    attempts: AtomicUsize,
}

impl RecordingRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next `count` writes fail with a constraint violation.
    pub fn failing_times(self, count: usize) -> Self {
        self.remaining_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_seed(mut self, id: &str, values: FormState) -> Self {
        self.seeds.insert(id.to_string(), values);
        self
    }

    pub fn created(&self) -> Vec<FormState> {
        self.created.lock().expect("created lock").clone()
    }

    pub fn updated(&self) -> Vec<(String, FormState)> {
        self.updated.lock().expect("updated lock").clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn write(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
            .is_ok();
        if failed {
            bail!("duplicate key value violates unique constraint");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordService for RecordingRecords {
    async fn get_by_id(&self, id: &str) -> Result<Record> {
        self.seeds
            .get(id)
            .cloned()
            .map(|values| Record::new(id, values))
            .ok_or_else(|| anyhow!("record {id} not found"))
    }

    async fn create(&self, payload: FormState) -> Result<Record> {
        self.write().await?;
        self.created.lock().expect("created lock").push(payload.clone());
        Ok(Record::new("rec-1", payload))
    }

    async fn update(&self, id: &str, payload: FormState) -> Result<Record> {
        self.write().await?;
        self.updated
            .lock()
            .expect("updated lock")
            .push((id.to_string(), payload.clone()));
        Ok(Record::new(id, payload))
    }
}

/// Customer lookup by identity number.
#[derive(Default)]
pub struct CustomerLookup {
    latency: Duration,
    keys: Mutex<Vec<String>>,
}

impl CustomerLookup {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            keys: Mutex::default(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().expect("keys lock").clone()
    }
}

#[async_trait]
impl LookupService for CustomerLookup {
    async fn find_id_by_key(&self, _lookup_key: &str, key: &str) -> Result<Option<FieldValue>> {
        self.keys.lock().expect("keys lock").push(key.to_string());
        tokio::time::sleep(self.latency).await;
        match key {
            "4455667" => Ok(Some(FieldValue::from(42i64))),
            "0000000" => bail!("customer service timed out"),
            _ => Ok(None),
        }
    }
}

pub fn build_wizard(definition: WizardDefinition, options: &Arc<ScriptedOptions>, records: &Arc<RecordingRecords>) -> Wizard {
    let collaborators = WizardCollaborators::new(options.clone(), records.clone());
    Wizard::new(definition, collaborators, EngineConfig::default()).expect("valid wizard")
}

pub fn build_wizard_with_lookup(
    definition: WizardDefinition,
    options: &Arc<ScriptedOptions>,
    records: &Arc<RecordingRecords>,
    lookup: &Arc<CustomerLookup>,
) -> Wizard {
    let collaborators = WizardCollaborators::new(options.clone(), records.clone()).with_lookup(lookup.clone());
    Wizard::new(definition, collaborators, EngineConfig::default()).expect("valid wizard")
}

pub fn labels(wizard: &Wizard, field: &str) -> Vec<String> {
    wizard
        .select_options(field)
        .expect("select options")
        .into_iter()
        .map(|option| option.label)
        .collect()
}
