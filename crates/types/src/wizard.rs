//! Strongly typed wizard definitions shared by the engine and any rendering layer.
//!
//! A wizard is a static, ordered list of steps. Each step is an ordered list of
//! field descriptors. Field kinds are a tagged variant so the attributes a kind
//! needs (a provider key for selects, a lookup binding for looked-up text) can
//! only exist on the kinds that use them: a dependency can only be declared on a
//! select, and a select always names its options provider.

pub mod validation;

use serde::{Deserialize, Serialize};

/// Fully authored multi-step wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDefinition {
    /// Canonical identifier used in logs and telemetry (for example, `address`).
    pub identifier: String,
    /// Optional human-readable title.
    #[serde(default)]
    pub title: Option<String>,
    /// Ordered steps; the user completes them front to back.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            steps: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Parses a YAML wizard document.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    /// Iterates every field across all steps in evaluation order, paired with its step index.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(index, step)| step.fields.iter().map(move |field| (index, field)))
    }

    /// Finds a field and the index of the step declaring it.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields().find(|(_, field)| field.name == name)
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl StepDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Describes a single input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Unique key of the field within the wizard; also its key in the form state.
    pub name: String,
    /// Label shown to the user and used in validation messages.
    #[serde(default)]
    pub label: Option<String>,
    /// Kind-specific attributes.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Whether a value must be present before leaving the step.
    #[serde(default)]
    pub required: bool,
    /// Optional shape constraints checked when a value is present.
    #[serde(default)]
    pub constraints: Option<FieldConstraints>,
}

/// Kind of input and the attributes that kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FieldKind {
    /// Single-line text. May populate a hidden field through a debounced lookup.
    Text {
        #[serde(default)]
        lookup: Option<LookupBinding>,
    },
    Number,
    /// Choice among options fetched from an options provider, optionally scoped by a parent field.
    Select {
        provider_key: String,
        #[serde(default)]
        depends_on: Option<String>,
    },
    /// Value carried in the form state but never shown nor validated.
    Hidden,
    /// Read-only presentation; never validated nor submitted.
    Display,
    Textarea,
}

/// Links a text field to a lookup service that resolves a hidden foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupBinding {
    /// Which lookup to run (for example, `customer_by_ci`).
    pub lookup_key: String,
    /// Hidden field receiving the resolved identifier.
    pub target: String,
}

/// Declarative constraints applied to a present value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConstraints {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldDescriptor {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            required: false,
            constraints: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Text { lookup: None })
    }

    /// Text field whose value is resolved through `lookup_key` into the hidden field `target`.
    pub fn lookup_text(name: impl Into<String>, lookup_key: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            FieldKind::Text {
                lookup: Some(LookupBinding {
                    lookup_key: lookup_key.into(),
                    target: target.into(),
                }),
            },
        )
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Number)
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Textarea)
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Hidden)
    }

    pub fn display(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Display)
    }

    /// Select without a parent; its options are fetched with no parent value.
    pub fn select(name: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            FieldKind::Select {
                provider_key: provider_key.into(),
                depends_on: None,
            },
        )
    }

    /// Select whose options are scoped by the current value of `parent`.
    pub fn dependent_select(name: impl Into<String>, provider_key: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            FieldKind::Select {
                provider_key: provider_key.into(),
                depends_on: Some(parent.into()),
            },
        )
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Label for messages, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn depends_on(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Select { depends_on, .. } => depends_on.as_deref(),
            _ => None,
        }
    }

    pub fn provider_key(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Select { provider_key, .. } => Some(provider_key.as_str()),
            _ => None,
        }
    }

    pub fn lookup(&self) -> Option<&LookupBinding> {
        match &self.kind {
            FieldKind::Text { lookup } => lookup.as_ref(),
            _ => None,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self.kind, FieldKind::Select { .. })
    }

    /// Hidden and display fields are skipped by the validation gate.
    pub fn is_user_editable(&self) -> bool {
        !matches!(self.kind, FieldKind::Hidden | FieldKind::Display)
    }

    /// Display fields are presentation only and never leave the wizard.
    pub fn is_submitted(&self) -> bool {
        !matches!(self.kind, FieldKind::Display)
    }
}
