use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use wizard_types::{FieldValue, OptionItem};

use super::OptionsProvider;

/// In-memory options table keyed by provider key and parent value.
///
/// Useful for previews and tests. Unknown combinations resolve to an empty list,
/// matching a backend filter that selects no rows.
#[derive(Debug, Default, Clone)]
pub struct StaticOptionsProvider {
    table: HashMap<(String, String), Vec<OptionItem>>,
}

impl StaticOptionsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers options served when no parent value is supplied.
    pub fn with_options(mut self, provider_key: impl Into<String>, items: Vec<OptionItem>) -> Self {
        self.table.insert((provider_key.into(), String::new()), items);
        self
    }

    /// Registers options served for a specific parent value.
    pub fn with_children(mut self, provider_key: impl Into<String>, parent: impl Into<FieldValue>, items: Vec<OptionItem>) -> Self {
        let parent = parent.into();
        self.table.insert((provider_key.into(), parent.as_key().into_owned()), items);
        self
    }
}

#[async_trait]
impl OptionsProvider for StaticOptionsProvider {
    async fn get_options(&self, provider_key: &str, parent: Option<&FieldValue>) -> Result<Vec<OptionItem>> {
        let parent_key = parent.map(|value| value.as_key().into_owned()).unwrap_or_default();
        Ok(self
            .table
            .get(&(provider_key.to_string(), parent_key))
            .cloned()
            .unwrap_or_default())
    }
}
