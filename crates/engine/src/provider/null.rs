use anyhow::Result;
use async_trait::async_trait;
use wizard_types::{FieldValue, OptionItem};

use super::OptionsProvider;

/// Options provider that never returns choices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOptionsProvider;

#[async_trait]
impl OptionsProvider for NullOptionsProvider {
    async fn get_options(&self, _provider_key: &str, _parent: Option<&FieldValue>) -> Result<Vec<OptionItem>> {
        Ok(Vec::new())
    }
}
