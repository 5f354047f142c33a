//! Form values and selectable options.
//!
//! A wizard keeps every field value in a single flat [`FormState`] bag that
//! survives back/forward navigation. Values are a small scalar union rather
//! than arbitrary JSON so the engine can compare a stored selection against a
//! freshly fetched option list without guessing at structure.

use std::{borrow::Cow, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

/// Scalar value stored for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit absence of a value.
    #[default]
    Null,
    /// Boolean toggle value.
    Bool(bool),
    /// Numeric value, kept in its JSON representation to avoid float drift on identifiers.
    Number(Number),
    /// Free text or a textual identifier.
    Text(String),
}

impl FieldValue {
    /// Returns true when the value carries no meaningful content (null or whitespace-only text).
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    /// Canonical comparison key.
    ///
    /// Select inputs round-trip values as text, so `5` and `"5"` compare equal.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Bool(flag) => Cow::Owned(flag.to_string()),
            FieldValue::Number(number) => Cow::Owned(number.to_string()),
            FieldValue::Text(text) => Cow::Borrowed(text.trim()),
        }
    }

    /// Borrow the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Interprets the value as a finite float, parsing numeric text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            FieldValue::Number(number) => number.as_f64(),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|number| number.is_finite())
    }

    /// Converts into a JSON value for payloads and logging.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Bool(flag) => JsonValue::Bool(*flag),
            FieldValue::Number(number) => JsonValue::Number(number.clone()),
            FieldValue::Text(text) => JsonValue::String(text.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map(FieldValue::Number).unwrap_or(FieldValue::Null)
    }
}

impl From<&OptionValue> for FieldValue {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Number(number) => FieldValue::Number(number.clone()),
            OptionValue::Text(text) => FieldValue::Text(text.clone()),
        }
    }
}

/// Value carried by a selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(Number),
    Text(String),
}

impl OptionValue {
    /// Canonical comparison key, aligned with [`FieldValue::as_key`].
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            OptionValue::Number(number) => Cow::Owned(number.to_string()),
            OptionValue::Text(text) => Cow::Borrowed(text.trim()),
        }
    }

    /// Returns true when `value` selects this option.
    pub fn matches(&self, value: &FieldValue) -> bool {
        !value.is_blank() && self.as_key() == value.as_key()
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(Number::from(value))
    }
}

/// One selectable choice returned by an options provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub value: OptionValue,
    pub label: String,
}

impl OptionItem {
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Returns true when `value` is present among `options`.
pub fn options_contain(options: &[OptionItem], value: &FieldValue) -> bool {
    options.iter().any(|option| option.value.matches(value))
}

/// Flat mapping of field name to current value, shared by every step of a wizard.
///
/// Cleared fields are removed rather than stored as null, so "unselected" has a
/// single representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: IndexMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Returns true when the field holds a non-blank value.
    pub fn has_value(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|value| !value.is_blank())
    }

    /// Returns the field value when it is non-blank.
    pub fn meaningful(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).filter(|value| !value.is_blank())
    }

    /// Stores a value and returns the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Removes a value, leaving the field unselected.
    pub fn clear(&mut self, name: &str) -> Option<FieldValue> {
        self.values.shift_remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts into a JSON object, preserving insertion order.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.values.iter().map(|(name, value)| (name.clone(), value.to_json())).collect())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormState {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FormState {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
