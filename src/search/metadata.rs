//! Result Metadata
//!
//! Bounded, typed key/value properties attached to search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of keys in one metadata map
pub const MAX_METADATA_KEYS: usize = 16;

/// Maximum key length in characters
pub const MAX_METADATA_KEY_LENGTH: usize = 32;

/// Maximum text value length in characters
pub const MAX_METADATA_VALUE_LENGTH: usize = 256;

// == Meta Value ==
/// A single scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Flag(value)
    }
}

// == Metadata Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata holds more than {} keys", MAX_METADATA_KEYS)]
    TooManyKeys,

    #[error("metadata key '{0}' is empty or longer than {} characters", MAX_METADATA_KEY_LENGTH)]
    InvalidKey(String),

    #[error("metadata value for '{0}' exceeds {} characters", MAX_METADATA_VALUE_LENGTH)]
    ValueTooLong(String),
}

// == Metadata ==
/// Size- and length-bounded property map.
///
/// Every way of building one enforces the bounds, so a `Metadata` value is
/// always within them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a property.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetaValue>,
    ) -> Result<(), MetadataError> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() || key.chars().count() > MAX_METADATA_KEY_LENGTH {
            return Err(MetadataError::InvalidKey(key));
        }
        if let MetaValue::Text(text) = &value {
            if text.chars().count() > MAX_METADATA_VALUE_LENGTH {
                return Err(MetadataError::ValueTooLong(key));
            }
        }
        if !self.0.contains_key(&key) && self.0.len() >= MAX_METADATA_KEYS {
            return Err(MetadataError::TooManyKeys);
        }

        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.0.iter()
    }
}

impl TryFrom<BTreeMap<String, MetaValue>> for Metadata {
    type Error = MetadataError;

    fn try_from(map: BTreeMap<String, MetaValue>) -> Result<Self, Self::Error> {
        if map.len() > MAX_METADATA_KEYS {
            return Err(MetadataError::TooManyKeys);
        }
        let mut metadata = Metadata::new();
        for (key, value) in map {
            metadata.insert(key, value)?;
        }
        Ok(metadata)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = BTreeMap::<String, MetaValue>::deserialize(deserializer)?;
        Metadata::try_from(map).map_err(serde::de::Error::custom)
    }
}
