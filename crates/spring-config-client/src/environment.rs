//! Remote environment resolved from config server property sources
//!
//! Property sources are kept in server order. The first source holding a key
//! wins, so earlier sources shadow later ones.

use std::collections::HashMap;

use crate::model::{ConfigServerPropertySource, ConfigServerResponse};

/// Properties fetched from a config server, ordered by precedence
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteEnvironment {
    name: String,
    profiles: Vec<String>,
    label: Option<String>,
    version: Option<String>,
    property_sources: Vec<ConfigServerPropertySource>,
}

impl RemoteEnvironment {
    /// Build from property sources, highest precedence first
    pub fn new(
        name: &str,
        profiles: Vec<String>,
        sources: Vec<ConfigServerPropertySource>,
    ) -> Self {
        Self {
            name: name.to_string(),
            profiles,
            label: None,
            version: None,
            property_sources: sources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Property sources in precedence order
    pub fn property_sources(&self) -> &[ConfigServerPropertySource] {
        &self.property_sources
    }

    /// Value of `key` from the highest precedence source that defines it
    pub fn get(&self, key: &str) -> Option<&str> {
        self.property_sources.iter().find_map(|s| s.get(key))
    }

    /// Name of the property source that supplies `key`
    pub fn source_for(&self, key: &str) -> Option<&str> {
        self.property_sources
            .iter()
            .find(|s| s.source.contains_key(key))
            .map(|s| s.name.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.property_sources
            .iter()
            .any(|s| s.source.contains_key(key))
    }

    /// Number of distinct keys across all sources
    pub fn len(&self) -> usize {
        self.to_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.property_sources.iter().all(|s| s.source.is_empty())
    }

    /// Flatten all sources into one map, higher precedence values winning
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut merged = HashMap::new();
        for source in self.property_sources.iter().rev() {
            for (key, value) in &source.source {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

impl From<ConfigServerResponse> for RemoteEnvironment {
    fn from(response: ConfigServerResponse) -> Self {
        Self {
            name: response.name,
            profiles: response.profiles,
            label: response.label,
            version: response.version,
            property_sources: response.property_sources,
        }
    }
}
