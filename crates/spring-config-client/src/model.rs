//! Config server model types
//!
//! Wire types returned by the Spring Cloud Config server environment endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

/// Environment returned by `GET /{application}/{profiles}[/{label}]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigServerResponse {
    pub name: String,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Property sources, highest precedence first
    #[serde(default)]
    pub property_sources: Vec<ConfigServerPropertySource>,
}

impl ConfigServerResponse {
    pub fn property_sources(&self) -> &[ConfigServerPropertySource] {
        &self.property_sources
    }
}

/// A named set of properties, e.g. one file of the backing repository
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigServerPropertySource {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: HashMap<String, String>,
}

impl ConfigServerPropertySource {
    pub fn new(name: &str, source: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.source.get(key).map(String::as_str)
    }
}

/// Scalars are kept as their string form, nulls are dropped
fn deserialize_source<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut source = HashMap::with_capacity(raw.len());

    for (key, value) in raw {
        match value {
            Value::Null => {}
            Value::String(s) => {
                source.insert(key, s);
            }
            Value::Bool(b) => {
                source.insert(key, b.to_string());
            }
            Value::Number(n) => {
                source.insert(key, n.to_string());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(D::Error::custom(format!(
                    "property '{}' must be a scalar value",
                    key
                )));
            }
        }
    }

    Ok(source)
}
