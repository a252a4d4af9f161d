//! Layered loading of the client configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional configuration file (yaml, toml, json, ...)
//! 3. `SPRING_CLOUD_CONFIG_*` environment variables, `__` separating nested keys
//! 4. explicit overrides (e.g. command line flags)
//!
//! Text settings (uri, label, name, credentials, ...) keep their exact
//! spelling: environment values are never coerced, and plain YAML scalars
//! such as `label: 2.10` or `password: 007` are read back as written.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat, Map, Source, Value};
use serde::Deserialize;
use tracing::debug;

use super::{PREFIX, SpringCloudClientConfiguration};
use crate::error::Result;

/// Environment variable prefix for client settings
pub const ENV_PREFIX: &str = "SPRING_CLOUD_CONFIG";

/// Fallback for the application name when `spring.cloud.config.name` is unset
pub const APPLICATION_NAME_PROPERTY: &str = "spring.application.name";

/// Fallback for the profiles when `spring.cloud.config.profile` is unset
pub const ACTIVE_PROFILES_PROPERTY: &str = "spring.profiles.active";

/// Full key of a client setting, e.g. `client_key("uri")` is `spring.cloud.config.uri`
pub fn client_key(field: &str) -> String {
    format!("{}.{}", PREFIX, field)
}

/// Builds a `SpringCloudClientConfiguration` from layered sources
#[derive(Debug, Default)]
pub struct ConfigurationLoader {
    file: Option<PathBuf>,
    file_required: bool,
    read_environment: bool,
    environment_source: Option<Map<String, String>>,
    overrides: Vec<(String, Value)>,
}

impl ConfigurationLoader {
    /// Create a loader that reads the process environment
    pub fn new() -> Self {
        Self {
            read_environment: true,
            ..Default::default()
        }
    }

    /// Read the given file; missing files are skipped unless `required`
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self.file_required = required;
        self
    }

    /// Skip environment variables entirely
    pub fn without_environment(mut self) -> Self {
        self.read_environment = false;
        self
    }

    /// Read environment variables from the given map instead of the process environment
    pub fn with_environment_source(mut self, vars: Map<String, String>) -> Self {
        self.read_environment = true;
        self.environment_source = Some(vars);
        self
    }

    /// Override a key (full dotted path); overrides win over every other source
    pub fn with_override(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Override a client setting relative to `spring.cloud.config`
    pub fn with_client_override(self, field: &str, value: impl Into<Value>) -> Self {
        let key = client_key(field);
        self.with_override(&key, value)
    }

    /// Load the configuration from all layers
    pub fn load(self) -> Result<SpringCloudClientConfiguration> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            debug!("Reading client configuration from {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(self.file_required));

            if let Some(text_settings) = yaml_text_settings(path) {
                builder = builder.add_source(File::from_str(&text_settings, FileFormat::Json));
            }
        }

        if self.read_environment {
            let environment = Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(self.environment_source);

            for (key, value) in environment.collect()? {
                let key = client_key(&key.replace('_', "-"));
                debug!("Client setting {} taken from environment", key);
                builder = builder.set_override(key, value)?;
            }
        }

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        let settings = builder.build()?;

        let mut configuration = match settings.get::<SpringCloudClientConfiguration>(PREFIX) {
            Ok(configuration) => configuration,
            Err(ConfigError::NotFound(_)) => SpringCloudClientConfiguration::default(),
            Err(e) => return Err(e.into()),
        };

        if configuration.name().is_none() {
            if let Some(name) = optional_string(&settings, APPLICATION_NAME_PROPERTY)? {
                configuration.set_name(Some(name));
            }
        }

        if configuration.profile().is_none() {
            if let Some(profiles) = optional_string(&settings, ACTIVE_PROFILES_PROPERTY)? {
                configuration.set_profile(Some(profiles));
            }
        }

        debug!("Loaded client configuration: {:?}", configuration);
        Ok(configuration)
    }
}

/// String settings of a YAML file, deserialized straight from the scalars
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlDocument {
    spring: YamlSpring,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlSpring {
    application: YamlApplication,
    profiles: YamlProfiles,
    cloud: YamlCloud,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlApplication {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlProfiles {
    active: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlCloud {
    config: YamlClientText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlClientText {
    uri: Option<String>,
    label: Option<String>,
    name: Option<String>,
    profile: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Re-read a YAML file's string settings as a JSON layer.
///
/// The `config` crate types plain YAML scalars (`2.10` becomes a float), so
/// this layer is added right after the file to restore the original text.
/// Returns `None` for other formats or when the file cannot be read; the
/// file source itself reports those errors.
fn yaml_text_settings(path: &Path) -> Option<String> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
    if !is_yaml {
        return None;
    }

    let content = std::fs::read_to_string(path).ok()?;
    let document: YamlDocument = match serde_yaml::from_str(&content) {
        Ok(document) => document,
        Err(e) => {
            debug!("Skipping text settings of {}: {}", path.display(), e);
            return None;
        }
    };

    let spring = document.spring;
    let client = spring.cloud.config;
    let entries = [
        (client_key("uri"), client.uri),
        (client_key("label"), client.label),
        (client_key("name"), client.name),
        (client_key("profile"), client.profile),
        (client_key("username"), client.username),
        (client_key("password"), client.password),
        (APPLICATION_NAME_PROPERTY.to_string(), spring.application.name),
        (ACTIVE_PROFILES_PROPERTY.to_string(), spring.profiles.active),
    ];

    let mut root = serde_json::Map::new();
    for (key, value) in entries {
        if let Some(value) = value {
            insert_path(&mut root, &key, value);
        }
    }

    if root.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(root).to_string())
    }
}

fn insert_path(root: &mut serde_json::Map<String, serde_json::Value>, key: &str, value: String) {
    match key.split_once('.') {
        Some((head, rest)) => {
            let child = root
                .entry(head.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let serde_json::Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
        None => {
            root.insert(key.to_string(), serde_json::Value::String(value));
        }
    }
}

fn optional_string(settings: &Config, key: &str) -> Result<Option<String>> {
    match settings.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
